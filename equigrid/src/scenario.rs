// src/scenario.rs
//
// Scenario initializer.
//
// Two ways to get a scenario:
// - fixed: `Config::default()` (or a validated YAML file),
// - randomized: `ScenarioSampler` draws every numeric field independently
//   from a small discrete candidate list using a seeded ChaCha8 stream.
//
// Same seed + same candidate lists => identical scenario. Every sampled
// scenario has positive demands and at least one high-income and one
// low-income city, so the equity terms of the reward are well defined.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::{Config, ConfigError, CostConfig};
use crate::types::CityRecord;

/// Candidate values for randomized scenarios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioRandConfig {
    pub num_cities: usize,
    pub initial_budget: Vec<f64>,
    pub demand: Vec<f64>,
    pub renewable_supply: Vec<f64>,
    pub nonrenewable_supply: Vec<f64>,
    pub population: Vec<f64>,
    /// Probability that a city is high-income.
    pub high_income_prob: f64,
    pub add_renewable_cost: Vec<f64>,
    pub remove_renewable_cost: Vec<f64>,
    pub add_nonrenewable_cost: Vec<f64>,
    pub remove_nonrenewable_cost: Vec<f64>,
    pub operating_renewable: Vec<f64>,
    pub operating_nonrenewable: Vec<f64>,
}

impl Default for ScenarioRandConfig {
    fn default() -> Self {
        Self {
            num_cities: 4,
            initial_budget: vec![600.0, 800.0, 1000.0, 1200.0],
            demand: vec![8.0, 10.0, 12.0, 15.0, 20.0],
            renewable_supply: vec![0.0, 2.0, 4.0, 8.0],
            nonrenewable_supply: vec![0.0, 4.0, 6.0, 8.0],
            population: vec![20_000.0, 50_000.0, 80_000.0, 120_000.0],
            high_income_prob: 0.5,
            add_renewable_cost: vec![120.0, 150.0, 180.0],
            remove_renewable_cost: vec![30.0, 50.0],
            add_nonrenewable_cost: vec![80.0, 100.0],
            remove_nonrenewable_cost: vec![20.0, 30.0],
            operating_renewable: vec![0.005, 0.01, 0.02],
            operating_nonrenewable: vec![0.01, 0.02, 0.05],
        }
    }
}

impl ScenarioRandConfig {
    /// Candidate lists collapsed to the default scenario's values.
    pub fn deterministic() -> Self {
        Self {
            num_cities: 4,
            initial_budget: vec![1000.0],
            demand: vec![10.0],
            renewable_supply: vec![0.0],
            nonrenewable_supply: vec![8.0],
            population: vec![50_000.0],
            high_income_prob: 0.5,
            add_renewable_cost: vec![150.0],
            remove_renewable_cost: vec![50.0],
            add_nonrenewable_cost: vec![100.0],
            remove_nonrenewable_cost: vec![30.0],
            operating_renewable: vec![0.01],
            operating_nonrenewable: vec![0.02],
        }
    }
}

/// Deterministic scenario sampler.
pub struct ScenarioSampler {
    config: ScenarioRandConfig,
    rng: ChaCha8Rng,
}

impl ScenarioSampler {
    pub fn new(config: ScenarioRandConfig, seed: u64) -> Self {
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Uniform pick from a candidate list; `fallback` when the list is empty.
    fn pick(&mut self, candidates: &[f64], fallback: f64) -> f64 {
        candidates.choose(&mut self.rng).copied().unwrap_or(fallback)
    }

    /// Sample a scenario on top of `base`.
    ///
    /// Cities, initial budget and all costs are drawn; supply increments,
    /// the per-city ceiling, reward weights, discount and grid constants come
    /// from `base`. Supply candidates above the ceiling are dropped. The grid's
    /// `max_budget` is raised to the sampled initial budget when needed.
    pub fn sample(&mut self, base: &Config) -> Result<Config, ConfigError> {
        let n = self.config.num_cities;
        if n < 2 {
            return Err(ConfigError::InvalidField {
                field: "num_cities".to_string(),
                message: "randomized scenarios need at least 2 cities (one per income class)"
                    .to_string(),
            });
        }

        // Copy candidate lists to avoid borrowing conflicts with &mut self.
        let rc = self.config.clone();
        let ceiling = base.supply.max_energy_per_city;
        let within_ceiling = |xs: &[f64]| -> Vec<f64> {
            xs.iter()
                .copied()
                .filter(|&s| (0.0..=ceiling).contains(&s))
                .collect()
        };
        let positive = |xs: &[f64]| -> Vec<f64> { xs.iter().copied().filter(|&x| x > 0.0).collect() };

        let re_candidates = within_ceiling(&rc.renewable_supply);
        let nre_candidates = within_ceiling(&rc.nonrenewable_supply);
        let demand_candidates = positive(&rc.demand);
        let population_candidates = positive(&rc.population);

        let initial_budget = self.pick(&rc.initial_budget, base.initial_budget);

        let mut cities = Vec::with_capacity(n);
        let mut operating_renewable = Vec::with_capacity(n);
        let mut operating_nonrenewable = Vec::with_capacity(n);
        for i in 0..n {
            let demand = self.pick(&demand_candidates, 10.0);
            let renewable = self.pick(&re_candidates, 0.0);
            let nonrenewable = self.pick(&nre_candidates, 0.0);
            let population = self.pick(&population_candidates, 1.0);
            let is_high_income = self.rng.gen::<f64>() < rc.high_income_prob;
            cities.push(CityRecord::new(
                format!("city_{i}"),
                demand,
                renewable,
                nonrenewable,
                population,
                is_high_income,
            ));
            operating_renewable.push(self.pick(&rc.operating_renewable, 0.01));
            operating_nonrenewable.push(self.pick(&rc.operating_nonrenewable, 0.02));
        }

        ensure_income_mix(&mut cities);

        let costs = CostConfig {
            add_renewable: self.pick(&rc.add_renewable_cost, base.costs.add_renewable),
            remove_renewable: self.pick(&rc.remove_renewable_cost, base.costs.remove_renewable),
            add_nonrenewable: self.pick(&rc.add_nonrenewable_cost, base.costs.add_nonrenewable),
            remove_nonrenewable: self.pick(
                &rc.remove_nonrenewable_cost,
                base.costs.remove_nonrenewable,
            ),
            operating_renewable,
            operating_nonrenewable,
        };

        let mut grid = base.grid.clone();
        if initial_budget > grid.max_budget {
            grid.max_budget = initial_budget;
        }

        let cfg = Config {
            name: format!("{}_rand", base.name),
            initial_budget,
            cities,
            costs,
            supply: base.supply.clone(),
            reward: base.reward.clone(),
            discount: base.discount,
            grid,
        };
        cfg.validate()?;
        Ok(cfg)
    }
}

/// Force at least one high-income and one low-income city.
///
/// If every city landed in one class, the first city becomes high-income or
/// the last becomes low-income, whichever class is missing.
fn ensure_income_mix(cities: &mut [CityRecord]) {
    if cities.len() < 2 {
        return;
    }
    if !cities.iter().any(|c| c.is_high_income) {
        cities[0].is_high_income = true;
    }
    if cities.iter().all(|c| c.is_high_income) {
        let last = cities.len() - 1;
        cities[last].is_high_income = false;
    }
}

/// Scenario for replicate `seed`: the base itself, or a sample drawn with
/// its own sampler so replicates never share an RNG stream.
pub fn scenario_for_seed(
    base: &Config,
    rand: Option<&ScenarioRandConfig>,
    seed: u64,
) -> Result<Config, ConfigError> {
    match rand {
        None => {
            base.validate()?;
            Ok(base.clone())
        }
        Some(rc) => ScenarioSampler::new(rc.clone(), seed).sample(base),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_scenario() {
        let base = Config::default();
        let a = ScenarioSampler::new(ScenarioRandConfig::default(), 42)
            .sample(&base)
            .unwrap();
        let b = ScenarioSampler::new(ScenarioRandConfig::default(), 42)
            .sample(&base)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_seeds_usually_differ() {
        let base = Config::default();
        let a = scenario_for_seed(&base, Some(&ScenarioRandConfig::default()), 1).unwrap();
        let b = scenario_for_seed(&base, Some(&ScenarioRandConfig::default()), 2).unwrap();
        assert!(a.cities != b.cities || a.costs != b.costs || a.initial_budget != b.initial_budget);
    }

    #[test]
    fn sampled_scenarios_are_well_formed() {
        let base = Config::default();
        let rc = ScenarioRandConfig::default();
        let mut sampler = ScenarioSampler::new(rc.clone(), 7);
        for _ in 0..200 {
            let cfg = sampler.sample(&base).unwrap();
            assert_eq!(cfg.num_cities(), rc.num_cities);
            assert!(cfg.cities.iter().all(|c| c.demand > 0.0));
            assert!(cfg.cities.iter().any(|c| c.is_high_income));
            assert!(cfg.cities.iter().any(|c| !c.is_high_income));
            assert!(rc.initial_budget.contains(&cfg.initial_budget));
            for c in &cfg.cities {
                assert!(rc.demand.contains(&c.demand));
                assert!(rc.population.contains(&c.population));
            }
        }
    }

    #[test]
    fn income_mix_forced_when_probability_degenerate() {
        let base = Config::default();
        for prob in [0.0, 1.0] {
            let rc = ScenarioRandConfig {
                high_income_prob: prob,
                ..ScenarioRandConfig::default()
            };
            let cfg = ScenarioSampler::new(rc, 3).sample(&base).unwrap();
            assert!(cfg.cities.iter().any(|c| c.is_high_income));
            assert!(cfg.cities.iter().any(|c| !c.is_high_income));
        }
    }

    #[test]
    fn single_city_randomized_scenario_rejected() {
        let rc = ScenarioRandConfig {
            num_cities: 1,
            ..ScenarioRandConfig::default()
        };
        assert!(ScenarioSampler::new(rc, 0).sample(&Config::default()).is_err());
    }

    #[test]
    fn deterministic_candidates_collapse() {
        let cfg = ScenarioSampler::new(ScenarioRandConfig::deterministic(), 99)
            .sample(&Config::default())
            .unwrap();
        assert_eq!(cfg.initial_budget, 1000.0);
        assert!(cfg.cities.iter().all(|c| c.demand == 10.0 && c.nonrenewable_supply == 8.0));
        assert_eq!(cfg.costs.operating_renewable, vec![0.01; 4]);
    }

    #[test]
    fn grid_max_budget_covers_sampled_budget() {
        let rc = ScenarioRandConfig {
            initial_budget: vec![5000.0],
            ..ScenarioRandConfig::default()
        };
        let cfg = ScenarioSampler::new(rc, 0).sample(&Config::default()).unwrap();
        assert_eq!(cfg.grid.max_budget, 5000.0);
    }

    #[test]
    fn fixed_source_returns_base() {
        let base = Config::default();
        assert_eq!(scenario_for_seed(&base, None, 123).unwrap(), base);
    }
}
