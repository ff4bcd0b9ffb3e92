// src/state.rs
//
// World state for the planning decision process.
//
// A WorldState is an immutable value. Cities are held behind `Arc` so that a
// transition touching city i allocates exactly one new CityRecord and shares
// every other record with its parent; lookahead policies can branch many
// hypothetical successors off one root without copying the whole city list.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::{Config, ConfigError};
use crate::types::CityRecord;

/// Numeric tolerance used for state equality.
pub const STATE_EPS: f64 = 1e-6;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldState {
    /// Remaining budget. May be negative after an infeasible step.
    pub budget: f64,
    /// Total demand snapshot taken at construction; never re-derived.
    pub total_demand: f64,
    /// Ordered city list; index is identity.
    pub cities: Vec<Arc<CityRecord>>,
}

impl WorldState {
    /// Build a state, caching total demand from the given cities.
    pub fn new(budget: f64, cities: Vec<CityRecord>) -> Self {
        let total_demand = cities.iter().map(|c| c.demand).sum();
        Self {
            budget,
            total_demand,
            cities: cities.into_iter().map(Arc::new).collect(),
        }
    }

    /// Episode start state for a validated scenario.
    ///
    /// Fails fast on any configuration error, including a city count that
    /// disagrees with the per-city cost vectors.
    pub fn initial(cfg: &Config) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self::new(cfg.initial_budget, cfg.cities.clone()))
    }

    pub fn num_cities(&self) -> usize {
        self.cities.len()
    }

    pub fn city(&self, index: usize) -> Option<&CityRecord> {
        self.cities.get(index).map(|c| c.as_ref())
    }

    /// Fresh value with a new budget; cities shared.
    pub fn with_budget(&self, budget: f64) -> Self {
        Self {
            budget,
            total_demand: self.total_demand,
            cities: self.cities.clone(),
        }
    }

    /// Fresh value with city `index` replaced; every other city shared.
    ///
    /// An out-of-range index leaves the city list unchanged.
    pub fn with_city(&self, index: usize, city: CityRecord) -> Self {
        let mut cities = self.cities.clone();
        if let Some(slot) = cities.get_mut(index) {
            *slot = Arc::new(city);
        }
        Self {
            budget: self.budget,
            total_demand: self.total_demand,
            cities,
        }
    }

    pub fn total_population(&self) -> f64 {
        self.cities.iter().map(|c| c.population).sum()
    }

    pub fn low_income_population(&self) -> f64 {
        self.cities
            .iter()
            .filter(|c| !c.is_high_income)
            .map(|c| c.population)
            .sum()
    }

    /// Number of cities whose demand is not yet covered.
    pub fn unserved_cities(&self) -> usize {
        self.cities.iter().filter(|c| !c.is_served()).count()
    }

    pub fn all_served(&self) -> bool {
        self.cities.iter().all(|c| c.is_served())
    }

    /// Field-wise equality within [`STATE_EPS`].
    pub fn approx_eq(&self, other: &WorldState) -> bool {
        let close = |a: f64, b: f64| (a - b).abs() <= STATE_EPS;
        close(self.budget, other.budget)
            && close(self.total_demand, other.total_demand)
            && self.cities.len() == other.cities.len()
            && self.cities.iter().zip(&other.cities).all(|(a, b)| {
                close(a.demand, b.demand)
                    && close(a.renewable_supply, b.renewable_supply)
                    && close(a.nonrenewable_supply, b.nonrenewable_supply)
                    && close(a.population, b.population)
            })
    }

    /// Summed absolute difference over budget and both supply vectors.
    ///
    /// This is the snapping metric used by the state indexer.
    pub fn l1_distance(&self, other: &WorldState) -> f64 {
        let mut d = (self.budget - other.budget).abs();
        for (a, b) in self.cities.iter().zip(&other.cities) {
            d += (a.renewable_supply - b.renewable_supply).abs();
            d += (a.nonrenewable_supply - b.nonrenewable_supply).abs();
        }
        d
    }
}

/// Structural equality (exact, including income class and names).
impl PartialEq for WorldState {
    fn eq(&self, other: &Self) -> bool {
        self.budget == other.budget
            && self.total_demand == other.total_demand
            && self.cities.len() == other.cities.len()
            && self
                .cities
                .iter()
                .zip(&other.cities)
                .all(|(a, b)| Arc::ptr_eq(a, b) || a == b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EnergyKind;

    fn two_cities() -> Vec<CityRecord> {
        vec![
            CityRecord::new("a", 10.0, 0.0, 8.0, 100.0, true),
            CityRecord::new("b", 12.0, 0.0, 8.0, 200.0, false),
        ]
    }

    #[test]
    fn total_demand_cached_at_construction() {
        let state = WorldState::new(1000.0, two_cities());
        assert_eq!(state.total_demand, 22.0);

        let bigger = state.with_city(0, CityRecord::new("a", 50.0, 0.0, 8.0, 100.0, true));
        assert_eq!(bigger.total_demand, 22.0);
    }

    #[test]
    fn with_city_shares_untouched_records() {
        let state = WorldState::new(1000.0, two_cities());
        let next = state.with_city(0, state.cities[0].with_supply(EnergyKind::Renewable, 8.0));

        assert!(Arc::ptr_eq(&state.cities[1], &next.cities[1]));
        assert!(!Arc::ptr_eq(&state.cities[0], &next.cities[0]));
        assert_eq!(state.cities[0].renewable_supply, 0.0);
        assert_eq!(next.cities[0].renewable_supply, 8.0);
    }

    #[test]
    fn with_city_out_of_range_is_unchanged() {
        let state = WorldState::new(1000.0, two_cities());
        let next = state.with_city(9, CityRecord::new("z", 1.0, 0.0, 0.0, 1.0, true));
        assert_eq!(state, next);
    }

    #[test]
    fn initial_rejects_invalid_config() {
        let mut cfg = Config::default();
        cfg.cities.clear();
        assert!(WorldState::initial(&cfg).is_err());
    }

    #[test]
    fn l1_distance_ignores_demand_and_population() {
        let a = WorldState::new(100.0, two_cities());
        let b = a
            .with_budget(90.0)
            .with_city(1, CityRecord::new("b", 99.0, 3.0, 8.0, 1.0, false));
        assert!((a.l1_distance(&b) - 13.0).abs() < 1e-12);
    }

    #[test]
    fn approx_eq_tolerates_small_noise() {
        let a = WorldState::new(100.0, two_cities());
        let b = a.with_budget(100.0 + 1e-9);
        assert!(a.approx_eq(&b));
        assert!(!a.approx_eq(&a.with_budget(100.1)));
    }
}
