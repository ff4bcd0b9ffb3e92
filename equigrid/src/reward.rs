// src/reward.rs
//
// Multi-objective reward and its decomposition.
//
//   r(s) = w_budget * B(s)
//        + w_unserved * (low-income population unserved / low-income population)
//        + w_re * (population served by renewable alone / total population)
//
// where B(s) is the raw budget (default) or max(0, budget).
//
// The reward depends on the state only. The action argument is accepted so
// the signature matches R(s, a) solvers; it is currently unused.
//
// Each component is computed independently and `total()` is their plain sum,
// so per-component attribution across an episode adds back to the reward.

use serde::{Deserialize, Serialize};

use crate::actions::Action;
use crate::config::{Config, RewardProfile};
use crate::state::WorldState;

/// Guard added to population denominators.
pub const POPULATION_EPS: f64 = 1e-6;

/// How the budget enters the reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetRewardMode {
    /// budget * weight; debt is penalised.
    Raw,
    /// max(0, budget) * weight; debt scores the same as an empty budget.
    Clamped,
}

impl BudgetRewardMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetRewardMode::Raw => "raw",
            BudgetRewardMode::Clamped => "clamped",
        }
    }

    pub fn parse(s: &str) -> Option<BudgetRewardMode> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Some(BudgetRewardMode::Raw),
            "clamped" | "clamp" | "nonneg" => Some(BudgetRewardMode::Clamped),
            _ => None,
        }
    }
}

/// Reward weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardWeights {
    /// Weight on the remaining budget (positive rewards conservation).
    pub budget: f64,
    /// Weight on the unserved low-income fraction (negative => penalty).
    pub low_income_unserved: f64,
    /// Weight on the renewable-served population fraction.
    pub population_with_re: f64,
    pub budget_mode: BudgetRewardMode,
}

impl Default for RewardWeights {
    fn default() -> Self {
        Self::for_profile(RewardProfile::Balanced)
    }
}

impl RewardWeights {
    pub fn for_profile(profile: RewardProfile) -> Self {
        let (budget, low_income_unserved, population_with_re) = match profile {
            RewardProfile::Balanced => (0.001, -5.0, 5.0),
            RewardProfile::EquityFirst => (0.0005, -15.0, 5.0),
            RewardProfile::Renewable => (0.0005, -5.0, 15.0),
        };
        Self {
            budget,
            low_income_unserved,
            population_with_re,
            budget_mode: BudgetRewardMode::Raw,
        }
    }
}

/// Per-step reward broken into its three additive parts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardComponents {
    pub budget: f64,
    pub equity_penalty: f64,
    pub renewable_bonus: f64,
}

impl RewardComponents {
    #[inline]
    pub fn total(&self) -> f64 {
        self.budget + self.equity_penalty + self.renewable_bonus
    }

    /// Component-wise `self += other * scale` (episode accumulation).
    pub fn accumulate(&mut self, other: &RewardComponents, scale: f64) {
        self.budget += other.budget * scale;
        self.equity_penalty += other.equity_penalty * scale;
        self.renewable_bonus += other.renewable_bonus * scale;
    }
}

/// Share of low-income population living in a city whose demand is unmet.
pub fn low_income_unserved_fraction(state: &WorldState) -> f64 {
    let unserved: f64 = state
        .cities
        .iter()
        .filter(|c| !c.is_high_income && !c.is_served())
        .map(|c| c.population)
        .sum();
    unserved / (state.low_income_population() + POPULATION_EPS)
}

/// Share of total population whose demand renewable supply covers on its own.
pub fn renewable_population_fraction(state: &WorldState) -> f64 {
    let covered: f64 = state
        .cities
        .iter()
        .filter(|c| c.is_renewable_served())
        .map(|c| c.population)
        .sum();
    covered / (state.total_population() + POPULATION_EPS)
}

pub fn budget_component(weights: &RewardWeights, state: &WorldState) -> f64 {
    let b = match weights.budget_mode {
        BudgetRewardMode::Raw => state.budget,
        BudgetRewardMode::Clamped => state.budget.max(0.0),
    };
    b * weights.budget
}

/// Reward split into components. `_action` is unused.
pub fn decompose_reward(cfg: &Config, state: &WorldState, _action: &Action) -> RewardComponents {
    let w = &cfg.reward;
    RewardComponents {
        budget: budget_component(w, state),
        equity_penalty: low_income_unserved_fraction(state) * w.low_income_unserved,
        renewable_bonus: renewable_population_fraction(state) * w.population_with_re,
    }
}

/// Scalar reward; equal to `decompose_reward(..).total()`.
pub fn reward(cfg: &Config, state: &WorldState, action: &Action) -> f64 {
    decompose_reward(cfg, state, action).total()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::all_actions;
    use crate::transition::transition;
    use crate::types::CityRecord;

    fn pair(low_supply: f64) -> WorldState {
        WorldState::new(
            500.0,
            vec![
                CityRecord::new("low", 10.0, 0.0, low_supply, 1000.0, false),
                CityRecord::new("high", 10.0, 0.0, 10.0, 1000.0, true),
            ],
        )
    }

    #[test]
    fn decomposition_sums_to_total() {
        let cfg = Config::default();
        let s0 = WorldState::initial(&cfg).unwrap();
        for a in all_actions(&cfg) {
            let s = transition(&cfg, &s0, &a);
            for b in all_actions(&cfg) {
                let parts = decompose_reward(&cfg, &s, &b);
                let r = reward(&cfg, &s, &b);
                assert!((parts.total() - r).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn reward_ignores_action() {
        let cfg = Config::default();
        let s = WorldState::initial(&cfg).unwrap();
        let baseline = reward(&cfg, &s, &Action::NoOp);
        for a in all_actions(&cfg) {
            assert_eq!(reward(&cfg, &s, &a), baseline);
        }
    }

    #[test]
    fn budget_component_monotone_under_positive_weight() {
        let cfg = Config::default();
        let s = WorldState::initial(&cfg).unwrap();
        let mut prev = f64::NEG_INFINITY;
        for b in [-500.0, -1.0, 0.0, 1.0, 250.0, 1000.0, 5000.0] {
            let c = budget_component(&cfg.reward, &s.with_budget(b));
            assert!(c >= prev);
            prev = c;
        }
    }

    #[test]
    fn clamped_mode_ignores_debt() {
        let mut cfg = Config::default();
        cfg.reward.budget_mode = BudgetRewardMode::Clamped;
        let s = WorldState::initial(&cfg).unwrap().with_budget(-300.0);
        assert_eq!(budget_component(&cfg.reward, &s), 0.0);

        cfg.reward.budget_mode = BudgetRewardMode::Raw;
        assert!(budget_component(&cfg.reward, &s) < 0.0);
    }

    #[test]
    fn unmet_low_income_city_penalised_more() {
        let cfg = Config::default();
        let unmet = decompose_reward(&cfg, &pair(4.0), &Action::NoOp);
        let met = decompose_reward(&cfg, &pair(10.0), &Action::NoOp);
        assert!(unmet.equity_penalty < met.equity_penalty);
        assert!(met.equity_penalty.abs() < 1e-12);
        assert!(unmet.equity_penalty <= 0.0);
    }

    #[test]
    fn renewable_bonus_needs_renewable_alone() {
        let cfg = Config::default();
        let fossil = WorldState::new(0.0, vec![CityRecord::new("a", 10.0, 2.0, 20.0, 100.0, true)]);
        let green = WorldState::new(0.0, vec![CityRecord::new("a", 10.0, 10.0, 0.0, 100.0, true)]);
        assert_eq!(decompose_reward(&cfg, &fossil, &Action::NoOp).renewable_bonus, 0.0);
        let bonus = decompose_reward(&cfg, &green, &Action::NoOp).renewable_bonus;
        assert!((bonus - cfg.reward.population_with_re).abs() < 1e-6);
    }

    #[test]
    fn fractions_are_population_weighted() {
        let state = WorldState::new(
            0.0,
            vec![
                CityRecord::new("small", 10.0, 0.0, 0.0, 100.0, false),
                CityRecord::new("big", 10.0, 0.0, 10.0, 900.0, false),
            ],
        );
        let f = low_income_unserved_fraction(&state);
        assert!((f - 0.1).abs() < 1e-6);
    }

    #[test]
    fn no_low_income_population_gives_zero_penalty() {
        let state = WorldState::new(0.0, vec![CityRecord::new("a", 10.0, 0.0, 0.0, 100.0, true)]);
        assert_eq!(low_income_unserved_fraction(&state), 0.0);
    }

    #[test]
    fn accumulate_scales_each_component() {
        let mut acc = RewardComponents::default();
        let step = RewardComponents {
            budget: 1.0,
            equity_penalty: -2.0,
            renewable_bonus: 4.0,
        };
        acc.accumulate(&step, 1.0);
        acc.accumulate(&step, 0.5);
        assert_eq!(acc.budget, 1.5);
        assert_eq!(acc.equity_penalty, -3.0);
        assert_eq!(acc.renewable_bonus, 6.0);
        assert_eq!(acc.total(), 4.5);
    }
}
