// src/transition.rs
//
// Deterministic transition function.
//
// A modifying action:
//   1. changes one supply kind of one city by one increment,
//   2. books the capital cost (debit for add, credit for remove),
//   3. bills operating cost on the entire post-action fleet.
//
// NoOp returns a fresh copy with identical fields and bills nothing.
//
// Feasibility is NOT re-checked. An infeasible action produces whatever the
// arithmetic says (negative supply, deeper debt); callers that want to stay
// feasible must pick from `actions::valid_actions`.

use crate::actions::Action;
use crate::config::Config;
use crate::state::WorldState;
use crate::types::{Direction, EnergyKind};

/// Operating cost of the fleet in `state` for one epoch.
///
/// Sum over cities of renewable * op_re + non-renewable * op_nre. Missing
/// cost entries count as zero (validated configs always have them).
pub fn fleet_operating_cost(cfg: &Config, state: &WorldState) -> f64 {
    let op_re = cfg.costs.operating(EnergyKind::Renewable);
    let op_nre = cfg.costs.operating(EnergyKind::NonRenewable);
    state
        .cities
        .iter()
        .enumerate()
        .map(|(j, c)| {
            c.renewable_supply * op_re.get(j).copied().unwrap_or(0.0)
                + c.nonrenewable_supply * op_nre.get(j).copied().unwrap_or(0.0)
        })
        .sum()
}

/// Apply `action` to `state` and return the successor state.
///
/// Pure: identical inputs always give identical outputs, and `state` is
/// never modified.
pub fn transition(cfg: &Config, state: &WorldState, action: &Action) -> WorldState {
    let (kind, direction, city) = match *action {
        Action::NoOp => return state.clone(),
        Action::Modify {
            kind,
            direction,
            city,
        } => (kind, direction, city),
    };

    let increment = cfg.supply.increment(kind);
    let next = match state.city(city) {
        Some(record) => {
            let supply = record.supply(kind) + direction.sign() * increment;
            state.with_city(city, record.with_supply(kind, supply))
        }
        None => state.clone(),
    };

    let capital = cfg.costs.capital(kind, direction);
    let operating = fleet_operating_cost(cfg, &next);
    let budget = match direction {
        Direction::Add => state.budget - capital - operating,
        Direction::Remove => state.budget + capital - operating,
    };

    next.with_budget(budget)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::all_actions;
    use crate::config::CostConfig;
    use crate::types::CityRecord;
    use std::sync::Arc;

    /// Two-city scenario with uniform 0.01 operating costs.
    fn two_city_config() -> Config {
        Config {
            name: "two_city".to_string(),
            initial_budget: 1000.0,
            cities: vec![
                CityRecord::new("a", 10.0, 0.0, 8.0, 1000.0, true),
                CityRecord::new("b", 12.0, 0.0, 8.0, 2000.0, false),
            ],
            costs: CostConfig {
                add_renewable: 150.0,
                remove_renewable: 50.0,
                add_nonrenewable: 100.0,
                remove_nonrenewable: 30.0,
                operating_renewable: vec![0.01, 0.01],
                operating_nonrenewable: vec![0.01, 0.01],
            },
            ..Config::default()
        }
    }

    #[test]
    fn add_renewable_concrete_scenario() {
        let cfg = two_city_config();
        let s0 = WorldState::initial(&cfg).unwrap();

        let s1 = transition(&cfg, &s0, &Action::add(EnergyKind::Renewable, 0));

        assert_eq!(s1.cities[0].renewable_supply, 8.0);
        assert_eq!(s1.cities[0].nonrenewable_supply, 8.0);
        // 1000 - 150 - [(0+8)*0.01 + 8*0.01 + 0*0.01 + 8*0.01]
        assert!((s1.budget - 849.76).abs() < 1e-9, "budget = {}", s1.budget);
        assert_eq!(*s1.cities[1], *s0.cities[1]);
        assert!(Arc::ptr_eq(&s1.cities[1], &s0.cities[1]));
        assert_eq!(s1.total_demand, s0.total_demand);
    }

    #[test]
    fn remove_nonrenewable_credits_capital_and_bills_fleet() {
        let cfg = two_city_config();
        let s0 = WorldState::initial(&cfg).unwrap();

        let s1 = transition(&cfg, &s0, &Action::remove(EnergyKind::NonRenewable, 1));

        assert_eq!(s1.cities[1].nonrenewable_supply, 0.0);
        // 1000 + 30 - [8*0.01 (city a nre)]
        assert!((s1.budget - 1029.92).abs() < 1e-9, "budget = {}", s1.budget);
    }

    #[test]
    fn noop_is_identity() {
        let cfg = Config::default();
        let s0 = WorldState::initial(&cfg).unwrap();
        let s1 = transition(&cfg, &s0, &Action::NoOp);
        assert_eq!(s0, s1);
        assert_eq!(s0.budget, s1.budget);
        for (a, b) in s0.cities.iter().zip(&s1.cities) {
            assert_eq!(**a, **b);
        }
    }

    #[test]
    fn transition_is_pure() {
        let cfg = Config::default();
        let s0 = WorldState::initial(&cfg).unwrap();
        for action in all_actions(&cfg) {
            let a = transition(&cfg, &s0, &action);
            let b = transition(&cfg, &s0, &action);
            assert_eq!(a, b, "action {action}");
        }
        // Root untouched by any branch.
        assert_eq!(s0, WorldState::initial(&cfg).unwrap());
    }

    #[test]
    fn infeasible_remove_goes_negative_without_error() {
        let cfg = two_city_config();
        let s0 = WorldState::initial(&cfg).unwrap();
        let s1 = transition(&cfg, &s0, &Action::remove(EnergyKind::Renewable, 0));
        assert_eq!(s1.cities[0].renewable_supply, -8.0);
    }

    #[test]
    fn fleet_operating_cost_sums_both_kinds() {
        let cfg = two_city_config();
        let s0 = WorldState::initial(&cfg).unwrap();
        assert!((fleet_operating_cost(&cfg, &s0) - 0.16).abs() < 1e-12);
    }
}
