// src/actions.rs
//
// Action type and action catalogue for the planning decision process.
//
// The catalogue is fixed by the city count:
//   [NoOp, (add-re, remove-re, add-nre, remove-nre) for city 0, city 1, ...]
// so an action's catalogue position is also its solver index.
//
// Feasibility is state-dependent and only enforced here, by filtering.
// The transition function applies whatever it is given.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::state::WorldState;
use crate::types::{Direction, EnergyKind};

/// Number of catalogue entries per city.
pub const ACTIONS_PER_CITY: usize = 4;

/// Per-city action order within the catalogue.
const CITY_ACTION_ORDER: [(EnergyKind, Direction); ACTIONS_PER_CITY] = [
    (EnergyKind::Renewable, Direction::Add),
    (EnergyKind::Renewable, Direction::Remove),
    (EnergyKind::NonRenewable, Direction::Add),
    (EnergyKind::NonRenewable, Direction::Remove),
];

/// One planning decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Leave everything as is.
    NoOp,
    /// Add or remove one capacity increment of `kind` in city `city`.
    Modify {
        kind: EnergyKind,
        direction: Direction,
        city: usize,
    },
}

impl Action {
    pub fn add(kind: EnergyKind, city: usize) -> Self {
        Action::Modify {
            kind,
            direction: Direction::Add,
            city,
        }
    }

    pub fn remove(kind: EnergyKind, city: usize) -> Self {
        Action::Modify {
            kind,
            direction: Direction::Remove,
            city,
        }
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, Action::NoOp)
    }

    /// Target city, if any.
    pub fn city(&self) -> Option<usize> {
        match self {
            Action::NoOp => None,
            Action::Modify { city, .. } => Some(*city),
        }
    }

    /// Catalogue position for a scenario with `num_cities` cities.
    ///
    /// Returns None for a city index outside the catalogue.
    pub fn catalogue_position(&self, num_cities: usize) -> Option<usize> {
        match *self {
            Action::NoOp => Some(0),
            Action::Modify {
                kind,
                direction,
                city,
            } => {
                if city >= num_cities {
                    return None;
                }
                let offset = CITY_ACTION_ORDER
                    .iter()
                    .position(|&(k, d)| k == kind && d == direction)?;
                Some(1 + city * ACTIONS_PER_CITY + offset)
            }
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::NoOp => write!(f, "noop"),
            Action::Modify {
                kind,
                direction,
                city,
            } => write!(f, "{}_{}@{}", direction.as_str(), kind.as_str(), city),
        }
    }
}

/// Full action catalogue: `1 + 4 * num_cities` entries in fixed order.
pub fn all_actions(cfg: &Config) -> Vec<Action> {
    catalogue(cfg.num_cities())
}

/// Catalogue for an explicit city count.
pub fn catalogue(num_cities: usize) -> Vec<Action> {
    let mut out = Vec::with_capacity(1 + ACTIONS_PER_CITY * num_cities);
    out.push(Action::NoOp);
    for city in 0..num_cities {
        for &(kind, direction) in &CITY_ACTION_ORDER {
            out.push(Action::Modify {
                kind,
                direction,
                city,
            });
        }
    }
    out
}

/// Whether `action` may be taken from `state`.
///
/// - add: budget >= capital cost and supply + increment <= per-city max
/// - remove: supply >= increment
/// - NoOp is always feasible
pub fn is_feasible(cfg: &Config, state: &WorldState, action: &Action) -> bool {
    match *action {
        Action::NoOp => true,
        Action::Modify {
            kind,
            direction,
            city,
        } => {
            let Some(record) = state.city(city) else {
                return false;
            };
            let increment = cfg.supply.increment(kind);
            let supply = record.supply(kind);
            match direction {
                Direction::Add => {
                    state.budget >= cfg.costs.capital(kind, Direction::Add)
                        && supply + increment <= cfg.supply.max_energy_per_city
                }
                Direction::Remove => supply >= increment,
            }
        }
    }
}

/// NoOp plus every feasible action, in catalogue order.
pub fn valid_actions(cfg: &Config, state: &WorldState) -> Vec<Action> {
    catalogue(state.num_cities())
        .into_iter()
        .filter(|a| is_feasible(cfg, state, a))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CityRecord;

    #[test]
    fn catalogue_size_and_order() {
        let cfg = Config::default();
        let actions = all_actions(&cfg);
        assert_eq!(actions.len(), 1 + 4 * cfg.num_cities());
        assert_eq!(actions[0], Action::NoOp);
        assert_eq!(actions[1], Action::add(EnergyKind::Renewable, 0));
        assert_eq!(actions[2], Action::remove(EnergyKind::Renewable, 0));
        assert_eq!(actions[3], Action::add(EnergyKind::NonRenewable, 0));
        assert_eq!(actions[4], Action::remove(EnergyKind::NonRenewable, 0));
        assert_eq!(actions[5], Action::add(EnergyKind::Renewable, 1));
    }

    #[test]
    fn catalogue_position_matches_catalogue() {
        let actions = catalogue(3);
        for (i, a) in actions.iter().enumerate() {
            assert_eq!(a.catalogue_position(3), Some(i));
        }
        assert_eq!(Action::add(EnergyKind::Renewable, 3).catalogue_position(3), None);
    }

    #[test]
    fn valid_actions_are_subset_of_catalogue() {
        let cfg = Config::default();
        let state = WorldState::initial(&cfg).unwrap();
        let all = all_actions(&cfg);
        let valid = valid_actions(&cfg, &state);
        assert_eq!(valid[0], Action::NoOp);
        assert!(valid.iter().all(|a| all.contains(a)));
    }

    #[test]
    fn add_blocked_by_budget() {
        let cfg = Config::default();
        let state = WorldState::initial(&cfg).unwrap().with_budget(149.99);
        assert!(!is_feasible(&cfg, &state, &Action::add(EnergyKind::Renewable, 0)));
        // Non-renewable add costs 100 and is still affordable.
        assert!(is_feasible(&cfg, &state, &Action::add(EnergyKind::NonRenewable, 0)));
    }

    #[test]
    fn add_blocked_by_capacity_ceiling() {
        let cfg = Config::default();
        let state = WorldState::new(
            10_000.0,
            vec![CityRecord::new("a", 10.0, 32.0, 40.0, 1.0, true)],
        );
        // 32 + 8 == 40 is allowed, 40 + 8 is not.
        assert!(is_feasible(&cfg, &state, &Action::add(EnergyKind::Renewable, 0)));
        assert!(!is_feasible(&cfg, &state, &Action::add(EnergyKind::NonRenewable, 0)));
    }

    #[test]
    fn remove_requires_an_installed_increment() {
        let cfg = Config::default();
        let state = WorldState::new(0.0, vec![CityRecord::new("a", 10.0, 7.9, 8.0, 1.0, true)]);
        assert!(!is_feasible(&cfg, &state, &Action::remove(EnergyKind::Renewable, 0)));
        assert!(is_feasible(&cfg, &state, &Action::remove(EnergyKind::NonRenewable, 0)));
    }

    #[test]
    fn out_of_range_city_is_infeasible() {
        let cfg = Config::default();
        let state = WorldState::initial(&cfg).unwrap();
        assert!(!is_feasible(&cfg, &state, &Action::remove(EnergyKind::Renewable, 99)));
    }

    #[test]
    fn display_is_compact() {
        assert_eq!(Action::NoOp.to_string(), "noop");
        assert_eq!(
            Action::remove(EnergyKind::NonRenewable, 2).to_string(),
            "remove_nonrenewable@2"
        );
    }
}
