// src/grid.rs
//
// Discretization, state enumeration and state indexing for tabular solvers.
//
// The enumerated grid is a deliberately coarse, lossy covering of the
// continuous state space, not the reachable set:
//   - at most `max_budget_levels` evenly spaced budgets in [min, max],
//   - crossed with the initial city configuration plus single-increment
//     variants (one renewable or one non-renewable `energy_step`) for the
//     first `perturbed_cities` cities only.
//
// States reached by `transition` rarely land on a grid point, so
// `StateIndex::index_of` falls back to nearest-neighbour snapping by summed
// absolute difference over (budget, renewable supplies, non-renewable
// supplies). Tabular results over this grid are an approximation of the
// true dynamics and should be read as such.

use std::collections::HashSet;
use std::sync::Arc;

use crate::config::{Config, GridConfig};
use crate::state::WorldState;
use crate::types::{CityRecord, EnergyKind};

/// Evenly spaced budget levels, inclusive of both bounds.
///
/// Count is `min(max_budget_levels, floor((max - min) / budget_step) + 1)`;
/// a single level sits at `min_budget`.
pub fn budget_levels(grid: &GridConfig) -> Vec<f64> {
    let span = (grid.max_budget - grid.min_budget).max(0.0);
    let cap = grid.max_budget_levels.max(1) as f64;
    // Clamp in f64: a tiny step can push span / step past usize::MAX.
    let n = if grid.budget_step > 0.0 {
        ((span / grid.budget_step).floor() + 1.0).min(cap) as usize
    } else {
        1
    };

    if n == 1 {
        return vec![grid.min_budget];
    }

    (0..n)
        .map(|k| {
            if k == n - 1 {
                grid.max_budget
            } else {
                let level = grid.min_budget + span * (k as f64) / ((n - 1) as f64);
                level.clamp(grid.min_budget, grid.max_budget)
            }
        })
        .collect()
}

/// City configurations covered by the grid: the initial list first, then
/// renewable / non-renewable single-step variants for the leading cities.
///
/// Variants that would push a supply above `max_energy_per_city` are skipped.
pub fn city_configurations(cfg: &Config) -> Vec<Vec<Arc<CityRecord>>> {
    let base: Vec<Arc<CityRecord>> = cfg.cities.iter().cloned().map(Arc::new).collect();
    let step = cfg.grid.energy_step;
    let ceiling = cfg.supply.max_energy_per_city;

    let mut out = vec![base.clone()];
    for i in 0..cfg.grid.perturbed_cities.min(base.len()) {
        for kind in EnergyKind::ALL {
            let bumped = base[i].supply(kind) + step;
            if bumped > ceiling {
                continue;
            }
            let mut variant = base.clone();
            variant[i] = Arc::new(base[i].with_supply(kind, bumped));
            out.push(variant);
        }
    }
    out
}

/// Exact identity key for de-duplication.
fn grid_key(budget: f64, cities: &[Arc<CityRecord>]) -> Vec<u64> {
    let mut key = Vec::with_capacity(1 + 2 * cities.len());
    key.push(budget.to_bits());
    for c in cities {
        key.push(c.renewable_supply.to_bits());
        key.push(c.nonrenewable_supply.to_bits());
    }
    key
}

/// Enumerated, de-duplicated state grid in budget-major order.
pub fn enumerate_states(cfg: &Config) -> Vec<WorldState> {
    let total_demand = cfg.total_demand();
    let levels = budget_levels(&cfg.grid);
    let configs = city_configurations(cfg);

    let mut seen = HashSet::with_capacity(levels.len() * configs.len());
    let mut out = Vec::with_capacity(levels.len() * configs.len());
    for &budget in &levels {
        for cities in &configs {
            if seen.insert(grid_key(budget, cities)) {
                out.push(WorldState {
                    budget,
                    total_demand,
                    cities: cities.clone(),
                });
            }
        }
    }
    out
}

/// Read-only index over an enumerated grid.
///
/// Built once per scenario and shared (`Arc<StateIndex>`) between solver
/// threads; nothing mutates it after construction.
#[derive(Debug, Clone)]
pub struct StateIndex {
    states: Vec<WorldState>,
}

impl StateIndex {
    pub fn build(cfg: &Config) -> Self {
        Self::from_states(enumerate_states(cfg))
    }

    pub fn from_states(states: Vec<WorldState>) -> Self {
        Self { states }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn states(&self) -> &[WorldState] {
        &self.states
    }

    pub fn get(&self, index: usize) -> Option<&WorldState> {
        self.states.get(index)
    }

    /// Index of a grid state equal to `state` within `STATE_EPS`, if any.
    pub fn exact_index_of(&self, state: &WorldState) -> Option<usize> {
        self.states.iter().position(|s| s.approx_eq(state))
    }

    /// Index of the nearest grid state by L1 distance; ties go to the lowest index.
    pub fn nearest_index_of(&self, state: &WorldState) -> usize {
        let mut best = 0;
        let mut best_d = f64::INFINITY;
        for (i, s) in self.states.iter().enumerate() {
            let d = s.l1_distance(state);
            if d < best_d {
                best_d = d;
                best = i;
            }
        }
        best
    }

    /// Total lookup: exact match if one exists, otherwise the nearest state.
    pub fn index_of(&self, state: &WorldState) -> usize {
        self.exact_index_of(state)
            .unwrap_or_else(|| self.nearest_index_of(state))
    }
}
