// src/mdp.rs
//
// Decision-process interface consumed by external solvers.
//
// Grid solvers (value iteration and friends) use states / actions /
// transition / reward / discount / state_index over the enumerated grid.
// Rollout and tree-search solvers use valid_actions / transition / reward /
// is_terminal on live states and never touch the grid.
//
// The grid is built lazily on first use and then shared read-only.

use std::sync::{Arc, OnceLock};

use crate::actions::{self, Action};
use crate::config::{Config, ConfigError};
use crate::grid::StateIndex;
use crate::reward::{self, RewardComponents};
use crate::state::WorldState;
use crate::terminal;
use crate::transition;

/// Finite-action, deterministic decision process.
pub trait DecisionProcess {
    type State;
    type Action;

    /// Enumerated state grid for tabular solvers.
    fn states(&self) -> &[Self::State];
    /// Full action catalogue.
    fn actions(&self) -> &[Self::Action];
    /// Actions admissible from `state`.
    fn valid_actions(&self, state: &Self::State) -> Vec<Self::Action>;
    fn transition(&self, state: &Self::State, action: &Self::Action) -> Self::State;
    fn reward(&self, state: &Self::State, action: &Self::Action) -> f64;
    fn is_terminal(&self, state: &Self::State) -> bool;
    fn discount(&self) -> f64;
    /// Total state lookup (exact match or nearest grid state).
    fn state_index(&self, state: &Self::State) -> usize;
    fn action_index(&self, action: &Self::Action) -> usize;
    fn initial_state(&self) -> Self::State;
}

/// The energy-capacity planning problem for one validated scenario.
#[derive(Debug)]
pub struct EnergyPlanningMdp {
    config: Arc<Config>,
    actions: Vec<Action>,
    initial: WorldState,
    grid: OnceLock<Arc<StateIndex>>,
}

impl EnergyPlanningMdp {
    /// Validate the scenario and build the process. Fails fast on bad config.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        Self::from_shared(Arc::new(config))
    }

    pub fn from_shared(config: Arc<Config>) -> Result<Self, ConfigError> {
        let initial = WorldState::initial(&config)?;
        let actions = actions::all_actions(&config);
        Ok(Self {
            config,
            actions,
            initial,
            grid: OnceLock::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Enumerated grid, built on first call.
    pub fn grid(&self) -> Arc<StateIndex> {
        Arc::clone(
            self.grid
                .get_or_init(|| Arc::new(StateIndex::build(&self.config))),
        )
    }

    /// Reward split into its components (sums to `reward`).
    pub fn decompose_reward(&self, state: &WorldState, action: &Action) -> RewardComponents {
        reward::decompose_reward(&self.config, state, action)
    }
}

impl DecisionProcess for EnergyPlanningMdp {
    type State = WorldState;
    type Action = Action;

    fn states(&self) -> &[WorldState] {
        self.grid
            .get_or_init(|| Arc::new(StateIndex::build(&self.config)))
            .states()
    }

    fn actions(&self) -> &[Action] {
        &self.actions
    }

    fn valid_actions(&self, state: &WorldState) -> Vec<Action> {
        actions::valid_actions(&self.config, state)
    }

    fn transition(&self, state: &WorldState, action: &Action) -> WorldState {
        transition::transition(&self.config, state, action)
    }

    fn reward(&self, state: &WorldState, action: &Action) -> f64 {
        reward::reward(&self.config, state, action)
    }

    fn is_terminal(&self, state: &WorldState) -> bool {
        terminal::is_terminal(&self.config, state)
    }

    fn discount(&self) -> f64 {
        self.config.discount
    }

    fn state_index(&self, state: &WorldState) -> usize {
        self.grid().index_of(state)
    }

    /// Catalogue position; an action outside the catalogue maps to NoOp (0).
    fn action_index(&self, action: &Action) -> usize {
        action
            .catalogue_position(self.config.num_cities())
            .unwrap_or(0)
    }

    fn initial_state(&self) -> WorldState {
        self.initial.clone()
    }
}
