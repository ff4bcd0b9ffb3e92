//! equigrid core library.
//!
//! A sequential decision model for energy-capacity planning across a set of
//! cities. An agent with a finite budget adds or removes renewable and
//! non-renewable capacity one increment at a time, trading off money,
//! service to low-income populations, and renewable coverage.
//!
//! # Layout
//!
//! - **Model** (`types`, `state`, `actions`, `transition`, `reward`,
//!   `terminal`): pure, deterministic functions over immutable values.
//!   No I/O.
//!
//! - **Decision process** (`mdp`): the `DecisionProcess` trait and
//!   `EnergyPlanningMdp`, the interface external solvers consume.
//!
//! - **Grid** (`grid`): coarse state enumeration and nearest-neighbour
//!   indexing for tabular solvers.
//!
//! - **Scenarios** (`config`, `scenario`): the fixed default scenario, reward
//!   profiles, env overrides, YAML loading, and seeded randomization.
//!
//! - **Rollouts** (`rl`, `logging`, `metrics`): baseline policies, the
//!   episode runner, Monte Carlo evaluation, and per-step telemetry sinks.

pub mod actions;
pub mod config;
pub mod grid;
pub mod logging;
pub mod mdp;
pub mod metrics;
pub mod reward;
pub mod rl;
pub mod scenario;
pub mod state;
pub mod terminal;
pub mod transition;
pub mod types;

pub use actions::{all_actions, is_feasible, valid_actions, Action};
pub use config::{
    resolve_effective_profile, Config, ConfigError, CostConfig, EffectiveProfile, GridConfig,
    ProfileSource, RewardProfile, SupplyConfig,
};
pub use grid::{enumerate_states, StateIndex};
pub use logging::{EventSink, JsonlSink, MemorySink, NoopSink, StepRecord};
pub use mdp::{DecisionProcess, EnergyPlanningMdp};
pub use metrics::{OnlineStats, StatSummary};
pub use reward::{decompose_reward, reward, BudgetRewardMode, RewardComponents, RewardWeights};
pub use scenario::{scenario_for_seed, ScenarioRandConfig, ScenarioSampler};
pub use state::WorldState;
pub use terminal::{is_terminal, termination_reason, TerminationReason};
pub use transition::transition;
pub use types::{CityRecord, Direction, EnergyKind};
