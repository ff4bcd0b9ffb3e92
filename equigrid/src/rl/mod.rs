// src/rl/mod.rs
//
// Policy rollouts on top of the planning decision process.
//
// Key components:
// - Policy:          trait for choosing an action from (config, state)
// - PolicyKind:      name-based selector used by the CLI
// - run_episode:     single deterministic rollout with per-step telemetry
// - evaluate_policy: Monte Carlo batch over seeds, optionally multi-threaded
//
// These are baselines and diagnostics for solver work, not solvers.

pub mod evaluate;
pub mod policy;
pub mod runner;

pub use evaluate::{evaluate_policy, run_replicates, EvalConfig, PolicyEvaluation};
pub use policy::{
    EquityFirstPolicy, GreedyPolicy, LookaheadPolicy, NoopPolicy, Policy, PolicyKind,
    PriorityPolicy, RandomPolicy,
};
pub use runner::{run_episode, EpisodeConfig, EpisodeSummary};
