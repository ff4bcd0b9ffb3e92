// src/rl/runner.rs
//
// Episode runner.
//
// One episode:
//   s <- initial state
//   repeat up to max_steps:
//     a  <- policy.select(cfg, s)
//     s' <- transition(cfg, s, a)
//     r  <- reward(cfg, s', a)          (scored on the post-transition state)
//     stop if s' is terminal
//
// The runner is deterministic given (config, policy, seed): the only
// randomness lives in policies, and they are reseeded from `EpisodeConfig`.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::logging::{EventSink, StepRecord};
use crate::reward::{decompose_reward, RewardComponents};
use crate::state::WorldState;
use crate::terminal::{termination_reason, TerminationReason};
use crate::transition::transition;

use super::policy::Policy;

/// Configuration for a single episode.
#[derive(Debug, Clone)]
pub struct EpisodeConfig {
    /// Seed handed to `Policy::reset_episode`.
    pub seed: u64,
    /// Episode ID for logging.
    pub episode_id: u64,
    /// Step bound; the episode ends with `MaxSteps` when reached.
    pub max_steps: u64,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            episode_id: 0,
            max_steps: 50,
        }
    }
}

impl EpisodeConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_episode_id(mut self, episode_id: u64) -> Self {
        self.episode_id = episode_id;
        self
    }

    pub fn with_max_steps(mut self, max_steps: u64) -> Self {
        self.max_steps = max_steps;
        self
    }
}

/// Summary of a completed episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    pub episode_id: u64,
    pub seed: u64,
    pub policy: String,
    pub termination_reason: TerminationReason,
    /// Steps actually taken.
    pub steps: u64,
    /// Undiscounted sum of step rewards.
    pub total_reward: f64,
    /// Sum of gamma^t * r_t, t starting at 0.
    pub discounted_reward: f64,
    /// Undiscounted per-component sums; `components.total()` == `total_reward`
    /// up to rounding.
    pub components: RewardComponents,
    pub final_budget: f64,
    pub final_unserved_cities: usize,
    /// Number of NoOp steps.
    pub noop_steps: u64,
}

/// Roll out one episode of `policy` on `cfg`.
///
/// `cfg` is assumed validated (see `Config::validate`).
pub fn run_episode(
    cfg: &Config,
    policy: &mut dyn Policy,
    episode: &EpisodeConfig,
    sink: &mut dyn EventSink,
) -> EpisodeSummary {
    policy.reset_episode(episode.seed);

    let mut state = WorldState::new(cfg.initial_budget, cfg.cities.clone());
    let mut total_reward = 0.0;
    let mut discounted_reward = 0.0;
    let mut discount_factor = 1.0;
    let mut components = RewardComponents::default();
    let mut steps: u64 = 0;
    let mut noop_steps: u64 = 0;

    let mut reason = termination_reason(cfg, &state);

    while reason.is_none() && steps < episode.max_steps {
        let action = policy.select(cfg, &state);
        let next = transition(cfg, &state, &action);
        let parts = decompose_reward(cfg, &next, &action);
        let r = parts.total();

        steps += 1;
        if action.is_noop() {
            noop_steps += 1;
        }
        total_reward += r;
        discounted_reward += discount_factor * r;
        discount_factor *= cfg.discount;
        components.accumulate(&parts, 1.0);

        reason = termination_reason(cfg, &next);

        sink.log_step(&StepRecord {
            episode_id: episode.episode_id,
            seed: episode.seed,
            step: steps,
            policy: policy.name().to_string(),
            action,
            reward: r,
            components: parts,
            budget: next.budget,
            unserved_cities: next.unserved_cities(),
            termination: reason.or(if steps >= episode.max_steps {
                Some(TerminationReason::MaxSteps)
            } else {
                None
            }),
        });

        state = next;
    }
    sink.flush();

    EpisodeSummary {
        episode_id: episode.episode_id,
        seed: episode.seed,
        policy: policy.name().to_string(),
        termination_reason: reason.unwrap_or(TerminationReason::MaxSteps),
        steps,
        total_reward,
        discounted_reward,
        components,
        final_budget: state.budget,
        final_unserved_cities: state.unserved_cities(),
        noop_steps,
    }
}
