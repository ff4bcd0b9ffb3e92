// src/rl/evaluate.rs
//
// Monte Carlo policy evaluation.
//
// Replicate k uses seed `base_seed + k` for both the policy RNG and (when
// randomization is on) the scenario sampler. Replicates may run on worker
// threads of a rayon pool; results come back in replicate order, so the
// summary is identical for any thread count.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{Config, ConfigError};
use crate::logging::NoopSink;
use crate::metrics::{OnlineStats, StatSummary};
use crate::scenario::{scenario_for_seed, ScenarioRandConfig};

use super::policy::PolicyKind;
use super::runner::{run_episode, EpisodeConfig, EpisodeSummary};

/// Batch evaluation settings.
#[derive(Debug, Clone)]
pub struct EvalConfig {
    pub runs: u64,
    pub max_steps: u64,
    pub base_seed: u64,
    /// Draw a fresh scenario per replicate when set.
    pub randomize: Option<ScenarioRandConfig>,
    /// Worker threads; 0 or 1 runs inline.
    pub threads: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            runs: 100,
            max_steps: 50,
            base_seed: 42,
            randomize: None,
            threads: 1,
        }
    }
}

/// Aggregated results for one policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyEvaluation {
    pub policy: String,
    pub runs: u64,
    pub total_reward: StatSummary,
    pub discounted_reward: StatSummary,
    pub budget_component: StatSummary,
    pub equity_component: StatSummary,
    pub renewable_component: StatSummary,
    pub steps: StatSummary,
    pub final_budget: StatSummary,
    pub final_unserved_cities: StatSummary,
    /// Episode count per termination reason (`as_str` keys).
    pub terminations: BTreeMap<String, u64>,
}

impl PolicyEvaluation {
    /// Fold replicate summaries, in the order given.
    pub fn from_episodes(policy: &str, episodes: &[EpisodeSummary]) -> Self {
        let mut total = OnlineStats::default();
        let mut discounted = OnlineStats::default();
        let mut budget = OnlineStats::default();
        let mut equity = OnlineStats::default();
        let mut renewable = OnlineStats::default();
        let mut steps = OnlineStats::default();
        let mut final_budget = OnlineStats::default();
        let mut unserved = OnlineStats::default();
        let mut terminations = BTreeMap::new();

        for ep in episodes {
            total.add(ep.total_reward);
            discounted.add(ep.discounted_reward);
            budget.add(ep.components.budget);
            equity.add(ep.components.equity_penalty);
            renewable.add(ep.components.renewable_bonus);
            steps.add(ep.steps as f64);
            final_budget.add(ep.final_budget);
            unserved.add(ep.final_unserved_cities as f64);
            *terminations
                .entry(ep.termination_reason.as_str().to_string())
                .or_insert(0) += 1;
        }

        Self {
            policy: policy.to_string(),
            runs: episodes.len() as u64,
            total_reward: total.summary(),
            discounted_reward: discounted.summary(),
            budget_component: budget.summary(),
            equity_component: equity.summary(),
            renewable_component: renewable.summary(),
            steps: steps.summary(),
            final_budget: final_budget.summary(),
            final_unserved_cities: unserved.summary(),
            terminations,
        }
    }
}

/// Run replicate `k`.
fn run_replicate(
    base: &Config,
    kind: PolicyKind,
    eval: &EvalConfig,
    k: u64,
) -> Result<EpisodeSummary, ConfigError> {
    let seed = eval.base_seed.wrapping_add(k);
    let cfg = scenario_for_seed(base, eval.randomize.as_ref(), seed)?;
    let mut policy = kind.build();
    let episode = EpisodeConfig {
        seed,
        episode_id: k,
        max_steps: eval.max_steps,
    };
    Ok(run_episode(&cfg, policy.as_mut(), &episode, &mut NoopSink))
}

/// All replicate summaries, in replicate order.
pub fn run_replicates(
    base: &Config,
    kind: PolicyKind,
    eval: &EvalConfig,
) -> Result<Vec<EpisodeSummary>, ConfigError> {
    let threads = eval.threads.max(1).min(eval.runs.max(1) as usize);

    if threads == 1 {
        return (0..eval.runs)
            .map(|k| run_replicate(base, kind, eval, k))
            .collect();
    }

    let pool = match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("[eval] WARN: could not build {threads}-thread pool ({e}); running inline");
            return (0..eval.runs)
                .map(|k| run_replicate(base, kind, eval, k))
                .collect();
        }
    };

    // Indexed parallel iterators collect in input order.
    pool.install(|| {
        (0..eval.runs as usize)
            .into_par_iter()
            .map(|k| run_replicate(base, kind, eval, k as u64))
            .collect()
    })
}

/// Evaluate `kind` over `eval.runs` replicates.
pub fn evaluate_policy(
    base: &Config,
    kind: PolicyKind,
    eval: &EvalConfig,
) -> Result<PolicyEvaluation, ConfigError> {
    let episodes = run_replicates(base, kind, eval)?;
    Ok(PolicyEvaluation::from_episodes(kind.as_str(), &episodes))
}
