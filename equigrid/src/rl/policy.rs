// src/rl/policy.rs
//
// Policy interface and baseline heuristic policies.
//
// A policy maps (config, state) to one action. Every policy only chooses
// among `valid_actions(cfg, state)`, so it can never propose an infeasible
// move. The config is passed on every call; policies hold no scenario data.
//
// Implementations:
// - NoopPolicy:        always NoOp (do-nothing baseline)
// - RandomPolicy:      uniform over valid actions, ChaCha8 per episode seed
// - GreedyPolicy:      best one-step reward
// - EquityFirstPolicy: serve unmet low-income cities first
// - PriorityPolicy:    population-weighted unmet-demand score
// - LookaheadPolicy:   exhaustive discounted lookahead to a fixed depth

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::actions::{valid_actions, Action};
use crate::config::Config;
use crate::reward::reward;
use crate::state::WorldState;
use crate::terminal::is_terminal;
use crate::transition::transition;
use crate::types::{CityRecord, EnergyKind};

/// Decision-making interface for episode rollouts.
pub trait Policy: Send {
    /// Short stable name used in logs and output files.
    fn name(&self) -> &str;

    /// Reset per-episode state. The seed makes stochastic policies repeatable.
    fn reset_episode(&mut self, seed: u64);

    /// Choose an action for `state`. Must return a member of
    /// `valid_actions(cfg, state)`.
    fn select(&mut self, cfg: &Config, state: &WorldState) -> Action;
}

/// Post-transition reward of every valid action, in catalogue order.
fn scored_actions(cfg: &Config, state: &WorldState) -> Vec<(Action, f64)> {
    valid_actions(cfg, state)
        .into_iter()
        .map(|a| {
            let next = transition(cfg, state, &a);
            (a, reward(cfg, &next, &a))
        })
        .collect()
}

/// First action with the strictly highest score; NoOp if the list is empty.
fn argmax(scored: &[(Action, f64)]) -> Action {
    let mut best = Action::NoOp;
    let mut best_score = f64::NEG_INFINITY;
    for &(a, score) in scored {
        if score > best_score {
            best = a;
            best_score = score;
        }
    }
    best
}

/// Capacity addition for `city`, renewable first, if either is feasible.
fn add_capacity(valid: &[Action], city: usize) -> Option<Action> {
    [EnergyKind::Renewable, EnergyKind::NonRenewable]
        .into_iter()
        .map(|kind| Action::add(kind, city))
        .find(|a| valid.contains(a))
}

// ---------------------------------------------------------------------------

/// Always NoOp.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPolicy;

impl Policy for NoopPolicy {
    fn name(&self) -> &str {
        "noop"
    }

    fn reset_episode(&mut self, _seed: u64) {}

    fn select(&mut self, _cfg: &Config, _state: &WorldState) -> Action {
        Action::NoOp
    }
}

/// Uniformly random valid action.
pub struct RandomPolicy {
    rng: ChaCha8Rng,
}

impl RandomPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomPolicy {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Policy for RandomPolicy {
    fn name(&self) -> &str {
        "random"
    }

    fn reset_episode(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    fn select(&mut self, cfg: &Config, state: &WorldState) -> Action {
        valid_actions(cfg, state)
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(Action::NoOp)
    }
}

/// Best immediate reward; ties go to the earlier catalogue entry.
#[derive(Debug, Default, Clone, Copy)]
pub struct GreedyPolicy;

impl Policy for GreedyPolicy {
    fn name(&self) -> &str {
        "greedy"
    }

    fn reset_episode(&mut self, _seed: u64) {}

    fn select(&mut self, cfg: &Config, state: &WorldState) -> Action {
        argmax(&scored_actions(cfg, state))
    }
}

/// Serve the most populous unmet low-income city, then fall back to greedy.
///
/// Capacity is added as renewable when affordable, otherwise non-renewable.
#[derive(Debug, Default, Clone, Copy)]
pub struct EquityFirstPolicy;

impl Policy for EquityFirstPolicy {
    fn name(&self) -> &str {
        "equity_first"
    }

    fn reset_episode(&mut self, _seed: u64) {}

    fn select(&mut self, cfg: &Config, state: &WorldState) -> Action {
        let valid = valid_actions(cfg, state);

        let mut targets: Vec<(usize, &CityRecord)> = state
            .cities
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_high_income && !c.is_served())
            .map(|(i, c)| (i, &**c))
            .collect();
        // Stable sort keeps catalogue order among equal populations.
        targets.sort_by(|a, b| b.1.population.total_cmp(&a.1.population));

        for (i, _) in targets {
            if let Some(a) = add_capacity(&valid, i) {
                return a;
            }
        }
        GreedyPolicy.select(cfg, state)
    }
}

/// Score unmet cities by `population * unmet_demand`, boosted for low-income
/// cities, and add capacity to the best one. NoOp when nothing is unmet.
#[derive(Debug, Clone, Copy)]
pub struct PriorityPolicy {
    /// Multiplier applied to low-income city scores.
    pub low_income_boost: f64,
}

impl Default for PriorityPolicy {
    fn default() -> Self {
        Self {
            low_income_boost: 2.0,
        }
    }
}

impl PriorityPolicy {
    fn score(&self, city: &CityRecord) -> f64 {
        let base = city.population * city.unmet_demand();
        if city.is_high_income {
            base
        } else {
            base * self.low_income_boost
        }
    }
}

impl Policy for PriorityPolicy {
    fn name(&self) -> &str {
        "priority"
    }

    fn reset_episode(&mut self, _seed: u64) {}

    fn select(&mut self, cfg: &Config, state: &WorldState) -> Action {
        let valid = valid_actions(cfg, state);

        let mut ranked: Vec<(usize, f64)> = state
            .cities
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_served())
            .map(|(i, c)| (i, self.score(c)))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        ranked
            .into_iter()
            .find_map(|(i, _)| add_capacity(&valid, i))
            .unwrap_or(Action::NoOp)
    }
}

/// Exhaustive depth-limited lookahead.
///
/// Value of a path is the discounted sum of post-transition rewards; terminal
/// states stop the recursion. Branching is `|valid_actions|` per level, so
/// keep `depth` small (2 or 3 for a handful of cities).
#[derive(Debug, Clone, Copy)]
pub struct LookaheadPolicy {
    depth: usize,
}

impl Default for LookaheadPolicy {
    fn default() -> Self {
        Self { depth: 2 }
    }
}

impl LookaheadPolicy {
    pub fn new(depth: usize) -> Self {
        Self {
            depth: depth.max(1),
        }
    }

    fn value(&self, cfg: &Config, state: &WorldState, depth: usize) -> f64 {
        if depth == 0 || is_terminal(cfg, state) {
            return 0.0;
        }
        valid_actions(cfg, state)
            .iter()
            .map(|a| {
                let next = transition(cfg, state, a);
                reward(cfg, &next, a)
                    + cfg.discount * self.value(cfg, &next, depth.saturating_sub(1))
            })
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

impl Policy for LookaheadPolicy {
    fn name(&self) -> &str {
        "lookahead"
    }

    fn reset_episode(&mut self, _seed: u64) {}

    fn select(&mut self, cfg: &Config, state: &WorldState) -> Action {
        let scored: Vec<(Action, f64)> = valid_actions(cfg, state)
            .into_iter()
            .map(|a| {
                let next = transition(cfg, state, &a);
                let v = reward(cfg, &next, &a)
                    + cfg.discount * self.value(cfg, &next, self.depth.saturating_sub(1));
                (a, v)
            })
            .collect();
        argmax(&scored)
    }
}

// ---------------------------------------------------------------------------

/// Policy selector for the CLI and batch evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyKind {
    Noop,
    Random,
    Greedy,
    EquityFirst,
    Priority,
    Lookahead,
}

impl PolicyKind {
    pub const ALL: [PolicyKind; 6] = [
        PolicyKind::Noop,
        PolicyKind::Random,
        PolicyKind::Greedy,
        PolicyKind::EquityFirst,
        PolicyKind::Priority,
        PolicyKind::Lookahead,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyKind::Noop => "noop",
            PolicyKind::Random => "random",
            PolicyKind::Greedy => "greedy",
            PolicyKind::EquityFirst => "equity_first",
            PolicyKind::Priority => "priority",
            PolicyKind::Lookahead => "lookahead",
        }
    }

    pub fn parse(s: &str) -> Option<PolicyKind> {
        match s.trim().to_ascii_lowercase().as_str() {
            "noop" | "none" => Some(PolicyKind::Noop),
            "random" | "rand" => Some(PolicyKind::Random),
            "greedy" => Some(PolicyKind::Greedy),
            "equity_first" | "equity-first" | "equity" => Some(PolicyKind::EquityFirst),
            "priority" => Some(PolicyKind::Priority),
            "lookahead" | "look_ahead" => Some(PolicyKind::Lookahead),
            _ => None,
        }
    }

    pub fn build(&self) -> Box<dyn Policy> {
        match self {
            PolicyKind::Noop => Box::new(NoopPolicy),
            PolicyKind::Random => Box::<RandomPolicy>::default(),
            PolicyKind::Greedy => Box::new(GreedyPolicy),
            PolicyKind::EquityFirst => Box::new(EquityFirstPolicy),
            PolicyKind::Priority => Box::<PriorityPolicy>::default(),
            PolicyKind::Lookahead => Box::<LookaheadPolicy>::default(),
        }
    }
}

impl std::fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PolicyKind::parse(s).ok_or_else(|| {
            let names: Vec<_> = PolicyKind::ALL.iter().map(|k| k.as_str()).collect();
            format!("unknown policy '{s}' (expected one of: {})", names.join(", "))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> (Config, WorldState) {
        let cfg = Config::default();
        let s = WorldState::initial(&cfg).unwrap();
        (cfg, s)
    }

    #[test]
    fn every_policy_picks_valid_actions() {
        let cfg = Config::default();
        for kind in PolicyKind::ALL {
            let mut policy = kind.build();
            policy.reset_episode(5);
            let mut s = WorldState::initial(&cfg).unwrap();
            for _ in 0..6 {
                if is_terminal(&cfg, &s) {
                    break;
                }
                let a = policy.select(&cfg, &s);
                assert!(
                    valid_actions(&cfg, &s).contains(&a),
                    "{} chose invalid {a}",
                    policy.name()
                );
                s = transition(&cfg, &s, &a);
            }
        }
    }

    #[test]
    fn random_policy_repeats_under_same_seed() {
        let (cfg, s) = start();
        let mut a = RandomPolicy::new(0);
        let mut b = RandomPolicy::new(0);
        a.reset_episode(11);
        b.reset_episode(11);
        let xs: Vec<_> = (0..20).map(|_| a.select(&cfg, &s)).collect();
        let ys: Vec<_> = (0..20).map(|_| b.select(&cfg, &s)).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn greedy_matches_best_one_step_reward() {
        let (cfg, s) = start();
        let chosen = GreedyPolicy.select(&cfg, &s);
        let best = scored_actions(&cfg, &s)
            .into_iter()
            .map(|(_, r)| r)
            .fold(f64::NEG_INFINITY, f64::max);
        let got = reward(&cfg, &transition(&cfg, &s, &chosen), &chosen);
        assert_eq!(got, best);
    }

    #[test]
    fn equity_first_targets_largest_unmet_low_income_city() {
        let (cfg, s) = start();
        // eastgate (index 2) is the most populous unmet low-income city.
        assert_eq!(
            EquityFirstPolicy.select(&cfg, &s),
            Action::add(EnergyKind::Renewable, 2)
        );
    }

    #[test]
    fn equity_first_falls_back_to_nonrenewable_when_renewable_unaffordable() {
        let (cfg, s) = start();
        let poor = s.with_budget(cfg.costs.add_nonrenewable);
        assert_eq!(
            EquityFirstPolicy.select(&cfg, &poor),
            Action::add(EnergyKind::NonRenewable, 2)
        );
    }

    #[test]
    fn priority_is_noop_when_everything_served() {
        let cfg = Config::default();
        let served = WorldState::new(
            500.0,
            vec![
                CityRecord::new("a", 5.0, 8.0, 0.0, 10.0, false),
                CityRecord::new("b", 5.0, 0.0, 8.0, 10.0, true),
            ],
        );
        let mut p = PriorityPolicy::default();
        assert_eq!(p.select(&cfg, &served), Action::NoOp);
    }

    #[test]
    fn lookahead_depth_one_equals_greedy() {
        let (cfg, s) = start();
        let mut look = LookaheadPolicy::new(1);
        assert_eq!(look.select(&cfg, &s), GreedyPolicy.select(&cfg, &s));
    }

    #[test]
    fn zero_depth_lookahead_degrades_to_greedy() {
        let (cfg, s) = start();
        let mut look = LookaheadPolicy { depth: 0 };
        assert_eq!(look.select(&cfg, &s), GreedyPolicy.select(&cfg, &s));
        assert_eq!(LookaheadPolicy::new(0).depth, 1);
    }

    #[test]
    fn policy_kind_names_round_trip() {
        for kind in PolicyKind::ALL {
            assert_eq!(PolicyKind::parse(kind.as_str()), Some(kind));
            assert_eq!(kind.build().name(), kind.as_str());
        }
        assert!("bogus".parse::<PolicyKind>().is_err());
    }
}
