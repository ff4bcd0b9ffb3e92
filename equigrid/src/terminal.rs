// src/terminal.rs
//
// Terminal test. An episode ends when the budget is strictly negative or
// every city's demand is covered. A budget of exactly zero is NOT terminal.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::state::WorldState;

/// Why an episode stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// Budget dropped below zero.
    BudgetExhausted,
    /// Every city has renewable + non-renewable >= demand.
    AllDemandMet,
    /// Caller's step bound reached first.
    MaxSteps,
}

impl TerminationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminationReason::BudgetExhausted => "budget_exhausted",
            TerminationReason::AllDemandMet => "all_demand_met",
            TerminationReason::MaxSteps => "max_steps",
        }
    }
}

/// Which terminal condition holds, if any. Budget exhaustion wins when both do.
pub fn termination_reason(_cfg: &Config, state: &WorldState) -> Option<TerminationReason> {
    if state.budget < 0.0 {
        Some(TerminationReason::BudgetExhausted)
    } else if state.all_served() {
        Some(TerminationReason::AllDemandMet)
    } else {
        None
    }
}

pub fn is_terminal(cfg: &Config, state: &WorldState) -> bool {
    termination_reason(cfg, state).is_some()
}
