// src/config.rs
//
// Scenario parameters for the equigrid planning model.
//
// `Config::default()` is the fixed literal scenario (four cities, mixed
// income, modest initial renewable build-out). Everything the transition,
// reward and enumerator need lives here: capital and operating costs,
// supply increments, reward weights, discount and grid constants.
//
// Config is validated once, when a scenario is built or loaded. Nothing in
// the simulation path re-checks it.

use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::reward::{BudgetRewardMode, RewardWeights};
use crate::types::{CityRecord, Direction, EnergyKind};

/// Full scenario parameterisation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Human-readable scenario name (logged, carried into summaries).
    pub name: String,
    /// Budget at the start of every episode.
    pub initial_budget: f64,
    /// Initial city list. Position is identity: actions address cities by index.
    pub cities: Vec<CityRecord>,
    pub costs: CostConfig,
    pub supply: SupplyConfig,
    pub reward: RewardWeights,
    /// Discount factor in (0, 1].
    pub discount: f64,
    /// Discretization constants, only read by the state enumerator.
    pub grid: GridConfig,
}

/// Capital (one-off) and operating (per-epoch, per-unit) costs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostConfig {
    pub add_renewable: f64,
    pub remove_renewable: f64,
    pub add_nonrenewable: f64,
    pub remove_nonrenewable: f64,
    /// Per-city operating cost per unit of installed renewable supply.
    pub operating_renewable: Vec<f64>,
    /// Per-city operating cost per unit of installed non-renewable supply.
    pub operating_nonrenewable: Vec<f64>,
}

impl CostConfig {
    /// Capital cost of one add/remove action for a given energy kind.
    ///
    /// For removals this is the amount credited back to the budget.
    pub fn capital(&self, kind: EnergyKind, direction: Direction) -> f64 {
        match (kind, direction) {
            (EnergyKind::Renewable, Direction::Add) => self.add_renewable,
            (EnergyKind::Renewable, Direction::Remove) => self.remove_renewable,
            (EnergyKind::NonRenewable, Direction::Add) => self.add_nonrenewable,
            (EnergyKind::NonRenewable, Direction::Remove) => self.remove_nonrenewable,
        }
    }

    pub fn operating(&self, kind: EnergyKind) -> &[f64] {
        match kind {
            EnergyKind::Renewable => &self.operating_renewable,
            EnergyKind::NonRenewable => &self.operating_nonrenewable,
        }
    }
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            add_renewable: 150.0,
            remove_renewable: 50.0,
            add_nonrenewable: 100.0,
            remove_nonrenewable: 30.0,
            operating_renewable: vec![0.01; 4],
            operating_nonrenewable: vec![0.02; 4],
        }
    }
}

/// Capacity granularity and per-city ceiling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupplyConfig {
    /// Units of renewable supply installed/removed by one action.
    pub renewable_increment: f64,
    /// Units of non-renewable supply installed/removed by one action.
    pub nonrenewable_increment: f64,
    /// Ceiling for each supply kind in any one city.
    pub max_energy_per_city: f64,
}

impl SupplyConfig {
    #[inline]
    pub fn increment(&self, kind: EnergyKind) -> f64 {
        match kind {
            EnergyKind::Renewable => self.renewable_increment,
            EnergyKind::NonRenewable => self.nonrenewable_increment,
        }
    }
}

impl Default for SupplyConfig {
    fn default() -> Self {
        Self {
            renewable_increment: 8.0,
            nonrenewable_increment: 8.0,
            max_energy_per_city: 40.0,
        }
    }
}

/// Discretization constants for the enumerated state grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Nominal spacing between budget levels.
    pub budget_step: f64,
    /// Supply perturbation applied to a city in a grid variant.
    pub energy_step: f64,
    pub min_budget: f64,
    pub max_budget: f64,
    /// Hard cap on the number of budget levels.
    pub max_budget_levels: usize,
    /// How many leading cities get single-perturbation variants.
    pub perturbed_cities: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            budget_step: 100.0,
            energy_step: 8.0,
            min_budget: 0.0,
            max_budget: 1000.0,
            max_budget_levels: 10,
            perturbed_cities: 3,
        }
    }
}

/// Reward-weight preset used by the CLI / evaluation harness.
///
/// Presets only change reward weights; costs, cities and grid stay at the
/// scenario's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardProfile {
    Balanced,
    EquityFirst,
    Renewable,
}

impl RewardProfile {
    /// Stable lowercase name (used in logs and summaries).
    pub fn as_str(&self) -> &'static str {
        match self {
            RewardProfile::Balanced => "balanced",
            RewardProfile::EquityFirst => "equity_first",
            RewardProfile::Renewable => "renewable",
        }
    }

    /// Parse a profile name (case-insensitive). Returns None if unrecognized.
    pub fn parse(s: &str) -> Option<RewardProfile> {
        match s.trim().to_ascii_lowercase().as_str() {
            "balanced" | "bal" | "b" => Some(RewardProfile::Balanced),
            "equity_first" | "equity-first" | "equity" | "eq" | "e" => {
                Some(RewardProfile::EquityFirst)
            }
            "renewable" | "green" | "re" | "r" => Some(RewardProfile::Renewable),
            _ => None,
        }
    }
}

/// Where the effective reward profile came from.
///
/// Precedence (highest to lowest): CLI, `EQUIGRID_REWARD_PROFILE`, default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileSource {
    Cli,
    Env,
    Default,
}

impl ProfileSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileSource::Cli => "cli",
            ProfileSource::Env => "env",
            ProfileSource::Default => "default",
        }
    }
}

/// Resolved profile with its source for logging.
#[derive(Debug, Clone, Copy)]
pub struct EffectiveProfile {
    pub profile: RewardProfile,
    pub source: ProfileSource,
}

impl EffectiveProfile {
    /// Format: `effective_reward_profile=<profile> source=<source>`
    pub fn log_startup(&self) {
        eprintln!(
            "effective_reward_profile={} source={}",
            self.profile.as_str(),
            self.source.as_str()
        );
    }
}

/// Resolve the effective reward profile: CLI, then env, then Balanced.
pub fn resolve_effective_profile(cli_profile: Option<RewardProfile>) -> EffectiveProfile {
    if let Some(p) = cli_profile {
        return EffectiveProfile {
            profile: p,
            source: ProfileSource::Cli,
        };
    }

    if let Ok(env_val) = env::var("EQUIGRID_REWARD_PROFILE") {
        if !env_val.is_empty() {
            if let Some(p) = RewardProfile::parse(&env_val) {
                return EffectiveProfile {
                    profile: p,
                    source: ProfileSource::Env,
                };
            }
            eprintln!(
                "[config] WARN: invalid EQUIGRID_REWARD_PROFILE={:?}; ignoring",
                env_val
            );
        }
    }

    EffectiveProfile {
        profile: RewardProfile::Balanced,
        source: ProfileSource::Default,
    }
}

/// Errors raised while building or loading a scenario.
///
/// These are initialization-time failures only; the simulation path never
/// produces them.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Io { path: String, source: String },
    Parse { source: String },
    NoCities,
    NonPositiveDemand { city: String, demand: f64 },
    NonPositivePopulation { city: String, population: f64 },
    MissingOperatingCost { kind: EnergyKind, expected: usize, found: usize },
    InvalidField { field: String, message: String },
    /// Every city is in one income class; `high_income` names the missing one.
    MissingIncomeClass { high_income: bool },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "Failed to read scenario file '{}': {}", path, source)
            }
            ConfigError::Parse { source } => {
                write!(f, "Failed to parse scenario YAML: {}", source)
            }
            ConfigError::NoCities => write!(f, "Scenario has no cities"),
            ConfigError::NonPositiveDemand { city, demand } => {
                write!(f, "City '{}' has non-positive demand {}", city, demand)
            }
            ConfigError::NonPositivePopulation { city, population } => {
                write!(
                    f,
                    "City '{}' has non-positive population {}",
                    city, population
                )
            }
            ConfigError::MissingOperatingCost {
                kind,
                expected,
                found,
            } => write!(
                f,
                "Expected {} {} operating-cost entries (one per city), found {}",
                expected,
                kind.as_str(),
                found
            ),
            ConfigError::InvalidField { field, message } => {
                write!(f, "Scenario validation error in '{}': {}", field, message)
            }
            ConfigError::MissingIncomeClass { high_income } => write!(
                f,
                "Scenario needs at least one {} city",
                if *high_income { "high-income" } else { "low-income" }
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidField {
        field: field.to_string(),
        message: message.into(),
    }
}

impl Default for Config {
    fn default() -> Self {
        let cities = vec![
            CityRecord::new("northfield", 10.0, 0.0, 8.0, 50_000.0, true),
            CityRecord::new("riverside", 12.0, 0.0, 8.0, 80_000.0, false),
            CityRecord::new("eastgate", 15.0, 4.0, 6.0, 120_000.0, false),
            CityRecord::new("hillcrest", 8.0, 2.0, 6.0, 30_000.0, true),
        ];

        Self {
            name: "default".to_string(),
            initial_budget: 1000.0,
            cities,
            costs: CostConfig::default(),
            supply: SupplyConfig::default(),
            reward: RewardWeights::default(),
            discount: 0.95,
            grid: GridConfig::default(),
        }
    }
}

impl Config {
    pub fn num_cities(&self) -> usize {
        self.cities.len()
    }

    /// Sum of configured city demands.
    pub fn total_demand(&self) -> f64 {
        self.cities.iter().map(|c| c.demand).sum()
    }

    /// Check every initialization-time invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let n = self.cities.len();
        if n == 0 {
            return Err(ConfigError::NoCities);
        }

        for kind in EnergyKind::ALL {
            let found = self.costs.operating(kind).len();
            if found != n {
                return Err(ConfigError::MissingOperatingCost {
                    kind,
                    expected: n,
                    found,
                });
            }
            if self.costs.operating(kind).iter().any(|c| !c.is_finite()) {
                return Err(invalid(
                    &format!("costs.operating_{}", kind.as_str()),
                    "operating costs must be finite",
                ));
            }
        }

        let max_energy = self.supply.max_energy_per_city;
        if !(max_energy > 0.0) {
            return Err(invalid(
                "supply.max_energy_per_city",
                "must be > 0",
            ));
        }
        for kind in EnergyKind::ALL {
            if !(self.supply.increment(kind) > 0.0) {
                return Err(invalid(
                    &format!("supply.{}_increment", kind.as_str()),
                    "must be > 0",
                ));
            }
        }

        for city in &self.cities {
            if !(city.demand > 0.0) || !city.demand.is_finite() {
                return Err(ConfigError::NonPositiveDemand {
                    city: city.name.clone(),
                    demand: city.demand,
                });
            }
            if !(city.population > 0.0) || !city.population.is_finite() {
                return Err(ConfigError::NonPositivePopulation {
                    city: city.name.clone(),
                    population: city.population,
                });
            }
            for kind in EnergyKind::ALL {
                let s = city.supply(kind);
                if !(0.0..=max_energy).contains(&s) {
                    return Err(invalid(
                        &format!("cities.{}.{}_supply", city.name, kind.as_str()),
                        format!("{} outside [0, {}]", s, max_energy),
                    ));
                }
            }
        }

        for high_income in [true, false] {
            if !self.cities.iter().any(|c| c.is_high_income == high_income) {
                return Err(ConfigError::MissingIncomeClass { high_income });
            }
        }

        let capital = [
            ("costs.add_renewable", self.costs.add_renewable),
            ("costs.remove_renewable", self.costs.remove_renewable),
            ("costs.add_nonrenewable", self.costs.add_nonrenewable),
            ("costs.remove_nonrenewable", self.costs.remove_nonrenewable),
        ];
        for (field, v) in capital {
            if !v.is_finite() || v < 0.0 {
                return Err(invalid(field, "capital costs must be finite and >= 0"));
            }
        }

        if !self.initial_budget.is_finite() {
            return Err(invalid("initial_budget", "must be finite"));
        }

        if !(self.discount > 0.0 && self.discount <= 1.0) {
            return Err(invalid(
                "discount",
                format!("{} outside (0, 1]", self.discount),
            ));
        }

        let g = &self.grid;
        if !(g.budget_step > 0.0) {
            return Err(invalid("grid.budget_step", "must be > 0"));
        }
        if !(g.energy_step > 0.0) {
            return Err(invalid("grid.energy_step", "must be > 0"));
        }
        if !g.min_budget.is_finite() || !g.max_budget.is_finite() || g.min_budget > g.max_budget
        {
            return Err(invalid(
                "grid.min_budget",
                format!(
                    "min_budget {} must be finite and <= max_budget {}",
                    g.min_budget, g.max_budget
                ),
            ));
        }
        if g.max_budget_levels == 0 {
            return Err(invalid("grid.max_budget_levels", "must be >= 1"));
        }

        Ok(())
    }

    /// Default scenario with the reward weights of a profile.
    pub fn for_profile(profile: RewardProfile) -> Self {
        let mut cfg = Config::default();
        cfg.apply_profile(profile);
        cfg
    }

    /// Replace reward weights with a profile preset, keeping the budget mode.
    pub fn apply_profile(&mut self, profile: RewardProfile) {
        let mode = self.reward.budget_mode;
        self.reward = RewardWeights::for_profile(profile);
        self.reward.budget_mode = mode;
    }

    /// Build a Config from a profile, then apply environment overrides.
    ///
    ///   - EQUIGRID_INITIAL_BUDGET   (f64)
    ///   - EQUIGRID_DISCOUNT         (f64 in (0, 1])
    ///   - EQUIGRID_MAX_ENERGY       (f64, per-city ceiling)
    ///   - EQUIGRID_BUDGET_REWARD    (raw | clamped)
    ///
    /// Any variable that fails to parse is ignored with a warning.
    pub fn from_env_or_profile(profile: RewardProfile) -> Self {
        let mut cfg = Config::for_profile(profile);
        cfg.apply_env_overrides();
        cfg
    }

    /// Apply the `EQUIGRID_*` overrides in place.
    pub fn apply_env_overrides(&mut self) {
        if let Some(v) = env_f64("EQUIGRID_INITIAL_BUDGET", self.initial_budget) {
            self.initial_budget = v;
        }

        if let Some(v) = env_f64("EQUIGRID_DISCOUNT", self.discount) {
            if v > 0.0 && v <= 1.0 {
                self.discount = v;
            } else {
                eprintln!(
                    "[config] WARN: EQUIGRID_DISCOUNT = {} outside (0, 1]; using default {}",
                    v, self.discount
                );
            }
        }

        if let Some(v) = env_f64("EQUIGRID_MAX_ENERGY", self.supply.max_energy_per_city) {
            self.supply.max_energy_per_city = v.max(0.0);
        }

        if let Ok(raw) = env::var("EQUIGRID_BUDGET_REWARD") {
            match BudgetRewardMode::parse(&raw) {
                Some(mode) => {
                    self.reward.budget_mode = mode;
                    eprintln!(
                        "[config] EQUIGRID_BUDGET_REWARD = {} (overrode default)",
                        mode.as_str()
                    );
                }
                None => eprintln!(
                    "[config] WARN: could not parse EQUIGRID_BUDGET_REWARD = {:?}; using default {}",
                    raw,
                    self.reward.budget_mode.as_str()
                ),
            }
        }
    }

    /// Parse a scenario from YAML and validate it.
    ///
    /// Missing fields fall back to the default scenario's values.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let cfg: Config = serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse {
            source: e.to_string(),
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load and validate a scenario file.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e.to_string(),
        })?;
        Self::from_yaml_str(&content)
    }
}

/// Read an f64 override; logs the outcome and returns None when unset or invalid.
fn env_f64(name: &str, current: f64) -> Option<f64> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => {
            eprintln!("[config] {name} = {v} (overrode default)");
            Some(v)
        }
        _ => {
            eprintln!(
                "[config] WARN: could not parse {} = {:?} as f64; using default {}",
                name, raw, current
            );
            None
        }
    }
}
