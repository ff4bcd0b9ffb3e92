// src/types.rs
//
// Common shared types for the equigrid planning model.

use serde::{Deserialize, Serialize};

/// Energy source a capacity action targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyKind {
    Renewable,
    NonRenewable,
}

impl EnergyKind {
    pub const ALL: [EnergyKind; 2] = [EnergyKind::Renewable, EnergyKind::NonRenewable];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnergyKind::Renewable => "renewable",
            EnergyKind::NonRenewable => "nonrenewable",
        }
    }
}

/// Whether an action installs or decommissions one capacity increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Add,
    Remove,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Add => "add",
            Direction::Remove => "remove",
        }
    }

    /// +1.0 for Add, -1.0 for Remove.
    #[inline]
    pub fn sign(&self) -> f64 {
        match self {
            Direction::Add => 1.0,
            Direction::Remove => -1.0,
        }
    }
}

/// Energy profile of one city.
///
/// Records are values: a transition that touches a city builds a new record
/// with [`CityRecord::with_supply`] and leaves the old one intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityRecord {
    pub name: String,
    /// Energy demand per epoch (> 0).
    pub demand: f64,
    /// Installed renewable supply (>= 0).
    pub renewable_supply: f64,
    /// Installed non-renewable supply (>= 0).
    pub nonrenewable_supply: f64,
    /// Resident population (> 0). Used to weight the reward fractions.
    pub population: f64,
    pub is_high_income: bool,
}

impl CityRecord {
    pub fn new(
        name: impl Into<String>,
        demand: f64,
        renewable_supply: f64,
        nonrenewable_supply: f64,
        population: f64,
        is_high_income: bool,
    ) -> Self {
        Self {
            name: name.into(),
            demand,
            renewable_supply,
            nonrenewable_supply,
            population,
            is_high_income,
        }
    }

    /// Installed supply of one kind.
    #[inline]
    pub fn supply(&self, kind: EnergyKind) -> f64 {
        match kind {
            EnergyKind::Renewable => self.renewable_supply,
            EnergyKind::NonRenewable => self.nonrenewable_supply,
        }
    }

    #[inline]
    pub fn total_supply(&self) -> f64 {
        self.renewable_supply + self.nonrenewable_supply
    }

    /// Demand is met when renewable + non-renewable supply covers it.
    #[inline]
    pub fn is_served(&self) -> bool {
        self.total_supply() >= self.demand
    }

    /// Demand is met by renewable supply alone.
    #[inline]
    pub fn is_renewable_served(&self) -> bool {
        self.renewable_supply >= self.demand
    }

    /// Demand not covered by current supply (0 when served).
    #[inline]
    pub fn unmet_demand(&self) -> f64 {
        (self.demand - self.total_supply()).max(0.0)
    }

    /// Copy of this record with one supply kind replaced.
    pub fn with_supply(&self, kind: EnergyKind, value: f64) -> Self {
        let mut next = self.clone();
        match kind {
            EnergyKind::Renewable => next.renewable_supply = value,
            EnergyKind::NonRenewable => next.nonrenewable_supply = value,
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn served_counts_either_source() {
        let city = CityRecord::new("x", 10.0, 4.0, 6.0, 100.0, false);
        assert!(city.is_served());
        assert!(!city.is_renewable_served());
        assert_eq!(city.unmet_demand(), 0.0);
    }

    #[test]
    fn with_supply_leaves_original_untouched() {
        let city = CityRecord::new("x", 10.0, 0.0, 8.0, 100.0, true);
        let next = city.with_supply(EnergyKind::Renewable, 8.0);
        assert_eq!(city.renewable_supply, 0.0);
        assert_eq!(next.renewable_supply, 8.0);
        assert_eq!(next.nonrenewable_supply, 8.0);
        assert_eq!(next.name, "x");
    }
}
