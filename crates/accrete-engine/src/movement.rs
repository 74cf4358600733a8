//! Movement classes and per-class tallies.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// How a user moved between two consecutive periods or windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserMovement {
    /// First activity falls in the current period
    New,
    /// Active in both the prior and the current period
    Retained,
    /// Active now, inactive in the prior period, not new
    Resurrected,
    /// Active in the prior period, inactive now
    Churned,
    /// Seen only before the prior period; never reported
    Prior,
}

impl UserMovement {
    /// Lowercase name of the class.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Retained => "retained",
            Self::Resurrected => "resurrected",
            Self::Churned => "churned",
            Self::Prior => "prior",
        }
    }
}

impl fmt::Display for UserMovement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How revenue moved between two consecutive periods.
///
/// Expansion and contraction are subsets of retained revenue; the other
/// classes mirror [`UserMovement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevenueMovement {
    /// Revenue from new users
    New,
    /// Revenue kept from the prior period, min(current, prior) per user
    Retained,
    /// Revenue from resurrected users
    Resurrected,
    /// Growth of retained users' revenue (positive)
    Expansion,
    /// Decline of retained users' revenue (negative)
    Contraction,
    /// Prior-period revenue of churned users (negative)
    Churned,
}

impl RevenueMovement {
    /// Lowercase name of the class.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Retained => "retained",
            Self::Resurrected => "resurrected",
            Self::Expansion => "expansion",
            Self::Contraction => "contraction",
            Self::Churned => "churned",
        }
    }
}

impl fmt::Display for RevenueMovement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Aggregate value per movement class.
///
/// A class is present only if at least one user fell into it; absence is
/// explicit rather than a stored zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementTally<C: Ord> {
    values: BTreeMap<C, f64>,
}

impl<C: Ord + Copy> MovementTally<C> {
    /// Create an empty tally.
    pub const fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Add `value` to the class, creating it if absent.
    pub fn add(&mut self, class: C, value: f64) {
        *self.values.entry(class).or_insert(0.0) += value;
    }

    /// Value of the class, `None` if no user fell into it.
    pub fn get(&self, class: C) -> Option<f64> {
        self.values.get(&class).copied()
    }

    /// Value of the class, treating absence as zero.
    pub fn value_or_zero(&self, class: C) -> f64 {
        self.get(class).unwrap_or(0.0)
    }

    /// Whether no class has been recorded.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over recorded classes in class order.
    pub fn iter(&self) -> impl Iterator<Item = (C, f64)> + '_ {
        self.values.iter().map(|(class, value)| (*class, *value))
    }
}

impl<C: Ord + Copy> Default for MovementTally<C> {
    fn default() -> Self {
        Self::new()
    }
}
