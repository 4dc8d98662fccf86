use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Backup size in megabytes
/// Uses NewType pattern so sizes are not confused with fill levels or percentages
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Megabytes(pub Decimal);

impl Megabytes {
    /// Create a new Megabytes value from a Decimal
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Get the underlying Decimal value
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Check if the size is zero
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for Megabytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} MB", self.0.normalize())
    }
}
