use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of a data store as reported by the analyzer (e.g., "pool-01")
/// Uses NewType pattern so data store names are not mixed up with other strings
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataStoreName(String);

impl DataStoreName {
    /// Create a new DataStoreName from a string
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the underlying string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DataStoreName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DataStoreName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for DataStoreName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for DataStoreName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for DataStoreName {
    fn borrow(&self) -> &str {
        &self.0
    }
}
