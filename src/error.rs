use std::fmt;

/// Errors surfaced by the alerting service and its collaborators
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertingError {
    /// A referenced entity (alert type, backup, mail receiver) does not exist
    NotFound(String),
    /// A uniquely named entity already exists
    Conflict(String),
    /// Caller supplied an unusable value (bad date, unsupported alert type, ...)
    InvalidInput(String),
    /// The alert store rejected a read or write
    Storage(String),
    /// The mail transport failed
    Notification(String),
    /// The analyzer service could not be reached or returned garbage
    Analyzer(String),
}

impl AlertingError {
    /// HTTP status code a web layer should answer with
    pub fn http_status(&self) -> u16 {
        match self {
            AlertingError::NotFound(_) => 404,
            AlertingError::InvalidInput(_) => 400,
            AlertingError::Conflict(_) => 409,
            AlertingError::Storage(_) | AlertingError::Notification(_) => 500,
            AlertingError::Analyzer(_) => 502,
        }
    }
}

impl fmt::Display for AlertingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertingError::NotFound(msg) => write!(f, "not found: {}", msg),
            AlertingError::Conflict(msg) => write!(f, "conflict: {}", msg),
            AlertingError::InvalidInput(msg) => write!(f, "invalid input: {}", msg),
            AlertingError::Storage(msg) => write!(f, "storage error: {}", msg),
            AlertingError::Notification(msg) => write!(f, "notification failed: {}", msg),
            AlertingError::Analyzer(msg) => write!(f, "analyzer request failed: {}", msg),
        }
    }
}

impl std::error::Error for AlertingError {}

impl From<reqwest::Error> for AlertingError {
    fn from(error: reqwest::Error) -> Self {
        AlertingError::Analyzer(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AlertingError>;
