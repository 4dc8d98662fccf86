use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Severity of an alert type
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Info,
    #[default]
    Warning,
    Critical,
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "INFO" => Ok(Severity::Info),
            "WARNING" => Ok(Severity::Warning),
            "CRITICAL" => Ok(Severity::Critical),
            other => Err(format!("unknown severity '{}'", other)),
        }
    }
}

/// Names of the alert types the backend produces itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertTypeName {
    #[serde(rename = "SIZE_ALERT")]
    Size,
    #[serde(rename = "CREATION_DATE_ALERT")]
    CreationDate,
    #[serde(rename = "STORAGE_FILL_ALERT")]
    StorageFill,
    #[serde(rename = "MISSING_BACKUP_ALERT")]
    MissingBackup,
    #[serde(rename = "ADDITIONAL_BACKUP_ALERT")]
    AdditionalBackup,
}

impl AlertTypeName {
    pub const ALL: [AlertTypeName; 5] = [
        AlertTypeName::Size,
        AlertTypeName::CreationDate,
        AlertTypeName::StorageFill,
        AlertTypeName::MissingBackup,
        AlertTypeName::AdditionalBackup,
    ];

    /// Catalog name as stored in the alert type table
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertTypeName::Size => "SIZE_ALERT",
            AlertTypeName::CreationDate => "CREATION_DATE_ALERT",
            AlertTypeName::StorageFill => "STORAGE_FILL_ALERT",
            AlertTypeName::MissingBackup => "MISSING_BACKUP_ALERT",
            AlertTypeName::AdditionalBackup => "ADDITIONAL_BACKUP_ALERT",
        }
    }
}

impl fmt::Display for AlertTypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertTypeName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AlertTypeName::ALL
            .iter()
            .copied()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| format!("unknown alert type '{}'", s))
    }
}

/// Catalog entry describing a class of alert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertType {
    pub id: Uuid,
    pub name: String,
    pub severity: Severity,
    /// Switched by the user in the notification settings
    pub user_active: bool,
    /// Switched by an administrator; overrides the user flag
    pub master_active: bool,
}

impl AlertType {
    /// Create a new alert type; the user flag starts active
    pub fn new(name: impl Into<String>, severity: Severity, master_active: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            severity,
            user_active: true,
            master_active,
        }
    }

    /// Alerts of this type are mailed only when both flags are set
    pub fn is_active(&self) -> bool {
        self.user_active && self.master_active
    }
}

/// Request to add an alert type to the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAlertType {
    pub name: String,
    pub severity: Severity,
    pub master_active: bool,
}

impl From<CreateAlertType> for AlertType {
    fn from(request: CreateAlertType) -> Self {
        AlertType::new(request.name, request.severity, request.master_active)
    }
}

/// Built-in alert types seeded at startup when missing
pub fn default_alert_types() -> Vec<CreateAlertType> {
    AlertTypeName::ALL
        .iter()
        .map(|name| CreateAlertType {
            name: name.as_str().to_string(),
            severity: Severity::Warning,
            master_active: true,
        })
        .collect()
}
