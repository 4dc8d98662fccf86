use crate::alerting::alert_type::AlertTypeName;
use crate::types::{DataStoreName, Megabytes};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of backup as reported by the backup software
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BackupType {
    Full,
    Incremental,
    Differential,
    Copy,
}

/// A backup an alert refers to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    pub id: Uuid,
    /// Task the backup belongs to, if the analyzer could resolve it
    pub task_id: Option<Uuid>,
    pub backup_type: BackupType,
    pub creation_date: DateTime<Utc>,
    pub size: Megabytes,
}

/// Lifecycle of an alert. `Deprecated` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertState {
    Active,
    Deprecated,
}

impl AlertState {
    pub fn is_deprecated(&self) -> bool {
        matches!(self, AlertState::Deprecated)
    }
}

// Stored and served as the boolean `deprecated` column
impl Serialize for AlertState {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_bool(self.is_deprecated())
    }
}

impl<'de> Deserialize<'de> for AlertState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let deprecated = bool::deserialize(deserializer)?;
        Ok(if deprecated {
            AlertState::Deprecated
        } else {
            AlertState::Active
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeAlert {
    pub backup: Backup,
    pub size: Megabytes,
    pub reference_size: Megabytes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreationDateAlert {
    pub backup: Backup,
    /// When the backup actually started
    pub date: DateTime<Utc>,
    /// When the schedule says it should have started
    pub reference_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageFillAlert {
    pub data_store_name: DataStoreName,
    pub filled: Decimal,
    pub high_water_mark: Decimal,
    pub capacity: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingBackupAlert {
    pub reference_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalBackupAlert {
    pub backup: Backup,
    pub date: DateTime<Utc>,
}

/// What an alert is about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "alertType")]
pub enum AlertKind {
    #[serde(rename = "SIZE_ALERT")]
    Size(SizeAlert),
    #[serde(rename = "CREATION_DATE_ALERT")]
    CreationDate(CreationDateAlert),
    #[serde(rename = "STORAGE_FILL_ALERT")]
    StorageFill(StorageFillAlert),
    #[serde(rename = "MISSING_BACKUP_ALERT")]
    MissingBackup(MissingBackupAlert),
    #[serde(rename = "ADDITIONAL_BACKUP_ALERT")]
    AdditionalBackup(AdditionalBackupAlert),
}

impl AlertKind {
    pub fn type_name(&self) -> AlertTypeName {
        match self {
            AlertKind::Size(_) => AlertTypeName::Size,
            AlertKind::CreationDate(_) => AlertTypeName::CreationDate,
            AlertKind::StorageFill(_) => AlertTypeName::StorageFill,
            AlertKind::MissingBackup(_) => AlertTypeName::MissingBackup,
            AlertKind::AdditionalBackup(_) => AlertTypeName::AdditionalBackup,
        }
    }

    /// Backup the alert was raised for, if the kind has one
    pub fn backup(&self) -> Option<&Backup> {
        match self {
            AlertKind::Size(alert) => Some(&alert.backup),
            AlertKind::CreationDate(alert) => Some(&alert.backup),
            AlertKind::AdditionalBackup(alert) => Some(&alert.backup),
            AlertKind::StorageFill(_) | AlertKind::MissingBackup(_) => None,
        }
    }
}

/// A persisted alert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: Uuid,
    pub creation_date: DateTime<Utc>,
    #[serde(rename = "deprecated")]
    pub state: AlertState,
    #[serde(flatten)]
    pub kind: AlertKind,
}

impl Alert {
    /// Create a new active alert stamped with the current time
    pub fn new(kind: AlertKind) -> Self {
        Self::new_at(kind, Utc::now())
    }

    pub fn new_at(kind: AlertKind, creation_date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            creation_date,
            state: AlertState::Active,
            kind,
        }
    }

    pub fn type_name(&self) -> AlertTypeName {
        self.kind.type_name()
    }

    pub fn backup(&self) -> Option<&Backup> {
        self.kind.backup()
    }

    pub fn is_active(&self) -> bool {
        !self.state.is_deprecated()
    }

    /// Soft-supersede the alert. There is no way back.
    pub fn deprecate(&mut self) {
        self.state = AlertState::Deprecated;
    }

    pub fn as_storage_fill(&self) -> Option<&StorageFillAlert> {
        match &self.kind {
            AlertKind::StorageFill(alert) => Some(alert),
            _ => None,
        }
    }
}

/// Fill level of a data store at one point in time, as reported by the analyzer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageFillFact {
    pub data_store_name: DataStoreName,
    pub filled: Decimal,
    pub high_water_mark: Decimal,
    pub capacity: Decimal,
}

impl StorageFillFact {
    pub fn new(
        data_store_name: impl Into<DataStoreName>,
        filled: Decimal,
        high_water_mark: Decimal,
        capacity: Decimal,
    ) -> Self {
        Self {
            data_store_name: data_store_name.into(),
            filled,
            high_water_mark,
            capacity,
        }
    }

    /// True when the alert carries exactly the values of this fact
    pub fn matches(&self, alert: &StorageFillAlert) -> bool {
        self.filled == alert.filled
            && self.high_water_mark == alert.high_water_mark
            && self.capacity == alert.capacity
    }
}

/// Raw data store record from the analyzer. Any value may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataStoreSnapshot {
    #[serde(alias = "displayName")]
    pub name: DataStoreName,
    #[serde(default)]
    pub capacity: Option<Decimal>,
    #[serde(default)]
    pub high_water_mark: Option<Decimal>,
    #[serde(default)]
    pub filled: Option<Decimal>,
}

impl From<StorageFillFact> for StorageFillAlert {
    fn from(fact: StorageFillFact) -> Self {
        Self {
            data_store_name: fact.data_store_name,
            filled: fact.filled,
            high_water_mark: fact.high_water_mark,
            capacity: fact.capacity,
        }
    }
}
