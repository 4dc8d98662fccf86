use crate::alerting::alert_type::{AlertType, AlertTypeName};
use crate::alerting::model::{Alert, Backup};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Persistence for the alert type catalog
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AlertTypeRepository: Send + Sync {
    async fn find_alert_type(&self, id: Uuid) -> Result<Option<AlertType>>;

    async fn find_alert_type_by_name(&self, name: &str) -> Result<Option<AlertType>>;

    async fn list_alert_types(&self) -> Result<Vec<AlertType>>;

    /// Insert or replace an alert type. Fails with a conflict when another
    /// entry already uses the name.
    async fn save_alert_type(&self, alert_type: AlertType) -> Result<AlertType>;
}

/// Persistence for alerts. Alerts are never deleted, only deprecated.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AlertRepository: Send + Sync {
    /// Every stored alert, deprecated ones included
    async fn list_alerts(&self) -> Result<Vec<Alert>>;

    async fn find_alert(&self, id: Uuid) -> Result<Option<Alert>>;

    async fn find_active_storage_fill_alerts(&self) -> Result<Vec<Alert>>;

    async fn find_active_by_data_store_name(&self, name: &str) -> Result<Vec<Alert>>;

    /// True when an alert of the given kind already refers to the backup
    async fn exists_for_backup(&self, alert_type: AlertTypeName, backup_id: Uuid) -> Result<bool>;

    async fn exists_missing_backup(&self, reference_date: DateTime<Utc>) -> Result<bool>;

    async fn insert_alert(&self, alert: Alert) -> Result<Alert>;

    async fn mark_deprecated(&self, ids: &[Uuid]) -> Result<()>;

    /// Deprecate `deprecate` and insert `insert` as one unit. Either every
    /// write is applied or none is.
    async fn commit_storage_fill(&self, deprecate: &[Uuid], insert: Vec<Alert>) -> Result<()>;
}

/// Read access to backups reported by the analyzer
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BackupLookup: Send + Sync {
    async fn find_backup(&self, id: Uuid) -> Result<Option<Backup>>;
}
