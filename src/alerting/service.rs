use crate::alerting::alert_type::{default_alert_types, AlertType, AlertTypeName, CreateAlertType};
use crate::alerting::filter::{
    parse_date, query_alerts, AlertFilter, AlertOrder, AlertView, Page, PageRequest,
};
use crate::alerting::model::{
    AdditionalBackupAlert, Alert, AlertKind, Backup, BackupType, CreationDateAlert,
    MissingBackupAlert, SizeAlert, StorageFillFact,
};
use crate::alerting::reconcile::{plan_storage_fill, ReconciliationReport};
use crate::alerting::rules::{evaluate_creation_time, evaluate_size, RuleThresholds};
use crate::alerting::summary::{count_by_severity, summarize, AlertStatistics, AlertSummary};
use crate::error::{AlertingError, Result};
use crate::traits::{AlertNotifier, AlertRepository, AlertTypeRepository, BackupLookup, FactSource};
use crate::types::Megabytes;
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSizeAlert {
    pub backup_id: Uuid,
    pub size: Megabytes,
    pub reference_size: Megabytes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCreationDateAlert {
    pub backup_id: Uuid,
    pub date: DateTime<Utc>,
    pub reference_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMissingBackupAlert {
    pub reference_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdditionalBackupAlert {
    pub backup_id: Uuid,
    pub date: DateTime<Utc>,
}

/// Front door of the alerting backend.
///
/// Owns the alert type catalog, creates alerts, reconciles storage fill
/// alerts and answers alert queries. New alerts of an active type are handed
/// to the notifier after they are stored.
pub struct AlertingService {
    alerts: Arc<dyn AlertRepository>,
    alert_types: Arc<dyn AlertTypeRepository>,
    backups: Arc<dyn BackupLookup>,
    notifier: Arc<dyn AlertNotifier>,
    thresholds: RuleThresholds,
    // Held for a whole storage fill reconciliation
    reconcile_lock: Mutex<()>,
}

impl AlertingService {
    pub fn new(
        alerts: Arc<dyn AlertRepository>,
        alert_types: Arc<dyn AlertTypeRepository>,
        backups: Arc<dyn BackupLookup>,
        notifier: Arc<dyn AlertNotifier>,
    ) -> Self {
        Self {
            alerts,
            alert_types,
            backups,
            notifier,
            thresholds: RuleThresholds::default(),
            reconcile_lock: Mutex::new(()),
        }
    }

    pub fn with_thresholds(mut self, thresholds: RuleThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn thresholds(&self) -> RuleThresholds {
        self.thresholds
    }

    // ---- Alert type catalog ----

    /// Seed the built-in alert types that are not in the catalog yet.
    /// Returns the newly created entries.
    pub async fn ensure_alert_types_exist(&self) -> Result<Vec<AlertType>> {
        let mut created = Vec::new();
        for request in default_alert_types() {
            if self
                .alert_types
                .find_alert_type_by_name(&request.name)
                .await?
                .is_some()
            {
                continue;
            }
            info!("Creating missing alert type {}", request.name);
            created.push(self.alert_types.save_alert_type(request.into()).await?);
        }
        Ok(created)
    }

    pub async fn create_alert_type(&self, request: CreateAlertType) -> Result<AlertType> {
        if self
            .alert_types
            .find_alert_type_by_name(&request.name)
            .await?
            .is_some()
        {
            return Err(AlertingError::Conflict(format!(
                "Alert type with name {} already exists",
                request.name
            )));
        }
        self.alert_types.save_alert_type(request.into()).await
    }

    /// Switch the user flag of an alert type
    pub async fn set_user_active(&self, id: Uuid, active: bool) -> Result<AlertType> {
        let mut alert_type = self.alert_type_by_id(id).await?;
        alert_type.user_active = active;
        self.alert_types.save_alert_type(alert_type).await
    }

    /// Switch the administrator flag of an alert type
    pub async fn set_master_active(&self, id: Uuid, active: bool) -> Result<AlertType> {
        let mut alert_type = self.alert_type_by_id(id).await?;
        alert_type.master_active = active;
        self.alert_types.save_alert_type(alert_type).await
    }

    /// List alert types. A flag given as `Some(true)` restricts the result to
    /// types with that flag set; `None` and `Some(false)` do not filter.
    pub async fn find_alert_types(
        &self,
        user_active: Option<bool>,
        master_active: Option<bool>,
    ) -> Result<Vec<AlertType>> {
        let types = self.alert_types.list_alert_types().await?;
        Ok(types
            .into_iter()
            .filter(|t| user_active != Some(true) || t.user_active)
            .filter(|t| master_active != Some(true) || t.master_active)
            .collect())
    }

    async fn alert_type_by_id(&self, id: Uuid) -> Result<AlertType> {
        self.alert_types
            .find_alert_type(id)
            .await?
            .ok_or_else(|| AlertingError::NotFound(format!("Alert type with id {} not found", id)))
    }

    async fn alert_type_by_name(&self, name: AlertTypeName) -> Result<AlertType> {
        self.alert_types
            .find_alert_type_by_name(name.as_str())
            .await?
            .ok_or_else(|| AlertingError::NotFound(format!("Alert type {} not found", name)))
    }

    async fn backup_by_id(&self, id: Uuid) -> Result<Backup> {
        self.backups
            .find_backup(id)
            .await?
            .ok_or_else(|| AlertingError::NotFound(format!("Backup with id {} not found", id)))
    }

    // ---- Per-backup alerts ----

    /// Store a size alert. Returns `None` when the backup already has one.
    pub async fn create_size_alert(&self, request: CreateSizeAlert) -> Result<Option<Alert>> {
        if self
            .alerts
            .exists_for_backup(AlertTypeName::Size, request.backup_id)
            .await?
        {
            debug!("Size alert for backup {} already exists, ignoring it", request.backup_id);
            return Ok(None);
        }
        let backup = self.backup_by_id(request.backup_id).await?;
        let kind = AlertKind::Size(SizeAlert {
            backup,
            size: request.size,
            reference_size: request.reference_size,
        });
        self.store_and_notify(kind).await.map(Some)
    }

    /// Store a creation date alert. Returns `None` when the backup already has one.
    pub async fn create_creation_date_alert(
        &self,
        request: CreateCreationDateAlert,
    ) -> Result<Option<Alert>> {
        if self
            .alerts
            .exists_for_backup(AlertTypeName::CreationDate, request.backup_id)
            .await?
        {
            debug!(
                "Creation date alert for backup {} already exists, ignoring it",
                request.backup_id
            );
            return Ok(None);
        }
        let backup = self.backup_by_id(request.backup_id).await?;
        let kind = AlertKind::CreationDate(CreationDateAlert {
            backup,
            date: request.date,
            reference_date: request.reference_date,
        });
        self.store_and_notify(kind).await.map(Some)
    }

    /// Store a missing backup alert. Returns `None` when one exists for the
    /// same reference date.
    pub async fn create_missing_backup_alert(
        &self,
        request: CreateMissingBackupAlert,
    ) -> Result<Option<Alert>> {
        if self
            .alerts
            .exists_missing_backup(request.reference_date)
            .await?
        {
            debug!(
                "Missing backup alert for {} already exists, ignoring it",
                request.reference_date
            );
            return Ok(None);
        }
        let kind = AlertKind::MissingBackup(MissingBackupAlert {
            reference_date: request.reference_date,
        });
        self.store_and_notify(kind).await.map(Some)
    }

    /// Store an additional backup alert. Returns `None` when the backup already has one.
    pub async fn create_additional_backup_alert(
        &self,
        request: CreateAdditionalBackupAlert,
    ) -> Result<Option<Alert>> {
        if self
            .alerts
            .exists_for_backup(AlertTypeName::AdditionalBackup, request.backup_id)
            .await?
        {
            debug!(
                "Additional backup alert for backup {} already exists, ignoring it",
                request.backup_id
            );
            return Ok(None);
        }
        let backup = self.backup_by_id(request.backup_id).await?;
        let kind = AlertKind::AdditionalBackup(AdditionalBackupAlert {
            backup,
            date: request.date,
        });
        self.store_and_notify(kind).await.map(Some)
    }

    pub async fn create_size_alerts(&self, requests: Vec<CreateSizeAlert>) -> Result<Vec<Alert>> {
        let mut created = Vec::new();
        for request in requests {
            created.extend(self.create_size_alert(request).await?);
        }
        Ok(created)
    }

    pub async fn create_creation_date_alerts(
        &self,
        requests: Vec<CreateCreationDateAlert>,
    ) -> Result<Vec<Alert>> {
        let mut created = Vec::new();
        for request in requests {
            created.extend(self.create_creation_date_alert(request).await?);
        }
        Ok(created)
    }

    pub async fn create_missing_backup_alerts(
        &self,
        requests: Vec<CreateMissingBackupAlert>,
    ) -> Result<Vec<Alert>> {
        let mut created = Vec::new();
        for request in requests {
            created.extend(self.create_missing_backup_alert(request).await?);
        }
        Ok(created)
    }

    pub async fn create_additional_backup_alerts(
        &self,
        requests: Vec<CreateAdditionalBackupAlert>,
    ) -> Result<Vec<Alert>> {
        let mut created = Vec::new();
        for request in requests {
            created.extend(self.create_additional_backup_alert(request).await?);
        }
        Ok(created)
    }

    /// Compare a backup against a reference size and raise a size alert when
    /// the change exceeds the configured threshold.
    pub async fn check_backup_size(
        &self,
        backup_id: Uuid,
        reference_size: Megabytes,
    ) -> Result<Option<Alert>> {
        let backup = self.backup_by_id(backup_id).await?;
        let evaluation = evaluate_size(backup.size, reference_size, self.thresholds.size_change);
        if !evaluation.triggered {
            return Ok(None);
        }
        self.create_size_alert(CreateSizeAlert {
            backup_id,
            size: backup.size,
            reference_size,
        })
        .await
    }

    /// Compare the start time of a backup against its schedule and raise a
    /// creation date alert when it deviates by more than the tolerance.
    pub async fn check_backup_creation_time(
        &self,
        backup_id: Uuid,
        reference_date: DateTime<Utc>,
    ) -> Result<Option<Alert>> {
        let backup = self.backup_by_id(backup_id).await?;
        let evaluation = evaluate_creation_time(
            backup.creation_date,
            reference_date,
            self.thresholds.creation_time_tolerance,
        );
        if !evaluation.triggered {
            return Ok(None);
        }
        self.create_creation_date_alert(CreateCreationDateAlert {
            backup_id,
            date: backup.creation_date,
            reference_date,
        })
        .await
    }

    async fn store_and_notify(&self, kind: AlertKind) -> Result<Alert> {
        let alert_type = self.alert_type_by_name(kind.type_name()).await?;
        let alert = self.alerts.insert_alert(Alert::new(kind)).await?;
        info!("Created {} {}", alert.type_name(), alert.id);
        self.notify_if_active(&alert, &alert_type).await;
        Ok(alert)
    }

    /// Returns true when the notifier accepted the alert
    async fn notify_if_active(&self, alert: &Alert, alert_type: &AlertType) -> bool {
        if !alert_type.is_active() {
            debug!("Alert type {} is inactive, not notifying", alert_type.name);
            return false;
        }
        match self.notifier.notify(alert, alert_type).await {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to send notification for alert {}: {}", alert.id, e);
                false
            }
        }
    }

    // ---- Storage fill ----

    /// Bring the active storage fill alerts in line with `facts`.
    ///
    /// The write set is committed in one repository call; a failed commit
    /// leaves the stored alerts untouched. Notifications go out only after
    /// the commit and their failures do not fail the reconciliation.
    pub async fn reconcile_storage_fill(
        &self,
        facts: Vec<StorageFillFact>,
    ) -> Result<ReconciliationReport> {
        let _guard = self.reconcile_lock.lock().await;

        let alert_type = self.alert_type_by_name(AlertTypeName::StorageFill).await?;
        let active = self.alerts.find_active_storage_fill_alerts().await?;
        let plan = plan_storage_fill(&facts, &active);

        let mut report = ReconciliationReport {
            unchanged: plan.unchanged.len(),
            ..ReconciliationReport::default()
        };
        if plan.is_empty() {
            debug!(
                "Storage fill alerts up to date ({} unchanged)",
                report.unchanged
            );
            return Ok(report);
        }

        let inserted = plan.new_alerts(Utc::now());
        self.alerts
            .commit_storage_fill(&plan.deprecate, inserted.clone())
            .await?;

        info!(
            "Storage fill reconciliation: {} inserted, {} deprecated, {} unchanged",
            inserted.len(),
            plan.deprecate.len(),
            report.unchanged
        );

        for alert in &inserted {
            if self.notify_if_active(alert, &alert_type).await {
                report.notified += 1;
            }
        }
        report.inserted = inserted.iter().map(|a| a.id).collect();
        report.deprecated = plan.deprecate;
        Ok(report)
    }

    /// Fetch the current facts from `source` and reconcile them
    pub async fn refresh_storage_fill(
        &self,
        source: &dyn FactSource,
    ) -> Result<ReconciliationReport> {
        let facts = source.fetch_storage_fill_facts().await?;
        debug!("Fetched {} storage fill facts", facts.len());
        self.reconcile_storage_fill(facts).await
    }

    // ---- Queries ----

    /// Active alerts per severity, optionally only those created on or after `from_date`
    pub async fn statistics(&self, from_date: Option<&str>) -> Result<AlertStatistics> {
        let from_date = from_date.map(|d| parse_date("fromDate", d)).transpose()?;
        let alerts = self.alerts.list_alerts().await?;
        let alert_types = self.alert_types.list_alert_types().await?;
        Ok(count_by_severity(&alerts, &alert_types, from_date))
    }

    pub async fn summary(&self) -> Result<AlertSummary> {
        let alerts = self.alerts.list_alerts().await?;
        let alert_types = self.alert_types.list_alert_types().await?;
        Ok(summarize(&alerts, &alert_types))
    }

    pub async fn list_alerts(
        &self,
        filter: &AlertFilter,
        order: AlertOrder,
        page: PageRequest,
    ) -> Result<Page<AlertView>> {
        let alerts = self.alerts.list_alerts().await?;
        let alert_types = self.alert_types.list_alert_types().await?;
        Ok(query_alerts(alerts, &alert_types, filter, order, page))
    }

    /// Id of the newest backup (by backup creation date) that has an alert
    /// of the given type, optionally restricted to one backup type.
    pub async fn latest_alert_backup(
        &self,
        alert_type_name: &str,
        backup_type: Option<BackupType>,
    ) -> Result<Option<Uuid>> {
        if self
            .alert_types
            .find_alert_type_by_name(alert_type_name)
            .await?
            .is_none()
        {
            return Err(AlertingError::NotFound(format!(
                "Alert type {} not found",
                alert_type_name
            )));
        }

        let name: AlertTypeName = alert_type_name.parse().map_err(AlertingError::InvalidInput)?;
        if matches!(name, AlertTypeName::StorageFill | AlertTypeName::MissingBackup) {
            return Err(AlertingError::InvalidInput(format!(
                "Alert type {} is not associated with a backup",
                name
            )));
        }

        let alerts = self.alerts.list_alerts().await?;
        let latest = alerts
            .iter()
            .filter(|a| a.type_name() == name)
            .filter_map(|a| a.backup())
            .filter(|b| backup_type.map_or(true, |t| b.backup_type == t))
            .max_by_key(|b| b.creation_date)
            .map(|b| b.id);

        if latest.is_none() {
            warn!("No {} alert refers to a backup", name);
        }
        Ok(latest)
    }
}
