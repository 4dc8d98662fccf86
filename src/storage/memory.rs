use crate::alerting::alert_type::{AlertType, AlertTypeName};
use crate::alerting::model::{Alert, AlertKind, Backup};
use crate::error::{AlertingError, Result};
use crate::traits::{AlertRepository, AlertTypeRepository, BackupLookup};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Process-local store backing every repository trait.
///
/// Cloning is cheap and clones share the same tables.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    alerts: Arc<RwLock<Vec<Alert>>>,
    alert_types: Arc<RwLock<HashMap<Uuid, AlertType>>>,
    backups: Arc<RwLock<HashMap<Uuid, Backup>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a backup so alerts can refer to it
    pub async fn insert_backup(&self, backup: Backup) {
        self.backups.write().await.insert(backup.id, backup);
    }

    /// Number of stored alerts, deprecated included
    pub async fn alert_count(&self) -> usize {
        self.alerts.read().await.len()
    }
}

fn unknown_alerts(alerts: &[Alert], ids: &[Uuid]) -> Vec<Uuid> {
    let known: HashSet<Uuid> = alerts.iter().map(|a| a.id).collect();
    ids.iter().filter(|id| !known.contains(id)).copied().collect()
}

fn deprecate_all(alerts: &mut [Alert], ids: &[Uuid]) {
    let ids: HashSet<&Uuid> = ids.iter().collect();
    for alert in alerts.iter_mut().filter(|a| ids.contains(&a.id)) {
        alert.deprecate();
    }
}

#[async_trait]
impl AlertTypeRepository for InMemoryStore {
    async fn find_alert_type(&self, id: Uuid) -> Result<Option<AlertType>> {
        Ok(self.alert_types.read().await.get(&id).cloned())
    }

    async fn find_alert_type_by_name(&self, name: &str) -> Result<Option<AlertType>> {
        let types = self.alert_types.read().await;
        Ok(types.values().find(|t| t.name == name).cloned())
    }

    async fn list_alert_types(&self) -> Result<Vec<AlertType>> {
        let types = self.alert_types.read().await;
        let mut list: Vec<AlertType> = types.values().cloned().collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(list)
    }

    async fn save_alert_type(&self, alert_type: AlertType) -> Result<AlertType> {
        let mut types = self.alert_types.write().await;
        if types
            .values()
            .any(|t| t.name == alert_type.name && t.id != alert_type.id)
        {
            return Err(AlertingError::Conflict(format!(
                "alert type {} already exists",
                alert_type.name
            )));
        }
        types.insert(alert_type.id, alert_type.clone());
        Ok(alert_type)
    }
}

#[async_trait]
impl AlertRepository for InMemoryStore {
    async fn list_alerts(&self) -> Result<Vec<Alert>> {
        Ok(self.alerts.read().await.clone())
    }

    async fn find_alert(&self, id: Uuid) -> Result<Option<Alert>> {
        let alerts = self.alerts.read().await;
        Ok(alerts.iter().find(|a| a.id == id).cloned())
    }

    async fn find_active_storage_fill_alerts(&self) -> Result<Vec<Alert>> {
        let alerts = self.alerts.read().await;
        Ok(alerts
            .iter()
            .filter(|a| a.is_active() && a.as_storage_fill().is_some())
            .cloned()
            .collect())
    }

    async fn find_active_by_data_store_name(&self, name: &str) -> Result<Vec<Alert>> {
        let alerts = self.alerts.read().await;
        Ok(alerts
            .iter()
            .filter(|a| a.is_active())
            .filter(|a| {
                a.as_storage_fill()
                    .map_or(false, |s| s.data_store_name.as_str() == name)
            })
            .cloned()
            .collect())
    }

    async fn exists_for_backup(&self, alert_type: AlertTypeName, backup_id: Uuid) -> Result<bool> {
        let alerts = self.alerts.read().await;
        Ok(alerts.iter().any(|a| {
            a.type_name() == alert_type && a.backup().map_or(false, |b| b.id == backup_id)
        }))
    }

    async fn exists_missing_backup(&self, reference_date: DateTime<Utc>) -> Result<bool> {
        let alerts = self.alerts.read().await;
        Ok(alerts.iter().any(|a| {
            matches!(&a.kind, AlertKind::MissingBackup(m) if m.reference_date == reference_date)
        }))
    }

    async fn insert_alert(&self, alert: Alert) -> Result<Alert> {
        let mut alerts = self.alerts.write().await;
        if alerts.iter().any(|a| a.id == alert.id) {
            return Err(AlertingError::Conflict(format!(
                "alert {} already exists",
                alert.id
            )));
        }
        alerts.push(alert.clone());
        Ok(alert)
    }

    async fn mark_deprecated(&self, ids: &[Uuid]) -> Result<()> {
        let mut alerts = self.alerts.write().await;
        let unknown = unknown_alerts(&alerts, ids);
        if !unknown.is_empty() {
            return Err(AlertingError::NotFound(format!("alerts {:?}", unknown)));
        }
        deprecate_all(&mut alerts, ids);
        Ok(())
    }

    async fn commit_storage_fill(&self, deprecate: &[Uuid], insert: Vec<Alert>) -> Result<()> {
        let mut alerts = self.alerts.write().await;

        // Validate everything before the first write
        let unknown = unknown_alerts(&alerts, deprecate);
        if !unknown.is_empty() {
            return Err(AlertingError::Storage(format!(
                "cannot deprecate unknown alerts {:?}",
                unknown
            )));
        }
        let existing: HashSet<Uuid> = alerts.iter().map(|a| a.id).collect();
        let mut seen = HashSet::new();
        if let Some(duplicate) = insert
            .iter()
            .find(|a| existing.contains(&a.id) || !seen.insert(a.id))
        {
            return Err(AlertingError::Storage(format!(
                "alert {} already exists",
                duplicate.id
            )));
        }

        deprecate_all(&mut alerts, deprecate);
        alerts.extend(insert);
        Ok(())
    }
}

#[async_trait]
impl BackupLookup for InMemoryStore {
    async fn find_backup(&self, id: Uuid) -> Result<Option<Backup>> {
        Ok(self.backups.read().await.get(&id).cloned())
    }
}
