//! Storage fill alert reconciliation.
//!
//! The analyzer reports every data store that is above its high-water mark in
//! one batch. The batch is diffed against the active storage fill alerts so
//! that afterwards every reported store has exactly one active alert carrying
//! its latest values, and stores that are no longer reported have none.
//! Planning is pure; the resulting write set is committed in one step by the
//! repository.

use crate::alerting::model::{Alert, AlertKind, StorageFillAlert, StorageFillFact};
use crate::types::DataStoreName;
use chrono::{DateTime, Utc};
use log::warn;
use serde::Serialize;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use uuid::Uuid;

/// Write set produced by [`plan_storage_fill`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationPlan {
    /// Active alerts to flag as deprecated
    pub deprecate: Vec<Uuid>,
    /// Facts that need a fresh alert
    pub insert: Vec<StorageFillFact>,
    /// Data stores whose active alert already carries the reported values
    pub unchanged: Vec<DataStoreName>,
}

impl ReconciliationPlan {
    /// True when applying the plan would not write anything
    pub fn is_empty(&self) -> bool {
        self.deprecate.is_empty() && self.insert.is_empty()
    }

    /// Build the alerts to insert, all stamped with `now`
    pub fn new_alerts(&self, now: DateTime<Utc>) -> Vec<Alert> {
        self.insert
            .iter()
            .cloned()
            .map(|fact| Alert::new_at(AlertKind::StorageFill(fact.into()), now))
            .collect()
    }
}

/// Summary of one reconciliation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationReport {
    pub inserted: Vec<Uuid>,
    pub deprecated: Vec<Uuid>,
    pub unchanged: usize,
    pub notified: usize,
}

/// Diff the latest facts against the currently active alerts.
///
/// `active` may contain alerts of other kinds or deprecated alerts; both are
/// ignored. When a batch names the same data store twice the later fact
/// wins. When the store holds several active alerts for one data store the
/// newest is treated as current and the others are deprecated.
pub fn plan_storage_fill(facts: &[StorageFillFact], active: &[Alert]) -> ReconciliationPlan {
    let mut plan = ReconciliationPlan::default();

    let mut latest: HashMap<&DataStoreName, &StorageFillFact> = HashMap::new();
    let mut order: Vec<&DataStoreName> = Vec::new();
    for fact in facts {
        if latest.insert(&fact.data_store_name, fact).is_some() {
            warn!(
                "Data store {} reported more than once in one batch, keeping the last report",
                fact.data_store_name
            );
        } else {
            order.push(&fact.data_store_name);
        }
    }

    let mut current: HashMap<&DataStoreName, (&Alert, &StorageFillAlert)> = HashMap::new();
    for alert in active.iter().filter(|alert| alert.is_active()) {
        let Some(storage) = alert.as_storage_fill() else {
            continue;
        };
        match current.entry(&storage.data_store_name) {
            Entry::Vacant(entry) => {
                entry.insert((alert, storage));
            }
            Entry::Occupied(mut entry) => {
                let (kept, _) = *entry.get();
                if alert.creation_date > kept.creation_date {
                    plan.deprecate.push(kept.id);
                    entry.insert((alert, storage));
                } else {
                    plan.deprecate.push(alert.id);
                }
            }
        }
    }

    for name in order {
        let fact = latest[name];
        match current.remove(name) {
            Some((_, existing)) if fact.matches(existing) => {
                plan.unchanged.push(name.clone());
            }
            Some((alert, _)) => {
                plan.deprecate.push(alert.id);
                plan.insert.push(fact.clone());
            }
            None => plan.insert.push(fact.clone()),
        }
    }

    // Stores no longer reported
    let mut vanished: Vec<(&DataStoreName, Uuid)> = current
        .into_iter()
        .map(|(name, (alert, _))| (name, alert.id))
        .collect();
    vanished.sort();
    plan.deprecate.extend(vanished.into_iter().map(|(_, id)| id));

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal::Decimal;

    fn fact(name: &str, filled: i64, hwm: i64, capacity: i64) -> StorageFillFact {
        StorageFillFact::new(
            name,
            Decimal::new(filled, 0),
            Decimal::new(hwm, 0),
            Decimal::new(capacity, 0),
        )
    }

    fn active_alert(name: &str, filled: i64, hwm: i64, capacity: i64) -> Alert {
        Alert::new(AlertKind::StorageFill(fact(name, filled, hwm, capacity).into()))
    }

    #[test]
    fn test_new_data_store_gets_alert() {
        let plan = plan_storage_fill(&[fact("A", 80, 70, 100)], &[]);
        assert_eq!(plan.insert, vec![fact("A", 80, 70, 100)]);
        assert!(plan.deprecate.is_empty());
    }

    #[test]
    fn test_unchanged_values_write_nothing() {
        let existing = active_alert("A", 80, 70, 100);
        let plan = plan_storage_fill(&[fact("A", 80, 70, 100)], &[existing]);
        assert!(plan.is_empty());
        assert_eq!(plan.unchanged, vec![DataStoreName::new("A")]);
    }

    #[test]
    fn test_changed_values_supersede_alert() {
        let existing = active_alert("A", 70, 60, 100);
        let plan = plan_storage_fill(&[fact("A", 80, 70, 100)], &[existing.clone()]);
        assert_eq!(plan.deprecate, vec![existing.id]);
        assert_eq!(plan.insert, vec![fact("A", 80, 70, 100)]);
    }

    #[test]
    fn test_missing_data_store_is_deprecated() {
        let a = active_alert("A", 80, 70, 100);
        let b = active_alert("B", 90, 70, 100);
        let plan = plan_storage_fill(&[fact("A", 80, 70, 100)], &[a, b.clone()]);
        assert_eq!(plan.deprecate, vec![b.id]);
        assert!(plan.insert.is_empty());
    }

    #[test]
    fn test_empty_batch_deprecates_everything() {
        let a = active_alert("A", 80, 70, 100);
        let b = active_alert("B", 90, 70, 100);
        let plan = plan_storage_fill(&[], &[a.clone(), b.clone()]);
        assert_eq!(plan.deprecate, vec![a.id, b.id]);
        assert!(plan.insert.is_empty());
    }

    #[test]
    fn test_duplicate_names_keep_last_fact() {
        let plan = plan_storage_fill(&[fact("A", 80, 70, 100), fact("A", 85, 70, 100)], &[]);
        assert_eq!(plan.insert, vec![fact("A", 85, 70, 100)]);
    }

    #[test]
    fn test_deprecated_and_foreign_alerts_are_ignored() {
        let mut old = active_alert("A", 80, 70, 100);
        old.deprecate();
        let missing = Alert::new(AlertKind::MissingBackup(
            crate::alerting::model::MissingBackupAlert {
                reference_date: Utc::now(),
            },
        ));

        let plan = plan_storage_fill(&[fact("A", 80, 70, 100)], &[old, missing]);
        assert_eq!(plan.insert.len(), 1);
        assert!(plan.deprecate.is_empty());
    }

    #[test]
    fn test_several_active_alerts_for_one_store_collapse_to_newest() {
        let now = Utc::now();
        let older = Alert::new_at(
            AlertKind::StorageFill(fact("A", 75, 70, 100).into()),
            now - Duration::hours(1),
        );
        let newer = Alert::new_at(AlertKind::StorageFill(fact("A", 80, 70, 100).into()), now);

        let plan = plan_storage_fill(&[fact("A", 80, 70, 100)], &[newer, older.clone()]);
        assert_eq!(plan.deprecate, vec![older.id]);
        assert!(plan.insert.is_empty());
        assert_eq!(plan.unchanged.len(), 1);
    }

    #[test]
    fn test_new_alerts_are_active_and_share_timestamp() {
        let plan = plan_storage_fill(&[fact("A", 80, 70, 100), fact("B", 90, 70, 100)], &[]);
        let now = Utc::now();
        let alerts = plan.new_alerts(now);
        assert_eq!(alerts.len(), 2);
        assert!(alerts.iter().all(|a| a.is_active() && a.creation_date == now));
        assert_ne!(alerts[0].id, alerts[1].id);
    }
}
