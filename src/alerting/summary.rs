use crate::alerting::alert_type::{AlertType, AlertTypeName, Severity};
use crate::alerting::model::{Alert, AlertKind};
use crate::types::DataStoreName;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// Number of active alerts per severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertStatistics {
    pub info_alerts: usize,
    pub warning_alerts: usize,
    pub critical_alerts: usize,
}

impl AlertStatistics {
    pub fn total(&self) -> usize {
        self.info_alerts + self.warning_alerts + self.critical_alerts
    }
}

/// What a group of repeated alerts has in common besides the alert type
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RepetitionSubject {
    Task(Uuid),
    DataStore(DataStoreName),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertOccurrence {
    pub date: DateTime<Utc>,
    pub alert_id: Uuid,
}

/// Alerts of one type raised more than once for the same task or data store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepeatedAlert {
    pub alert_type: AlertTypeName,
    pub severity: Severity,
    pub subject: RepetitionSubject,
    pub count: usize,
    /// Newest first
    pub history: Vec<AlertOccurrence>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertSummary {
    #[serde(flatten)]
    pub statistics: AlertStatistics,
    pub repeated_alerts: Vec<RepeatedAlert>,
    pub most_frequent_alert: Option<RepeatedAlert>,
}

/// Count active alerts by the severity of their type, optionally only those
/// created on or after `from_date`. Alerts whose type is not in the catalog
/// are not counted.
pub fn count_by_severity(
    alerts: &[Alert],
    alert_types: &[AlertType],
    from_date: Option<NaiveDate>,
) -> AlertStatistics {
    let severities: HashMap<&str, Severity> = alert_types
        .iter()
        .map(|t| (t.name.as_str(), t.severity))
        .collect();

    let mut statistics = AlertStatistics::default();
    for alert in alerts.iter().filter(|a| a.is_active()) {
        if from_date.map_or(false, |from| alert.creation_date.date_naive() < from) {
            continue;
        }
        match severities.get(alert.type_name().as_str()) {
            Some(Severity::Info) => statistics.info_alerts += 1,
            Some(Severity::Warning) => statistics.warning_alerts += 1,
            Some(Severity::Critical) => statistics.critical_alerts += 1,
            None => {}
        }
    }
    statistics
}

fn repetition_subject(alert: &Alert) -> Option<RepetitionSubject> {
    match &alert.kind {
        AlertKind::StorageFill(storage) => {
            Some(RepetitionSubject::DataStore(storage.data_store_name.clone()))
        }
        _ => alert
            .backup()
            .and_then(|backup| backup.task_id)
            .map(RepetitionSubject::Task),
    }
}

/// Group alerts (deprecated included) by type and task or data store and
/// keep the groups with more than one member, largest first.
pub fn find_repetitions(alerts: &[Alert], alert_types: &[AlertType]) -> Vec<RepeatedAlert> {
    let severities: HashMap<&str, Severity> = alert_types
        .iter()
        .map(|t| (t.name.as_str(), t.severity))
        .collect();

    let mut groups: HashMap<(AlertTypeName, RepetitionSubject), Vec<&Alert>> = HashMap::new();
    for alert in alerts {
        if let Some(subject) = repetition_subject(alert) {
            groups
                .entry((alert.type_name(), subject))
                .or_default()
                .push(alert);
        }
    }

    let mut repeated: Vec<RepeatedAlert> = groups
        .into_iter()
        .filter(|(_, members)| members.len() > 1)
        .map(|((alert_type, subject), mut members)| {
            members.sort_by(|a, b| b.creation_date.cmp(&a.creation_date));
            RepeatedAlert {
                alert_type,
                severity: severities
                    .get(alert_type.as_str())
                    .copied()
                    .unwrap_or_default(),
                subject,
                count: members.len(),
                history: members
                    .into_iter()
                    .map(|alert| AlertOccurrence {
                        date: alert.creation_date,
                        alert_id: alert.id,
                    })
                    .collect(),
            }
        })
        .collect();

    repeated.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.alert_type.as_str().cmp(b.alert_type.as_str()))
            .then_with(|| a.subject.cmp(&b.subject))
    });
    repeated
}

pub fn summarize(alerts: &[Alert], alert_types: &[AlertType]) -> AlertSummary {
    let repeated_alerts = find_repetitions(alerts, alert_types);
    AlertSummary {
        statistics: count_by_severity(alerts, alert_types, None),
        most_frequent_alert: repeated_alerts.first().cloned(),
        repeated_alerts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerting::model::{
        Backup, BackupType, MissingBackupAlert, SizeAlert, StorageFillAlert,
    };
    use crate::types::Megabytes;
    use chrono::{Duration, TimeZone};
    use rust_decimal::Decimal;

    fn catalog() -> Vec<AlertType> {
        vec![
            AlertType::new("SIZE_ALERT", Severity::Warning, true),
            AlertType::new("STORAGE_FILL_ALERT", Severity::Critical, true),
            AlertType::new("MISSING_BACKUP_ALERT", Severity::Info, true),
        ]
    }

    fn size_alert(task: Uuid, at: DateTime<Utc>) -> Alert {
        let backup = Backup {
            id: Uuid::new_v4(),
            task_id: Some(task),
            backup_type: BackupType::Full,
            creation_date: at,
            size: Megabytes::new(Decimal::new(121, 0)),
        };
        Alert::new_at(
            AlertKind::Size(SizeAlert {
                backup,
                size: Megabytes::new(Decimal::new(121, 0)),
                reference_size: Megabytes::new(Decimal::new(100, 0)),
            }),
            at,
        )
    }

    fn storage_alert(name: &str, at: DateTime<Utc>) -> Alert {
        Alert::new_at(
            AlertKind::StorageFill(StorageFillAlert {
                data_store_name: DataStoreName::new(name),
                filled: Decimal::new(80, 0),
                high_water_mark: Decimal::new(70, 0),
                capacity: Decimal::new(100, 0),
            }),
            at,
        )
    }

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_statistics_count_active_alerts_by_severity() {
        let mut deprecated = storage_alert("A", day(1));
        deprecated.deprecate();
        let alerts = vec![
            deprecated,
            storage_alert("A", day(2)),
            size_alert(Uuid::new_v4(), day(2)),
            Alert::new_at(
                AlertKind::MissingBackup(MissingBackupAlert { reference_date: day(3) }),
                day(3),
            ),
        ];

        let stats = count_by_severity(&alerts, &catalog(), None);
        assert_eq!(
            stats,
            AlertStatistics {
                info_alerts: 1,
                warning_alerts: 1,
                critical_alerts: 1
            }
        );
        assert_eq!(stats.total(), 3);

        let stats = count_by_severity(&alerts, &catalog(), Some(day(3).date_naive()));
        assert_eq!(stats.total(), 1);
    }

    #[test]
    fn test_repetitions_group_by_task_and_data_store() {
        let task = Uuid::new_v4();
        let alerts = vec![
            size_alert(task, day(1)),
            size_alert(task, day(2)),
            size_alert(task, day(3)),
            size_alert(Uuid::new_v4(), day(3)),
            storage_alert("A", day(1)),
            storage_alert("A", day(1) + Duration::hours(5)),
            storage_alert("B", day(1)),
        ];

        let repeated = find_repetitions(&alerts, &catalog());
        assert_eq!(repeated.len(), 2);
        assert_eq!(repeated[0].subject, RepetitionSubject::Task(task));
        assert_eq!(repeated[0].count, 3);
        assert_eq!(repeated[0].history[0].date, day(3));
        assert_eq!(repeated[1].subject, RepetitionSubject::DataStore(DataStoreName::new("A")));
        assert_eq!(repeated[1].severity, Severity::Critical);
    }

    #[test]
    fn test_summary_picks_most_frequent() {
        let task = Uuid::new_v4();
        let alerts = vec![size_alert(task, day(1)), size_alert(task, day(2))];
        let summary = summarize(&alerts, &catalog());
        assert_eq!(summary.most_frequent_alert.as_ref().map(|r| r.count), Some(2));
        assert_eq!(summary.statistics.warning_alerts, 2);

        let empty = summarize(&[], &catalog());
        assert!(empty.most_frequent_alert.is_none());
    }
}
