//! Alert mails.
//!
//! Every alert kind maps to a reason line, a longer description and either a
//! value/reference value pair (`alertMail` template) or a single info row
//! (`alertMailOneInfoRow` template).

use crate::alerting::alert_type::AlertType;
use crate::alerting::model::{Alert, AlertKind};
use crate::alerting::rules::{evaluate_size, Direction};
use crate::error::Result;
use crate::notify::receivers::MailReceiverRegistry;
use crate::traits::{AlertNotifier, MailTransport, OutgoingMail};
use async_trait::async_trait;
use log::{debug, info};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;

pub const ALERT_MAIL_SUBJECT: &str = "Alert has been triggered";

const TEMPLATE_TWO_VALUES: &str = "alertMail";
const TEMPLATE_ONE_INFO_ROW: &str = "alertMailOneInfoRow";
const EMPTY: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailConfig {
    /// When false mails are logged instead of sent
    pub mailing_active: bool,
    pub subject: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            mailing_active: true,
            subject: ALERT_MAIL_SUBJECT.to_string(),
        }
    }
}

#[derive(Default)]
struct MailContent {
    reason: String,
    description: String,
    value: Option<String>,
    reference_value: Option<String>,
    info: Option<String>,
    value_column_name: &'static str,
    reference_value_column_name: &'static str,
    info_column_name: &'static str,
}

fn describe(kind: &AlertKind) -> MailContent {
    match kind {
        AlertKind::Size(alert) => {
            // The threshold does not matter here, only the delta
            let evaluation = evaluate_size(alert.size, alert.reference_size, Decimal::ZERO);
            let percentage = evaluation
                .percentage_delta
                .map(|p| p.normalize().to_string())
                .unwrap_or_else(|| "Infinity".to_string());
            let change = if evaluation.direction == Direction::Decrease {
                "decreased"
            } else {
                "increased"
            };
            MailContent {
                reason: format!("Size of latest Backup {} by {} %", change, percentage),
                description: format!(
                    "Size of latest Backup {} by {}% compared to the previous Backup. \
                     This could indicate a problem with the Backup.",
                    change, percentage
                ),
                value: Some(alert.size.to_string()),
                reference_value: Some(alert.reference_size.to_string()),
                value_column_name: "Size of backup",
                reference_value_column_name: "Size of previous backup",
                ..MailContent::default()
            }
        }
        AlertKind::CreationDate(alert) => MailContent {
            reason: "Backup was started at an unusual time".to_string(),
            description: format!(
                "Backup was started at {}, but based on the defined schedule, \
                 it should have been started at around {}",
                alert.date, alert.reference_date
            ),
            value: Some(alert.date.to_string()),
            reference_value: Some(alert.reference_date.to_string()),
            value_column_name: "Creation Date of Backup",
            reference_value_column_name: "Date the backup should have been started",
            ..MailContent::default()
        },
        AlertKind::StorageFill(alert) => MailContent {
            reason: "Less available storage space than expected".to_string(),
            description: format!(
                "The current storage fill is {}, which is above the threshold of {}. \
                 This indicates insufficient available storage space. Maximum capacity is {}",
                alert.filled.normalize(),
                alert.high_water_mark.normalize(),
                alert.capacity.normalize()
            ),
            value: Some(alert.filled.normalize().to_string()),
            reference_value: Some(alert.high_water_mark.normalize().to_string()),
            value_column_name: "Storage Fill Value",
            reference_value_column_name: "Available storage the system should have",
            ..MailContent::default()
        },
        AlertKind::MissingBackup(alert) => MailContent {
            reason: "Backup was scheduled but not started".to_string(),
            description: format!(
                "According to the schedule there should have been a backup started at {}",
                alert.reference_date
            ),
            info: Some(alert.reference_date.to_string()),
            info_column_name: "Scheduled Date",
            ..MailContent::default()
        },
        AlertKind::AdditionalBackup(alert) => MailContent {
            reason: "Backup was started but not scheduled".to_string(),
            description: format!(
                "A backup was started at {} without being scheduled",
                alert.date
            ),
            info: Some(alert.date.to_string()),
            info_column_name: "Creation Date",
            ..MailContent::default()
        },
    }
}

/// Pick the template for `alert` and build its context
pub fn render_alert_mail(alert: &Alert) -> (&'static str, BTreeMap<String, String>) {
    let content = describe(&alert.kind);
    let template = if content.info.is_some() {
        TEMPLATE_ONE_INFO_ROW
    } else {
        TEMPLATE_TWO_VALUES
    };

    let or_empty = |value: Option<String>| value.unwrap_or_else(|| EMPTY.to_string());
    let backup = alert.backup();

    let mut context = BTreeMap::new();
    context.insert("reason".to_string(), content.reason);
    context.insert("description".to_string(), content.description);
    context.insert("value".to_string(), or_empty(content.value));
    context.insert("referenceValue".to_string(), or_empty(content.reference_value));
    context.insert("info".to_string(), or_empty(content.info));
    context.insert("valueColumnName".to_string(), content.value_column_name.to_string());
    context.insert(
        "referenceValueColumnName".to_string(),
        content.reference_value_column_name.to_string(),
    );
    context.insert("infoColumnName".to_string(), content.info_column_name.to_string());
    context.insert(
        "backupId".to_string(),
        or_empty(backup.map(|b| b.id.to_string())),
    );
    context.insert(
        "creationDate".to_string(),
        or_empty(backup.map(|b| b.creation_date.to_string())),
    );

    (template, context)
}

/// Mails every new alert to all registered receivers
pub struct MailNotifier {
    receivers: MailReceiverRegistry,
    transport: Arc<dyn MailTransport>,
    config: MailConfig,
}

impl MailNotifier {
    pub fn new(
        receivers: MailReceiverRegistry,
        transport: Arc<dyn MailTransport>,
        config: MailConfig,
    ) -> Self {
        Self {
            receivers,
            transport,
            config,
        }
    }

    pub fn receivers(&self) -> &MailReceiverRegistry {
        &self.receivers
    }
}

#[async_trait]
impl AlertNotifier for MailNotifier {
    async fn notify(&self, alert: &Alert, alert_type: &AlertType) -> Result<()> {
        let recipients = self.receivers.addresses().await;
        if recipients.is_empty() {
            debug!("No mail receivers found. Skipping mail for alert {}", alert.id);
            return Ok(());
        }

        let (template, context) = render_alert_mail(alert);
        let mail = OutgoingMail {
            recipients,
            subject: self.config.subject.clone(),
            template: template.to_string(),
            context,
        };

        if !self.config.mailing_active {
            info!(
                "Mailing is disabled. Would have sent {} mail to {} with subject \"{}\"",
                alert_type.name,
                mail.recipients.join(","),
                mail.subject
            );
            return Ok(());
        }

        debug!(
            "Sending {} mail to {} with subject \"{}\"",
            alert_type.name,
            mail.recipients.join(","),
            mail.subject
        );
        self.transport.send(&mail).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerting::alert_type::Severity;
    use crate::alerting::model::{
        Backup, BackupType, MissingBackupAlert, SizeAlert, StorageFillFact,
    };
    use crate::error::AlertingError;
    use crate::notify::receivers::CreateMailReceiver;
    use crate::traits::notifier::MockMailTransport;
    use crate::types::Megabytes;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn storage_alert() -> Alert {
        let fact = StorageFillFact::new(
            "pool-1",
            Decimal::new(80, 0),
            Decimal::new(70, 0),
            Decimal::new(100, 0),
        );
        Alert::new(AlertKind::StorageFill(fact.into()))
    }

    fn size_alert(size: i64, reference: i64) -> Alert {
        let backup = Backup {
            id: Uuid::new_v4(),
            task_id: None,
            backup_type: BackupType::Full,
            creation_date: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
            size: Megabytes::new(Decimal::new(size, 0)),
        };
        Alert::new(AlertKind::Size(SizeAlert {
            backup,
            size: Megabytes::new(Decimal::new(size, 0)),
            reference_size: Megabytes::new(Decimal::new(reference, 0)),
        }))
    }

    async fn registry_with_receiver() -> MailReceiverRegistry {
        let registry = MailReceiverRegistry::new();
        registry
            .add(CreateMailReceiver {
                mail: "ops@example.com".to_string(),
            })
            .await
            .unwrap();
        registry
    }

    fn storage_type() -> AlertType {
        AlertType::new("STORAGE_FILL_ALERT", Severity::Warning, true)
    }

    #[test]
    fn test_render_storage_fill_mail() {
        let (template, context) = render_alert_mail(&storage_alert());
        assert_eq!(template, "alertMail");
        assert_eq!(context["reason"], "Less available storage space than expected");
        assert_eq!(
            context["description"],
            "The current storage fill is 80, which is above the threshold of 70. \
             This indicates insufficient available storage space. Maximum capacity is 100"
        );
        assert_eq!(context["value"], "80");
        assert_eq!(context["referenceValue"], "70");
        assert_eq!(context["backupId"], "-");
        assert_eq!(context["creationDate"], "-");
    }

    #[test]
    fn test_render_size_mail_percentages() {
        let (_, context) = render_alert_mail(&size_alert(50, 100));
        assert_eq!(context["reason"], "Size of latest Backup decreased by 50 %");
        assert_eq!(context["value"], "50 MB");

        let (_, context) = render_alert_mail(&size_alert(150, 100));
        assert_eq!(context["reason"], "Size of latest Backup increased by 50 %");

        let (_, context) = render_alert_mail(&size_alert(10, 0));
        assert_eq!(context["reason"], "Size of latest Backup increased by Infinity %");
        assert_ne!(context["backupId"], "-");
    }

    #[test]
    fn test_render_missing_backup_uses_info_row() {
        let reference_date = Utc.with_ymd_and_hms(2024, 5, 1, 2, 0, 0).unwrap();
        let alert = Alert::new(AlertKind::MissingBackup(MissingBackupAlert { reference_date }));
        let (template, context) = render_alert_mail(&alert);
        assert_eq!(template, "alertMailOneInfoRow");
        assert_eq!(context["infoColumnName"], "Scheduled Date");
        assert_eq!(context["value"], "-");
        assert_eq!(context["info"], reference_date.to_string());
    }

    #[tokio::test]
    async fn test_notify_sends_to_all_receivers() {
        let mut transport = MockMailTransport::new();
        transport
            .expect_send()
            .withf(|mail: &OutgoingMail| {
                mail.recipients == vec!["ops@example.com".to_string()]
                    && mail.subject == ALERT_MAIL_SUBJECT
                    && mail.template == "alertMail"
            })
            .times(1)
            .returning(|_| Ok(()));

        let notifier = MailNotifier::new(
            registry_with_receiver().await,
            Arc::new(transport),
            MailConfig::default(),
        );
        notifier.notify(&storage_alert(), &storage_type()).await.unwrap();
    }

    #[tokio::test]
    async fn test_notify_without_receivers_skips_transport() {
        let mut transport = MockMailTransport::new();
        transport.expect_send().never();
        let notifier = MailNotifier::new(
            MailReceiverRegistry::new(),
            Arc::new(transport),
            MailConfig::default(),
        );
        notifier.notify(&storage_alert(), &storage_type()).await.unwrap();
    }

    #[tokio::test]
    async fn test_disabled_mailing_only_logs() {
        let mut transport = MockMailTransport::new();
        transport.expect_send().never();
        let notifier = MailNotifier::new(
            registry_with_receiver().await,
            Arc::new(transport),
            MailConfig {
                mailing_active: false,
                ..MailConfig::default()
            },
        );
        notifier.notify(&storage_alert(), &storage_type()).await.unwrap();
    }

    #[tokio::test]
    async fn test_transport_error_is_returned() {
        let mut transport = MockMailTransport::new();
        transport
            .expect_send()
            .returning(|_| Err(AlertingError::Notification("refused".to_string())));
        let notifier = MailNotifier::new(
            registry_with_receiver().await,
            Arc::new(transport),
            MailConfig::default(),
        );
        let err = notifier.notify(&storage_alert(), &storage_type()).await.unwrap_err();
        assert_eq!(err, AlertingError::Notification("refused".to_string()));
    }
}
