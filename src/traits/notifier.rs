use crate::alerting::alert_type::AlertType;
use crate::alerting::model::Alert;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Receives every newly created alert of an active alert type
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AlertNotifier: Send + Sync {
    async fn notify(&self, alert: &Alert, alert_type: &AlertType) -> Result<()>;
}

/// A rendered mail ready to be handed to a transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMail {
    pub recipients: Vec<String>,
    pub subject: String,
    pub template: String,
    pub context: BTreeMap<String, String>,
}

/// Delivers mails to their recipients
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, mail: &OutgoingMail) -> Result<()>;
}
