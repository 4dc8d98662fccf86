use crate::error::{AlertingError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Address that gets a copy of every alert mail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailReceiver {
    pub id: Uuid,
    pub mail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMailReceiver {
    pub mail: String,
}

/// Registry of mail receivers, unique by address
#[derive(Clone, Default)]
pub struct MailReceiverRegistry {
    receivers: Arc<RwLock<Vec<MailReceiver>>>,
}

impl MailReceiverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, request: CreateMailReceiver) -> Result<MailReceiver> {
        let mail = request.mail.trim().to_string();
        if mail.is_empty() || !mail.contains('@') {
            return Err(AlertingError::InvalidInput(format!(
                "'{}' is not a mail address",
                request.mail
            )));
        }

        let mut receivers = self.receivers.write().await;
        if receivers.iter().any(|r| r.mail.eq_ignore_ascii_case(&mail)) {
            return Err(AlertingError::Conflict(
                "Mail receiver already exists".to_string(),
            ));
        }

        let receiver = MailReceiver {
            id: Uuid::new_v4(),
            mail,
        };
        receivers.push(receiver.clone());
        log::info!("Added mail receiver {}", receiver.mail);
        Ok(receiver)
    }

    /// Register every address in order, stopping at the first rejected one
    pub async fn add_all(&self, mails: &[String]) -> Result<Vec<MailReceiver>> {
        let mut added = Vec::with_capacity(mails.len());
        for mail in mails {
            added.push(self.add(CreateMailReceiver { mail: mail.clone() }).await?);
        }
        Ok(added)
    }

    pub async fn remove(&self, id: Uuid) -> Result<()> {
        let mut receivers = self.receivers.write().await;
        let before = receivers.len();
        receivers.retain(|r| r.id != id);
        if receivers.len() == before {
            return Err(AlertingError::NotFound(format!(
                "Mail receiver with id {} not found",
                id
            )));
        }
        Ok(())
    }

    pub async fn list(&self) -> Vec<MailReceiver> {
        self.receivers.read().await.clone()
    }

    /// Addresses of every registered receiver
    pub async fn addresses(&self) -> Vec<String> {
        self.receivers
            .read()
            .await
            .iter()
            .map(|r| r.mail.clone())
            .collect()
    }
}
