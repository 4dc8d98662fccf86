use crate::error::{AlertingError, Result};
use crate::traits::{MailTransport, OutgoingMail};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

/// Writes mails to the log instead of delivering them
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTransport;

#[async_trait]
impl MailTransport for LogTransport {
    async fn send(&self, mail: &OutgoingMail) -> Result<()> {
        info!(
            recipients = %mail.recipients.join(","),
            template = %mail.template,
            "{}: {}",
            mail.subject,
            mail.context.get("reason").map(String::as_str).unwrap_or("-")
        );
        Ok(())
    }
}

/// Posts mails as JSON to a mail relay
pub struct WebhookTransport {
    url: String,
    http_client: Client,
}

impl WebhookTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            http_client: Client::new(),
        }
    }
}

#[async_trait]
impl MailTransport for WebhookTransport {
    async fn send(&self, mail: &OutgoingMail) -> Result<()> {
        debug!(url = %self.url, recipients = mail.recipients.len(), "Posting alert mail");
        let response = self
            .http_client
            .post(&self.url)
            .json(mail)
            .send()
            .await
            .map_err(|e| AlertingError::Notification(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "Mail relay rejected alert mail");
            return Err(AlertingError::Notification(format!(
                "mail relay answered {}: {}",
                status, body
            )));
        }
        Ok(())
    }
}
