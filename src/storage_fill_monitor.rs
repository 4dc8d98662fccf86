use backup_monitor::{
    init_logging, AlertingService, AnalyzerClient, AppConfig, InMemoryStore, LogTransport,
    MailNotifier, MailReceiverRegistry, MailTransport, WebhookTransport,
};
use log::{error, info};
use std::sync::Arc;
use tokio::time::{interval, MissedTickBehavior};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    init_logging(config.log_level, None)?;

    info!(
        "Starting storage fill monitor (analyzer {}, every {}s)",
        config.analyzer_url,
        config.refresh_interval.as_secs()
    );

    let transport: Arc<dyn MailTransport> = match &config.mail_webhook_url {
        Some(url) => {
            info!("Delivering alert mails through {}", url);
            Arc::new(WebhookTransport::new(url.clone()))
        }
        None => Arc::new(LogTransport),
    };

    let receivers = MailReceiverRegistry::new();
    let seeded = receivers.add_all(&config.mail_receivers).await?;
    info!("Mail receivers registered: {}", seeded.len());
    let notifier = MailNotifier::new(receivers, transport, config.mail_config());

    let store = InMemoryStore::new();
    let service = AlertingService::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(store),
        Arc::new(notifier),
    )
    .with_thresholds(config.thresholds);

    let created = service.ensure_alert_types_exist().await?;
    info!("Alert catalog ready ({} types created)", created.len());

    let analyzer = AnalyzerClient::new(config.analyzer_url.clone());

    let mut ticker = interval(config.refresh_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match service.refresh_storage_fill(&analyzer).await {
                    Ok(report) => info!(
                        "Refresh done: {} inserted, {} deprecated, {} unchanged, {} notified",
                        report.inserted.len(),
                        report.deprecated.len(),
                        report.unchanged,
                        report.notified
                    ),
                    Err(e) => error!("Storage fill refresh failed: {}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down storage fill monitor");
                break;
            }
        }
    }

    Ok(())
}
