pub mod alerting;
pub mod analyzer;
pub mod config;
pub mod error;
pub mod logging;
pub mod notify;
pub mod storage;
pub mod traits;
pub mod types;

pub use alerting::{
    Alert, AlertFilter, AlertKind, AlertOrder, AlertState, AlertType, AlertTypeName,
    AlertingService, PageRequest, ReconciliationReport, Severity, StorageFillFact,
};
pub use analyzer::AnalyzerClient;
pub use config::{AppConfig, ConfigError};
pub use error::{AlertingError, Result};
pub use logging::init_logging;
pub use notify::{LogTransport, MailConfig, MailNotifier, MailReceiverRegistry, WebhookTransport};
pub use storage::InMemoryStore;
pub use traits::{
    AlertNotifier, AlertRepository, AlertTypeRepository, BackupLookup, FactSource, MailTransport,
};
pub use types::{DataStoreName, Megabytes};
