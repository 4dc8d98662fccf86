pub mod notifier;
pub mod repository;
pub mod source;

// Re-export all traits
pub use notifier::{AlertNotifier, MailTransport, OutgoingMail};
pub use repository::{AlertRepository, AlertTypeRepository, BackupLookup};
pub use source::FactSource;
