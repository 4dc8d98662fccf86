pub mod mail;
pub mod receivers;
pub mod transport;

pub use mail::{render_alert_mail, MailConfig, MailNotifier, ALERT_MAIL_SUBJECT};
pub use receivers::{CreateMailReceiver, MailReceiver, MailReceiverRegistry};
pub use transport::{LogTransport, WebhookTransport};
