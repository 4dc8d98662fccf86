use crate::alerting::rules::RuleThresholds;
use crate::notify::MailConfig;
use log::LevelFilter;
use rust_decimal::Decimal;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 300;

/// Runtime configuration, read from the environment
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Base URL of the analyzer service
    pub analyzer_url: String,
    /// When false alert mails are only logged
    pub mailing_active: bool,
    /// Mail relay endpoint; mails are logged when unset
    pub mail_webhook_url: Option<String>,
    /// Addresses seeded into the mail receiver registry at startup
    pub mail_receivers: Vec<String>,
    pub log_level: LevelFilter,
    pub thresholds: RuleThresholds,
    pub refresh_interval: Duration,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its value
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let analyzer_url = get("ANALYZER_URL")
            .ok_or_else(|| ConfigError::Missing("ANALYZER_URL".to_string()))?;

        // Anything but an explicit "false" keeps mailing on
        let mailing_active =
            get("MAILING_ACTIVE").map_or(true, |v| !v.eq_ignore_ascii_case("false"));

        let mail_receivers = get("MAIL_RECEIVERS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|mail| !mail.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let log_level = match get("LOG_LEVEL") {
            Some(level) => LevelFilter::from_str(&level)
                .map_err(|_| ConfigError::Invalid("LOG_LEVEL".to_string(), level))?,
            None => LevelFilter::Info,
        };

        let mut thresholds = RuleThresholds::default();
        if let Some(raw) = get("SIZE_ALERT_THRESHOLD") {
            thresholds.size_change = Decimal::from_str(&raw)
                .ok()
                .filter(|t| !t.is_sign_negative())
                .ok_or(ConfigError::Invalid("SIZE_ALERT_THRESHOLD".to_string(), raw))?;
        }
        if let Some(raw) = get("CREATION_TIME_TOLERANCE_MINUTES") {
            let minutes: u32 = raw.parse().map_err(|_| {
                ConfigError::Invalid("CREATION_TIME_TOLERANCE_MINUTES".to_string(), raw)
            })?;
            thresholds.creation_time_tolerance = chrono::Duration::minutes(i64::from(minutes));
        }

        let refresh_secs = match get("REFRESH_INTERVAL_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::Invalid("REFRESH_INTERVAL_SECS".to_string(), raw))?,
            None => DEFAULT_REFRESH_INTERVAL_SECS,
        };

        Ok(Self {
            analyzer_url,
            mailing_active,
            mail_webhook_url: get("MAIL_WEBHOOK_URL"),
            mail_receivers,
            log_level,
            thresholds,
            refresh_interval: Duration::from_secs(refresh_secs),
        })
    }

    pub fn mail_config(&self) -> MailConfig {
        MailConfig {
            mailing_active: self.mailing_active,
            ..MailConfig::default()
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(String),
    Invalid(String, String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(var) => {
                write!(f, "environment variable '{}' is not set", var)
            }
            ConfigError::Invalid(var, value) => {
                write!(f, "environment variable '{}' has invalid value '{}'", var, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("ANALYZER_URL", "http://analyzer:8000")]).unwrap();
        assert_eq!(config.analyzer_url, "http://analyzer:8000");
        assert!(config.mailing_active);
        assert_eq!(config.mail_webhook_url, None);
        assert_eq!(config.log_level, LevelFilter::Info);
        assert!(config.mail_receivers.is_empty());
        assert_eq!(config.thresholds, RuleThresholds::default());
        assert_eq!(config.refresh_interval, Duration::from_secs(300));
    }

    #[test]
    fn test_missing_analyzer_url() {
        assert_eq!(
            load(&[]).unwrap_err(),
            ConfigError::Missing("ANALYZER_URL".to_string())
        );
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("ANALYZER_URL", "http://analyzer"),
            ("MAILING_ACTIVE", "false"),
            ("MAIL_WEBHOOK_URL", "http://relay/mail"),
            ("LOG_LEVEL", "debug"),
            ("MAIL_RECEIVERS", " ops@example.com, ,backup@example.com "),
            ("SIZE_ALERT_THRESHOLD", "0.5"),
            ("CREATION_TIME_TOLERANCE_MINUTES", "30"),
            ("REFRESH_INTERVAL_SECS", "60"),
        ])
        .unwrap();
        assert!(!config.mailing_active);
        assert!(!config.mail_config().mailing_active);
        assert_eq!(config.mail_webhook_url.as_deref(), Some("http://relay/mail"));
        assert_eq!(config.log_level, LevelFilter::Debug);
        assert_eq!(
            config.mail_receivers,
            vec!["ops@example.com".to_string(), "backup@example.com".to_string()]
        );
        assert_eq!(config.thresholds.size_change, Decimal::new(5, 1));
        assert_eq!(
            config.thresholds.creation_time_tolerance,
            chrono::Duration::minutes(30)
        );
        assert_eq!(config.refresh_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_invalid_values() {
        let err = load(&[("ANALYZER_URL", "x"), ("SIZE_ALERT_THRESHOLD", "-0.1")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(var, _) if var == "SIZE_ALERT_THRESHOLD"));

        let err = load(&[("ANALYZER_URL", "x"), ("REFRESH_INTERVAL_SECS", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(var, _) if var == "REFRESH_INTERVAL_SECS"));

        let err = load(&[("ANALYZER_URL", "x"), ("LOG_LEVEL", "loud")]).unwrap_err();
        assert!(err.to_string().contains("LOG_LEVEL"));
    }
}
