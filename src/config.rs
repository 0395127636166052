//! Service configuration.
//!
//! Non-secret settings come from an optional TOML file named by
//! `DAYBRIEF_CONFIG`; every section falls back to defaults. Secrets are read
//! only from the environment. [`AppConfig::load`] validates everything once
//! and reports every missing key together.

use chrono::Weekday;
use chrono_tz::Tz;
use daybrief_agenda::AgendaConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Env var naming the TOML config file.
pub const CONFIG_PATH_ENV: &str = "DAYBRIEF_CONFIG";
pub const WHATSAPP_ACCESS_TOKEN_ENV: &str = "WHATSAPP_ACCESS_TOKEN";
pub const WHATSAPP_PHONE_NUMBER_ID_ENV: &str = "WHATSAPP_PHONE_NUMBER_ID";
pub const WHATSAPP_VERIFY_TOKEN_ENV: &str = "WHATSAPP_VERIFY_TOKEN";
pub const TRIGGER_TOKEN_ENV: &str = "DAYBRIEF_TRIGGER_TOKEN";

/// Configuration failure detected at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required configuration: {}", .0.join(", "))]
    Missing(Vec<String>),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub gateway: GatewayConfig,
    pub agenda: AgendaConfig,
    pub schedule: ScheduleConfig,
    pub logging: LoggingConfig,
    pub store: StoreConfig,
    /// IANA zone used for profiles without a valid timezone.
    pub default_timezone: String,
    #[serde(skip)]
    pub secrets: Secrets,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            agenda: AgendaConfig::default(),
            schedule: ScheduleConfig::default(),
            logging: LoggingConfig::default(),
            store: StoreConfig::default(),
            default_timezone: "UTC".to_owned(),
            secrets: Secrets::default(),
        }
    }
}

/// HTTP listener for triggers and provider webhooks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8787,
        }
    }
}

/// Automatic digest delivery times, in each profile's local time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub enabled: bool,
    pub daily_hour: u32,
    pub daily_minute: u32,
    pub weekly_day: Weekday,
    pub weekly_hour: u32,
    pub weekly_minute: u32,
    /// Seconds between scheduler ticks.
    pub tick_seconds: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            daily_hour: 7,
            daily_minute: 0,
            weekly_day: Weekday::Sat,
            weekly_hour: 21,
            weekly_minute: 0,
            tick_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// When set, logs are also written to a daily-rotated file here.
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite database path. Defaults to the platform data directory.
    pub path: Option<PathBuf>,
}

impl StoreConfig {
    /// Effective database path.
    pub fn resolved_path(&self) -> PathBuf {
        if let Some(path) = &self.path {
            return path.clone();
        }
        dirs::data_dir()
            .map(|dir| dir.join("daybrief"))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("profiles.db")
    }
}

/// Secrets read from the environment.
#[derive(Clone, Default)]
pub struct Secrets {
    pub whatsapp_access_token: String,
    pub whatsapp_phone_number_id: String,
    pub whatsapp_verify_token: String,
    pub trigger_token: String,
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("whatsapp_access_token", &"<redacted>")
            .field("whatsapp_phone_number_id", &self.whatsapp_phone_number_id)
            .field("whatsapp_verify_token", &"<redacted>")
            .field("trigger_token", &"<redacted>")
            .finish()
    }
}

impl AppConfig {
    /// Load from `DAYBRIEF_CONFIG` (if set) and the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] naming every absent secret, or the
    /// first file/validation error encountered.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Like [`AppConfig::load`], reading variables through `lookup`.
    pub fn load_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = match lookup(CONFIG_PATH_ENV).filter(|p| !p.trim().is_empty()) {
            Some(path) => Self::from_file(Path::new(path.trim()))?,
            None => Self::default(),
        };

        let mut missing = Vec::new();
        let mut secret = |key: &str| -> String {
            match lookup(key).map(|v| v.trim().to_owned()) {
                Some(value) if !value.is_empty() => value,
                _ => {
                    missing.push(key.to_owned());
                    String::new()
                }
            }
        };
        config.secrets = Secrets {
            whatsapp_access_token: secret(WHATSAPP_ACCESS_TOKEN_ENV),
            whatsapp_phone_number_id: secret(WHATSAPP_PHONE_NUMBER_ID_ENV),
            whatsapp_verify_token: secret(WHATSAPP_VERIFY_TOKEN_ENV),
            trigger_token: secret(TRIGGER_TOKEN_ENV),
        };
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse non-secret settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Validate the non-secret settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.default_zone()?;
        self.agenda
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        let schedule = &self.schedule;
        for (name, hour, minute) in [
            ("daily", schedule.daily_hour, schedule.daily_minute),
            ("weekly", schedule.weekly_hour, schedule.weekly_minute),
        ] {
            if hour > 23 || minute > 59 {
                return Err(ConfigError::Invalid(format!(
                    "schedule.{name} time {hour:02}:{minute:02} is not a valid time of day"
                )));
            }
        }
        if schedule.tick_seconds == 0 {
            return Err(ConfigError::Invalid(
                "schedule.tick_seconds must be greater than 0".into(),
            ));
        }
        if self.gateway.host.trim().is_empty() {
            return Err(ConfigError::Invalid("gateway.host must not be empty".into()));
        }
        Ok(())
    }

    /// Parsed [`AppConfig::default_timezone`].
    pub fn default_zone(&self) -> Result<Tz, ConfigError> {
        self.default_timezone.parse::<Tz>().map_err(|_| {
            ConfigError::Invalid(format!(
                "default_timezone '{}' is not an IANA zone",
                self.default_timezone
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn full_env() -> Vec<(&'static str, &'static str)> {
        vec![
            (WHATSAPP_ACCESS_TOKEN_ENV, "access"),
            (WHATSAPP_PHONE_NUMBER_ID_ENV, "10001"),
            (WHATSAPP_VERIFY_TOKEN_ENV, "verify"),
            (TRIGGER_TOKEN_ENV, "trigger"),
        ]
    }

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().expect("defaults validate");
        assert_eq!(config.default_zone().unwrap(), Tz::UTC);
        assert_eq!(config.schedule.weekly_day, Weekday::Sat);
        assert_eq!(config.schedule.daily_hour, 7);
    }

    #[test]
    fn every_missing_secret_is_reported() {
        let err = AppConfig::load_with(env(&[(WHATSAPP_PHONE_NUMBER_ID_ENV, "10001")]))
            .expect_err("secrets missing");
        match err {
            ConfigError::Missing(keys) => assert_eq!(
                keys,
                vec![
                    WHATSAPP_ACCESS_TOKEN_ENV.to_owned(),
                    WHATSAPP_VERIFY_TOKEN_ENV.to_owned(),
                    TRIGGER_TOKEN_ENV.to_owned(),
                ]
            ),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn blank_secret_counts_as_missing() {
        let mut pairs = full_env();
        pairs[0] = (WHATSAPP_ACCESS_TOKEN_ENV, "   ");
        let err = AppConfig::load_with(env(&pairs)).expect_err("blank token");
        assert!(err.to_string().contains(WHATSAPP_ACCESS_TOKEN_ENV));
    }

    #[test]
    fn loads_file_and_secrets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daybrief.toml");
        std::fs::write(
            &path,
            r#"
default_timezone = "Europe/London"

[gateway]
port = 9100

[schedule]
weekly_day = "sun"
weekly_hour = 18

[agenda]
max_pages = 2
"#,
        )
        .unwrap();
        let path_str = path.to_string_lossy().into_owned();
        let mut pairs = full_env();
        pairs.push((CONFIG_PATH_ENV, path_str.as_str()));

        let config = AppConfig::load_with(env(&pairs)).expect("load");
        assert_eq!(config.gateway.port, 9100);
        assert_eq!(config.gateway.host, "127.0.0.1");
        assert_eq!(config.schedule.weekly_day, Weekday::Sun);
        assert_eq!(config.schedule.weekly_hour, 18);
        assert_eq!(config.schedule.daily_hour, 7);
        assert_eq!(config.agenda.max_pages, 2);
        assert_eq!(config.default_zone().unwrap(), chrono_tz::Europe::London);
        assert_eq!(config.secrets.trigger_token, "trigger");
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let config = AppConfig {
            default_timezone: "Mars/Olympus".into(),
            ..Default::default()
        };
        let err = config.validate().expect_err("bad zone");
        assert!(err.to_string().contains("Mars/Olympus"));
    }

    #[test]
    fn out_of_range_schedule_is_rejected() {
        let mut config = AppConfig::default();
        config.schedule.daily_hour = 24;
        assert!(config.validate().is_err());
    }

    #[test]
    fn secrets_are_redacted_in_debug() {
        let secrets = Secrets {
            whatsapp_access_token: "EAAG-secret".into(),
            trigger_token: "hunter2".into(),
            ..Default::default()
        };
        let rendered = format!("{secrets:?}");
        assert!(!rendered.contains("EAAG-secret"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn store_path_override_wins() {
        let store = StoreConfig {
            path: Some(PathBuf::from("/var/lib/daybrief/p.db")),
        };
        assert_eq!(store.resolved_path(), PathBuf::from("/var/lib/daybrief/p.db"));
        assert!(StoreConfig::default().resolved_path().ends_with("profiles.db"));
    }
}
