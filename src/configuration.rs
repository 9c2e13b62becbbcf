use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use reqwest::Url;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

use crate::domain::RecipientEmail;
use crate::pipeline::DismissTimings;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub store: StoreSettings,
    pub notification: NotificationSettings,
    pub dismiss: DismissSettings,
}

#[derive(Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
}

#[derive(Deserialize, Clone)]
pub struct StoreSettings {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub anon_key: Option<Secret<String>>,
    pub table: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

impl StoreSettings {
    /// Resolves the store credentials once, so callers never inspect raw
    /// strings at submit time.
    pub fn load(&self) -> StoreConfig {
        match self.credentials() {
            Ok(credentials) => StoreConfig::Configured(credentials),
            Err(error) => StoreConfig::Unconfigured(error),
        }
    }

    fn credentials(&self) -> Result<StoreCredentials, ConfigurationError> {
        let url = require("store.url", self.url.as_deref())?;
        let anon_key = require(
            "store.anon_key",
            self.anon_key.as_ref().map(|key| key.expose_secret().as_str()),
        )?;
        let base_url = Url::parse(url).map_err(|e| ConfigurationError::InvalidValue {
            key: "store.url",
            reason: e.to_string(),
        })?;

        Ok(StoreCredentials {
            base_url,
            anon_key: Secret::new(anon_key.to_owned()),
            table: self.table.clone(),
            timeout: Duration::from_millis(self.timeout_milliseconds),
        })
    }
}

#[derive(Debug)]
pub enum StoreConfig {
    Configured(StoreCredentials),
    Unconfigured(ConfigurationError),
}

#[derive(Debug, Clone)]
pub struct StoreCredentials {
    pub base_url: Url,
    pub anon_key: Secret<String>,
    pub table: String,
    pub timeout: Duration,
}

#[derive(Deserialize, Clone)]
pub struct NotificationSettings {
    pub base_url: String,
    pub sender: String,
    #[serde(default)]
    pub api_key: Option<Secret<String>>,
    #[serde(default)]
    pub recipient: Option<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

impl NotificationSettings {
    pub fn credentials(&self) -> Result<NotificationCredentials, ConfigurationError> {
        let api_key = require(
            "notification.api_key",
            self.api_key.as_ref().map(|key| key.expose_secret().as_str()),
        )?;
        let recipient = require("notification.recipient", self.recipient.as_deref())?;
        let recipient = RecipientEmail::parse(recipient.to_owned()).map_err(|reason| {
            ConfigurationError::InvalidValue {
                key: "notification.recipient",
                reason,
            }
        })?;
        let base_url =
            Url::parse(&self.base_url).map_err(|e| ConfigurationError::InvalidValue {
                key: "notification.base_url",
                reason: e.to_string(),
            })?;

        Ok(NotificationCredentials {
            base_url,
            sender: self.sender.clone(),
            api_key: Secret::new(api_key.to_owned()),
            recipient,
            timeout: Duration::from_millis(self.timeout_milliseconds),
        })
    }
}

#[derive(Debug, Clone)]
pub struct NotificationCredentials {
    pub base_url: Url,
    pub sender: String,
    pub api_key: Secret<String>,
    pub recipient: RecipientEmail,
    pub timeout: Duration,
}

#[derive(Deserialize, Clone)]
pub struct DismissSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub success_milliseconds: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub error_milliseconds: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub clipboard_milliseconds: u64,
    #[serde(default)]
    pub clipboard_command: Vec<String>,
}

impl DismissSettings {
    pub fn timings(&self) -> DismissTimings {
        DismissTimings {
            success: Duration::from_millis(self.success_milliseconds),
            error: Duration::from_millis(self.error_milliseconds),
        }
    }

    pub fn clipboard(&self) -> Duration {
        Duration::from_millis(self.clipboard_milliseconds)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigurationError {
    #[error("{0} is not configured")]
    Missing(&'static str),
    #[error("{0} still holds a placeholder value")]
    Placeholder(&'static str),
    #[error("{key} is invalid: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

fn require<'a>(key: &'static str, value: Option<&'a str>) -> Result<&'a str, ConfigurationError> {
    match value.map(str::trim) {
        None | Some("") => Err(ConfigurationError::Missing(key)),
        Some(v) if v.to_lowercase().contains("placeholder") => {
            Err(ConfigurationError::Placeholder(key))
        }
        Some(v) => Ok(v),
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let settings = Config::builder()
        .add_source(File::new("configuration.yaml", FileFormat::Yaml))
        .add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
