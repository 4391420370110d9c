//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use crate::application::errors::ConfigError;

/// Bot configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub webex: WebexConfig,
    pub bot: BotConfig,
    pub apic: ApicConfig,
    pub refresh: RefreshConfig,
}

/// Messaging platform access
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct WebexConfig {
    pub token: String,
    pub api_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BotConfig {
    /// Public base URL the platform posts webhooks to
    pub url: String,
    pub listen_addr: String,
}

/// Fabric controller access
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ApicConfig {
    pub url: String,
    pub username: String,
    pub password: String,
    pub timeout_secs: u64,
    /// Accept self-signed controller certificates
    pub insecure: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RefreshConfig {
    pub token_secs: u64,
    pub subscription_secs: u64,
}

impl Default for WebexConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_url: "https://webexapis.com".to_string(),
            timeout_secs: 10,
        }
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            listen_addr: "0.0.0.0:7001".to_string(),
        }
    }
}

impl Default for ApicConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            username: String::new(),
            password: String::new(),
            timeout_secs: 10,
            insecure: true,
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            token_secs: 180,
            subscription_secs: 60,
        }
    }
}

fn parse_value<T: std::str::FromStr>(field: &str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        field: field.to_string(),
        value,
    })
}

fn parse_bool(field: &str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value,
        }),
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self)
            .map_err(|e| ConfigError::Parse(format!("Failed to serialize config: {}", e)))
    }

    /// Build the runtime configuration: defaults, then the optional YAML
    /// file, then `.env`, then the process environment
    pub fn resolve(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };

        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", path.display());
        }

        base.with_overrides(|key| std::env::var(key).ok())?.validated()
    }

    /// Apply variables found through `lookup` on top of `self`
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("WEBEX_TOKEN") {
            self.webex.token = v;
        }
        if let Some(v) = lookup("WEBEX_API_URL") {
            self.webex.api_url = v;
        }
        if let Some(v) = lookup("WEBEX_TIMEOUT_SECS") {
            self.webex.timeout_secs = parse_value("WEBEX_TIMEOUT_SECS", v)?;
        }
        if let Some(v) = lookup("BOT_URL") {
            self.bot.url = v;
        }
        if let Some(v) = lookup("LISTEN_ADDR") {
            self.bot.listen_addr = v;
        }
        if let Some(v) = lookup("APIC_URL") {
            self.apic.url = v;
        }
        if let Some(v) = lookup("APIC_USERNAME") {
            self.apic.username = v;
        }
        if let Some(v) = lookup("APIC_PASSWORD") {
            self.apic.password = v;
        }
        if let Some(v) = lookup("APIC_TIMEOUT_SECS") {
            self.apic.timeout_secs = parse_value("APIC_TIMEOUT_SECS", v)?;
        }
        if let Some(v) = lookup("APIC_INSECURE") {
            self.apic.insecure = parse_bool("APIC_INSECURE", v)?;
        }
        if let Some(v) = lookup("TOKEN_REFRESH_SECS") {
            self.refresh.token_secs = parse_value("TOKEN_REFRESH_SECS", v)?;
        }
        if let Some(v) = lookup("SUBSCRIPTION_REFRESH_SECS") {
            self.refresh.subscription_secs = parse_value("SUBSCRIPTION_REFRESH_SECS", v)?;
        }
        Ok(self)
    }

    /// Reject configurations missing a required setting
    pub fn validated(self) -> Result<Self, ConfigError> {
        let required = [
            ("WEBEX_TOKEN", &self.webex.token),
            ("BOT_URL", &self.bot.url),
            ("APIC_URL", &self.apic.url),
            ("APIC_USERNAME", &self.apic.username),
            ("APIC_PASSWORD", &self.apic.password),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingField(name.to_string()));
            }
        }
        if self.refresh.token_secs == 0 || self.refresh.subscription_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "refresh".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(self)
    }

    pub fn token_refresh(&self) -> Duration {
        Duration::from_secs(self.refresh.token_secs)
    }

    pub fn subscription_refresh(&self) -> Duration {
        Duration::from_secs(self.refresh.subscription_secs)
    }

    pub fn apic_timeout(&self) -> Duration {
        Duration::from_secs(self.apic.timeout_secs)
    }

    pub fn webex_timeout(&self) -> Duration {
        Duration::from_secs(self.webex.timeout_secs)
    }
}
