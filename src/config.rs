use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{ResponderError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub responder: ResponderConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub client: ClientConfig,
}

/// What gets sent and how replied threads are marked
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponderConfig {
    #[serde(default = "default_label_name")]
    pub label_name: String,
    #[serde(default = "default_reply_subject")]
    pub reply_subject: String,
    #[serde(default = "default_reply_body")]
    pub reply_body: String,
    /// Explicit `From` header; Gmail uses the account address when unset
    #[serde(default)]
    pub from_address: Option<String>,
    /// Unread messages fetched per tick
    #[serde(default = "default_max_unread")]
    pub max_unread: u32,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            label_name: default_label_name(),
            reply_subject: default_reply_subject(),
            reply_body: default_reply_body(),
            from_address: None,
            max_unread: default_max_unread(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum IntervalMode {
    /// Draw a fresh random delay before every tick
    #[default]
    PerTick,
    /// Draw one delay at startup and repeat it for the process lifetime
    Fixed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_min_interval_secs")]
    pub min_interval_secs: u64,
    #[serde(default = "default_max_interval_secs")]
    pub max_interval_secs: u64,
    #[serde(default)]
    pub interval_mode: IntervalMode,
    /// Arm the next tick only after the previous one finished
    #[serde(default)]
    pub serialize_ticks: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            min_interval_secs: default_min_interval_secs(),
            max_interval_secs: default_max_interval_secs(),
            interval_mode: IntervalMode::default(),
            serialize_ticks: false,
        }
    }
}

impl ScheduleConfig {
    pub fn min_interval(&self) -> Duration {
        Duration::from_secs(self.min_interval_secs)
    }

    pub fn max_interval(&self) -> Duration {
        Duration::from_secs(self.max_interval_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ClientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_label_name() -> String {
    "Vacation Auto Replies".to_string()
}

fn default_reply_subject() -> String {
    "Re: On Vacation Auto Reply".to_string()
}

fn default_reply_body() -> String {
    "Thank you for your email. I am currently on vacation and will respond as soon as possible."
        .to_string()
}

fn default_max_unread() -> u32 {
    2
}

fn default_min_interval_secs() -> u64 {
    45
}

fn default_max_interval_secs() -> u64 {
    120
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Config {
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ResponderError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            ResponderError::ConfigError(format!("Failed to parse config file: {}", e))
        })?;

        config.validate()?;

        tracing::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    ResponderError::ConfigError(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let content = toml::to_string_pretty(self).map_err(|e| {
            ResponderError::ConfigError(format!("Failed to serialize config: {}", e))
        })?;

        tokio::fs::write(path, content).await.map_err(|e| {
            ResponderError::ConfigError(format!("Failed to write config file: {}", e))
        })?;

        tracing::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let label_name = self.responder.label_name.trim();
        if label_name.is_empty() {
            return Err(ResponderError::ConfigError(
                "responder.label_name cannot be empty".to_string(),
            ));
        }

        if self.responder.reply_body.trim().is_empty() {
            return Err(ResponderError::ConfigError(
                "responder.reply_body cannot be empty".to_string(),
            ));
        }

        if !self.responder.reply_subject.starts_with("Re:") {
            return Err(ResponderError::ConfigError(
                "responder.reply_subject must start with 'Re:'".to_string(),
            ));
        }

        // Gmail caps messages.list at 500 results per page
        if self.responder.max_unread == 0 {
            return Err(ResponderError::ConfigError(
                "responder.max_unread must be at least 1".to_string(),
            ));
        }
        if self.responder.max_unread > 500 {
            return Err(ResponderError::ConfigError(
                "responder.max_unread cannot exceed 500".to_string(),
            ));
        }

        if self.schedule.min_interval_secs == 0 {
            return Err(ResponderError::ConfigError(
                "schedule.min_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.schedule.max_interval_secs <= self.schedule.min_interval_secs {
            return Err(ResponderError::ConfigError(
                "schedule.max_interval_secs must be greater than schedule.min_interval_secs"
                    .to_string(),
            ));
        }

        if self.client.request_timeout_secs == 0 {
            return Err(ResponderError::ConfigError(
                "client.request_timeout_secs must be greater than 0".to_string(),
            ));
        }

        tracing::debug!("Configuration validation passed");
        Ok(())
    }

    /// Create an example configuration file
    pub async fn create_example(path: &Path) -> Result<()> {
        let config = Self::default();
        config.save(path).await
    }
}
