use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{ForwardBotError, Result};
use crate::plugins::manager::DEFAULT_COMMAND_PREFIX;

pub const DEFAULT_DB_PATH: &str = "./data/forward-bot.db";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 7879;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    pub db_path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CommandsConfig {
    pub prefix: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DeliveryConfig {
    pub url: Option<String>,
    pub token: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DaemonConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub commands: CommandsConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    #[serde(default)]
    pub daemon: DaemonConfig,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| ForwardBotError::Config(e.to_string()))?;
        let config: Config =
            serde_json::from_str(&content).map_err(|e| ForwardBotError::Config(e.to_string()))?;
        Ok(config)
    }

    pub fn db_path(&self) -> &str {
        non_empty(self.storage.db_path.as_deref()).unwrap_or(DEFAULT_DB_PATH)
    }

    pub fn command_prefix(&self) -> &str {
        self.commands
            .prefix
            .as_deref()
            .unwrap_or(DEFAULT_COMMAND_PREFIX)
    }

    pub fn delivery_url(&self) -> Option<&str> {
        non_empty(self.delivery.url.as_deref())
    }

    pub fn host(&self) -> &str {
        non_empty(self.daemon.host.as_deref()).unwrap_or(DEFAULT_HOST)
    }

    pub fn port(&self) -> u16 {
        self.daemon.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn daemon_token(&self) -> &str {
        self.daemon.token.as_deref().unwrap_or_default()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_empty_config() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.db_path(), DEFAULT_DB_PATH);
        assert_eq!(config.command_prefix(), "/");
        assert_eq!(config.delivery_url(), None);
        assert_eq!(config.host(), DEFAULT_HOST);
        assert_eq!(config.port(), DEFAULT_PORT);
        assert_eq!(config.daemon_token(), "");
    }

    #[test]
    fn blank_values_fall_back() {
        let config: Config = serde_json::from_str(
            r#"{"storage":{"db_path":"  "},"delivery":{"url":""},"commands":{"prefix":"!"}}"#,
        )
        .unwrap();
        assert_eq!(config.db_path(), DEFAULT_DB_PATH);
        assert_eq!(config.delivery_url(), None);
        assert_eq!(config.command_prefix(), "!");
    }
}
