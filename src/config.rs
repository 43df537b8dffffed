// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{Result, SyncError};
use crate::utils::Validator;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_REMOTE_CALL_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncConfig {
    #[serde(default = "default_timeout_ms")]
    pub remote_call_timeout_ms: u64,
}

impl SyncConfig {
    pub fn remote_call_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_call_timeout_ms)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            remote_call_timeout_ms: DEFAULT_REMOTE_CALL_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GatewayKind {
    #[default]
    File,
    Http,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub kind: GatewayKind,
    #[serde(default = "default_registry_path")]
    pub registry_path: PathBuf,
    #[serde(default)]
    pub connections: HashMap<String, ConnectionConfig>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            kind: GatewayKind::File,
            registry_path: default_registry_path(),
            connections: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectionConfig {
    pub base_url: String,
    pub token: Option<String>,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_REMOTE_CALL_TIMEOUT_MS
}

fn default_registry_path() -> PathBuf {
    PathBuf::from("./data/repositories.json")
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder.add_source(
                config::File::from(Path::new("config/default.toml")).required(false),
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix("TEMPLATE_SYNC")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| SyncError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| SyncError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            sync: SyncConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.sync.remote_call_timeout_ms == 0 {
            return Err(SyncError::Config(
                "remote_call_timeout_ms must be greater than 0".to_string(),
            ));
        }

        for (id, connection) in &self.gateway.connections {
            Validator::validate_connection_id(id)
                .map_err(|e| SyncError::Config(e.to_string()))?;
            Validator::validate_url(&connection.base_url).map_err(|e| {
                SyncError::Config(format!("connection {}: {}", id, e))
            })?;
        }

        if self.gateway.kind == GatewayKind::Http && self.gateway.connections.is_empty() {
            return Err(SyncError::Config(
                "http gateway requires at least one [gateway.connections.<id>] entry".to_string(),
            ));
        }

        Ok(())
    }
}
