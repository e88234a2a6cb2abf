// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Configuration management for the exercise bridge server

use crate::constants::env_config;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Port the line-delimited JSON bridge listens on.
    pub bridge_port: u16,
    /// Port the HTTP health endpoints listen on.
    pub health_port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Store backend: `agent` or `memory`.
    pub backend: String,
    /// Base URL of the on-device native agent (agent backend only).
    pub agent_base_url: String,
    /// Platform version string driving the distance capability set.
    pub platform_version: String,
    /// JSON seed file for the memory backend.
    pub seed_path: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bridge_port: env_config::bridge_port(),
            health_port: env_config::health_port(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: env_config::store_backend(),
            agent_base_url: env_config::agent_base_url(),
            platform_version: env_config::platform_version(),
            seed_path: env_config::seed_path(),
        }
    }
}

impl Config {
    /// Load from a TOML file when one exists, otherwise from the
    /// environment (`.env` honored).
    pub fn load(path: Option<String>) -> Result<Self> {
        let config_path = path.unwrap_or_else(|| {
            dirs::config_dir()
                .map(|p| p.join("exercise-bridge-server/config.toml"))
                .unwrap_or_else(|| "config.toml".into())
                .to_string_lossy()
                .to_string()
        });

        if Path::new(&config_path).exists() {
            let content =
                fs::read_to_string(&config_path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")
        } else {
            dotenv::dotenv().ok();
            Ok(Config {
                server: ServerConfig::default(),
                store: StoreConfig::default(),
            })
        }
    }

    pub fn save(&self, path: Option<String>) -> Result<()> {
        let config_path = path.unwrap_or_else(|| {
            dirs::config_dir()
                .map(|p| p.join("exercise-bridge-server/config.toml"))
                .unwrap_or_else(|| "config.toml".into())
                .to_string_lossy()
                .to_string()
        });

        let parent = Path::new(&config_path)
            .parent()
            .context("Invalid config path")?;
        fs::create_dir_all(parent)?;

        let content = toml::to_string_pretty(self)?;
        fs::write(&config_path, content)?;

        Ok(())
    }
}
