//! Configuration loading.
//!
//! Settings come from an optional TOML file, then environment variables
//! override them. Deployments usually configure through the environment
//! alone, so every field has a default and no file is read unless
//! `--config` is given.
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `DATABASE_URL` | `store.url` |
//! | `DATABASE_NAME` | `store.name` |
//! | `PORT` | port of `server.bind` |
//!
//! A document store is configured only when both `url` and `name` are
//! present. Their absence is what puts the service in degraded mode.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Request body limit for multipart uploads.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}
fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Pool acquire timeout, bounding how long a ping or query may wait.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            name: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    3
}

/// Connection settings of a configured store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConnection<'a> {
    pub url: &'a str,
    pub name: &'a str,
}

impl StoreConfig {
    pub fn url_set(&self) -> bool {
        non_empty(&self.url).is_some()
    }

    pub fn name_set(&self) -> bool {
        non_empty(&self.name).is_some()
    }

    /// Returns the connection settings when both url and name are set.
    pub fn connection(&self) -> Option<StoreConnection<'_>> {
        Some(StoreConnection {
            url: non_empty(&self.url)?,
            name: non_empty(&self.name)?,
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Config {
    /// Applies `DATABASE_URL`, `DATABASE_NAME` and `PORT` from `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL") {
            self.store.url = Some(url);
        }
        if let Some(name) = lookup("DATABASE_NAME") {
            self.store.name = Some(name);
        }
        if let Some(port) = lookup("PORT") {
            let port: u16 = port
                .trim()
                .parse()
                .with_context(|| format!("PORT must be a port number, got '{}'", port))?;
            let host = self
                .server
                .bind
                .rsplit_once(':')
                .map(|(host, _)| host.to_string())
                .unwrap_or_else(|| "0.0.0.0".to_string());
            self.server.bind = format!("{}:{}", host, port);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.max_upload_bytes == 0 {
            bail!("server.max_upload_bytes must be > 0");
        }
        if self.store.timeout_secs == 0 {
            bail!("store.timeout_secs must be > 0");
        }
        if let Some(url) = non_empty(&self.store.url) {
            if !url.starts_with("sqlite:") {
                bail!(
                    "Unsupported store url '{}'. Only sqlite: urls are supported.",
                    url
                );
            }
        }
        Ok(())
    }
}

/// Parses a TOML configuration string without environment overrides.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    config.validate()?;
    Ok(config)
}

/// Loads configuration from `path` (if any) and the process environment.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            toml::from_str(&content).with_context(|| "Failed to parse config file")?
        }
        None => Config::default(),
    };

    config.apply_env(|key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}
