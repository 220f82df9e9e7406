//! Configuration loading and management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Runtime configuration of the HTTP server
///
/// Loaded from YAML, then overridden from the environment:
///
/// | Variable                   | Field             |
/// |----------------------------|-------------------|
/// | `EMPORIUM_HOST`            | `host`            |
/// | `EMPORIUM_PORT`            | `port`            |
/// | `DATABASE_URL`             | `database_url`    |
/// | `EMPORIUM_MAX_CONNECTIONS` | `max_connections` |
/// | `RUST_LOG`                 | `log_filter`      |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,

    /// TCP port to bind
    pub port: u16,

    /// PostgreSQL connection string; the in-memory store is used when absent
    pub database_url: Option<String>,

    /// Size of the database connection pool
    pub max_connections: u32,

    /// `tracing_subscriber::EnvFilter` directive
    pub log_filter: String,

    /// Attach a permissive CORS layer
    pub cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            database_url: None,
            max_connections: 5,
            log_filter: "info,emporium=debug".to_string(),
            cors: false,
        }
    }
}

impl ServerConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path))?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(host) = lookup("EMPORIUM_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("EMPORIUM_PORT") {
            self.port = port
                .parse()
                .with_context(|| format!("EMPORIUM_PORT is not a port number: {}", port))?;
        }
        if let Some(url) = lookup("DATABASE_URL") {
            self.database_url = Some(url).filter(|u| !u.is_empty());
        }
        if let Some(max) = lookup("EMPORIUM_MAX_CONNECTIONS") {
            self.max_connections = max.parse().with_context(|| {
                format!("EMPORIUM_MAX_CONNECTIONS is not a number: {}", max)
            })?;
        }
        if let Some(filter) = lookup("RUST_LOG") {
            self.log_filter = filter;
        }
        Ok(self)
    }

    /// `host:port` string to bind
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
