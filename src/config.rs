//! Application configuration.
//!
//! Layered: built-in defaults, then an optional TOML file, then
//! `USERHUB_`-prefixed environment variables (double underscore as the
//! section separator, e.g. `USERHUB_SERVER__PORT=9090`).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::auth::TokenConfig;

const ENV_PREFIX: &str = "USERHUB";

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/userhub.db"),
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: TokenConfig,
}

impl AppConfig {
    /// Load configuration with defaults, an optional file, and env overrides.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("server.bind", ServerConfig::default().bind)?
            .set_default("server.port", ServerConfig::default().port as i64)?
            .set_default(
                "database.path",
                DatabaseConfig::default().path.display().to_string(),
            )?;

        if let Some(path) = file {
            builder = builder.add_source(
                File::from(path)
                    .format(FileFormat::Toml)
                    .required(true),
            );
        }

        let built = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .context("building configuration")?;

        built
            .try_deserialize()
            .context("deserializing configuration")
    }
}
