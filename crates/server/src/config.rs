//! Server configuration

use anyhow::{Context, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Environment variable prefix, e.g. `FETAL_MODEL_PATH`
pub const ENV_PREFIX: &str = "FETAL";

/// Optional config file, looked up in the working directory
pub const CONFIG_FILE: &str = "fetal-age";

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Serialized model, read once at startup
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    /// Version label reported with every prediction
    #[serde(default = "default_model_version")]
    pub model_version: String,

    /// Expected SHA-256 of the model file; startup fails on mismatch
    #[serde(default)]
    pub model_checksum: Option<String>,

    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Name used in structured logs
    #[serde(default = "default_instance_name")]
    pub instance_name: String,
}

fn default_model_path() -> PathBuf {
    PathBuf::from("fetal_age_model.onnx")
}

fn default_model_version() -> String {
    "v1".to_string()
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8501
}

fn default_instance_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "local".to_string())
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            model_version: default_model_version(),
            model_checksum: None,
            bind_address: default_bind_address(),
            port: default_port(),
            instance_name: default_instance_name(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the optional config file and the environment
    pub fn load() -> Result<Self> {
        Self::load_from(config::File::with_name(CONFIG_FILE).required(false))
    }

    fn load_from<S>(file: S) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config = config::Config::builder()
            .add_source(file)
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()
            .context("Failed to read configuration")?;

        config
            .try_deserialize()
            .context("Invalid configuration")
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.bind_address, self.port)
            .parse()
            .with_context(|| format!("Invalid bind address {}:{}", self.bind_address, self.port))
    }
}
