//! Server configuration

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Config file consulted when `PREDICTOR_CONFIG` is unset (any extension the
/// `config` crate understands, e.g. `predictor.toml`)
const DEFAULT_CONFIG_FILE: &str = "predictor";

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP port for the UI, API and health/metrics endpoints
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path of the serialized classifier (.onnx or .json)
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    /// Expected SHA256 of the model artifact, hex encoded
    #[serde(default)]
    pub model_sha256: Option<String>,

    /// Instance name attached to structured log events
    #[serde(default = "default_instance")]
    pub instance: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8501
}

fn default_model_path() -> PathBuf {
    PathBuf::from("models/diabetes_logistic.json")
}

fn default_instance() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "diabetes-predictor".to_string())
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            model_path: default_model_path(),
            model_sha256: None,
            instance: default_instance(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the optional config file, then `PREDICTOR_*` env vars
    pub fn load() -> Result<Self> {
        let file = std::env::var("PREDICTOR_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(&file)
    }

    /// Load configuration with an explicit config file name
    pub fn load_from(file: &str) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(file).required(false))
            .add_source(config::Environment::with_prefix("PREDICTOR"))
            .build()
            .context("Failed to read configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Invalid predictor configuration")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("port must be non-zero");
        }
        if let Some(sha) = &self.model_sha256 {
            if sha.len() != 64 || !sha.chars().all(|c| c.is_ascii_hexdigit()) {
                anyhow::bail!("model_sha256 must be 64 hex characters");
            }
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(dir: &tempfile::TempDir, contents: &str) -> String {
        let path = dir.path().join("predictor.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_address(), "0.0.0.0:8501");
        assert_eq!(config.model_path, PathBuf::from("models/diabetes_logistic.json"));
        assert!(config.model_sha256.is_none());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "host = \"127.0.0.1\"\nport = 9000\nmodel_path = \"/srv/models/best.onnx\"\n",
        );

        let config = ServerConfig::load_from(&path).unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:9000");
        assert_eq!(config.model_path, PathBuf::from("/srv/models/best.onnx"));
    }

    #[test]
    fn test_missing_file_is_not_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("absent");
        let config = ServerConfig::load_from(missing.to_str().unwrap()).unwrap();
        assert_eq!(config.port, 8501);
    }

    #[test]
    fn test_rejects_malformed_checksum() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_config(&dir, "model_sha256 = \"abc\"\n");
        assert!(ServerConfig::load_from(&path).is_err());
    }
}
