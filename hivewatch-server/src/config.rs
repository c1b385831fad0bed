//! Server configuration
//!
//! Resolution priority: environment variables, then
//! `~/.config/hivewatch/server.toml`, then compiled defaults.

use crate::decision::DecisionPolicy;
use hivewatch_common::config::{config_file_path, default_data_dir, load_toml};
use hivewatch_common::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    /// Uploads, fallback store files and model assets live here
    pub data_dir: PathBuf,
    pub mongodb_uri: String,
    pub database: String,
    /// Explicit model/labels locations; default resolves under
    /// `<data_dir>/models/`
    pub model_path: Option<PathBuf>,
    pub labels_path: Option<PathBuf>,
    pub verification: DecisionPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_address: "127.0.0.1".to_string(),
            port: 5001,
            data_dir: default_data_dir(),
            mongodb_uri: "mongodb://localhost:27017".to_string(),
            database: "hivewatch".to_string(),
            model_path: None,
            labels_path: None,
            verification: DecisionPolicy::default(),
        }
    }
}

impl ServerConfig {
    /// ENV -> TOML -> defaults
    pub fn load() -> Result<Self> {
        let mut config = match config_file_path("server") {
            Some(path) => load_toml::<ServerConfig>(&path)?.unwrap_or_default(),
            None => ServerConfig::default(),
        };

        if let Ok(address) = std::env::var("HIVEWATCH_BIND_ADDRESS") {
            config.bind_address = address;
        }
        if let Ok(port) = std::env::var("HIVEWATCH_PORT") {
            config.port = port
                .parse()
                .map_err(|e| Error::Config(format!("Invalid HIVEWATCH_PORT: {}", e)))?;
        }
        if let Ok(dir) = std::env::var("HIVEWATCH_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(uri) = std::env::var("HIVEWATCH_MONGODB_URI") {
            config.mongodb_uri = uri;
        }
        if let Ok(db) = std::env::var("HIVEWATCH_DATABASE") {
            config.database = db;
        }
        if let Ok(path) = std::env::var("HIVEWATCH_MODEL_PATH") {
            config.model_path = Some(PathBuf::from(path));
        }
        if let Ok(path) = std::env::var("HIVEWATCH_LABELS_PATH") {
            config.labels_path = Some(PathBuf::from(path));
        }

        Ok(config)
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }

    pub fn reports_file(&self) -> PathBuf {
        self.data_dir.join("reports.json")
    }

    pub fn contacts_file(&self) -> PathBuf {
        self.data_dir.join("emergency_contacts.json")
    }

    pub fn model_path(&self) -> PathBuf {
        self.model_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("models").join("mobilenet_v2.onnx"))
    }

    pub fn labels_path(&self) -> PathBuf {
        self.labels_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("models").join("imagenet_labels.txt"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn env_overrides_defaults() {
        std::env::set_var("HIVEWATCH_PORT", "6001");
        std::env::set_var("HIVEWATCH_DATA_DIR", "/tmp/hivewatch-test");
        let config = ServerConfig::load().unwrap();
        assert_eq!(config.port, 6001);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/hivewatch-test"));
        assert_eq!(
            config.model_path(),
            PathBuf::from("/tmp/hivewatch-test/models/mobilenet_v2.onnx")
        );
        std::env::remove_var("HIVEWATCH_PORT");
        std::env::remove_var("HIVEWATCH_DATA_DIR");
    }

    #[test]
    #[serial]
    fn invalid_port_is_config_error() {
        std::env::set_var("HIVEWATCH_PORT", "not-a-port");
        let result = ServerConfig::load();
        std::env::remove_var("HIVEWATCH_PORT");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn derived_paths_follow_data_dir() {
        let config = ServerConfig {
            data_dir: PathBuf::from("/srv/hive"),
            ..ServerConfig::default()
        };
        assert_eq!(config.uploads_dir(), PathBuf::from("/srv/hive/uploads"));
        assert_eq!(config.reports_file(), PathBuf::from("/srv/hive/reports.json"));
    }
}
