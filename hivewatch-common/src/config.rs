//! Configuration loading helpers
//!
//! Resolution follows ENV -> TOML file -> compiled default priority.
//! Each binary defines its own config struct and calls into these
//! helpers for the file and data-directory parts.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Platform config file path for a HiveWatch component, e.g.
/// `~/.config/hivewatch/server.toml`. Returns None when the platform
/// config directory cannot be determined.
pub fn config_file_path(component: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("hivewatch").join(format!("{}.toml", component)))
}

/// Parse a TOML config file into `T`. Returns Ok(None) when the file
/// does not exist; a present-but-invalid file is an error rather than
/// a silent fallback.
pub fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    let parsed = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
    tracing::debug!("Loaded configuration from {}", path.display());
    Ok(Some(parsed))
}

/// OS-dependent default data directory (uploads, fallback report file)
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("hivewatch"))
        .unwrap_or_else(|| PathBuf::from("./hivewatch_data"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Sample {
        port: u16,
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(load_toml::<Sample>(&path).unwrap().is_none());
    }

    #[test]
    fn invalid_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "port = \"not a number").unwrap();
        assert!(load_toml::<Sample>(&path).is_err());
    }

    #[test]
    fn valid_file_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.toml");
        std::fs::write(&path, "port = 5001\n").unwrap();
        let sample = load_toml::<Sample>(&path).unwrap().unwrap();
        assert_eq!(sample.port, 5001);
    }
}
