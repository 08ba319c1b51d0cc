//! Store configuration, read from a RON file.
//!
//! Default location is `~/.config/cellvault/config.ron`. Every field is
//! optional:
//!
//! ```ron
//! (
//!     autosave: (enabled: true, interval_secs: 30),
//!     storage: (root: Some("/var/lib/cellvault/objects")),
//!     author: Some("amy"),
//! )
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::autosave::{AutoSaveConfig, DEFAULT_INTERVAL};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoSaveSection {
    pub enabled: bool,
    pub interval_secs: u64,
}

impl Default for AutoSaveSection {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: DEFAULT_INTERVAL.as_secs(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Object directory; platform data dir when unset.
    pub root: Option<PathBuf>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub autosave: AutoSaveSection,
    pub storage: StorageSection,
    /// Version-history author when a document has no owner.
    pub author: Option<String>,
}

impl StoreConfig {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                let config = Self::from_ron_str(&text)?;
                tracing::debug!(path = %path.display(), "loaded config");
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    /// `~/.config/cellvault/config.ron` or the platform equivalent.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("cellvault").join("config.ron"))
    }

    /// Configured object directory, else the platform data dir.
    pub fn storage_root(&self) -> Option<PathBuf> {
        self.storage
            .root
            .clone()
            .or_else(|| dirs::data_dir().map(|p| p.join("cellvault").join("objects")))
    }

    pub fn autosave_config(&self) -> AutoSaveConfig {
        AutoSaveConfig::from_secs(self.autosave.enabled, self.autosave.interval_secs)
    }

    pub fn autosave_interval(&self) -> Duration {
        self.autosave_config().interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        let config = StoreConfig::from_ron_str("()").unwrap();
        assert_eq!(config, StoreConfig::default());
        assert!(config.autosave.enabled);
        assert_eq!(config.autosave_interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_partial_config() {
        let config = StoreConfig::from_ron_str(
            r#"(autosave: (interval_secs: 0), storage: (root: Some("/tmp/objs")))"#,
        )
        .unwrap();
        assert!(config.autosave.enabled);
        // Zero is raised to one second.
        assert_eq!(config.autosave_interval(), Duration::from_secs(1));
        assert_eq!(config.storage_root(), Some(PathBuf::from("/tmp/objs")));
        assert!(config.author.is_none());
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            StoreConfig::from_ron_str("(autosave: 7)"),
            Err(ConfigError::Ron(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::load(&dir.path().join("absent.ron")).unwrap();
        assert_eq!(config, StoreConfig::default());
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ron");
        std::fs::write(&path, r#"(autosave: (enabled: false), author: Some("ops"))"#).unwrap();
        let config = StoreConfig::load(&path).unwrap();
        assert!(!config.autosave_config().enabled);
        assert_eq!(config.author.as_deref(), Some("ops"));
    }
}
