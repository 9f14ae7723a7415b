//! # Configuration
//!
//! Document locations come from, in order of precedence:
//! 1. `--memory` / `--pool` flags
//! 2. an `insepa.toml` file (the `--config` path, or `./insepa.toml` if present)
//! 3. built-in defaults next to the working directory
//!
//! ```toml
//! memory_path = "adam_memoria.json"
//! pool_path = "inconsciente.json"
//! ```

use insepa_core::InsepaError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "insepa.toml";

/// Default namespace document.
pub const DEFAULT_MEMORY_FILE: &str = "adam_memoria.json";

/// Default pool document.
pub const DEFAULT_POOL_FILE: &str = "inconsciente.json";

/// Maximum config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Contents of an `insepa.toml` file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub memory_path: Option<PathBuf>,
    pub pool_path: Option<PathBuf>,
}

impl FileConfig {
    /// Parse a config file.
    pub fn load(path: &Path) -> Result<Self, InsepaError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            InsepaError::ConfigError(format!("Cannot read '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(InsepaError::ConfigError(format!(
                "Config file size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }

        let text = std::fs::read_to_string(path).map_err(|e| {
            InsepaError::ConfigError(format!("Cannot read '{}': {}", path.display(), e))
        })?;
        Self::parse(&text)
    }

    /// Parse config text.
    pub fn parse(text: &str) -> Result<Self, InsepaError> {
        toml::from_str(text).map_err(|e| InsepaError::ConfigError(e.to_string()))
    }
}

/// Resolved document locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub memory_path: PathBuf,
    pub pool_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            memory_path: PathBuf::from(DEFAULT_MEMORY_FILE),
            pool_path: PathBuf::from(DEFAULT_POOL_FILE),
        }
    }
}

impl Settings {
    /// Merge flags over the config file over the defaults.
    ///
    /// An explicit `config_path` must exist; the implicit `./insepa.toml` is
    /// only read when present.
    pub fn resolve(
        config_path: Option<&Path>,
        memory: Option<PathBuf>,
        pool: Option<PathBuf>,
    ) -> Result<Self, InsepaError> {
        let file = match config_path {
            Some(path) => FileConfig::load(path)?,
            None => {
                let implicit = Path::new(DEFAULT_CONFIG_FILE);
                if implicit.is_file() {
                    FileConfig::load(implicit)?
                } else {
                    FileConfig::default()
                }
            }
        };

        Ok(Self::merge(file, memory, pool))
    }

    fn merge(file: FileConfig, memory: Option<PathBuf>, pool: Option<PathBuf>) -> Self {
        let defaults = Self::default();
        Self {
            memory_path: memory.or(file.memory_path).unwrap_or(defaults.memory_path),
            pool_path: pool.or(file.pool_path).unwrap_or(defaults.pool_path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_partial_file() {
        let config = FileConfig::parse("memory_path = \"m.json\"").expect("parse");
        assert_eq!(config.memory_path, Some(PathBuf::from("m.json")));
        assert_eq!(config.pool_path, None);
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(matches!(
            FileConfig::parse("memory = \"m.json\""),
            Err(InsepaError::ConfigError(_))
        ));
    }

    #[test]
    fn flags_override_file() {
        let file = FileConfig {
            memory_path: Some(PathBuf::from("file_m.json")),
            pool_path: Some(PathBuf::from("file_p.json")),
        };
        let settings = Settings::merge(file, Some(PathBuf::from("flag_m.json")), None);

        assert_eq!(settings.memory_path, PathBuf::from("flag_m.json"));
        assert_eq!(settings.pool_path, PathBuf::from("file_p.json"));
    }

    #[test]
    fn defaults_when_nothing_given() {
        let settings = Settings::merge(FileConfig::default(), None, None);
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn explicit_missing_config_is_error() {
        let result = Settings::resolve(Some(Path::new("/nonexistent/insepa.toml")), None, None);
        assert!(matches!(result, Err(InsepaError::ConfigError(_))));
    }
}
