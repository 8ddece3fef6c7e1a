//! Destination configuration.
//!
//! When no `--url` is given, the destination is read from a JSON file in
//! the current working directory:
//!
//! ```json
//! { "destination": "http://host:3000/upload" }
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Errors loading the destination configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration file not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed configuration in {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("`destination` in {} must be a non-empty string", .0.display())]
    EmptyDestination(PathBuf),
}

/// Upload destination read from [`CONFIG_FILE_NAME`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DestinationConfig {
    pub destination: String,
}

impl DestinationConfig {
    /// Loads `config.json` from `dir`.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        Self::load_from(&dir.join(CONFIG_FILE_NAME))
    }

    /// Loads and validates the configuration at `path`.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::Missing(path.to_path_buf()));
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Self::parse(&content, path)
    }

    /// Parses and validates configuration text; `origin` is used in errors.
    pub fn parse(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        let mut config: DestinationConfig =
            serde_json::from_str(content).map_err(|source| ConfigError::Malformed {
                path: origin.to_path_buf(),
                source,
            })?;

        config.destination = config.destination.trim().to_string();
        if config.destination.is_empty() {
            return Err(ConfigError::EmptyDestination(origin.to_path_buf()));
        }

        tracing::debug!(
            path = %origin.display(),
            destination = %config.destination,
            "destination loaded"
        );
        Ok(config)
    }
}
