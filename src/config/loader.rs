//! Configuration loading from disk.
//!
//! Reads the TOML configuration and, when one is named, the preload file
//! that ships with the rendered page.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::{GadgetConfig, PreloadConfig};
use crate::config::validation::{validate_config, ValidationError};
use crate::io::PreloadStore;

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
    Preload { path: PathBuf, source: serde_json::Error },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "cannot read {}: {}", path.display(), source)
            }
            ConfigError::Parse(e) => write!(f, "invalid TOML: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "invalid configuration: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
            ConfigError::Preload { path, source } => {
                write!(f, "preload file {} is not a JSON array: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Preload { source, .. } => Some(source),
            ConfigError::Validation(_) => None,
        }
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GadgetConfig, ConfigError> {
    parse_config(&read(path)?)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<GadgetConfig, ConfigError> {
    let config: GadgetConfig = toml::from_str(content).map_err(ConfigError::Parse)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Build the preload store named by `config`; empty when no file is set.
pub fn load_preloads(config: &PreloadConfig) -> Result<PreloadStore, ConfigError> {
    let Some(path) = &config.file else {
        return Ok(PreloadStore::new());
    };
    let store = PreloadStore::from_json(&read(path)?).map_err(|source| ConfigError::Preload {
        path: path.clone(),
        source,
    })?;
    tracing::info!(path = %path.display(), entries = store.len(), "Preloads loaded");
    Ok(store)
}
