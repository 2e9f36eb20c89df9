//! Configuration file parsing.
//!
//! Parses a `sift.toml` file into a `RawConfig` whose index paths are still
//! unresolved.

use std::{fs, path::Path};

use serde::Deserialize;

use crate::{AnalyzerSettings, ConfigError, EngineSettings, FieldSpec};

/// Raw configuration as parsed directly from a TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// Engine-wide settings.
    pub engine: EngineSettings,
    /// Index definitions, in file order.
    pub index: Vec<RawIndex>,
}

/// Raw index definition from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawIndex {
    /// Index name.
    pub name: String,
    /// Index directory. Defaults to `.sift/<name>` next to the config file.
    pub path: Option<String>,
    /// Index-time analyzer settings.
    pub analyzer: AnalyzerSettings,
    /// Search-time analyzer settings, if they differ.
    pub search_analyzer: Option<AnalyzerSettings>,
    /// Field definitions (`[[index.field]]`).
    pub field: Vec<FieldSpec>,
}

/// Parses a configuration file from disk.
pub fn parse_config_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    parse_config_str(&contents, path)
}

/// Parses configuration from a TOML string.
///
/// The `path` parameter is used for error reporting.
pub fn parse_config_str(contents: &str, path: &Path) -> Result<RawConfig, ConfigError> {
    toml::from_str(contents).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })
}
