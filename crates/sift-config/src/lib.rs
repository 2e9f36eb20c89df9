//! Configuration system for sift.
//!
//! sift reads a single TOML file named `sift.toml`: the one in the working
//! directory if present, otherwise `<config dir>/sift/sift.toml`. The file
//! holds engine-wide settings and the list of index descriptors.

#![warn(missing_docs)]

mod descriptor;
mod discovery;
mod error;
mod parse;
mod resolve;
#[cfg(test)]
mod test_support;
mod validate;

use std::path::{Path, PathBuf};

pub use descriptor::{
    ALIAS_PATH_FIELD, AnalyzerKind, AnalyzerSettings, CONTENT_FIELD, FieldKind, FieldSpec,
    ID_FIELD, IndexDescriptor, RESERVED_FIELDS, SUPPORTED_LANGUAGES, is_supported_language,
};
pub use discovery::{CONFIG_FILENAME, discover_config_file, global_config_path};
pub use error::ConfigError;
pub use parse::{RawConfig, RawIndex, parse_config_file, parse_config_str};
pub use resolve::{DEFAULT_INDEX_DIR, resolve_index_path};
use serde::{Deserialize, Serialize};
pub use validate::ConfigWarning;
use validate::validate_config;

/// Fully resolved sift configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Engine-wide settings.
    pub engine: EngineSettings,
    /// Index descriptors with resolved paths, in file order.
    pub indexes: Vec<IndexDescriptor>,
    /// Directory of the loaded config file; `None` when no file was found.
    pub config_root: Option<PathBuf>,
}

impl Config {
    /// Discovers and loads the configuration for `cwd`.
    ///
    /// Returns `Ok(Config::default())` if no configuration file is found.
    pub fn load(cwd: &Path) -> Result<Self, ConfigError> {
        match discover_config_file(cwd) {
            Some(path) => Self::load_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Loads configuration from a specific file.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = parse_config_file(path)?;
        let config_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_raw(raw, config_dir)
    }

    /// Builds a configuration from a parsed file, resolving index paths
    /// against `config_dir`.
    pub fn from_raw(raw: RawConfig, config_dir: &Path) -> Result<Self, ConfigError> {
        let indexes = raw
            .index
            .into_iter()
            .enumerate()
            .map(|(position, index)| {
                if index.name.trim().is_empty() {
                    return Err(ConfigError::MissingIndexName { position });
                }
                let path = resolve_index_path(index.path.as_deref(), &index.name, config_dir)?;
                Ok(IndexDescriptor {
                    name: index.name,
                    path,
                    fields: index.field,
                    analyzer: index.analyzer,
                    search_analyzer: index.search_analyzer,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self {
            engine: raw.engine,
            indexes,
            config_root: Some(config_dir.to_path_buf()),
        })
    }

    /// Returns the index with the given name.
    pub fn index(&self, name: &str) -> Option<&IndexDescriptor> {
        self.indexes.iter().find(|i| i.name == name)
    }

    /// Returns the named indexes, or every index when `names` is empty.
    pub fn select(&self, names: &[String]) -> Result<Vec<&IndexDescriptor>, ConfigError> {
        if names.is_empty() {
            return Ok(self.indexes.iter().collect());
        }
        names
            .iter()
            .map(|name| {
                self.index(name)
                    .ok_or_else(|| ConfigError::UnknownIndex { name: name.clone() })
            })
            .collect()
    }

    /// Validates the configuration and returns any warnings.
    ///
    /// This checks for:
    /// - Empty configuration (no indexes defined)
    /// - Duplicate index names, duplicate or reserved field names
    /// - Unsupported languages and stemming without a language
    /// - Index paths that exist but are not directories
    pub fn validate(&self) -> Vec<ConfigWarning> {
        validate_config(self)
    }

    /// Serializes the effective engine settings to TOML.
    pub fn engine_to_toml(&self) -> Result<String, ConfigError> {
        /// Wrapper producing an `[engine]` table.
        #[derive(Serialize)]
        struct EngineTable<'a> {
            /// Engine-wide settings.
            engine: &'a EngineSettings,
        }
        Ok(toml::to_string_pretty(&EngineTable {
            engine: &self.engine,
        })?)
    }
}

/// How clauses without an explicit operator are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultOperator {
    /// Any clause may match.
    #[default]
    Or,
    /// Every clause must match.
    And,
}

/// Engine-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Maximum number of results any search returns.
    pub max_results: usize,
    /// Maximum number of leaf clauses in one query.
    pub max_clause_count: usize,
    /// Memory budget for an index writer, in bytes.
    pub writer_heap_bytes: usize,
    /// Default operator between clauses.
    pub default_operator: DefaultOperator,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_results: 1000,
            max_clause_count: 1024,
            writer_heap_bytes: 50_000_000,
            default_operator: DefaultOperator::Or,
        }
    }
}
