//! Path resolution for index definitions.

use std::path::{Path, PathBuf};

use directories::BaseDirs;

use crate::ConfigError;

/// Directory, relative to the config file, holding indexes without an
/// explicit path.
pub const DEFAULT_INDEX_DIR: &str = ".sift";

/// Resolves an index path to an absolute path.
///
/// - Tilde paths (`~/idx`) are expanded to the home directory
/// - Relative paths are resolved against `config_dir`
/// - `None` resolves to `<config_dir>/.sift/<name>`
///
/// The path does not need to exist: an index that has not been built yet
/// has no directory.
pub fn resolve_index_path(
    path: Option<&str>,
    name: &str,
    config_dir: &Path,
) -> Result<PathBuf, ConfigError> {
    let Some(path) = path else {
        return Ok(config_dir.join(DEFAULT_INDEX_DIR).join(name));
    };

    let expanded = expand_tilde(path)?;
    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        Ok(config_dir.join(expanded))
    }
}

/// Expands a tilde prefix to the home directory.
fn expand_tilde(path: &str) -> Result<PathBuf, ConfigError> {
    if path == "~" {
        return home_dir();
    }

    if let Some(rest) = path.strip_prefix("~/") {
        let home = home_dir()?;
        return Ok(home.join(rest));
    }

    Ok(PathBuf::from(path))
}

/// Returns the home directory.
fn home_dir() -> Result<PathBuf, ConfigError> {
    BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .ok_or(ConfigError::NoHomeDirectory)
}
