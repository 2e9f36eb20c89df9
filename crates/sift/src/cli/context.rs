//! Shared context for running CLI commands.

use std::{
    env,
    path::{Path, PathBuf},
    process::ExitCode,
};

use sift_config::{Config, IndexDescriptor, discover_config_file};

/// Command execution context built once per CLI invocation.
pub struct CommandContext {
    /// Current working directory.
    pub cwd: PathBuf,
    /// Loaded configuration (default if no config file was found).
    pub config: Config,
    /// The configuration file in use, if any.
    pub config_file: Option<PathBuf>,
}

impl CommandContext {
    /// Loads the configuration from `explicit`, or discovers it from the
    /// current directory.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ExitCode> {
        let cwd = current_dir_or_failure()?;
        let config_file = match explicit {
            Some(path) => Some(cwd.join(path)),
            None => discover_config_file(&cwd),
        };
        let config = match &config_file {
            Some(path) => Config::load_file(path).map_err(|e| {
                eprintln!("error: failed to load configuration: {e}");
                ExitCode::FAILURE
            })?,
            None => Config::default(),
        };
        Ok(Self {
            cwd,
            config,
            config_file,
        })
    }

    /// Ensures at least one index is configured.
    pub fn require_indexes(&self) -> Result<(), ExitCode> {
        if self.config.indexes.is_empty() {
            eprintln!("error: no indexes defined in configuration");
            eprintln!("Add [[index]] sections to sift.toml.");
            return Err(ExitCode::FAILURE);
        }
        Ok(())
    }

    /// Looks up one index by name.
    pub fn index(&self, name: &str) -> Result<&IndexDescriptor, ExitCode> {
        self.config.index(name).ok_or_else(|| {
            eprintln!("error: unknown index '{name}'");
            ExitCode::FAILURE
        })
    }

    /// Selects the named indexes, or all of them when `names` is empty.
    pub fn select(&self, names: &[String]) -> Result<Vec<&IndexDescriptor>, ExitCode> {
        self.require_indexes()?;
        self.config.select(names).map_err(|e| {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        })
    }
}

/// Returns the current working directory or exits with a consistent error.
fn current_dir_or_failure() -> Result<PathBuf, ExitCode> {
    env::current_dir().map_err(|e| {
        eprintln!("error: could not determine current directory: {e}");
        ExitCode::FAILURE
    })
}
