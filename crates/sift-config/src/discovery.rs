//! Configuration file discovery.
//!
//! Looks for `sift.toml` in the working directory, then in the user's
//! configuration directory.

use std::path::{Path, PathBuf};

use directories::BaseDirs;

/// The configuration filename.
pub const CONFIG_FILENAME: &str = "sift.toml";

/// Returns the configuration file to load for `cwd`, if any.
///
/// `cwd/sift.toml` wins over the global file.
pub fn discover_config_file(cwd: &Path) -> Option<PathBuf> {
    let local = cwd.join(CONFIG_FILENAME);
    if local.is_file() {
        return Some(local);
    }
    global_config_path().filter(|path| path.is_file())
}

/// Returns the path of the global configuration file
/// (`<config dir>/sift/sift.toml`).
///
/// Returns `None` if the home directory cannot be determined.
pub fn global_config_path() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.config_dir().join("sift").join(CONFIG_FILENAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestDir;

    #[test]
    fn local_config_is_found() {
        let dir = TestDir::new();
        let config = dir.create_config("[engine]\n");
        assert_eq!(discover_config_file(dir.path()), Some(config));
    }

    #[test]
    fn missing_local_falls_back_to_global() {
        let dir = TestDir::new();
        let sub = dir.create_dir("a/b");
        let found = discover_config_file(&sub);
        // Only the global config can be found here.
        if let Some(path) = found {
            assert_eq!(Some(path), global_config_path());
        }
    }

    #[test]
    fn global_path_ends_with_filename() {
        if let Some(path) = global_config_path() {
            assert!(path.ends_with(Path::new("sift").join(CONFIG_FILENAME)));
        }
    }
}
