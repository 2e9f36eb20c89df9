//! Recovery from writer locks left behind by crashed processes.

use std::path::Path;

use tracing::{info, warn};

use crate::store::DirectoryStore;

/// Removes the writer lock of the index at `path`.
///
/// Returns true if a lock file was removed. Never fails: errors are logged
/// and reported as false, and a directory without a lock is left alone.
/// Callers must make sure no writer is running on `path`, since a live
/// writer's lock is removed too.
pub fn force_unlock(path: &Path) -> bool {
    let store = DirectoryStore::new(path);
    if !store.exists() || !store.has_lock_file() {
        return false;
    }
    match store.remove_lock() {
        Ok(true) => {
            info!(path = %path.display(), "cleared stale writer lock");
            true
        }
        Ok(false) => false,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not clear writer lock");
            false
        }
    }
}
