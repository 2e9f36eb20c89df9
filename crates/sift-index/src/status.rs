//! Index status detection.

use sift_config::IndexDescriptor;
use tracing::debug;

use crate::{
    config_hash::{compute_config_hash, read_stored_hash},
    store::DirectoryStore,
};

/// State of one index on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStatus {
    /// No index exists at the descriptor path.
    Missing,
    /// A writer currently holds the index lock.
    Locked,
    /// The index was built with different settings and needs a rebuild.
    ConfigChanged,
    /// The index matches the descriptor.
    Current,
}

impl IndexStatus {
    /// Returns a human-readable description for display.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Locked => "locked",
            Self::ConfigChanged => "stale (config changed)",
            Self::Current => "current",
        }
    }

    /// Returns true if the index must be rebuilt before it is trustworthy.
    pub fn needs_rebuild(&self) -> bool {
        matches!(self, Self::Missing | Self::ConfigChanged)
    }
}

/// Determines the state of the index described by `descriptor`.
///
/// This checks, in order:
/// 1. Whether an initialized index exists (`meta.json` present)
/// 2. Whether a live writer holds the lock
/// 3. Whether the stored config hash matches the descriptor
pub fn detect_index_status(descriptor: &IndexDescriptor) -> IndexStatus {
    let store = DirectoryStore::new(descriptor.path());
    if !store.has_index() {
        return IndexStatus::Missing;
    }

    match store.is_locked() {
        Ok(true) => return IndexStatus::Locked,
        Ok(false) => {}
        Err(e) => debug!(index = %descriptor.name, error = %e, "could not check writer lock"),
    }

    let current = compute_config_hash(descriptor);
    match read_stored_hash(store.path()) {
        Some(stored) if stored == current => IndexStatus::Current,
        _ => IndexStatus::ConfigChanged,
    }
}
