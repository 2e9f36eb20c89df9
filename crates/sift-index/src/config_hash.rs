//! Configuration hash computation for index versioning.
//!
//! Each index stores a hash of the descriptor settings that affect what is
//! written: field definitions and index-time analysis. When they change,
//! the stored hash no longer matches and the index should be rebuilt.
//! Search-time analyzer settings are not part of the hash.

use std::{
    fs,
    hash::{Hash, Hasher},
    io,
    path::{Path, PathBuf},
};

use sift_config::{AnalyzerSettings, FieldSpec, IndexDescriptor};
use siphasher::sip::SipHasher24;

/// Current schema version. Bump this when the reserved fields change.
pub const SCHEMA_VERSION: u32 = 1;

/// File inside the index directory holding the hash.
pub const CONFIG_HASH_FILE: &str = "sift.hash";

/// Descriptor settings included in the config hash.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct IndexingConfig<'a> {
    /// Schema version.
    pub schema_version: u32,
    /// Descriptor fields, in order.
    pub fields: &'a [FieldSpec],
    /// Index-time analysis.
    pub analyzer: &'a AnalyzerSettings,
}

impl<'a> IndexingConfig<'a> {
    /// Extracts indexing-relevant settings from a descriptor.
    pub fn from_descriptor(descriptor: &'a IndexDescriptor) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            fields: &descriptor.fields,
            analyzer: &descriptor.analyzer,
        }
    }

    /// Computes a hash of the indexing configuration.
    pub fn compute_hash(&self) -> u64 {
        let mut hasher = SipHasher24::new();
        self.hash(&mut hasher);
        hasher.finish()
    }

    /// Computes a hash and returns it as a hex string.
    pub fn hash_string(&self) -> String {
        format!("{:016x}", self.compute_hash())
    }
}

/// Computes the config hash of a descriptor.
pub fn compute_config_hash(descriptor: &IndexDescriptor) -> String {
    IndexingConfig::from_descriptor(descriptor).hash_string()
}

/// Path of the hash file inside an index directory.
pub fn config_hash_path(index_dir: &Path) -> PathBuf {
    index_dir.join(CONFIG_HASH_FILE)
}

/// Reads the stored config hash from an index directory.
///
/// Returns `None` if the hash file doesn't exist or can't be read.
pub fn read_stored_hash(index_dir: &Path) -> Option<String> {
    fs::read_to_string(config_hash_path(index_dir))
        .ok()
        .map(|s| s.trim().to_string())
}

/// Writes the config hash to an index directory.
pub fn write_config_hash(index_dir: &Path, hash: &str) -> io::Result<()> {
    fs::create_dir_all(index_dir)?;
    fs::write(config_hash_path(index_dir), hash)
}
