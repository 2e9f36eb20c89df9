//! Filesystem location holding one index's data files.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use tantivy::{
    Directory,
    directory::{Lock, MmapDirectory, error::LockError},
};
use walkdir::WalkDir;

use crate::error::IndexError;

/// Name of the lock file tantivy creates while a writer is open.
pub const WRITER_LOCK_FILE: &str = ".tantivy-writer.lock";

/// Marker file present in every initialized index.
pub const META_FILE: &str = "meta.json";

/// An index directory on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryStore {
    /// Directory holding the index files.
    path: PathBuf,
}

impl DirectoryStore {
    /// Creates a store handle. Nothing is touched on disk.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the directory path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if the directory exists.
    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }

    /// Returns true if the directory is missing or holds no files.
    pub fn is_empty(&self) -> bool {
        if !self.exists() {
            return true;
        }
        !WalkDir::new(&self.path)
            .min_depth(1)
            .into_iter()
            .filter_map(Result::ok)
            .any(|entry| entry.file_type().is_file())
    }

    /// Returns true if the directory holds an initialized index.
    pub fn has_index(&self) -> bool {
        self.path.join(META_FILE).is_file()
    }

    /// Creates the directory if it does not exist.
    pub fn ensure(&self) -> Result<(), IndexError> {
        fs::create_dir_all(&self.path)?;
        Ok(())
    }

    /// Removes every file in the directory, leaving it empty.
    pub fn clear(&self) -> Result<(), IndexError> {
        match fs::remove_dir_all(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        self.ensure()
    }

    /// Opens the directory for tantivy.
    pub fn open(&self) -> Result<MmapDirectory, IndexError> {
        MmapDirectory::open(&self.path).map_err(|e| {
            let err: tantivy::TantivyError = e.into();
            IndexError::open_index(self.path.clone(), &err)
        })
    }

    /// Returns true if the writer lock file exists.
    ///
    /// The file outlives the writer that created it, so its presence alone
    /// does not mean a writer is running. See [`is_locked`](Self::is_locked).
    pub fn has_lock_file(&self) -> bool {
        self.path.join(WRITER_LOCK_FILE).is_file()
    }

    /// Returns true if a live writer currently holds the lock.
    pub fn is_locked(&self) -> Result<bool, IndexError> {
        if !self.has_lock_file() {
            return Ok(false);
        }
        let directory = self.open()?;
        match directory.acquire_lock(&writer_lock()) {
            Ok(_released_on_drop) => Ok(false),
            Err(LockError::LockBusy) => Ok(true),
            Err(e) => Err(IndexError::Directory(e.to_string())),
        }
    }

    /// Deletes the writer lock file. Returns false if there was none.
    pub fn remove_lock(&self) -> Result<bool, IndexError> {
        let directory = self.open()?;
        let lock = Path::new(WRITER_LOCK_FILE);
        let present = directory
            .exists(lock)
            .map_err(|e| IndexError::Directory(e.to_string()))?;
        if !present {
            return Ok(false);
        }
        directory
            .delete(lock)
            .map_err(|e| IndexError::Directory(e.to_string()))?;
        Ok(true)
    }

    /// Total size in bytes of the files in the directory.
    pub fn disk_usage(&self) -> u64 {
        WalkDir::new(&self.path)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| entry.metadata().ok())
            .map(|meta| meta.len())
            .sum()
    }
}

/// The lock tantivy takes for its index writer.
fn writer_lock() -> Lock {
    Lock {
        filepath: PathBuf::from(WRITER_LOCK_FILE),
        is_blocking: false,
    }
}
