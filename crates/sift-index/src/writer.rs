//! Index writer for adding documents to a Tantivy index.

use std::path::{Path, PathBuf};

use sift_config::{IndexDescriptor, RESERVED_FIELDS};
use tantivy::{
    Index, IndexSettings, IndexWriter as TantivyIndexWriter, TantivyDocument, Term,
};
use tracing::{debug, info};

use crate::{
    analyzer::{AnalysisMode, Analyzer},
    config_hash::{compute_config_hash, write_config_hash},
    document::Document,
    error::IndexError,
    schema::IndexSchema,
    store::DirectoryStore,
};

/// Default heap size for the index writer (50 MB).
pub const DEFAULT_HEAP_SIZE: usize = 50_000_000;

/// Writes documents to one index.
///
/// A writer is not synchronized beyond what tantivy's lock file provides:
/// callers must make sure only one writer (or lock recovery) runs for a
/// given path at a time, for example by routing all writes for an index
/// through a single task queue.
pub struct IndexWriter {
    /// Name of the index, for logging.
    name: String,
    /// Index directory.
    path: PathBuf,
    /// The Tantivy index.
    index: Index,
    /// The underlying Tantivy writer.
    writer: TantivyIndexWriter,
    /// Schema with field handles.
    schema: IndexSchema,
}

impl IndexWriter {
    /// Opens the index for `descriptor`, creating it when needed.
    ///
    /// With `force_create` the directory is cleared and a fresh index is
    /// built from the descriptor. Otherwise an existing index is opened;
    /// if that fails because the directory holds no index yet, one retry is
    /// made with `force_create`. Any other failure is returned.
    pub fn open_or_create(
        descriptor: &IndexDescriptor,
        force_create: bool,
    ) -> Result<Self, IndexError> {
        Self::open_or_create_with_heap(descriptor, force_create, DEFAULT_HEAP_SIZE)
    }

    /// Like [`open_or_create`](Self::open_or_create) with an explicit
    /// writer memory budget.
    pub fn open_or_create_with_heap(
        descriptor: &IndexDescriptor,
        force_create: bool,
        heap_bytes: usize,
    ) -> Result<Self, IndexError> {
        if force_create {
            return Self::create(descriptor, heap_bytes);
        }

        match Self::open_existing(descriptor, heap_bytes) {
            Ok(writer) => Ok(writer),
            Err(e) if !DirectoryStore::new(descriptor.path()).has_index() => {
                info!(
                    index = %descriptor.name,
                    path = %descriptor.path().display(),
                    reason = %e,
                    "no index found, creating"
                );
                Self::create(descriptor, heap_bytes)
            }
            Err(e) => Err(e),
        }
    }

    /// Opens an existing index.
    fn open_existing(descriptor: &IndexDescriptor, heap_bytes: usize) -> Result<Self, IndexError> {
        let path = descriptor.path().to_path_buf();
        let directory = DirectoryStore::new(&path).open()?;
        let index = Index::open(directory).map_err(|e| IndexError::open_index(path.clone(), &e))?;
        Self::from_index(descriptor, index, heap_bytes)
    }

    /// Clears the directory and creates a fresh index.
    fn create(descriptor: &IndexDescriptor, heap_bytes: usize) -> Result<Self, IndexError> {
        let path = descriptor.path().to_path_buf();
        let store = DirectoryStore::new(&path);
        store.clear()?;

        let schema = IndexSchema::new(descriptor);
        let index = Index::create(
            store.open()?,
            schema.schema().clone(),
            IndexSettings::default(),
        )
        .map_err(|e| IndexError::open_index(path.clone(), &e))?;

        let writer = Self::from_index(descriptor, index, heap_bytes)?;
        write_config_hash(&path, &compute_config_hash(descriptor))?;
        Ok(writer)
    }

    /// Registers the analyzer and acquires the tantivy writer.
    fn from_index(
        descriptor: &IndexDescriptor,
        index: Index,
        heap_bytes: usize,
    ) -> Result<Self, IndexError> {
        let path = descriptor.path().to_path_buf();
        let schema = IndexSchema::from_schema(index.schema()).ok_or_else(|| IndexError::OpenIndex {
            path: path.clone(),
            message: "index schema lacks reserved fields".to_string(),
        })?;

        Analyzer::for_index(descriptor, AnalysisMode::Index)?.register(&index);

        let writer = index
            .writer(heap_bytes)
            .map_err(|e| IndexError::open_index(path.clone(), &e))?;

        Ok(Self {
            name: descriptor.name.clone(),
            path,
            index,
            writer,
            schema,
        })
    }

    /// Returns the index directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stages a document. It becomes visible after [`commit`](Self::commit).
    ///
    /// Fields that are not part of the index schema are skipped.
    pub fn add_document(&mut self, doc: &Document) -> Result<(), IndexError> {
        if doc.id.is_empty() {
            return Err(IndexError::Write("document id is empty".to_string()));
        }

        let mut tantivy_doc = TantivyDocument::new();
        tantivy_doc.add_text(self.schema.id, &doc.id);
        tantivy_doc.add_text(self.schema.content, &doc.content);
        if let Some(alias_path) = &doc.alias_path {
            tantivy_doc.add_text(self.schema.alias_path, alias_path);
        }

        for (name, value) in &doc.fields {
            match self.schema.field(name) {
                Some(field) if !RESERVED_FIELDS.contains(&name.as_str()) => {
                    tantivy_doc.add_text(field, value);
                }
                _ => debug!(index = %self.name, field = %name, "skipping field not in schema"),
            }
        }

        self.writer
            .add_document(tantivy_doc)
            .map_err(|e| IndexError::write(&e))?;
        Ok(())
    }

    /// Stages multiple documents.
    pub fn add_documents(&mut self, docs: &[Document]) -> Result<(), IndexError> {
        for doc in docs {
            self.add_document(doc)?;
        }
        Ok(())
    }

    /// Stages deletion of every document with the given id.
    pub fn delete_document(&mut self, id: &str) {
        let term = Term::from_field_text(self.schema.id, id);
        self.writer.delete_term(term);
    }

    /// Replaces any document with the same id.
    pub fn upsert_document(&mut self, doc: &Document) -> Result<(), IndexError> {
        self.delete_document(&doc.id);
        self.add_document(doc)
    }

    /// Stages deletion of all documents.
    pub fn delete_all(&mut self) -> Result<(), IndexError> {
        self.writer
            .delete_all_documents()
            .map_err(|e| IndexError::write(&e))?;
        Ok(())
    }

    /// Commits all pending changes, making them visible to new searchers.
    pub fn commit(&mut self) -> Result<(), IndexError> {
        self.writer.commit().map_err(|e| IndexError::commit(&e))?;
        Ok(())
    }

    /// Discards uncommitted changes.
    pub fn rollback(&mut self) -> Result<(), IndexError> {
        self.writer.rollback().map_err(|e| IndexError::commit(&e))?;
        Ok(())
    }

    /// Returns the number of committed documents.
    pub fn num_docs(&self) -> Result<u64, IndexError> {
        let reader = self.index.reader().map_err(|e| IndexError::read(&e))?;
        Ok(reader.searcher().num_docs())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use sift_config::FieldSpec;
    use tempfile::TempDir;

    use super::*;
    use crate::{config_hash::read_stored_hash, store::META_FILE};

    fn descriptor(temp: &TempDir) -> IndexDescriptor {
        IndexDescriptor::new("news", temp.path().join("news")).with_field(FieldSpec::text("title"))
    }

    fn doc(id: &str, content: &str) -> Document {
        Document::new(id, content)
    }

    #[test]
    fn creates_index_in_missing_directory() {
        let temp = TempDir::new().unwrap();
        let desc = descriptor(&temp);
        let writer = IndexWriter::open_or_create(&desc, false).unwrap();

        assert!(desc.path().join(META_FILE).exists());
        assert_eq!(
            read_stored_hash(desc.path()),
            Some(compute_config_hash(&desc))
        );
        assert_eq!(writer.num_docs().unwrap(), 0);
    }

    #[test]
    fn adds_and_commits_documents() {
        let temp = TempDir::new().unwrap();
        let mut writer = IndexWriter::open_or_create(&descriptor(&temp), false).unwrap();

        writer
            .add_documents(&[doc("1", "quick brown fox"), doc("2", "lazy dog")])
            .unwrap();
        writer.commit().unwrap();

        assert_eq!(writer.num_docs().unwrap(), 2);
    }

    #[test]
    fn reopens_existing_index() {
        let temp = TempDir::new().unwrap();
        let desc = descriptor(&temp);
        {
            let mut writer = IndexWriter::open_or_create(&desc, false).unwrap();
            writer.add_document(&doc("1", "fox")).unwrap();
            writer.commit().unwrap();
        }
        let writer = IndexWriter::open_or_create(&desc, false).unwrap();
        assert_eq!(writer.num_docs().unwrap(), 1);
    }

    #[test]
    fn force_create_discards_existing_documents() {
        let temp = TempDir::new().unwrap();
        let desc = descriptor(&temp);
        {
            let mut writer = IndexWriter::open_or_create(&desc, false).unwrap();
            writer.add_document(&doc("1", "fox")).unwrap();
            writer.commit().unwrap();
        }
        let writer = IndexWriter::open_or_create(&desc, true).unwrap();
        assert_eq!(writer.num_docs().unwrap(), 0);
    }

    #[test]
    fn corrupt_index_is_not_recreated() {
        let temp = TempDir::new().unwrap();
        let desc = descriptor(&temp);
        fs::create_dir_all(desc.path()).unwrap();
        fs::write(desc.path().join(META_FILE), "not json").unwrap();

        let result = IndexWriter::open_or_create(&desc, false);
        assert!(matches!(result, Err(IndexError::OpenIndex { .. })));
        assert_eq!(
            fs::read_to_string(desc.path().join(META_FILE)).unwrap(),
            "not json"
        );
    }

    #[test]
    fn delete_and_upsert_by_id() {
        let temp = TempDir::new().unwrap();
        let mut writer = IndexWriter::open_or_create(&descriptor(&temp), false).unwrap();
        writer
            .add_documents(&[doc("1", "fox"), doc("2", "dog")])
            .unwrap();
        writer.commit().unwrap();

        writer.delete_document("1");
        writer.upsert_document(&doc("2", "cat")).unwrap();
        writer.commit().unwrap();

        assert_eq!(writer.num_docs().unwrap(), 1);
    }

    #[test]
    fn delete_all_removes_documents() {
        let temp = TempDir::new().unwrap();
        let mut writer = IndexWriter::open_or_create(&descriptor(&temp), false).unwrap();
        writer.add_document(&doc("1", "fox")).unwrap();
        writer.commit().unwrap();

        writer.delete_all().unwrap();
        writer.commit().unwrap();

        assert_eq!(writer.num_docs().unwrap(), 0);
    }

    #[test]
    fn rollback_discards_uncommitted_changes() {
        let temp = TempDir::new().unwrap();
        let mut writer = IndexWriter::open_or_create(&descriptor(&temp), false).unwrap();

        writer.add_document(&doc("1", "fox")).unwrap();
        writer.rollback().unwrap();
        writer.commit().unwrap();

        assert_eq!(writer.num_docs().unwrap(), 0);
    }

    #[test]
    fn unknown_fields_are_skipped() {
        let temp = TempDir::new().unwrap();
        let mut writer = IndexWriter::open_or_create(&descriptor(&temp), false).unwrap();
        let document = doc("1", "fox")
            .with_field("title", "Fox")
            .with_field("nonexistent", "ignored");
        writer.add_document(&document).unwrap();
        writer.commit().unwrap();
        assert_eq!(writer.num_docs().unwrap(), 1);
    }

    #[test]
    fn empty_id_is_rejected() {
        let temp = TempDir::new().unwrap();
        let mut writer = IndexWriter::open_or_create(&descriptor(&temp), false).unwrap();
        assert!(matches!(
            writer.add_document(&doc("", "fox")),
            Err(IndexError::Write(_))
        ));
    }
}
