//! Documents fed to the index writer.

use std::{collections::BTreeMap, io::BufRead};

use serde::{Deserialize, Serialize};

use crate::error::IndexError;

/// One unit of content to index.
///
/// Values are plain strings: callers serialize dates and numbers into a
/// form that sorts lexically before handing them over.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Document {
    /// Stable identifier. Writing a document with an existing id through
    /// [`upsert_document`](crate::IndexWriter::upsert_document) replaces it.
    pub id: String,
    /// Default full-text content.
    #[serde(default)]
    pub content: String,
    /// Path used for scoping searches to part of a site.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias_path: Option<String>,
    /// Values for descriptor fields, keyed by field name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,
}

impl Document {
    /// Creates a document with content and no other fields.
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    /// Sets the alias path.
    pub fn with_alias_path(mut self, path: impl Into<String>) -> Self {
        self.alias_path = Some(path.into());
        self
    }

    /// Sets a field value.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

/// Reads one JSON document per line. Blank lines are skipped.
pub fn read_json_lines(reader: impl BufRead) -> Result<Vec<Document>, IndexError> {
    let mut docs = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let doc = serde_json::from_str(&line).map_err(|e| IndexError::InvalidDocument {
            line: index + 1,
            message: e.to_string(),
        })?;
        docs.push(doc);
    }
    Ok(docs)
}
