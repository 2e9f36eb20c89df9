//! Index descriptors: storage path, field schema and analyzer settings.
//!
//! Descriptors are produced by configuration loading and are read-only to
//! the engine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_with::{OneOrMany, serde_as};

/// Field holding the stable document identifier.
pub const ID_FIELD: &str = "id";

/// Default full-text field.
pub const CONTENT_FIELD: &str = "content";

/// Field holding the document's alias path, used for path scoping.
pub const ALIAS_PATH_FIELD: &str = "alias_path";

/// Fields present in every index schema.
pub const RESERVED_FIELDS: [&str; 3] = [ID_FIELD, CONTENT_FIELD, ALIAS_PATH_FIELD];

/// Languages with stemming and stop-word support.
pub const SUPPORTED_LANGUAGES: [&str; 18] = [
    "arabic",
    "danish",
    "dutch",
    "english",
    "finnish",
    "french",
    "german",
    "greek",
    "hungarian",
    "italian",
    "norwegian",
    "portuguese",
    "romanian",
    "russian",
    "spanish",
    "swedish",
    "tamil",
    "turkish",
];

/// Returns true if `language` names a supported language (case-insensitive).
pub fn is_supported_language(language: &str) -> bool {
    SUPPORTED_LANGUAGES
        .iter()
        .any(|l| l.eq_ignore_ascii_case(language))
}

/// Configuration for one index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexDescriptor {
    /// Index name, unique within a configuration.
    pub name: String,
    /// Resolved directory holding the index files.
    pub path: PathBuf,
    /// Additional fields beyond the reserved ones.
    pub fields: Vec<FieldSpec>,
    /// Analysis used when writing documents.
    pub analyzer: AnalyzerSettings,
    /// Analysis used for query text. Falls back to `analyzer` when unset.
    pub search_analyzer: Option<AnalyzerSettings>,
}

impl IndexDescriptor {
    /// Creates a descriptor with the default analyzer and only the reserved
    /// fields.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            fields: Vec::new(),
            analyzer: AnalyzerSettings::default(),
            search_analyzer: None,
        }
    }

    /// Adds a field.
    pub fn with_field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Replaces the index-time analyzer settings.
    pub fn with_analyzer(mut self, analyzer: AnalyzerSettings) -> Self {
        self.analyzer = analyzer;
        self
    }

    /// Sets separate search-time analyzer settings.
    pub fn with_search_analyzer(mut self, analyzer: AnalyzerSettings) -> Self {
        self.search_analyzer = Some(analyzer);
        self
    }

    /// Returns the index directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the user-defined field with the given name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// How a field's values are indexed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Tokenized with the index analyzer.
    #[default]
    Text,
    /// Indexed as a single untokenized value.
    Keyword,
}

/// A user-defined field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct FieldSpec {
    /// Field name.
    pub name: String,
    /// Indexing mode. Text fields are tokenized, keyword fields are not.
    #[serde(default)]
    pub kind: FieldKind,
    /// Whether values are stored and returned with hits.
    #[serde(default = "default_true")]
    pub stored: bool,
    /// Whether the field can be used as a sort key.
    #[serde(default)]
    pub sortable: bool,
}

impl FieldSpec {
    /// A stored text field.
    pub fn text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Text,
            stored: true,
            sortable: false,
        }
    }

    /// A stored keyword field.
    pub fn keyword(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Keyword,
            stored: true,
            sortable: false,
        }
    }

    /// Marks the field sortable.
    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    /// Returns true if values are split into tokens.
    pub fn is_tokenized(&self) -> bool {
        self.kind == FieldKind::Text
    }
}

/// Tokenization strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyzerKind {
    /// Word tokenizer with the configured filters.
    #[default]
    Standard,
    /// Word tokenizer, lowercased.
    Simple,
    /// Splits on whitespace only.
    Whitespace,
    /// The whole value is one token.
    Keyword,
    /// Simple analysis with stop-word removal.
    Stop,
    /// Matches any substring of an indexed word.
    Subset,
    /// Matches any prefix of an indexed value.
    StartsWith,
}

/// Analyzer settings for one index.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalyzerSettings {
    /// Tokenization strategy.
    pub kind: AnalyzerKind,
    /// Language for stemming and named stop-word lists.
    pub language: Option<String>,
    /// Whether to stem tokens (requires `language`).
    pub stemming: bool,
    /// Named stop-word list (a language), if any.
    pub stop_words: Option<String>,
    /// Extra stop words. Accepts a single string or a list.
    #[serde_as(as = "OneOrMany<_>")]
    pub custom_stop_words: Vec<String>,
    /// Whether to lowercase tokens.
    pub case_fold: bool,
    /// Whether to fold accented characters to ASCII.
    pub fold_diacritics: bool,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            kind: AnalyzerKind::Standard,
            language: None,
            stemming: false,
            stop_words: None,
            custom_stop_words: Vec::new(),
            case_fold: true,
            fold_diacritics: true,
        }
    }
}

impl AnalyzerSettings {
    /// Settings for the given kind, other options at their defaults.
    pub fn of_kind(kind: AnalyzerKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// English stemming and stop words on the standard tokenizer.
    pub fn english() -> Self {
        Self {
            language: Some("english".to_string()),
            stemming: true,
            stop_words: Some("english".to_string()),
            ..Self::default()
        }
    }
}

/// Serde default for boolean fields that default to on.
fn default_true() -> bool {
    true
}
