//! Tantivy schema derived from an index descriptor.
//!
//! Every schema has three reserved fields:
//! - `id`: stable document identifier (raw, stored)
//! - `content`: default full-text field (analyzed with positions, stored)
//! - `alias_path`: document path used for scoping (raw, stored)
//!
//! Descriptor fields follow. Text fields use the index analyzer, keyword
//! fields are indexed as a single raw token. Sortable fields are always
//! stored, since sort keys are read back from the document store.

use std::collections::HashSet;

use sift_config::{
    ALIAS_PATH_FIELD, CONTENT_FIELD, FieldKind, ID_FIELD, IndexDescriptor, RESERVED_FIELDS,
};
use tantivy::schema::{
    Field, FieldType, IndexRecordOption, STORED, STRING, Schema, TextFieldIndexing, TextOptions,
};

use crate::analyzer::SIFT_TOKENIZER;

/// Tantivy's built-in untokenized analyzer.
const RAW_TOKENIZER: &str = "raw";

/// Handles to the reserved fields of an index schema.
#[derive(Debug, Clone)]
pub struct IndexSchema {
    /// The underlying Tantivy schema.
    schema: Schema,
    /// Stable document identifier.
    pub id: Field,
    /// Default full-text field.
    pub content: Field,
    /// Path used for scoping.
    pub alias_path: Field,
}

impl IndexSchema {
    /// Builds the schema for a descriptor.
    ///
    /// Definitions of reserved fields are ignored, as are repeated field
    /// names after the first.
    pub fn new(descriptor: &IndexDescriptor) -> Self {
        let mut builder = Schema::builder();

        let id = builder.add_text_field(ID_FIELD, STRING | STORED);
        let content = builder.add_text_field(CONTENT_FIELD, analyzed_options(true));
        let alias_path = builder.add_text_field(ALIAS_PATH_FIELD, STRING | STORED);

        let mut seen: HashSet<&str> = RESERVED_FIELDS.into_iter().collect();
        for spec in &descriptor.fields {
            if !seen.insert(spec.name.as_str()) {
                continue;
            }
            let stored = spec.stored || spec.sortable;
            let options = match spec.kind {
                FieldKind::Text => analyzed_options(stored),
                FieldKind::Keyword => raw_options(stored),
            };
            builder.add_text_field(&spec.name, options);
        }

        Self {
            schema: builder.build(),
            id,
            content,
            alias_path,
        }
    }

    /// Wraps a schema read back from an existing index.
    ///
    /// Returns `None` if a reserved field is missing.
    pub fn from_schema(schema: Schema) -> Option<Self> {
        Some(Self {
            id: schema.get_field(ID_FIELD).ok()?,
            content: schema.get_field(CONTENT_FIELD).ok()?,
            alias_path: schema.get_field(ALIAS_PATH_FIELD).ok()?,
            schema,
        })
    }

    /// Returns the underlying Tantivy schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<Field> {
        self.schema.get_field(name).ok()
    }
}

/// Options for a field analyzed with the index pipeline.
fn analyzed_options(stored: bool) -> TextOptions {
    let options = TextOptions::default().set_indexing_options(
        TextFieldIndexing::default()
            .set_tokenizer(SIFT_TOKENIZER)
            .set_index_option(IndexRecordOption::WithFreqsAndPositions),
    );
    if stored { options.set_stored() } else { options }
}

/// Options for a field indexed as one untokenized value.
fn raw_options(stored: bool) -> TextOptions {
    let options = TextOptions::default().set_indexing_options(
        TextFieldIndexing::default()
            .set_tokenizer(RAW_TOKENIZER)
            .set_index_option(IndexRecordOption::Basic),
    );
    if stored { options.set_stored() } else { options }
}

/// Returns true if the field is tokenized with the sift pipeline.
///
/// Works on any schema, including one read back from disk.
pub fn is_analyzed(schema: &Schema, field: Field) -> bool {
    match schema.get_field_entry(field).field_type() {
        FieldType::Str(options) => options
            .get_indexing_options()
            .is_some_and(|indexing| indexing.tokenizer() == SIFT_TOKENIZER),
        _ => false,
    }
}

/// Returns true if the field records term positions, which phrase queries
/// require.
pub fn has_positions(schema: &Schema, field: Field) -> bool {
    match schema.get_field_entry(field).field_type() {
        FieldType::Str(options) => options
            .get_indexing_options()
            .is_some_and(|indexing| indexing.index_option().has_positions()),
        _ => false,
    }
}

/// Names of stored fields other than `id`, in schema order.
pub fn stored_field_names(schema: &Schema) -> Vec<String> {
    schema
        .fields()
        .filter(|(_, entry)| entry.is_stored() && entry.name() != ID_FIELD)
        .map(|(_, entry)| entry.name().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use sift_config::FieldSpec;

    use super::*;

    fn descriptor() -> IndexDescriptor {
        IndexDescriptor::new("news", "/idx/news")
            .with_field(FieldSpec::text("title").sortable())
            .with_field(FieldSpec::keyword("category"))
            .with_field(FieldSpec {
                stored: false,
                ..FieldSpec::text("summary")
            })
    }

    #[test]
    fn reserved_fields_are_present() {
        let schema = IndexSchema::new(&IndexDescriptor::new("empty", "/idx"));
        assert!(schema.field("id").is_some());
        assert!(schema.field("content").is_some());
        assert!(schema.field("alias_path").is_some());
        assert_eq!(schema.schema().fields().count(), 3);
    }

    #[test]
    fn field_kinds_map_to_tokenizers() {
        let schema = IndexSchema::new(&descriptor());
        let s = schema.schema();
        assert!(is_analyzed(s, schema.content));
        assert!(!is_analyzed(s, schema.id));
        assert!(!is_analyzed(s, schema.alias_path));
        assert!(is_analyzed(s, schema.field("title").unwrap()));
        assert!(!is_analyzed(s, schema.field("category").unwrap()));
        assert!(has_positions(s, schema.content));
        assert!(!has_positions(s, schema.field("category").unwrap()));
    }

    #[test]
    fn stored_fields_exclude_id_and_unstored() {
        let schema = IndexSchema::new(&descriptor());
        assert_eq!(
            stored_field_names(schema.schema()),
            ["content", "alias_path", "title", "category"]
        );
    }

    #[test]
    fn from_schema_requires_reserved_fields() {
        let built = IndexSchema::new(&descriptor());
        let wrapped = IndexSchema::from_schema(built.schema().clone()).unwrap();
        assert_eq!(wrapped.content, built.content);

        let mut builder = Schema::builder();
        builder.add_text_field("id", STRING);
        assert!(IndexSchema::from_schema(builder.build()).is_none());
    }

    #[test]
    fn sortable_implies_stored() {
        let desc = IndexDescriptor::new("news", "/idx").with_field(FieldSpec {
            stored: false,
            ..FieldSpec::keyword("date").sortable()
        });
        let schema = IndexSchema::new(&desc);
        let field = schema.field("date").unwrap();
        assert!(schema.schema().get_field_entry(field).is_stored());
    }

    #[test]
    fn reserved_and_duplicate_definitions_are_ignored() {
        let desc = IndexDescriptor::new("news", "/idx")
            .with_field(FieldSpec::keyword("content"))
            .with_field(FieldSpec::text("title"))
            .with_field(FieldSpec::keyword("title"));
        let schema = IndexSchema::new(&desc);
        assert_eq!(schema.schema().fields().count(), 4);
        assert!(is_analyzed(schema.schema(), schema.content));
        assert!(is_analyzed(schema.schema(), schema.field("title").unwrap()));
    }
}
