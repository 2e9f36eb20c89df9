//! Post-match filtering on stored field values.
//!
//! [`FilteredCollector`] wraps another collector and forwards only the
//! documents whose stored value passes the [`Filter`], so hit counts and top
//! documents both reflect it.

use sift_config::ALIAS_PATH_FIELD;
use tantivy::{
    DocId, Score, SegmentOrdinal, SegmentReader, TantivyDocument,
    collector::{Collector, SegmentCollector},
    schema::{Field, Schema, Value},
    store::StoreReader,
};

/// Number of decompressed store blocks cached per segment.
const STORE_CACHE_BLOCKS: usize = 10;

/// Predicate over (stored value, filter value).
pub type FilterPredicate = fn(&str, &str) -> bool;

/// A condition on one stored field.
#[derive(Debug, Clone)]
pub struct Filter {
    /// Field whose stored value is tested.
    field: String,
    /// Value handed to the predicate.
    value: String,
    /// The test.
    predicate: FilterPredicate,
}

impl Filter {
    /// Creates a filter.
    pub fn new(
        field: impl Into<String>,
        value: impl Into<String>,
        predicate: FilterPredicate,
    ) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            predicate,
        }
    }

    /// Accepts documents whose alias path starts with `scope`, ignoring case.
    pub fn path_prefix(scope: impl Into<String>) -> Self {
        Self::new(ALIAS_PATH_FIELD, scope, starts_with_ignore_case)
    }

    /// Returns the tested field name.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Returns the filter value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Applies the predicate to a stored value.
    pub fn accepts(&self, stored: &str) -> bool {
        (self.predicate)(stored, &self.value)
    }
}

/// Case-insensitive prefix test.
fn starts_with_ignore_case(stored: &str, prefix: &str) -> bool {
    stored.to_lowercase().starts_with(&prefix.to_lowercase())
}

/// Collector that drops documents rejected by a [`Filter`].
pub struct FilteredCollector<C> {
    /// Collector receiving accepted documents.
    inner: C,
    /// The condition.
    filter: Filter,
    /// Handle of the filtered field; `None` if the schema lacks it.
    field: Option<Field>,
}

impl<C> FilteredCollector<C> {
    /// Wraps `inner`. When `schema` has no such field, every document is
    /// rejected.
    pub fn new(inner: C, filter: Filter, schema: &Schema) -> Self {
        let field = schema.get_field(filter.field()).ok();
        Self {
            inner,
            filter,
            field,
        }
    }
}

impl<C: Collector> Collector for FilteredCollector<C> {
    type Fruit = C::Fruit;
    type Child = FilteredSegmentCollector<C::Child>;

    fn for_segment(
        &self,
        segment_local_id: SegmentOrdinal,
        segment: &SegmentReader,
    ) -> tantivy::Result<Self::Child> {
        let inner = self.inner.for_segment(segment_local_id, segment)?;
        let store = match self.field {
            Some(field) => Some((field, segment.get_store_reader(STORE_CACHE_BLOCKS)?)),
            None => None,
        };
        Ok(FilteredSegmentCollector {
            inner,
            store,
            filter: self.filter.clone(),
        })
    }

    fn requires_scoring(&self) -> bool {
        self.inner.requires_scoring()
    }

    fn merge_fruits(
        &self,
        segment_fruits: Vec<<Self::Child as SegmentCollector>::Fruit>,
    ) -> tantivy::Result<Self::Fruit> {
        self.inner.merge_fruits(segment_fruits)
    }
}

/// Per-segment half of [`FilteredCollector`].
pub struct FilteredSegmentCollector<T> {
    /// Segment collector receiving accepted documents.
    inner: T,
    /// Filtered field and the segment's document store.
    store: Option<(Field, StoreReader)>,
    /// The condition.
    filter: Filter,
}

impl<T> FilteredSegmentCollector<T> {
    /// Loads the stored value and tests it. Unreadable documents and
    /// documents without a value are rejected.
    fn accepts(&self, doc: DocId) -> bool {
        let Some((field, store)) = &self.store else {
            return false;
        };
        let Ok(stored) = store.get::<TantivyDocument>(doc) else {
            return false;
        };
        stored
            .get_all(*field)
            .filter_map(|value| value.as_str())
            .any(|value| self.filter.accepts(value))
    }
}

impl<T: SegmentCollector> SegmentCollector for FilteredSegmentCollector<T> {
    type Fruit = T::Fruit;

    fn collect(&mut self, doc: DocId, score: Score) {
        if self.accepts(doc) {
            self.inner.collect(doc, score);
        }
    }

    fn harvest(self) -> Self::Fruit {
        self.inner.harvest()
    }
}

#[cfg(test)]
mod tests {
    use tantivy::{
        Index, IndexWriter,
        collector::Count,
        doc,
        query::AllQuery,
        schema::{STORED, STRING},
    };

    use super::*;

    fn index_with_paths(paths: &[&str]) -> (Index, Schema) {
        let mut builder = Schema::builder();
        let path = builder.add_text_field(ALIAS_PATH_FIELD, STRING | STORED);
        let schema = builder.build();
        let index = Index::create_in_ram(schema.clone());
        let mut writer: IndexWriter = index.writer_with_num_threads(1, 15_000_000).unwrap();
        for p in paths {
            writer.add_document(doc!(path => *p)).unwrap();
        }
        writer.add_document(TantivyDocument::new()).unwrap();
        writer.commit().unwrap();
        (index, schema)
    }

    fn count(index: &Index, collector: &FilteredCollector<Count>) -> usize {
        let searcher = index.reader().unwrap().searcher();
        searcher.search(&AllQuery, collector).unwrap()
    }

    #[test]
    fn path_prefix_ignores_case() {
        let filter = Filter::path_prefix("/News");
        assert!(filter.accepts("/news/fox"));
        assert!(filter.accepts("/NEWS"));
        assert!(!filter.accepts("/blog/news"));
        assert_eq!(filter.field(), ALIAS_PATH_FIELD);
        assert_eq!(filter.value(), "/News");
    }

    #[test]
    fn custom_predicate() {
        let filter = Filter::new("lang", "en", |stored, value| stored == value);
        assert!(filter.accepts("en"));
        assert!(!filter.accepts("english"));
    }

    #[test]
    fn collector_counts_only_accepted_documents() {
        let (index, schema) = index_with_paths(&["/news/a", "/news/b", "/blog/c"]);
        let collector = FilteredCollector::new(Count, Filter::path_prefix("/news"), &schema);
        assert_eq!(count(&index, &collector), 2);
    }

    #[test]
    fn unknown_field_rejects_everything() {
        let (index, schema) = index_with_paths(&["/news/a"]);
        let filter = Filter::new("missing", "x", |_, _| true);
        let collector = FilteredCollector::new(Count, filter, &schema);
        assert_eq!(count(&index, &collector), 0);
    }
}
