//! End-to-end tests: write indexes to disk, then search them.

// Integration tests live outside cfg(test) by design
#![allow(clippy::tests_outside_test_module)]

use std::{fs, path::Path};

use sift_config::{AnalyzerSettings, EngineSettings, FieldSpec, IndexDescriptor};
use sift_index::{
    Document, IndexSearcher, IndexStatus, IndexWriter, QueryExecutor, ResultSet, SearchError,
    SearchRequest, SearcherCache, WRITER_LOCK_FILE, detect_index_status, force_unlock,
};
use sift_query::Operator;
use tempfile::TempDir;

fn news(root: &Path) -> IndexDescriptor {
    IndexDescriptor::new("news", root.join("idx/news"))
        .with_field(FieldSpec::keyword("category"))
        .with_field(FieldSpec::text("title").sortable())
        .with_analyzer(AnalyzerSettings {
            stop_words: None,
            custom_stop_words: vec!["the".into(), "a".into()],
            ..AnalyzerSettings::english()
        })
}

fn write(desc: &IndexDescriptor, docs: &[Document]) -> IndexSearcher {
    let mut writer = IndexWriter::open_or_create(desc, false).unwrap();
    writer.add_documents(docs).unwrap();
    writer.commit().unwrap();
    IndexSearcher::open(desc).unwrap()
}

fn fox_and_dog(desc: &IndexDescriptor) -> IndexSearcher {
    write(
        desc,
        &[
            Document::new("1", "quick brown fox")
                .with_alias_path("/news/animals/fox")
                .with_field("category", "news")
                .with_field("title", "Fox"),
            Document::new("2", "lazy dog")
                .with_alias_path("/blog/dog")
                .with_field("category", "blog")
                .with_field("title", "Dog"),
        ],
    )
}

fn search(searchers: &[&IndexSearcher], request: &SearchRequest) -> ResultSet {
    QueryExecutor::new(&EngineSettings::default())
        .search(request, searchers)
        .unwrap()
}

fn ids(results: &ResultSet) -> Vec<&str> {
    results.hits.iter().map(|h| h.id.as_str()).collect()
}

#[test]
fn empty_directory_is_unavailable() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("idx/news")).unwrap();
    let desc = news(temp.path());

    assert!(IndexSearcher::open(&desc).is_none());
    assert_eq!(detect_index_status(&desc), IndexStatus::Missing);
}

#[test]
fn single_term_finds_one_document() {
    let temp = TempDir::new().unwrap();
    let searcher = fox_and_dog(&news(temp.path()));

    let results = search(&[&searcher], &SearchRequest::new("fox"));
    assert_eq!(ids(&results), ["1"]);
    assert_eq!(results.total, 1);
    assert_eq!(results.hits[0].fields["content"], "quick brown fox");
}

#[test]
fn phrase_and_missing_term() {
    let temp = TempDir::new().unwrap();
    let searcher = fox_and_dog(&news(temp.path()));

    let results = search(&[&searcher], &SearchRequest::new("\"quick brown\""));
    assert_eq!(ids(&results), ["1"]);

    let results = search(&[&searcher], &SearchRequest::new("cat"));
    assert!(results.hits.is_empty());
    assert_eq!(results.total, 0);
}

#[test]
fn two_indexes_both_contribute() {
    let temp = TempDir::new().unwrap();
    let first = write(
        &IndexDescriptor::new("first", temp.path().join("first")),
        &[Document::new("a", "red fox")],
    );
    let second = write(
        &IndexDescriptor::new("second", temp.path().join("second")),
        &[Document::new("b", "arctic fox"), Document::new("c", "owl")],
    );

    let results = search(&[&first, &second], &SearchRequest::new("fox"));
    assert_eq!(results.total, 2);
    assert_eq!(results.hits.len(), 2);
    assert_eq!(results.indexes, ["first", "second"]);
    let mut sources: Vec<&str> = results.hits.iter().map(|h| h.index.as_str()).collect();
    sources.sort_unstable();
    assert_eq!(sources, ["first", "second"]);
}

#[test]
fn require_content_skips_field_only_queries() {
    let temp = TempDir::new().unwrap();
    let searcher = fox_and_dog(&news(temp.path()));

    let field_only = SearchRequest::new("category:news");
    assert_eq!(search(&[&searcher], &field_only).total, 1);

    let results = search(&[&searcher], &field_only.clone().requiring_content());
    assert!(results.is_empty());
    assert_eq!(results.indexes, ["news"]);

    let mixed = SearchRequest::new("category:news AND fox").requiring_content();
    assert_eq!(search(&[&searcher], &mixed).total, 1);
}

#[test]
fn force_unlock_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let desc = news(temp.path());
    drop(fox_and_dog(&desc));

    force_unlock(desc.path());
    assert!(!force_unlock(desc.path()));
    assert!(!desc.path().join(WRITER_LOCK_FILE).exists());
    assert!(!force_unlock(&temp.path().join("nowhere")));

    let reopened = IndexWriter::open_or_create(&desc, false).unwrap();
    assert_eq!(reopened.num_docs().unwrap(), 2);
}

#[test]
fn path_scope_limits_hits_and_total() {
    let temp = TempDir::new().unwrap();
    let searcher = fox_and_dog(&news(temp.path()));
    let any = "fox OR dog";

    let scoped = SearchRequest::new(any).with_path_scope("/NEWS/");
    let results = search(&[&searcher], &scoped);
    assert_eq!(ids(&results), ["1"]);
    assert_eq!(results.total, 1);

    for everywhere in ["*", "/%", ""] {
        let results = search(&[&searcher], &SearchRequest::new(any).with_path_scope(everywhere));
        assert_eq!(results.total, 2, "scope {everywhere:?}");
    }
}

#[test]
fn sorts_by_stored_field() {
    let temp = TempDir::new().unwrap();
    let searcher = fox_and_dog(&news(temp.path()));

    let asc = SearchRequest::new("fox OR dog").with_sort("title");
    assert_eq!(ids(&search(&[&searcher], &asc)), ["2", "1"]);

    let desc = SearchRequest::new("fox OR dog").with_sort("title desc, ##score##");
    assert_eq!(ids(&search(&[&searcher], &desc)), ["1", "2"]);
}

#[test]
fn numeric_sort_orders_mixed_values() {
    let temp = TempDir::new().unwrap();
    let desc = IndexDescriptor::new("ranked", temp.path().join("idx/ranked"))
        .with_field(FieldSpec::keyword("rank").sortable());
    let ranks = [("a", "10"), ("b", "1a"), ("c", "9"), ("d", "abc"), ("e", "2.5")];
    let mut docs: Vec<Document> = ranks
        .iter()
        .map(|(id, rank)| Document::new(*id, "fox").with_field("rank", *rank))
        .collect();
    docs.push(Document::new("f", "fox"));
    let searcher = write(&desc, &docs);

    let asc = SearchRequest::new("fox").with_sort("(int)rank");
    assert_eq!(ids(&search(&[&searcher], &asc)), ["f", "e", "c", "a", "b", "d"]);

    let descending = SearchRequest::new("fox").with_sort("(int)rank desc");
    assert_eq!(
        ids(&search(&[&searcher], &descending)),
        ["d", "b", "a", "c", "e", "f"]
    );
}

#[test]
fn and_operator_requires_every_term() {
    let temp = TempDir::new().unwrap();
    let searcher = fox_and_dog(&news(temp.path()));

    let or = SearchRequest::new("quick dog");
    assert_eq!(search(&[&searcher], &or).total, 2);

    let and = SearchRequest::new("quick dog").with_operator(Operator::And);
    assert_eq!(search(&[&searcher], &and).total, 0);
}

#[test]
fn diacritics_are_ignored_in_queries() {
    let temp = TempDir::new().unwrap();
    let searcher = fox_and_dog(&news(temp.path()));
    let results = search(&[&searcher], &SearchRequest::new("fóx"));
    assert_eq!(ids(&results), ["1"]);
}

#[test]
fn syntax_errors_and_clause_limit() {
    let temp = TempDir::new().unwrap();
    let searcher = fox_and_dog(&news(temp.path()));
    let executor = QueryExecutor::new(&EngineSettings {
        max_clause_count: 3,
        ..EngineSettings::default()
    });

    assert!(matches!(
        executor.search(&SearchRequest::new("(fox"), &[&searcher]),
        Err(SearchError::QuerySyntax(_))
    ));
    assert!(matches!(
        executor.search(&SearchRequest::new("a b c d"), &[&searcher]),
        Err(SearchError::TooComplex {
            clauses: 4,
            limit: 3
        })
    ));
    assert!(executor.search(&SearchRequest::new("a b c"), &[&searcher]).is_ok());
}

#[test]
fn deeply_nested_queries_are_rejected() {
    let temp = TempDir::new().unwrap();
    let searcher = fox_and_dog(&news(temp.path()));
    let query = format!("{}fox{}", "(".repeat(20_000), ")".repeat(20_000));

    let result = QueryExecutor::new(&EngineSettings::default())
        .search(&SearchRequest::new(query), &[&searcher]);
    assert!(matches!(result, Err(SearchError::QuerySyntax(_))));

    let shallow = SearchRequest::new("((fox) OR (dog))");
    assert_eq!(search(&[&searcher], &shallow).total, 2);
}

#[test]
fn cached_searchers_see_commits_after_invalidation() {
    let temp = TempDir::new().unwrap();
    let desc = news(temp.path());
    let cache = SearcherCache::new();
    drop(fox_and_dog(&desc));

    let before = cache.get_or_open(&desc).unwrap();
    assert_eq!(before.num_docs(), 2);

    let mut writer = IndexWriter::open_or_create(&desc, false).unwrap();
    writer.add_document(&Document::new("3", "grey wolf")).unwrap();
    writer.commit().unwrap();
    drop(writer);

    cache.invalidate(desc.path());
    let after = cache.get_or_open(&desc).unwrap();
    let results = search(&[&*after], &SearchRequest::new("wolf"));
    assert_eq!(ids(&results), ["3"]);
}

#[test]
fn descriptor_changes_are_detected() {
    let temp = TempDir::new().unwrap();
    let desc = news(temp.path());
    drop(fox_and_dog(&desc));
    assert_eq!(detect_index_status(&desc), IndexStatus::Current);

    let changed = desc.clone().with_field(FieldSpec::keyword("author"));
    assert_eq!(detect_index_status(&changed), IndexStatus::ConfigChanged);
}
