//! Multi-index query execution.

use std::{
    cmp::{Ordering, max, min},
    collections::{BTreeMap, HashMap, hash_map::Entry},
    fmt,
    sync::Arc,
};

use serde::Serialize;
use sift_config::{CONTENT_FIELD, DefaultOperator, EngineSettings, ID_FIELD, IndexDescriptor};
use sift_query::{Operator, QueryNode, parse};
use tantivy::{
    Searcher, TantivyDocument,
    collector::{Count, TopDocs},
    schema::Value,
};
use tracing::{debug, error};

use super::{IndexSearcher, compile::QueryCompiler};
use crate::{
    analyzer::{Analyzer, strip_diacritics},
    error::SearchError,
    filter::{Filter, FilteredCollector},
    schema::stored_field_names,
    sort::{SortComparator, SortCriterion, SortKind, SortSpecification, parse_sort},
};

/// Path scopes that mean "everywhere".
const UNSCOPED_PATHS: [&str; 3] = ["", "*", "/%"];

/// Parameters of one search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    /// Query string.
    pub query: String,
    /// When set, only documents whose alias path starts with this prefix
    /// match.
    pub path_scope: Option<String>,
    /// Sort expression; relevance order when unset.
    pub sort_expression: Option<String>,
    /// Page size, capped by the engine's `max_results`.
    pub max_results: Option<usize>,
    /// Number of merged hits to skip.
    pub offset: usize,
    /// Return nothing unless some clause searches `content`.
    pub require_content_field: bool,
    /// Operator between unmarked clauses; the engine default when unset.
    pub default_operator: Option<Operator>,
}

impl SearchRequest {
    /// Creates a request for a query string.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            path_scope: None,
            sort_expression: None,
            max_results: None,
            offset: 0,
            require_content_field: false,
            default_operator: None,
        }
    }

    /// Restricts matches to a path prefix.
    pub fn with_path_scope(mut self, scope: impl Into<String>) -> Self {
        self.path_scope = Some(scope.into());
        self
    }

    /// Sets the sort expression.
    pub fn with_sort(mut self, expression: impl Into<String>) -> Self {
        self.sort_expression = Some(expression.into());
        self
    }

    /// Sets the page size.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }

    /// Sets the number of hits to skip.
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Requires a clause on `content`.
    pub fn requiring_content(mut self) -> Self {
        self.require_content_field = true;
        self
    }

    /// Overrides the default operator.
    pub fn with_operator(mut self, operator: Operator) -> Self {
        self.default_operator = Some(operator);
        self
    }

    /// The path filter implied by the scope, if any.
    fn path_filter(&self) -> Option<Filter> {
        self.path_scope
            .as_deref()
            .map(str::trim)
            .filter(|scope| !UNSCOPED_PATHS.contains(scope))
            .map(Filter::path_prefix)
    }
}

/// One matching document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hit {
    /// Document identifier.
    pub id: String,
    /// Relevance score within its index.
    pub score: f32,
    /// Name of the index the document came from.
    pub index: String,
    /// Stored field values, first value per field.
    pub fields: BTreeMap<String, String>,
}

impl Hit {
    /// Returns the value a sort criterion reads. `id` is always available.
    pub fn value(&self, field: &str) -> Option<&str> {
        if field == ID_FIELD {
            Some(&self.id)
        } else {
            self.fields.get(field).map(String::as_str)
        }
    }
}

/// Merged result of a search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultSet {
    /// The requested page of hits.
    pub hits: Vec<Hit>,
    /// Distinct matching documents across all indexes.
    pub total: usize,
    /// Best score among all merged hits; zero when there are none.
    pub max_score: f32,
    /// Names of the indexes searched.
    pub indexes: Vec<String>,
}

impl ResultSet {
    /// An empty result over the given indexes.
    fn empty(indexes: Vec<String>) -> Self {
        Self {
            hits: Vec::new(),
            total: 0,
            max_score: 0.0,
            indexes,
        }
    }

    /// Returns true if nothing matched.
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// Hits and match count from one index.
struct IndexMatches {
    /// Matching documents, not deduplicated.
    count: usize,
    /// Top documents with their stored fields loaded.
    hits: Vec<Hit>,
}

/// Runs queries over sets of opened indexes.
pub struct QueryExecutor {
    /// Engine limits and defaults.
    settings: EngineSettings,
    /// Comparators for `(custom)` sort criteria, by field.
    comparators: HashMap<String, Arc<dyn SortComparator>>,
}

impl fmt::Debug for QueryExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryExecutor")
            .field("settings", &self.settings)
            .field("comparators", &self.comparators.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl QueryExecutor {
    /// Creates an executor.
    pub fn new(settings: &EngineSettings) -> Self {
        Self {
            settings: settings.clone(),
            comparators: HashMap::new(),
        }
    }

    /// Registers the comparator used by `(custom)` criteria on `field`.
    /// Custom criteria without one leave the order unchanged.
    pub fn with_comparator(
        mut self,
        field: impl Into<String>,
        comparator: Arc<dyn SortComparator>,
    ) -> Self {
        self.comparators.insert(field.into(), comparator);
        self
    }

    /// Searches every index in `searchers` and merges the hits.
    ///
    /// The query is parsed once and compiled per index, so a field one
    /// index lacks simply matches nothing there. Documents found in several
    /// indexes are reported once, with their best score.
    pub fn search<S: AsRef<IndexSearcher>>(
        &self,
        request: &SearchRequest,
        searchers: &[S],
    ) -> Result<ResultSet, SearchError> {
        let result = self.run(request, searchers);
        match &result {
            Ok(results) => debug!(
                query = %request.query,
                indexes = ?results.indexes,
                total = results.total,
                "search complete"
            ),
            Err(SearchError::Internal(message)) => {
                error!(query = %request.query, error = %message, "search failed");
            }
            Err(_) => {}
        }
        result
    }

    /// Body of [`search`](Self::search).
    fn run<S: AsRef<IndexSearcher>>(
        &self,
        request: &SearchRequest,
        searchers: &[S],
    ) -> Result<ResultSet, SearchError> {
        if searchers.is_empty() {
            return Err(SearchError::NoIndexes);
        }
        let descriptors: Vec<&IndexDescriptor> =
            searchers.iter().map(|s| s.as_ref().descriptor()).collect();
        let names: Vec<String> = descriptors.iter().map(|d| d.name.clone()).collect();
        let analyzer = Analyzer::for_indexes(&descriptors)?;

        let Some(node) = self.parse_query(request)? else {
            return Ok(ResultSet::empty(names));
        };
        if request.require_content_field && !node.targets_field(CONTENT_FIELD) {
            debug!(query = %request.query, "query has no content clause, skipping");
            return Ok(ResultSet::empty(names));
        }

        let filter = request.path_filter();
        let sort = request.sort_expression.as_deref().and_then(parse_sort);

        let mut total = 0;
        let mut merged: Vec<Hit> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for searcher in searchers {
            let matches = self.search_index(
                searcher.as_ref(),
                &node,
                &analyzer,
                filter.as_ref(),
                sort.as_ref(),
            )?;
            total += matches.count;
            for hit in matches.hits {
                match positions.entry(hit.id.clone()) {
                    Entry::Occupied(entry) => {
                        total = total.saturating_sub(1);
                        let kept = &mut merged[*entry.get()];
                        if hit.score > kept.score {
                            *kept = hit;
                        }
                    }
                    Entry::Vacant(entry) => {
                        entry.insert(merged.len());
                        merged.push(hit);
                    }
                }
            }
        }

        merged.sort_by(|a, b| self.compare_hits(a, b, sort.as_ref()));
        let max_score = merged.iter().map(|h| h.score).fold(0.0, f32::max);
        let page_size = min(
            request.max_results.unwrap_or(self.settings.max_results),
            self.settings.max_results,
        );
        let hits = merged
            .into_iter()
            .skip(request.offset)
            .take(page_size)
            .collect();

        Ok(ResultSet {
            hits,
            total,
            max_score,
            indexes: names,
        })
    }

    /// Parses the request's query after folding diacritics.
    fn parse_query(&self, request: &SearchRequest) -> Result<Option<QueryNode>, SearchError> {
        let operator = request
            .default_operator
            .unwrap_or(match self.settings.default_operator {
                DefaultOperator::Or => Operator::Or,
                DefaultOperator::And => Operator::And,
            });
        let text = strip_diacritics(&request.query);
        let Some(node) = parse(&text, CONTENT_FIELD, operator)? else {
            return Ok(None);
        };

        let clauses = node.clause_count();
        if clauses > self.settings.max_clause_count {
            return Err(SearchError::TooComplex {
                clauses,
                limit: self.settings.max_clause_count,
            });
        }
        Ok((!node.is_empty()).then_some(node))
    }

    /// Runs the query on one index.
    fn search_index(
        &self,
        index: &IndexSearcher,
        node: &QueryNode,
        analyzer: &Analyzer,
        filter: Option<&Filter>,
        sort: Option<&SortSpecification>,
    ) -> Result<IndexMatches, SearchError> {
        let searcher = index.searcher();
        let schema = searcher.schema().clone();
        let query = QueryCompiler::new(&schema, analyzer).compile_root(node)?;

        let limit = if sort.is_some_and(SortSpecification::sorts_by_field) {
            usize::try_from(searcher.num_docs()).unwrap_or(usize::MAX)
        } else {
            self.settings.max_results
        };
        let collector = (Count, TopDocs::with_limit(max(1, limit)));
        let (count, top) = match filter {
            Some(filter) => searcher.search(
                query.as_ref(),
                &FilteredCollector::new(collector, filter.clone(), &schema),
            )?,
            None => searcher.search(query.as_ref(), &collector)?,
        };

        let fields = stored_field_names(&schema);
        let hits = top
            .into_iter()
            .map(|(score, address)| {
                let doc: TantivyDocument = searcher.doc(address)?;
                Ok(load_hit(&searcher, &doc, &fields, score, index.name()))
            })
            .collect::<Result<Vec<_>, SearchError>>()?;
        Ok(IndexMatches { count, hits })
    }

    /// Orders hits by the sort criteria, then score, then id.
    fn compare_hits(&self, a: &Hit, b: &Hit, sort: Option<&SortSpecification>) -> Ordering {
        sort.map(SortSpecification::criteria)
            .unwrap_or_default()
            .iter()
            .map(|criterion| self.compare_by(criterion, a, b))
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)))
    }

    /// Orders hits by one criterion.
    fn compare_by(&self, criterion: &SortCriterion, a: &Hit, b: &Hit) -> Ordering {
        let field = criterion.field.as_str();
        match criterion.kind {
            SortKind::Score => criterion.compare_scores(a.score, b.score),
            SortKind::Custom => self.comparators.get(field).map_or(Ordering::Equal, |cmp| {
                criterion.directed(cmp.compare(a.value(field), b.value(field)))
            }),
            SortKind::String | SortKind::NumericString => {
                criterion.compare_values(a.value(field), b.value(field))
            }
        }
    }
}

/// Reads the id and stored fields of a matched document.
fn load_hit(
    searcher: &Searcher,
    doc: &TantivyDocument,
    fields: &[String],
    score: f32,
    index: &str,
) -> Hit {
    let schema = searcher.schema();
    let first_text = |name: &str| {
        schema
            .get_field(name)
            .ok()
            .and_then(|field| doc.get_first(field))
            .and_then(|value| value.as_str())
            .map(str::to_string)
    };
    let id = first_text(ID_FIELD).unwrap_or_default();
    let fields = fields
        .iter()
        .filter_map(|name| first_text(name).map(|value| (name.clone(), value)))
        .collect();
    Hit {
        id,
        score,
        index: index.to_string(),
        fields,
    }
}
