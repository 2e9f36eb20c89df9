//! Query compiler.
//!
//! Compiles a [`QueryNode`] into a Tantivy query for one index. Text on
//! analyzed fields goes through the query analyzer; keyword and reserved
//! raw fields match the literal text.

use sift_query::{Occur as QueryOccur, QueryNode};
use tantivy::{
    Term,
    query::{
        AllQuery, BooleanQuery, BoostQuery, EmptyQuery, FuzzyTermQuery, Occur, PhraseQuery,
        Query, RegexQuery, TermQuery,
    },
    schema::{Field, IndexRecordOption, Schema},
};

use crate::{
    analyzer::Analyzer,
    error::SearchError,
    schema::{has_positions, is_analyzed},
};

/// Characters with special meaning in a Tantivy regex.
const REGEX_META: &str = r"\.+*?()|[]{}^$";

/// Compiles query trees against one index schema.
pub(crate) struct QueryCompiler<'a> {
    /// Schema of the index being searched.
    schema: &'a Schema,
    /// Query analyzer shared by all searched indexes.
    analyzer: &'a Analyzer,
}

impl<'a> QueryCompiler<'a> {
    /// Creates a compiler for one schema.
    pub(crate) fn new(schema: &'a Schema, analyzer: &'a Analyzer) -> Self {
        Self { schema, analyzer }
    }

    /// Compiles a tree. A tree that matches nothing compiles to
    /// `EmptyQuery`.
    pub(crate) fn compile_root(&self, node: &QueryNode) -> Result<Box<dyn Query>, SearchError> {
        Ok(self.compile(node)?.unwrap_or_else(|| Box::new(EmptyQuery)))
    }

    /// Compiles a node.
    ///
    /// Returns `None` for nodes with nothing to match, such as a term made
    /// only of stop words.
    fn compile(&self, node: &QueryNode) -> Result<Option<Box<dyn Query>>, SearchError> {
        match node {
            QueryNode::Term(term) => Ok(self.on_field(&term.field, |field| {
                self.compile_term(field, &term.text)
            })),
            QueryNode::Phrase { terms, slop } => {
                let Some(first) = terms.first() else {
                    return Ok(None);
                };
                let words: Vec<&str> = terms
                    .iter()
                    .filter(|t| t.field == first.field)
                    .map(|t| t.text.as_str())
                    .collect();
                Ok(self.on_field(&first.field, |field| {
                    self.compile_phrase(field, &words, *slop)
                }))
            }
            QueryNode::Wildcard(term) => self.compile_regex(&term.field, &wildcard_regex(
                &self.literal(&term.field, &term.text),
            )),
            QueryNode::Prefix(term) => self.compile_regex(&term.field, &prefix_regex(
                &self.literal(&term.field, &term.text),
            )),
            QueryNode::Fuzzy { term, distance } => Ok(self.on_field(&term.field, |field| {
                let text = self.literal(&term.field, &term.text);
                let term = Term::from_field_text(field, &text);
                Some(Box::new(FuzzyTermQuery::new(term, *distance, true)) as Box<dyn Query>)
            })),
            QueryNode::Boolean(clauses) => {
                let mut compiled: Vec<(Occur, Box<dyn Query>)> = Vec::new();
                for clause in clauses {
                    if let Some(query) = self.compile(&clause.node)? {
                        compiled.push((occur(clause.occur), query));
                    }
                }
                if compiled.is_empty() {
                    return Ok(None);
                }
                if compiled.iter().all(|(o, _)| *o == Occur::MustNot) {
                    compiled.insert(0, (Occur::Must, Box::new(AllQuery)));
                }
                Ok(Some(Box::new(BooleanQuery::new(compiled))))
            }
            QueryNode::Boost { node, factor } => Ok(self
                .compile(node)?
                .map(|inner| Box::new(BoostQuery::new(inner, *factor)) as Box<dyn Query>)),
        }
    }

    /// Resolves a field name and compiles against it. Fields missing from
    /// this index compile to `EmptyQuery`.
    fn on_field(
        &self,
        name: &str,
        build: impl FnOnce(Field) -> Option<Box<dyn Query>>,
    ) -> Option<Box<dyn Query>> {
        match self.schema.get_field(name) {
            Ok(field) => build(field),
            Err(_) => Some(Box::new(EmptyQuery)),
        }
    }

    /// Compiles a single term. Analysis may split it into a phrase.
    fn compile_term(&self, field: Field, text: &str) -> Option<Box<dyn Query>> {
        if !is_analyzed(self.schema, field) {
            return Some(raw_term_query(field, text));
        }
        let tokens = self.analyzer.tokenize(text);
        self.tokens_query(field, &tokens, 0)
    }

    /// Compiles a phrase from its words.
    fn compile_phrase(&self, field: Field, words: &[&str], slop: u32) -> Option<Box<dyn Query>> {
        if !is_analyzed(self.schema, field) {
            return Some(raw_term_query(field, &words.join(" ")));
        }
        let tokens: Vec<String> = words
            .iter()
            .flat_map(|word| self.analyzer.tokenize(word))
            .collect();
        self.tokens_query(field, &tokens, slop)
    }

    /// Builds a term query for one token and a phrase query for several.
    fn tokens_query(&self, field: Field, tokens: &[String], slop: u32) -> Option<Box<dyn Query>> {
        let terms: Vec<Term> = tokens
            .iter()
            .map(|token| Term::from_field_text(field, token))
            .collect();
        match terms.len() {
            0 => None,
            1 => terms
                .into_iter()
                .next()
                .map(|term| Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs)) as _),
            _ if has_positions(self.schema, field) => {
                let mut phrase = PhraseQuery::new(terms);
                phrase.set_slop(slop);
                Some(Box::new(phrase))
            }
            _ => {
                let clauses = terms
                    .into_iter()
                    .map(|term| {
                        let query: Box<dyn Query> =
                            Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs));
                        (Occur::Must, query)
                    })
                    .collect();
                Some(Box::new(BooleanQuery::new(clauses)))
            }
        }
    }

    /// Compiles a regex over the terms of a field.
    fn compile_regex(
        &self,
        name: &str,
        pattern: &str,
    ) -> Result<Option<Box<dyn Query>>, SearchError> {
        let Ok(field) = self.schema.get_field(name) else {
            return Ok(Some(Box::new(EmptyQuery)));
        };
        let query = RegexQuery::from_pattern(pattern, field)
            .map_err(|e| SearchError::Internal(format!("invalid pattern '{pattern}': {e}")))?;
        Ok(Some(Box::new(query)))
    }

    /// Normalizes literal text the way the field's tokens were normalized.
    fn literal(&self, name: &str, text: &str) -> String {
        match self.schema.get_field(name) {
            Ok(field) if is_analyzed(self.schema, field) => self.analyzer.normalize_literal(text),
            _ => text.to_string(),
        }
    }
}

/// Exact match on an untokenized field.
fn raw_term_query(field: Field, text: &str) -> Box<dyn Query> {
    Box::new(TermQuery::new(
        Term::from_field_text(field, text),
        IndexRecordOption::Basic,
    ))
}

/// Maps a parsed clause occurrence to Tantivy's.
fn occur(occur: QueryOccur) -> Occur {
    match occur {
        QueryOccur::Should => Occur::Should,
        QueryOccur::Must => Occur::Must,
        QueryOccur::MustNot => Occur::MustNot,
    }
}

/// Appends a character that must match literally.
fn push_literal(regex: &mut String, ch: char) {
    if REGEX_META.contains(ch) {
        regex.push('\\');
    }
    regex.push(ch);
}

/// Translates a wildcard pattern (`*`, `?`, backslash escapes) to a regex.
fn wildcard_regex(pattern: &str) -> String {
    let mut regex = String::with_capacity(pattern.len() * 2);
    let mut chars = pattern.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    push_literal(&mut regex, escaped);
                }
            }
            '*' => regex.push_str(".*"),
            '?' => regex.push('.'),
            other => push_literal(&mut regex, other),
        }
    }
    regex
}

/// Regex matching every term that starts with `prefix`.
fn prefix_regex(prefix: &str) -> String {
    let mut regex = String::with_capacity(prefix.len() * 2 + 2);
    for ch in prefix.chars() {
        push_literal(&mut regex, ch);
    }
    regex.push_str(".*");
    regex
}
