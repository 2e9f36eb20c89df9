//! Sort specification parsing.
//!
//! A sort expression is a comma-separated list of criteria, each an
//! optional type tag, a field name and an optional direction:
//!
//! ```text
//! (date)published desc, title, ##score##
//! ```
//!
//! Values are compared as strings, so dates are expected in a form that
//! sorts lexically. Numeric tags put values that parse as numbers first, in
//! numeric order, followed by the rest in string order. `##score##` (or the
//! `(score)` tag)
//! sorts by relevance, `(custom)` defers to a comparator registered on the
//! executor.

use std::{cmp::Ordering, sync::LazyLock};

use regex::Regex;

/// Pseudo-field that sorts by relevance score.
pub const SCORE_FIELD: &str = "##score##";

/// One criterion: optional `(type)` tag, field name, optional direction.
static SORT_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\((?<type>\w+)\))?\s*(?<field>[^\s]+)(\s+(?<dir>\w+))?\s*$")
        .expect("invalid sort token regex")
});

/// How a criterion compares values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKind {
    /// Lexical comparison of stored values.
    String,
    /// A number stored in lexically sortable form.
    NumericString,
    /// Relevance score.
    Score,
    /// Comparison by a caller-supplied [`SortComparator`].
    Custom,
}

/// One sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortCriterion {
    /// Field to sort on. [`SCORE_FIELD`] for score criteria.
    pub field: String,
    /// Value comparison.
    pub kind: SortKind,
    /// Whether larger values come first.
    pub descending: bool,
}

impl SortCriterion {
    /// Returns true if this criterion sorts by relevance.
    pub fn is_score(&self) -> bool {
        self.kind == SortKind::Score
    }

    /// Orders two stored values. Missing values sort first when ascending.
    pub fn compare_values(&self, a: Option<&str>, b: Option<&str>) -> Ordering {
        let ordering = match self.kind {
            SortKind::NumericString => compare_numeric(a, b),
            _ => a.cmp(&b),
        };
        self.directed(ordering)
    }

    /// Orders two scores. Higher scores come first when descending.
    pub fn compare_scores(&self, a: f32, b: f32) -> Ordering {
        self.directed(a.total_cmp(&b))
    }

    /// Applies the criterion's direction to an ascending ordering.
    pub fn directed(&self, ordering: Ordering) -> Ordering {
        if self.descending {
            ordering.reverse()
        } else {
            ordering
        }
    }
}

/// Ascending numeric order: missing values, then numbers, then values that
/// are not numbers in string order.
fn compare_numeric(a: Option<&str>, b: Option<&str>) -> Ordering {
    let number = |v: &str| v.trim().parse::<f64>().ok();
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => match (number(x), number(y)) {
            (Some(m), Some(n)) => m.total_cmp(&n),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => x.cmp(y),
        },
    }
}

/// An ordered, non-empty list of sort criteria.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpecification(Vec<SortCriterion>);

impl SortSpecification {
    /// Returns the criteria in priority order.
    pub fn criteria(&self) -> &[SortCriterion] {
        &self.0
    }

    /// Returns true if any criterion sorts by a stored field rather than
    /// the score.
    pub fn sorts_by_field(&self) -> bool {
        self.0.iter().any(|c| !c.is_score())
    }
}

/// Compares two stored values for a `(custom)` criterion.
pub trait SortComparator: Send + Sync {
    /// Orders two values in ascending order. The criterion's direction is
    /// applied afterwards.
    fn compare(&self, a: Option<&str>, b: Option<&str>) -> Ordering;
}

impl<F> SortComparator for F
where
    F: Fn(Option<&str>, Option<&str>) -> Ordering + Send + Sync,
{
    fn compare(&self, a: Option<&str>, b: Option<&str>) -> Ordering {
        self(a, b)
    }
}

/// Parses a sort expression.
///
/// Returns `None` when the expression yields no criteria, which means
/// "order by relevance". Score criteria after the first are ignored.
/// Field criteria are ascending unless the direction is `desc`. A score
/// criterion is the exception: without a direction, or with anything other
/// than `asc`, higher scores come first.
pub fn parse_sort(expression: &str) -> Option<SortSpecification> {
    let mut criteria: Vec<SortCriterion> = Vec::new();

    for token in expression.split(',') {
        let Some(caps) = SORT_TOKEN.captures(token) else {
            continue;
        };
        let Some(field) = caps.name("field").map(|m| m.as_str()) else {
            continue;
        };
        let tag = caps.name("type").map(|m| m.as_str().to_lowercase());
        let direction = caps.name("dir").map(|m| m.as_str().to_lowercase());

        let kind = if field.eq_ignore_ascii_case(SCORE_FIELD) {
            SortKind::Score
        } else {
            match tag.as_deref() {
                Some("int" | "float" | "double") => SortKind::NumericString,
                Some("custom") => SortKind::Custom,
                Some("score") => SortKind::Score,
                _ => SortKind::String,
            }
        };

        if kind == SortKind::Score && criteria.iter().any(SortCriterion::is_score) {
            continue;
        }

        let descending = match (kind, direction.as_deref()) {
            (SortKind::Score, Some("asc")) => false,
            (SortKind::Score, _) => true,
            (_, dir) => dir == Some("desc"),
        };

        let field = if kind == SortKind::Score {
            SCORE_FIELD.to_string()
        } else {
            field.to_string()
        };

        criteria.push(SortCriterion {
            field,
            kind,
            descending,
        });
    }

    (!criteria.is_empty()).then_some(SortSpecification(criteria))
}
