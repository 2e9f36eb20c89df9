//! Query tree.
//!
//! Represents parsed queries before compilation to index queries. Every
//! leaf names the field it targets, so a tree can be inspected or
//! decomposed per field without consulting a schema.

use std::fmt;

/// Edit distance used by `term~` when no distance is given.
pub const DEFAULT_FUZZY_DISTANCE: u8 = 2;

/// A term bound to the field it is matched against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldTerm {
    /// Field name.
    pub field: String,
    /// Term text (or pattern, for wildcard leaves).
    pub text: String,
}

impl FieldTerm {
    /// Creates a term on the given field.
    pub fn new(field: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            text: text.into(),
        }
    }
}

/// How a clause participates in its enclosing boolean group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occur {
    /// The clause may match; matching raises the score.
    Should,
    /// The clause must match.
    Must,
    /// The clause must not match.
    MustNot,
}

/// One clause of a boolean group.
#[derive(Debug, Clone, PartialEq)]
pub struct BooleanClause {
    /// Required, optional, or prohibited.
    pub occur: Occur,
    /// The clause query.
    pub node: QueryNode,
}

impl BooleanClause {
    /// Creates a clause.
    pub fn new(occur: Occur, node: QueryNode) -> Self {
        Self { occur, node }
    }

    /// Returns true if the clause is prohibited.
    pub fn is_prohibited(&self) -> bool {
        self.occur == Occur::MustNot
    }

    /// Returns true if the clause is required.
    pub fn is_required(&self) -> bool {
        self.occur == Occur::Must
    }
}

/// A parsed query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryNode {
    /// A single term.
    Term(FieldTerm),

    /// An ordered sequence of terms, matched within `slop` positions.
    Phrase {
        /// Phrase terms in order.
        terms: Vec<FieldTerm>,
        /// Allowed position slack (0 = exact).
        slop: u32,
    },

    /// A pattern with `*` (any run) and `?` (any single character).
    Wildcard(FieldTerm),

    /// Terms starting with the given text.
    Prefix(FieldTerm),

    /// Terms within an edit distance of the given text.
    Fuzzy {
        /// Term to approximate.
        term: FieldTerm,
        /// Maximum Levenshtein distance.
        distance: u8,
    },

    /// A boolean combination of clauses.
    Boolean(Vec<BooleanClause>),

    /// Multiplies the score of the inner query.
    Boost {
        /// Boosted query.
        node: Box<Self>,
        /// Boost factor.
        factor: f32,
    },
}

impl QueryNode {
    /// Creates a term leaf.
    pub fn term(field: &str, text: &str) -> Self {
        Self::Term(FieldTerm::new(field, text))
    }

    /// Creates an exact phrase on a single field.
    pub fn phrase(field: &str, words: &[&str]) -> Self {
        Self::Phrase {
            terms: words.iter().map(|w| FieldTerm::new(field, *w)).collect(),
            slop: 0,
        }
    }

    /// Creates a boosted node.
    pub fn boost(node: Self, factor: f32) -> Self {
        Self::Boost {
            node: Box::new(node),
            factor,
        }
    }

    /// Returns the number of leaf clauses in the tree.
    ///
    /// Used to enforce a ceiling on query complexity.
    pub fn clause_count(&self) -> usize {
        match self {
            Self::Term(_)
            | Self::Phrase { .. }
            | Self::Wildcard(_)
            | Self::Prefix(_)
            | Self::Fuzzy { .. } => 1,
            Self::Boolean(clauses) => clauses.iter().map(|c| c.node.clause_count()).sum(),
            Self::Boost { node, .. } => node.clause_count(),
        }
    }

    /// Returns true if any leaf of the tree targets `field`.
    pub fn targets_field(&self, field: &str) -> bool {
        match self {
            Self::Term(t) | Self::Wildcard(t) | Self::Prefix(t) | Self::Fuzzy { term: t, .. } => {
                t.field == field
            }
            Self::Phrase { terms, .. } => terms.iter().any(|t| t.field == field),
            Self::Boolean(clauses) => clauses.iter().any(|c| c.node.targets_field(field)),
            Self::Boost { node, .. } => node.targets_field(field),
        }
    }

    /// Returns true if the node is a boolean group with no clauses.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Boolean(clauses) => clauses.is_empty(),
            Self::Boost { node, .. } => node.is_empty(),
            Self::Phrase { terms, .. } => terms.is_empty(),
            _ => false,
        }
    }

    /// Formats the node as a tree structure with the given indentation level.
    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let prefix = "  ".repeat(indent);
        match self {
            Self::Term(t) => writeln!(f, "{prefix}Term({}:{:?})", t.field, t.text),
            Self::Phrase { terms, slop } => {
                let words: Vec<String> = terms
                    .iter()
                    .map(|t| format!("{}:{}", t.field, t.text))
                    .collect();
                if *slop == 0 {
                    writeln!(f, "{prefix}Phrase({words:?})")
                } else {
                    writeln!(f, "{prefix}Phrase({words:?}, slop={slop})")
                }
            }
            Self::Wildcard(t) => writeln!(f, "{prefix}Wildcard({}:{:?})", t.field, t.text),
            Self::Prefix(t) => writeln!(f, "{prefix}Prefix({}:{:?})", t.field, t.text),
            Self::Fuzzy { term, distance } => writeln!(
                f,
                "{prefix}Fuzzy({}:{:?}, distance={distance})",
                term.field, term.text
            ),
            Self::Boolean(clauses) => {
                writeln!(f, "{prefix}Boolean")?;
                for clause in clauses {
                    writeln!(f, "{prefix}  {:?}", clause.occur)?;
                    clause.node.fmt_tree(f, indent + 2)?;
                }
                Ok(())
            }
            Self::Boost { node, factor } => {
                writeln!(f, "{prefix}Boost({factor})")?;
                node.fmt_tree(f, indent + 1)
            }
        }
    }

    /// Formats the node in query syntax, with every field spelled out.
    pub fn to_query_string(&self) -> String {
        match self {
            Self::Term(t) => format!("{}:{}", t.field, t.text),
            Self::Phrase { terms, slop } => {
                let field = terms.first().map(|t| t.field.as_str()).unwrap_or_default();
                let words: Vec<&str> = terms.iter().map(|t| t.text.as_str()).collect();
                if *slop == 0 {
                    format!("{field}:\"{}\"", words.join(" "))
                } else {
                    format!("{field}:\"{}\"~{slop}", words.join(" "))
                }
            }
            Self::Wildcard(t) => format!("{}:{}", t.field, t.text),
            Self::Prefix(t) => format!("{}:{}*", t.field, t.text),
            Self::Fuzzy { term, distance } => {
                format!("{}:{}~{distance}", term.field, term.text)
            }
            Self::Boolean(clauses) => {
                let parts: Vec<String> = clauses
                    .iter()
                    .map(|c| {
                        let inner = match &c.node {
                            Self::Boolean(_) => format!("({})", c.node.to_query_string()),
                            other => other.to_query_string(),
                        };
                        match c.occur {
                            Occur::Must => format!("+{inner}"),
                            Occur::MustNot => format!("-{inner}"),
                            Occur::Should => inner,
                        }
                    })
                    .collect();
                parts.join(" ")
            }
            Self::Boost { node, factor } => match node.as_ref() {
                Self::Boolean(_) => format!("({})^{factor}", node.to_query_string()),
                other => format!("{}^{factor}", other.to_query_string()),
            },
        }
    }
}

impl fmt::Display for QueryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_tree(f, 0)
    }
}
