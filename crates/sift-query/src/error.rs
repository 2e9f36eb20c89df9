//! Query reading errors.
//!
//! The lexer and parser report [`LexError`] and [`ParseError`]; callers of
//! [`parse`](crate::parse) see both as a [`QueryError`].

use std::{error::Error as StdError, fmt};

use thiserror::Error;

/// Tokenizing failed at a byte offset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("query syntax error at byte {position}: {message}")]
pub struct LexError {
    /// Error message.
    pub message: String,
    /// Byte offset of the offending character.
    pub position: usize,
    /// Query text being tokenized.
    pub input: String,
}

impl LexError {
    /// Creates a lexer error.
    pub fn new(message: impl Into<String>, position: usize, input: &str) -> Self {
        Self {
            message: message.into(),
            position,
            input: input.to_string(),
        }
    }
}

/// The token stream is not a valid query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
    /// Error message.
    pub message: String,
    /// Index of the offending token, or `None` at end of input.
    pub token_index: Option<usize>,
}

impl ParseError {
    /// Creates a parser error.
    pub fn new(message: impl Into<String>, token_index: Option<usize>) -> Self {
        Self {
            message: message.into(),
            token_index,
        }
    }
}

/// Which stage of query reading rejected the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorKind {
    /// The text could not be split into tokens.
    Lex,
    /// The tokens do not form a valid query.
    Parse,
}

/// Hints keyed by stage and a fragment of the error message.
const HINTS: &[(QueryErrorKind, &str, &str)] = &[
    (
        QueryErrorKind::Lex,
        "unclosed quote",
        "close the phrase with a second quote (\")",
    ),
    (
        QueryErrorKind::Lex,
        "escape",
        "a backslash must be followed by the character it escapes",
    ),
    (
        QueryErrorKind::Parse,
        "closing parenthesis",
        "every ( needs a matching )",
    ),
    (
        QueryErrorKind::Parse,
        "nested deeper",
        "remove parentheses that group a single clause",
    ),
    (
        QueryErrorKind::Parse,
        "operator",
        "AND, OR and NOT join two expressions, as in 'fox AND dog'",
    ),
];

/// A query that could not be read.
///
/// Renders as the message, the query text with a caret under the offending
/// byte when known, and a hint for common mistakes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryError {
    /// Stage that failed.
    pub kind: QueryErrorKind,
    /// What went wrong.
    message: String,
    /// Byte offset of the problem, when the lexer found it.
    pub offset: Option<usize>,
    /// The query text, when known.
    pub query: Option<String>,
}

impl QueryError {
    /// Error raised while tokenizing `query` at byte `offset`.
    pub fn lex(message: impl Into<String>, offset: usize, query: impl Into<String>) -> Self {
        Self {
            kind: QueryErrorKind::Lex,
            message: message.into(),
            offset: Some(offset),
            query: Some(query.into()),
        }
    }

    /// Error raised while parsing tokens.
    pub fn parse(message: impl Into<String>, query: Option<String>) -> Self {
        Self {
            kind: QueryErrorKind::Parse,
            message: message.into(),
            offset: None,
            query,
        }
    }

    /// Error raised while parsing `query`, anchored at byte `offset`.
    pub fn parse_at(message: impl Into<String>, offset: usize, query: impl Into<String>) -> Self {
        Self {
            offset: Some(offset),
            ..Self::parse(message, Some(query.into()))
        }
    }

    /// The bare message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// A hint for fixing the query, if the mistake is a common one.
    pub fn suggestion(&self) -> Option<&'static str> {
        HINTS
            .iter()
            .find(|(kind, fragment, _)| *kind == self.kind && self.message.contains(fragment))
            .map(|(_, _, hint)| *hint)
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "query syntax error: {}", self.message)?;
        if let Some(query) = &self.query {
            writeln!(f, "  {query}")?;
            if let Some(offset) = self.offset {
                writeln!(f, "  {:>width$}", '^', width = offset.min(query.len()) + 1)?;
            }
        }
        match self.suggestion() {
            Some(hint) => write!(f, "hint: {hint}"),
            None => Ok(()),
        }
    }
}

impl StdError for QueryError {}

impl From<LexError> for QueryError {
    fn from(err: LexError) -> Self {
        Self::lex(err.message, err.position, err.input)
    }
}

impl From<ParseError> for QueryError {
    fn from(err: ParseError) -> Self {
        Self::parse(err.message, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lex_error_display() {
        let err = QueryError::lex("unclosed quote", 0, "\"hello world");
        let display = err.to_string();
        assert!(display.contains("\n  ^\n"));
        assert!(display.contains("unclosed quote"));
        assert!(display.contains("\"hello world"));
        assert!(display.contains('^'));
        assert!(display.contains("hint:"));
    }

    #[test]
    fn parse_error_display() {
        let err = QueryError::parse("expected closing parenthesis", Some("(fox".to_string()));
        let display = err.to_string();
        assert!(display.contains("expected closing parenthesis"));
        assert!(display.contains("(fox"));
        assert!(!display.contains('^'));
        assert!(display.contains("hint:"));
    }

    #[test]
    fn anchored_parse_error_shows_caret() {
        let err = QueryError::parse_at("expected closing parenthesis", 4, "(fox");
        assert_eq!(err.kind, QueryErrorKind::Parse);
        assert_eq!(err.query.as_deref(), Some("(fox"));
        assert!(err.to_string().contains("\n      ^\n"));
    }

    #[test]
    fn message_extraction() {
        let err = QueryError::lex("test message", 0, "query");
        assert_eq!(err.message(), "test message");
    }

    #[test]
    fn dangling_operator_suggestion() {
        let err = QueryError::parse("operator AND needs an expression after it", None);
        assert!(err.suggestion().unwrap().contains("AND, OR and NOT"));
        assert_eq!(QueryError::parse("unknown thing", None).suggestion(), None);
    }

    #[test]
    fn lex_error_converts_with_input() {
        let err: QueryError = LexError::new("unclosed quote", 3, "ab \"c").into();
        assert_eq!(err.query.as_deref(), Some("ab \"c"));
        assert_eq!(err.kind, QueryErrorKind::Lex);
        assert_eq!(err.offset, Some(3));
    }
}
