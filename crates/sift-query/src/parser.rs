//! Query parser.
//!
//! Parses a token stream into a [`QueryNode`] tree using recursive descent.
//!
//! # Grammar
//!
//! ```text
//! query      → clause_seq
//! clause_seq → (conjunction? modifier? clause)*
//! conjunction→ "AND" | "OR"
//! modifier   → "+" | "-" | "NOT"
//! clause     → (FIELD_PREFIX)? (leaf | "(" clause_seq ")") boost?
//! leaf       → TERM fuzzy? | PHRASE slop? | PREFIX | WILDCARD
//! ```
//!
//! Clauses are combined the classic boolean way: each clause of a group is
//! required, optional or prohibited depending on its modifier, the
//! conjunction before it and the default operator. An `AND` also makes the
//! clause before it required; under the `And` default operator an `OR`
//! makes the clause before it optional.

use std::mem;

use crate::{
    ast::{BooleanClause, DEFAULT_FUZZY_DISTANCE, FieldTerm, Occur, QueryNode},
    error::{ParseError, QueryError},
    lexer::{Token, tokenize_with_offsets},
};

/// Deepest parenthesized nesting accepted.
pub const MAX_GROUP_DEPTH: usize = 128;

/// Default combination of clauses that carry no explicit conjunction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Operator {
    /// Adjacent clauses are optional (`a b` matches either).
    #[default]
    Or,
    /// Adjacent clauses are required (`a b` matches both).
    And,
}

/// An explicit conjunction between two clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conjunction {
    /// `AND` or `&&`.
    And,
    /// `OR` or `||`.
    Or,
}

/// A prefix modifier on a clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modifier {
    /// `+`
    Required,
    /// `-`, `NOT` or `!`
    Prohibited,
}

/// Recursive descent parser for query expressions.
struct Parser {
    /// Token stream to parse.
    tokens: Vec<Token>,
    /// Current position in token stream.
    position: usize,
    /// Default operator between clauses.
    operator: Operator,
    /// Groups currently open.
    depth: usize,
}

impl Parser {
    /// Creates a new parser from a token stream.
    fn new(tokens: Vec<Token>, operator: Operator) -> Self {
        Self {
            tokens,
            position: 0,
            operator,
            depth: 0,
        }
    }

    /// Parses the token stream into a query tree.
    fn parse(mut self, default_field: &str) -> Result<Option<QueryNode>, ParseError> {
        if self.tokens.is_empty() {
            return Ok(None);
        }

        let node = self.parse_clause_seq(default_field)?;

        if let Some(token) = self.peek() {
            let message = if matches!(token, Token::RParen) {
                "unexpected closing parenthesis".to_string()
            } else {
                format!("unexpected token: {token:?}")
            };
            return Err(ParseError::new(message, Some(self.position)));
        }

        Ok(node)
    }

    /// Parses clauses up to the end of input or a closing parenthesis.
    ///
    /// A sequence holding a single unmodified clause collapses to that
    /// clause; an empty sequence yields `None`.
    fn parse_clause_seq(&mut self, field: &str) -> Result<Option<QueryNode>, ParseError> {
        let mut clauses: Vec<BooleanClause> = Vec::new();
        let mut parsed = 0usize;
        let mut plain_first = false;

        while !matches!(self.peek(), None | Some(Token::RParen)) {
            let conjunction = self.parse_conjunction()?;
            if conjunction.is_some() && parsed == 0 {
                return Err(ParseError::new(
                    "operator needs an expression before it",
                    Some(self.position.saturating_sub(1)),
                ));
            }

            let modifier = self.parse_modifier();
            if matches!(self.peek(), None | Some(Token::RParen)) {
                let message = if conjunction.is_some() {
                    "operator needs an expression after it"
                } else {
                    "modifier needs an expression after it"
                };
                return Err(ParseError::new(message, Some(self.position)));
            }

            let node = self.parse_clause(field)?;
            if clauses.is_empty() && node.is_some() {
                plain_first = conjunction.is_none() && modifier.is_none();
            }
            parsed += 1;
            self.add_clause(&mut clauses, conjunction, modifier, node);
        }

        if clauses.len() == 1 && plain_first {
            return Ok(clauses.pop().map(|c| c.node));
        }
        if clauses.is_empty() {
            return Ok(None);
        }
        Ok(Some(QueryNode::Boolean(clauses)))
    }

    /// Appends a clause, adjusting the previous clause for the conjunction.
    fn add_clause(
        &self,
        clauses: &mut Vec<BooleanClause>,
        conjunction: Option<Conjunction>,
        modifier: Option<Modifier>,
        node: Option<QueryNode>,
    ) {
        if let Some(last) = clauses.last_mut().filter(|c| !c.is_prohibited()) {
            match (conjunction, self.operator) {
                (Some(Conjunction::And), _) => last.occur = Occur::Must,
                (Some(Conjunction::Or), Operator::And) => last.occur = Occur::Should,
                _ => {}
            }
        }

        let Some(node) = node else {
            return;
        };

        let prohibited = modifier == Some(Modifier::Prohibited);
        let required = match self.operator {
            Operator::Or => {
                modifier == Some(Modifier::Required)
                    || (conjunction == Some(Conjunction::And) && !prohibited)
            }
            Operator::And => {
                modifier == Some(Modifier::Required)
                    || (!prohibited && conjunction != Some(Conjunction::Or))
            }
        };

        let occur = if prohibited {
            Occur::MustNot
        } else if required {
            Occur::Must
        } else {
            Occur::Should
        };
        clauses.push(BooleanClause::new(occur, node));
    }

    /// Consumes an optional `AND` / `OR`.
    fn parse_conjunction(&mut self) -> Result<Option<Conjunction>, ParseError> {
        let conjunction = match self.peek() {
            Some(Token::And) => Conjunction::And,
            Some(Token::Or) => Conjunction::Or,
            _ => return Ok(None),
        };
        self.advance();
        if matches!(self.peek(), Some(Token::And | Token::Or)) {
            return Err(ParseError::new(
                "operator cannot follow another operator",
                Some(self.position),
            ));
        }
        Ok(Some(conjunction))
    }

    /// Consumes an optional `+`, `-` or `NOT`.
    fn parse_modifier(&mut self) -> Option<Modifier> {
        let modifier = match self.peek() {
            Some(Token::Plus) => Modifier::Required,
            Some(Token::Minus | Token::Not) => Modifier::Prohibited,
            _ => return None,
        };
        self.advance();
        Some(modifier)
    }

    /// Parses one clause, with an optional field prefix and boost.
    ///
    /// Returns `None` for clauses with nothing to match, such as `""` or `()`.
    fn parse_clause(&mut self, field: &str) -> Result<Option<QueryNode>, ParseError> {
        let mut field = field.to_string();
        if let Some(Token::FieldPrefix(name)) = self.peek().cloned() {
            let prefix_at = self.position;
            self.advance();
            field = name;
            if matches!(
                self.peek(),
                None | Some(Token::RParen | Token::And | Token::Or | Token::Boost(_))
            ) {
                return Err(ParseError::new(
                    format!("expected term, phrase, or group after '{field}:'"),
                    Some(prefix_at),
                ));
            }
        }

        let node = match self.peek().cloned() {
            Some(Token::LParen) => self.parse_group(&field)?,
            Some(Token::Term(text)) => {
                self.advance();
                Some(self.parse_fuzzy(FieldTerm::new(&field, text)))
            }
            Some(Token::Phrase(text)) => {
                self.advance();
                self.parse_phrase(&field, &text)
            }
            Some(Token::Prefix(text)) => {
                self.advance();
                Some(QueryNode::Prefix(FieldTerm::new(&field, text)))
            }
            Some(Token::Wildcard(pattern)) => {
                self.advance();
                Some(QueryNode::Wildcard(FieldTerm::new(&field, pattern)))
            }
            Some(Token::Boost(_)) => {
                return Err(ParseError::new(
                    "unexpected boost (needs expression before it)",
                    Some(self.position),
                ));
            }
            Some(Token::Tilde(_)) => {
                return Err(ParseError::new(
                    "unexpected '~' (needs a term or phrase before it)",
                    Some(self.position),
                ));
            }
            Some(token) => {
                return Err(ParseError::new(
                    format!("unexpected token: {token:?}"),
                    Some(self.position),
                ));
            }
            None => return Err(ParseError::new("unexpected end of query", None)),
        };

        Ok(self.maybe_apply_boost(node))
    }

    /// Applies a `~` suffix to a term, producing a fuzzy query.
    fn parse_fuzzy(&mut self, term: FieldTerm) -> QueryNode {
        let Some(Token::Tilde(value)) = self.peek().cloned() else {
            return QueryNode::Term(term);
        };
        self.advance();
        let distance = value.map_or(DEFAULT_FUZZY_DISTANCE, |v| {
            // Levenshtein automata are only built up to distance 2.
            if v >= 2.0 {
                2
            } else if v >= 1.0 {
                1
            } else {
                0
            }
        });
        QueryNode::Fuzzy { term, distance }
    }

    /// Builds a phrase, applying an optional `~N` slop suffix.
    fn parse_phrase(&mut self, field: &str, text: &str) -> Option<QueryNode> {
        let mut slop = 0;
        if let Some(Token::Tilde(value)) = self.peek().cloned() {
            self.advance();
            slop = value.map_or(0, |v| v.max(0.0).trunc() as u32);
        }

        let terms: Vec<FieldTerm> = text
            .split_whitespace()
            .map(|word| FieldTerm::new(field, word))
            .collect();
        if terms.is_empty() {
            return None;
        }
        Some(QueryNode::Phrase { terms, slop })
    }

    /// Parses a parenthesized group, consuming the surrounding parentheses.
    ///
    /// Fails once more than [`MAX_GROUP_DEPTH`] groups are open.
    fn parse_group(&mut self, field: &str) -> Result<Option<QueryNode>, ParseError> {
        if self.depth >= MAX_GROUP_DEPTH {
            return Err(ParseError::new(
                format!("groups nested deeper than {MAX_GROUP_DEPTH} levels"),
                Some(self.position),
            ));
        }
        self.advance(); // consume (
        self.depth += 1;
        let inner = self.parse_clause_seq(field);
        self.depth -= 1;
        let inner = inner?;

        if !self.check(&Token::RParen) {
            return Err(ParseError::new(
                "expected closing parenthesis",
                Some(self.position),
            ));
        }
        self.advance(); // consume )

        Ok(inner)
    }

    /// Checks if the current token is a boost operator and applies it if so.
    fn maybe_apply_boost(&mut self, node: Option<QueryNode>) -> Option<QueryNode> {
        let Some(Token::Boost(factor)) = self.peek().cloned() else {
            return node;
        };
        self.advance();
        node.map(|n| QueryNode::boost(n, factor))
    }

    /// Returns the current token without consuming it.
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    /// Checks if the current token matches the given token.
    fn check(&self, token: &Token) -> bool {
        self.peek()
            .is_some_and(|t| mem::discriminant(t) == mem::discriminant(token))
    }

    /// Advances to the next token.
    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }
}

/// Parses a query string into a query tree.
///
/// Unqualified terms target `default_field`. Returns `Ok(None)` for queries
/// with nothing to match, `Ok(Some(node))` for valid queries, or
/// `Err(QueryError)` for invalid syntax. Parse errors point at the byte
/// where the offending token starts, or at the end of the input.
pub fn parse(
    input: &str,
    default_field: &str,
    operator: Operator,
) -> Result<Option<QueryNode>, QueryError> {
    let (tokens, offsets): (Vec<Token>, Vec<usize>) =
        tokenize_with_offsets(input)?.into_iter().unzip();
    Parser::new(tokens, operator)
        .parse(default_field)
        .map_err(|e| {
            let offset = e
                .token_index
                .and_then(|index| offsets.get(index).copied())
                .unwrap_or(input.len());
            QueryError::parse_at(e.message, offset, input)
        })
}
