//! Query parsing and clause decomposition for sift.
//!
//! This crate provides the query language used by the search engine:
//!
//! - **Terms**: `fox` - matched against the default field
//! - **Fields**: `title:guide` - match a specific field
//! - **Phrases**: `"quick brown"` - exact sequences
//! - **Operators**: `a AND b`, `a OR b`, `NOT a`, `&&`, `||`, `!`
//! - **Modifiers**: `+required`, `-prohibited`
//! - **Grouping**: `(a b) OR (c d)`
//! - **Wildcards**: `qu?ck`, `br*wn`; prefixes: `bro*`
//! - **Fuzzy**: `fox~`, `fox~1`
//! - **Boosting**: `fox^2.5`
//!
//! Parsing produces a [`QueryNode`] tree. [`decompose`] walks a tree and
//! recovers an explicit AND/OR/NOT [`ClauseTree`] restricted to one field,
//! which can be rendered as a relational predicate.
//!
//! # Example
//!
//! ```
//! use sift_query::{Operator, decompose, parse};
//!
//! let node = parse("+fox -cat title:guide", "content", Operator::Or)
//!     .unwrap()
//!     .unwrap();
//! let tree = decompose(&node, "content");
//! assert_eq!(tree.to_query_string(), "fox AND NOT cat");
//! ```

#![warn(missing_docs)]

mod ast;
mod decompose;
mod error;
mod lexer;
mod parser;

pub use ast::{BooleanClause, DEFAULT_FUZZY_DISTANCE, FieldTerm, Occur, QueryNode};
pub use decompose::{Clause, ClauseTree, Combinator, decompose, decompose_into};
pub use error::{LexError, ParseError, QueryError, QueryErrorKind};
pub use lexer::{Token, tokenize};
pub use parser::{MAX_GROUP_DEPTH, Operator, parse};
