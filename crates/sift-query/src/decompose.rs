//! Clause decomposition.
//!
//! Recovers an explicit AND/OR/NOT structure from a parsed [`QueryNode`],
//! keeping only the clauses that target one field. The result can be
//! rendered back to query syntax or to a relational `LIKE` predicate for
//! searching a store that has no full-text index.

use serde::Serialize;

use crate::ast::{DEFAULT_FUZZY_DISTANCE, FieldTerm, QueryNode};

/// How a clause combines with the clauses before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Combinator {
    /// Both must hold.
    And,
    /// Either may hold.
    Or,
    /// The preceding clauses hold and this one does not.
    AndNot,
}

impl Combinator {
    /// Flips between `And` and `AndNot`, for prohibited clauses.
    fn negated(self) -> Self {
        match self {
            Self::AndNot => Self::And,
            Self::And | Self::Or => Self::AndNot,
        }
    }

    /// Keyword rendered between two clauses.
    fn keyword(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::AndNot => "AND NOT",
        }
    }
}

/// One element of a [`ClauseTree`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Clause {
    /// A term, `"phrase"`, wildcard pattern, `prefix*` or `fuzzy~`.
    Leaf(String),
    /// A nested group.
    Tree(ClauseTree),
}

/// An ordered list of clauses with their combinators.
///
/// Never contains an empty subtree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClauseTree {
    /// Clauses in query order.
    clauses: Vec<(Clause, Combinator)>,
}

impl ClauseTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the clauses in order.
    pub fn clauses(&self) -> &[(Clause, Combinator)] {
        &self.clauses
    }

    /// Returns true if the tree has no clauses.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Returns the number of direct clauses.
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// Appends a leaf.
    pub fn push_leaf(&mut self, text: impl Into<String>, combinator: Combinator) {
        self.clauses.push((Clause::Leaf(text.into()), combinator));
    }

    /// Appends a subtree. Empty subtrees are dropped; returns whether the
    /// subtree was attached.
    pub fn push_tree(&mut self, tree: Self, combinator: Combinator) -> bool {
        if tree.is_empty() {
            return false;
        }
        self.clauses.push((Clause::Tree(tree), combinator));
        true
    }

    /// Returns every leaf text, depth first.
    pub fn leaves(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    /// Appends leaf texts to `out`.
    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a str>) {
        for (clause, _) in &self.clauses {
            match clause {
                Clause::Leaf(text) => out.push(text),
                Clause::Tree(tree) => tree.collect_leaves(out),
            }
        }
    }

    /// Renders the tree in query syntax, e.g. `fox AND (dog OR cat) AND NOT
    /// "lazy dog"`.
    ///
    /// The combinator of the first clause is only rendered when it is a
    /// negation.
    pub fn to_query_string(&self) -> String {
        self.render(&|clause| match clause {
            Clause::Leaf(text) => text.clone(),
            Clause::Tree(tree) => format!("({})", tree.to_query_string()),
        })
    }

    /// Renders the tree as a SQL `LIKE` predicate over `column`.
    ///
    /// Every leaf becomes a substring match. Wildcards `*` and `?` map to
    /// `%` and `_`, and single quotes are doubled. An empty tree renders as
    /// an always-false predicate.
    pub fn to_sql_predicate(&self, column: &str) -> String {
        if self.is_empty() {
            return "1 = 0".to_string();
        }
        self.render(&|clause| match clause {
            Clause::Leaf(text) => format!("{column} LIKE '%{}%'", like_pattern(text)),
            Clause::Tree(tree) => format!("({})", tree.to_sql_predicate(column)),
        })
    }

    /// Joins rendered clauses with their combinator keywords.
    fn render(&self, clause_text: &dyn Fn(&Clause) -> String) -> String {
        let mut out = String::new();
        for (i, (clause, combinator)) in self.clauses.iter().enumerate() {
            let text = clause_text(clause);
            if i == 0 {
                if *combinator == Combinator::AndNot {
                    out.push_str("NOT ");
                }
            } else {
                out.push(' ');
                out.push_str(combinator.keyword());
                out.push(' ');
            }
            out.push_str(&text);
        }
        out
    }
}

/// Decomposes `node` into a clause tree restricted to `field`.
///
/// Clauses on other fields, and groups left empty by that restriction, are
/// dropped.
pub fn decompose(node: &QueryNode, field: &str) -> ClauseTree {
    let mut tree = ClauseTree::new();
    decompose_into(node, field, Combinator::And, &mut tree);
    tree
}

/// Appends the clauses of `node` that target `field` to `tree`.
///
/// `combinator` is the combinator the node inherits from its parent. Returns
/// whether anything was added.
pub fn decompose_into(
    node: &QueryNode,
    field: &str,
    combinator: Combinator,
    tree: &mut ClauseTree,
) -> bool {
    match node {
        QueryNode::Boolean(clauses) => {
            let mut added = false;
            for clause in clauses {
                let child_combinator = if clause.is_prohibited() {
                    combinator.negated()
                } else if clause.is_required() {
                    Combinator::And
                } else {
                    Combinator::Or
                };
                if is_group(&clause.node) {
                    let mut child = ClauseTree::new();
                    if decompose_into(&clause.node, field, child_combinator, &mut child) {
                        added |= tree.push_tree(child, child_combinator);
                    }
                } else {
                    added |= decompose_into(&clause.node, field, child_combinator, tree);
                }
            }
            added
        }
        QueryNode::Boost { node, .. } => decompose_into(node, field, combinator, tree),
        leaf => match leaf_text(leaf, field) {
            Some(text) => {
                tree.push_leaf(text, combinator);
                true
            }
            None => false,
        },
    }
}

/// Returns true for boolean groups, looking through boosts.
fn is_group(node: &QueryNode) -> bool {
    match node {
        QueryNode::Boolean(_) => true,
        QueryNode::Boost { node, .. } => is_group(node),
        _ => false,
    }
}

/// Renders a leaf node on `field`, or `None` if it targets another field.
fn leaf_text(node: &QueryNode, field: &str) -> Option<String> {
    let on_field = |t: &FieldTerm| t.field == field;
    match node {
        QueryNode::Term(t) if on_field(t) => Some(escape_term(&t.text)),
        QueryNode::Phrase { terms, .. } => {
            let words: Vec<String> = terms
                .iter()
                .filter(|t| on_field(*t))
                .map(|t| t.text.replace('\\', "\\\\").replace('"', "\\\""))
                .collect();
            (!words.is_empty()).then(|| format!("\"{}\"", words.join(" ")))
        }
        QueryNode::Wildcard(t) if on_field(t) => Some(t.text.clone()),
        QueryNode::Prefix(t) if on_field(t) => Some(format!("{}*", escape_term(&t.text))),
        QueryNode::Fuzzy { term, distance } if on_field(term) => {
            let text = escape_term(&term.text);
            if *distance == DEFAULT_FUZZY_DISTANCE {
                Some(format!("{text}~"))
            } else {
                Some(format!("{text}~{distance}"))
            }
        }
        _ => None,
    }
}

/// Escapes characters that carry meaning in query syntax.
fn escape_term(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '*' | '?' | '"' | '(' | ')' | ':' | '^' | '~') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Converts leaf text to the body of a SQL `LIKE` pattern.
fn like_pattern(leaf: &str) -> String {
    let body = match leaf.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        Some(phrase) => phrase,
        None => strip_fuzzy_suffix(leaf),
    };

    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    push_sql_char(&mut out, escaped);
                }
            }
            '*' => out.push('%'),
            '?' => out.push('_'),
            other => push_sql_char(&mut out, other),
        }
    }
    out
}

/// Pushes a literal character, doubling single quotes.
fn push_sql_char(out: &mut String, ch: char) {
    if ch == '\'' {
        out.push('\'');
    }
    out.push(ch);
}

/// Removes an unescaped trailing `~` or `~N`.
fn strip_fuzzy_suffix(leaf: &str) -> &str {
    let trimmed = leaf.trim_end_matches(|c: char| c.is_ascii_digit());
    match trimmed.strip_suffix('~') {
        Some(rest) if !rest.ends_with('\\') || rest.ends_with("\\\\") => rest,
        _ => leaf,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{Operator, parse};

    fn tree_for(query: &str, field: &str) -> ClauseTree {
        let node = parse(query, "content", Operator::Or).unwrap().unwrap();
        decompose(&node, field)
    }

    #[test]
    fn single_term() {
        let tree = tree_for("fox", "content");
        assert_eq!(
            tree.clauses(),
            &[(Clause::Leaf("fox".into()), Combinator::And)]
        );
        assert_eq!(tree.to_query_string(), "fox");
    }

    #[test]
    fn required_and_prohibited_clauses() {
        let tree = tree_for("+fox -cat", "content");
        assert_eq!(
            tree.clauses(),
            &[
                (Clause::Leaf("fox".into()), Combinator::And),
                (Clause::Leaf("cat".into()), Combinator::AndNot),
            ]
        );
        assert_eq!(tree.to_query_string(), "fox AND NOT cat");
    }

    #[test]
    fn optional_clauses_are_or() {
        let tree = tree_for("fox dog", "content");
        assert_eq!(tree.to_query_string(), "fox OR dog");
    }

    #[test]
    fn leading_negation_renders_not() {
        let tree = tree_for("-cat +fox", "content");
        assert_eq!(tree.to_query_string(), "NOT cat AND fox");
    }

    #[test]
    fn nested_group_becomes_subtree() {
        let tree = tree_for("+fox +(dog OR cat)", "content");
        assert_eq!(tree.len(), 2);
        assert!(matches!(tree.clauses()[1].0, Clause::Tree(_)));
        assert_eq!(tree.to_query_string(), "fox AND (dog OR cat)");
    }

    #[test]
    fn other_fields_yield_empty_tree() {
        let tree = tree_for("title:guide +category:news", "content");
        assert!(tree.is_empty());
        assert_eq!(tree.to_query_string(), "");
    }

    #[test]
    fn empty_subgroup_is_not_attached() {
        let tree = tree_for("+fox +(title:a title:b)", "content");
        assert_eq!(
            tree.clauses(),
            &[(Clause::Leaf("fox".into()), Combinator::And)]
        );
    }

    #[test]
    fn decompose_into_reports_additions() {
        let node = parse("title:a", "content", Operator::Or).unwrap().unwrap();
        let mut tree = ClauseTree::new();
        assert!(!decompose_into(&node, "content", Combinator::And, &mut tree));
        assert!(decompose_into(&node, "title", Combinator::And, &mut tree));
        assert_eq!(tree.leaves(), vec!["a"]);
    }

    #[test]
    fn phrase_keeps_on_field_terms() {
        let tree = tree_for("\"quick brown\"", "content");
        assert_eq!(tree.leaves(), vec!["\"quick brown\""]);
    }

    #[test]
    fn prefix_wildcard_and_fuzzy_leaves() {
        let tree = tree_for("bro* qu?ck fox~ dog~1", "content");
        assert_eq!(tree.leaves(), vec!["bro*", "qu?ck", "fox~", "dog~1"]);
    }

    #[test]
    fn boost_is_transparent() {
        let tree = tree_for("fox^2 +(dog cat)^3", "content");
        assert_eq!(tree.to_query_string(), "fox AND (dog OR cat)");
    }

    #[test]
    fn and_terms_reproduce_clause_set() {
        let tree = tree_for("quick AND brown AND fox", "content");
        let mut leaves = tree.leaves();
        leaves.sort_unstable();
        assert_eq!(leaves, vec!["brown", "fox", "quick"]);
        assert!(tree.clauses().iter().all(|(_, c)| *c == Combinator::And));
        assert_eq!(tree.to_query_string(), "quick AND brown AND fox");
    }

    #[test]
    fn escaped_term_round_trips() {
        let tree = tree_for(r"c\*", "content");
        assert_eq!(tree.leaves(), vec![r"c\*"]);
        assert_eq!(tree.to_sql_predicate("body"), "body LIKE '%c*%'");
    }

    #[test]
    fn sql_predicate() {
        let tree = tree_for("+fox -\"lazy dog\" +(bro* OR o'neil)", "content");
        assert_eq!(
            tree.to_sql_predicate("body"),
            "body LIKE '%fox%' AND NOT body LIKE '%lazy dog%' \
             AND (body LIKE '%bro%%' OR body LIKE '%o''neil%')"
        );
    }

    #[test]
    fn sql_predicate_strips_fuzzy_suffix() {
        let tree = tree_for("fox~1", "content");
        assert_eq!(tree.to_sql_predicate("body"), "body LIKE '%fox%'");
    }

    #[test]
    fn empty_tree_sql_is_false() {
        assert_eq!(ClauseTree::new().to_sql_predicate("body"), "1 = 0");
    }

    #[test]
    fn serializes_to_json() {
        let tree = tree_for("+fox -cat", "content");
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "clauses": [[{"leaf": "fox"}, "and"], [{"leaf": "cat"}, "and_not"]]
            })
        );
    }
}
