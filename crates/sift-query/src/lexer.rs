//! Splits query text into tokens.
//!
//! Escapes are resolved here; wildcard words keep theirs so the compiler can
//! tell a literal `*` from a wildcard.

use std::{iter::Peekable, str::Chars};

use crate::error::LexError;

/// One lexical unit of a query.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A bare word (search term), with escapes resolved.
    Term(String),

    /// A word ending in a single unescaped `*`, with the star removed.
    Prefix(String),

    /// A word containing unescaped `*` or `?` wildcards.
    ///
    /// Escapes are kept in the pattern so literal wildcard characters can be
    /// told apart from wildcards.
    Wildcard(String),

    /// Text between double quotes.
    Phrase(String),

    /// The `AND` keyword or `&&`.
    And,

    /// The `OR` keyword or `||`.
    Or,

    /// The `NOT` keyword or `!`.
    Not,

    /// Required prefix (`+`).
    Plus,

    /// Prohibited prefix (`-`).
    Minus,

    /// Left parenthesis.
    LParen,

    /// Right parenthesis.
    RParen,

    /// `name:` before a clause, holding `name`.
    FieldPrefix(String),

    /// `^factor` after a clause.
    Boost(f32),

    /// Fuzzy or proximity operator (`~` with an optional number).
    Tilde(Option<f32>),
}

/// Characters that end a bare word.
fn is_word_boundary(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, '(' | ')' | '"' | '^' | '~')
}

/// Cursor over the query text.
struct Lexer<'a> {
    /// Query text.
    input: &'a str,
    /// Remaining characters.
    chars: Peekable<Chars<'a>>,
    /// Byte offset of the next character.
    position: usize,
}

impl<'a> Lexer<'a> {
    /// Starts at the beginning of `input`.
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().peekable(),
            position: 0,
        }
    }

    /// Error pointing at byte `position`.
    fn error_at(&self, message: impl Into<String>, position: usize) -> LexError {
        LexError::new(message, position, self.input)
    }

    /// Consumes the input, pairing each token with its starting byte offset.
    fn tokenize(mut self) -> Result<Vec<(Token, usize)>, LexError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            let start = self.position;
            let Some(token) = self.next_token()? else {
                break;
            };
            tokens.push((token, start));
        }
        Ok(tokens)
    }

    /// Next token, `None` once the input is exhausted.
    fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        self.skip_whitespace();

        let Some(&ch) = self.chars.peek() else {
            return Ok(None);
        };

        match ch {
            '"' => self.read_phrase(),
            '(' => {
                self.advance();
                Ok(Some(Token::LParen))
            }
            ')' => {
                self.advance();
                Ok(Some(Token::RParen))
            }
            '+' => {
                self.advance();
                Ok(Some(Token::Plus))
            }
            '-' => {
                self.advance();
                Ok(Some(Token::Minus))
            }
            '!' => {
                self.advance();
                Ok(Some(Token::Not))
            }
            '&' | '|' => self.read_symbol_operator(ch),
            '^' => self.read_boost(),
            '~' => self.read_tilde(),
            _ => self.read_word(),
        }
    }

    /// Reads `"..."`. An unterminated quote is an error.
    fn read_phrase(&mut self) -> Result<Option<Token>, LexError> {
        let start_pos = self.position;
        self.advance(); // consume opening quote

        let mut content = String::new();

        loop {
            match self.chars.peek() {
                Some(&'"') => {
                    self.advance(); // consume closing quote
                    return Ok(Some(Token::Phrase(content)));
                }
                Some(&'\\') => {
                    self.advance();
                    match self.chars.peek() {
                        Some(&escaped) => {
                            content.push(escaped);
                            self.advance();
                        }
                        None => return Err(self.error_at("unclosed quote", start_pos)),
                    }
                }
                Some(&ch) => {
                    content.push(ch);
                    self.advance();
                }
                None => return Err(self.error_at("unclosed quote", start_pos)),
            }
        }
    }

    /// Reads `&&` or `||`. A single `&` or `|` is read as part of a word.
    fn read_symbol_operator(&mut self, ch: char) -> Result<Option<Token>, LexError> {
        let rest = &self.input[self.position..];
        let doubled = if ch == '&' { "&&" } else { "||" };
        if !rest.starts_with(doubled) {
            return self.read_word();
        }
        self.advance();
        self.advance();
        Ok(Some(if ch == '&' { Token::And } else { Token::Or }))
    }

    /// Reads a term, keyword, wildcard pattern, or field prefix.
    fn read_word(&mut self) -> Result<Option<Token>, LexError> {
        let start_pos = self.position;
        // Unescaped text and the pattern form that keeps escapes.
        let mut word = String::new();
        let mut pattern = String::new();
        let mut wildcard_positions = Vec::new();
        let mut escaped_any = false;

        while let Some(&ch) = self.chars.peek() {
            if is_word_boundary(ch) {
                break;
            }

            match ch {
                '\\' => {
                    self.advance();
                    let Some(&escaped) = self.chars.peek() else {
                        return Err(self.error_at("dangling escape character", start_pos));
                    };
                    word.push(escaped);
                    pattern.push('\\');
                    pattern.push(escaped);
                    escaped_any = true;
                    self.advance();
                }
                ':' if !word.is_empty() && !escaped_any && wildcard_positions.is_empty() => {
                    self.advance();
                    return Ok(Some(Token::FieldPrefix(word)));
                }
                '*' | '?' => {
                    wildcard_positions.push(word.len());
                    word.push(ch);
                    pattern.push(ch);
                    self.advance();
                }
                _ => {
                    word.push(ch);
                    pattern.push(ch);
                    self.advance();
                }
            }
        }

        if word.is_empty() {
            return Ok(None);
        }

        if !escaped_any {
            match word.as_str() {
                "AND" => return Ok(Some(Token::And)),
                "OR" => return Ok(Some(Token::Or)),
                "NOT" => return Ok(Some(Token::Not)),
                _ => {}
            }
        }

        if wildcard_positions.is_empty() {
            return Ok(Some(Token::Term(word)));
        }

        let is_prefix = wildcard_positions.len() == 1
            && word.len() > 1
            && word.ends_with('*')
            && wildcard_positions[0] == word.len() - 1;
        if is_prefix {
            word.pop();
            return Ok(Some(Token::Prefix(word)));
        }

        Ok(Some(Token::Wildcard(pattern)))
    }

    /// Reads `^` followed by a number.
    fn read_boost(&mut self) -> Result<Option<Token>, LexError> {
        let start_pos = self.position;
        self.advance(); // consume '^'

        let number = self.read_number();
        if number.is_empty() {
            return Err(self.error_at("expected number after '^'", start_pos));
        }

        match number.parse::<f32>() {
            Ok(factor) => Ok(Some(Token::Boost(factor))),
            Err(_) => Err(self.error_at(format!("invalid boost value: {number}"), start_pos)),
        }
    }

    /// Reads a fuzzy/proximity operator (`~`, `~N` or `~N.N`).
    fn read_tilde(&mut self) -> Result<Option<Token>, LexError> {
        let start_pos = self.position;
        self.advance(); // consume '~'

        let number = self.read_number();
        if number.is_empty() {
            return Ok(Some(Token::Tilde(None)));
        }

        match number.parse::<f32>() {
            Ok(value) => Ok(Some(Token::Tilde(Some(value)))),
            Err(_) => Err(self.error_at(format!("invalid fuzzy value: {number}"), start_pos)),
        }
    }

    /// Reads digits with an optional single decimal point.
    fn read_number(&mut self) -> String {
        let mut number = String::new();
        while let Some(&ch) = self.chars.peek() {
            if ch.is_ascii_digit() || (ch == '.' && !number.contains('.')) {
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        number
    }

    /// Skips whitespace.
    fn skip_whitespace(&mut self) {
        while let Some(&ch) = self.chars.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Consumes one character.
    fn advance(&mut self) {
        if let Some(ch) = self.chars.next() {
            self.position += ch.len_utf8();
        }
    }
}

/// Splits `input` into tokens.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    Ok(tokenize_with_offsets(input)?
        .into_iter()
        .map(|(token, _)| token)
        .collect())
}

/// Splits `input` into tokens, each with the byte offset where it starts.
pub(crate) fn tokenize_with_offsets(input: &str) -> Result<Vec<(Token, usize)>, LexError> {
    Lexer::new(input).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(s: &str) -> Token {
        Token::Term(s.into())
    }

    #[test]
    fn empty_input() {
        assert_eq!(tokenize("").unwrap(), vec![]);
        assert_eq!(tokenize("   ").unwrap(), vec![]);
    }

    #[test]
    fn multiple_terms() {
        assert_eq!(
            tokenize("quick  fox").unwrap(),
            vec![term("quick"), term("fox")]
        );
    }

    #[test]
    fn quoted_phrase() {
        assert_eq!(
            tokenize("\"quick brown\"").unwrap(),
            vec![Token::Phrase("quick brown".into())]
        );
    }

    #[test]
    fn escaped_quote_in_phrase() {
        assert_eq!(
            tokenize(r#""say \"hi\"""#).unwrap(),
            vec![Token::Phrase("say \"hi\"".into())]
        );
    }

    #[test]
    fn unclosed_quote_error() {
        let err = tokenize("fox \"hello world").unwrap_err();
        assert_eq!(err.position, 4);
        assert!(err.message.contains("unclosed"));
    }

    #[test]
    fn keywords_are_uppercase_only() {
        assert_eq!(
            tokenize("a AND b OR NOT c").unwrap(),
            vec![
                term("a"),
                Token::And,
                term("b"),
                Token::Or,
                Token::Not,
                term("c")
            ]
        );
        assert_eq!(
            tokenize("cats and dogs").unwrap(),
            vec![term("cats"), term("and"), term("dogs")]
        );
    }

    #[test]
    fn symbol_operators() {
        assert_eq!(
            tokenize("a && b || !c").unwrap(),
            vec![
                term("a"),
                Token::And,
                term("b"),
                Token::Or,
                Token::Not,
                term("c")
            ]
        );
    }

    #[test]
    fn modifiers() {
        assert_eq!(
            tokenize("+fox -cat").unwrap(),
            vec![Token::Plus, term("fox"), Token::Minus, term("cat")]
        );
    }

    #[test]
    fn hyphen_inside_word_is_kept() {
        assert_eq!(tokenize("e-mail").unwrap(), vec![term("e-mail")]);
    }

    #[test]
    fn field_prefix() {
        assert_eq!(
            tokenize("title:guide").unwrap(),
            vec![Token::FieldPrefix("title".into()), term("guide")]
        );
    }

    #[test]
    fn escaped_colon_is_not_a_field() {
        assert_eq!(tokenize(r"a\:b").unwrap(), vec![term("a:b")]);
    }

    #[test]
    fn prefix_and_wildcards() {
        assert_eq!(
            tokenize("bro* qu?ck *own").unwrap(),
            vec![
                Token::Prefix("bro".into()),
                Token::Wildcard("qu?ck".into()),
                Token::Wildcard("*own".into())
            ]
        );
    }

    #[test]
    fn escaped_star_is_literal() {
        assert_eq!(tokenize(r"c\*").unwrap(), vec![term("c*")]);
    }

    #[test]
    fn lone_star_is_wildcard() {
        assert_eq!(tokenize("*").unwrap(), vec![Token::Wildcard("*".into())]);
    }

    #[test]
    fn fuzzy_operator() {
        assert_eq!(
            tokenize("fox~ dog~1").unwrap(),
            vec![
                term("fox"),
                Token::Tilde(None),
                term("dog"),
                Token::Tilde(Some(1.0))
            ]
        );
    }

    #[test]
    fn phrase_slop() {
        assert_eq!(
            tokenize("\"quick fox\"~2").unwrap(),
            vec![Token::Phrase("quick fox".into()), Token::Tilde(Some(2.0))]
        );
    }

    #[test]
    fn boost_float() {
        assert_eq!(
            tokenize("fox^2.5").unwrap(),
            vec![term("fox"), Token::Boost(2.5)]
        );
    }

    #[test]
    fn boost_missing_number() {
        let err = tokenize("fox^").unwrap_err();
        assert!(err.message.contains("expected number"));
    }

    #[test]
    fn dangling_escape() {
        let err = tokenize("fox\\").unwrap_err();
        assert!(err.message.contains("escape"));
    }

    #[test]
    fn complex_query() {
        assert_eq!(
            tokenize("title:guide (rust OR go) -deprecated").unwrap(),
            vec![
                Token::FieldPrefix("title".into()),
                term("guide"),
                Token::LParen,
                term("rust"),
                Token::Or,
                term("go"),
                Token::RParen,
                Token::Minus,
                term("deprecated")
            ]
        );
    }

    #[test]
    fn offsets_point_at_token_starts() {
        let tokens = tokenize_with_offsets("  title:\"big cat\" -dog^2").unwrap();
        let offsets: Vec<usize> = tokens.iter().map(|(_, at)| *at).collect();
        assert_eq!(offsets, [2, 8, 18, 19, 22]);
        assert_eq!(tokens[0].0, Token::FieldPrefix("title".into()));
    }
}
