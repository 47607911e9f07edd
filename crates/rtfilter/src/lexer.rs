//! Lexer (tokenizer) for filter expressions.
//!
//! The lexer splits an expression into bracket tokens, the `OR`/`NOT`
//! keywords and raw conditions. A raw condition is either `field<op>value`
//! or a bare value; values stay untyped here and are classified later.

use super::ast::Operator;
use super::error::{FilterError, FilterResult};

/// A token with its position in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionedToken {
    /// The token.
    pub token: FilterToken,
    /// The byte position where the token starts (0-indexed).
    pub position: usize,
}

/// A token in a filter expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterToken {
    /// A comparison, or a bare value applied to the default field.
    Condition(RawCondition),

    /// The `OR` keyword.
    Or,

    /// The `NOT` keyword.
    Not,

    /// Opening bracket `[`.
    OpenBracket,

    /// Closing bracket `]`.
    CloseBracket,
}

impl FilterToken {
    /// Returns the token as it would be written in an expression.
    pub fn describe(&self) -> String {
        match self {
            FilterToken::Condition(cond) => cond.to_string(),
            FilterToken::Or => "OR".to_string(),
            FilterToken::Not => "NOT".to_string(),
            FilterToken::OpenBracket => "[".to_string(),
            FilterToken::CloseBracket => "]".to_string(),
        }
    }
}

/// A condition exactly as written, before literal classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCondition {
    /// Field name, absent for bare values.
    pub field: Option<String>,
    /// Comparison operator, absent for bare values.
    pub operator: Option<Operator>,
    /// The value text.
    pub value: RawValue,
}

impl std::fmt::Display for RawCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let (Some(field), Some(op)) = (&self.field, &self.operator) {
            write!(f, "{field}{op}")?;
        }
        match &self.value {
            RawValue::Word(word) => write!(f, "{word}"),
            RawValue::Quoted(text) => write!(f, "{text:?}"),
            RawValue::Regex { pattern, flags } => write!(f, "/{pattern}/{flags}"),
        }
    }
}

/// The value part of a raw condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    /// An unquoted word (glob, number, boolean word or template).
    Word(String),
    /// A quoted string with escapes already resolved.
    Quoted(String),
    /// A `/pattern/flags` literal.
    Regex {
        /// Pattern text between the slashes.
        pattern: String,
        /// Flag letters after the closing slash.
        flags: String,
    },
}

/// Lexer for tokenizing filter expressions.
pub struct Lexer<'a> {
    input: &'a str,
    /// Current byte position in the input string.
    position: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input string.
    pub fn new(input: &'a str) -> Self {
        Self { input, position: 0 }
    }

    /// Peeks at the next character without consuming it.
    fn peek(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    /// Consumes and returns the next character, updating position.
    fn next_char(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.position += c.len_utf8();
        Some(c)
    }

    /// Returns true if the remaining input starts with `prefix`.
    fn starts_with(&self, prefix: &str) -> bool {
        self.input[self.position..].starts_with(prefix)
    }

    /// Returns true at the end of a value: end of input, whitespace or `]`.
    fn at_delimiter(&self) -> bool {
        match self.peek() {
            None => true,
            Some(c) => c.is_whitespace() || c == ']',
        }
    }

    /// Skips whitespace characters.
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.next_char();
            } else {
                break;
            }
        }
    }

    /// Reads a field name followed by an operator, if one starts here.
    ///
    /// Leaves the position untouched when the input is not `field<op>`.
    fn read_field_and_operator(&mut self) -> Option<(String, Operator)> {
        let start = self.position;
        let mut field = String::new();
        while let Some(c) = self.peek() {
            let valid = if field.is_empty() {
                c.is_ascii_alphabetic() || c == '_'
            } else {
                c.is_ascii_alphanumeric() || c == '_' || c == '.'
            };
            if !valid {
                break;
            }
            field.push(c);
            self.next_char();
        }

        if !field.is_empty() {
            if let Some(op) = self.read_operator() {
                return Some((field, op));
            }
        }

        self.position = start;
        None
    }

    /// Reads a comparison operator, longest match first.
    fn read_operator(&mut self) -> Option<Operator> {
        const OPERATORS: [(&str, Operator); 8] = [
            ("==", Operator::Equal),
            ("!=", Operator::NotEqual),
            ("<>", Operator::NotEqual),
            (">=", Operator::GreaterEqual),
            ("<=", Operator::LessEqual),
            (">", Operator::Greater),
            ("<", Operator::Less),
            ("=", Operator::Equal),
        ];

        let (text, op) = OPERATORS
            .iter()
            .find(|(text, _)| self.starts_with(text))?;
        self.position += text.len();
        Some(*op)
    }

    /// Reads a quoted string (single or double quotes).
    fn read_quoted_string(&mut self) -> FilterResult<String> {
        let start = self.position;
        let Some(quote_char) = self.next_char() else {
            return Err(FilterError::UnterminatedQuote { position: start });
        };

        let mut result = String::new();
        loop {
            match self.next_char() {
                None => return Err(FilterError::UnterminatedQuote { position: start }),
                Some(c) if c == quote_char => break,
                Some('\\') => match self.next_char() {
                    Some(escaped) => result.push(escaped),
                    None => return Err(FilterError::UnterminatedQuote { position: start }),
                },
                Some(c) => result.push(c),
            }
        }

        if !self.at_delimiter() {
            let rest: String = self.input[self.position..]
                .chars()
                .take_while(|c| !c.is_whitespace())
                .collect();
            return Err(FilterError::unexpected_token(rest, self.position));
        }
        Ok(result)
    }

    /// Reads a `/regex/flags` literal.
    ///
    /// Slash-delimited text that is followed by anything other than `i`
    /// flags (e.g. `/data/movies/*`) is read as a plain word instead.
    fn read_regex_or_word(&mut self) -> FilterResult<RawValue> {
        let start = self.position;
        self.next_char(); // consume '/'

        let mut pattern = String::new();
        loop {
            match self.next_char() {
                None => return Err(FilterError::UnterminatedRegex { position: start }),
                Some('/') => break,
                Some('\\') => {
                    pattern.push('\\');
                    if let Some(escaped) = self.next_char() {
                        pattern.push(escaped);
                    }
                }
                Some(c) => pattern.push(c),
            }
        }

        let mut flags = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphabetic() {
                flags.push(c);
                self.next_char();
            } else {
                break;
            }
        }

        if self.at_delimiter() && flags.chars().all(|c| c == 'i') {
            return Ok(RawValue::Regex { pattern, flags });
        }

        self.position = start;
        Ok(RawValue::Word(self.read_word()))
    }

    /// Reads an unquoted word.
    ///
    /// A word ends at whitespace or at a `]` that does not close a `[` opened
    /// inside the word. `{{ ... }}` placeholders may contain whitespace.
    fn read_word(&mut self) -> String {
        let mut word = String::new();
        let mut depth = 0usize;

        while let Some(c) = self.peek() {
            if self.starts_with("{{") {
                if let Some(end) = self.input[self.position..].find("}}") {
                    let placeholder = &self.input[self.position..self.position + end + 2];
                    word.push_str(placeholder);
                    self.position += end + 2;
                    continue;
                }
            }
            if c.is_whitespace() || (c == ']' && depth == 0) {
                break;
            }
            match c {
                '[' => depth += 1,
                ']' => depth -= 1,
                _ => {}
            }
            word.push(c);
            self.next_char();
        }
        word
    }

    /// Reads the value after an operator.
    fn read_value(&mut self) -> FilterResult<RawValue> {
        match self.peek() {
            Some('"') | Some('\'') => Ok(RawValue::Quoted(self.read_quoted_string()?)),
            Some('/') => self.read_regex_or_word(),
            _ => Ok(RawValue::Word(self.read_word())),
        }
    }

    /// Returns the next token with its position, or None at end of input.
    pub fn next_token(&mut self) -> FilterResult<Option<PositionedToken>> {
        self.skip_whitespace();

        let Some(c) = self.peek() else {
            return Ok(None);
        };
        let token_start = self.position;

        let token = match c {
            '[' => {
                self.next_char();
                FilterToken::OpenBracket
            }
            ']' => {
                self.next_char();
                FilterToken::CloseBracket
            }
            '"' | '\'' | '/' => FilterToken::Condition(RawCondition {
                field: None,
                operator: None,
                value: self.read_value()?,
            }),
            _ => {
                if let Some((field, operator)) = self.read_field_and_operator() {
                    FilterToken::Condition(RawCondition {
                        field: Some(field),
                        operator: Some(operator),
                        value: self.read_value()?,
                    })
                } else {
                    let word = self.read_word();
                    match word.as_str() {
                        "OR" => FilterToken::Or,
                        "NOT" => FilterToken::Not,
                        _ => FilterToken::Condition(RawCondition {
                            field: None,
                            operator: None,
                            value: RawValue::Word(word),
                        }),
                    }
                }
            }
        };

        Ok(Some(PositionedToken {
            token,
            position: token_start,
        }))
    }

    /// Collects all tokens, failing on the first lexical error.
    pub fn tokenize(mut self) -> FilterResult<Vec<PositionedToken>> {
        let mut tokens = Vec::new();
        while let Some(positioned_token) = self.next_token()? {
            tokens.push(positioned_token);
        }
        Ok(tokens)
    }
}
