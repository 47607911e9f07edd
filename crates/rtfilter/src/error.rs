//! Error types for filter parsing and compilation.

use thiserror::Error;

/// A specialized Result type for filter operations.
pub type FilterResult<T> = Result<T, FilterError>;

/// Errors that can occur while parsing or compiling a filter expression.
///
/// Matching itself never fails: a missing field or a value that cannot be
/// compared simply makes the condition a non-match.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FilterError {
    /// The filter expression is empty.
    #[error("filter expression is empty")]
    EmptyExpression,

    /// An unexpected token was encountered during parsing.
    #[error("unexpected token '{token}' at position {position}")]
    UnexpectedToken {
        /// The unexpected token that was encountered.
        token: String,
        /// Byte offset of the token.
        position: usize,
    },

    /// The expression ended where an operand was still expected.
    #[error("unexpected end of expression after '{after}' at position {position}")]
    UnexpectedEndOfInput {
        /// The keyword or token left without an operand.
        after: String,
        /// Byte offset of that token.
        position: usize,
    },

    /// An opening bracket was never closed.
    #[error("unclosed bracket at position {position}")]
    UnclosedBracket {
        /// Byte offset of the opening `[`.
        position: usize,
    },

    /// A closing bracket has no matching opening bracket.
    #[error("unmatched closing bracket at position {position}")]
    UnmatchedBracket {
        /// Byte offset of the stray `]`.
        position: usize,
    },

    /// A quoted string was not terminated.
    #[error("unterminated quoted string at position {position}")]
    UnterminatedQuote {
        /// Byte offset of the opening quote.
        position: usize,
    },

    /// A `/regex/` literal was not terminated.
    #[error("unterminated regex literal at position {position}")]
    UnterminatedRegex {
        /// Byte offset of the opening slash.
        position: usize,
    },

    /// A regex literal (or a glob translated to one) failed to compile.
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The offending pattern source.
        pattern: String,
        /// Message from the regex engine.
        reason: String,
    },

    /// An operator was applied to a literal that can never be compared that way.
    #[error("cannot compare field '{field}' using '{operator}' with {literal}")]
    UnsupportedLiteral {
        /// The field of the condition.
        field: String,
        /// The operator of the condition.
        operator: String,
        /// Description of the literal.
        literal: String,
    },
}

impl FilterError {
    /// Creates an unexpected token error.
    pub fn unexpected_token(token: impl Into<String>, position: usize) -> Self {
        FilterError::UnexpectedToken {
            token: token.into(),
            position,
        }
    }

    /// Creates an unexpected end of input error.
    pub fn unexpected_end(after: impl Into<String>, position: usize) -> Self {
        FilterError::UnexpectedEndOfInput {
            after: after.into(),
            position,
        }
    }

    /// Creates an invalid pattern error.
    pub fn invalid_pattern(pattern: impl Into<String>, reason: impl ToString) -> Self {
        FilterError::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates an unsupported literal error.
    pub fn unsupported_literal(
        field: impl Into<String>,
        operator: impl Into<String>,
        literal: impl Into<String>,
    ) -> Self {
        FilterError::UnsupportedLiteral {
            field: field.into(),
            operator: operator.into(),
            literal: literal.into(),
        }
    }

    /// Returns true for errors raised while parsing the expression text.
    pub fn is_syntax_error(&self) -> bool {
        !matches!(
            self,
            FilterError::InvalidPattern { .. } | FilterError::UnsupportedLiteral { .. }
        )
    }

    /// Returns the byte offset of the offending token, if the error has one.
    pub fn position(&self) -> Option<usize> {
        match self {
            FilterError::UnexpectedToken { position, .. }
            | FilterError::UnexpectedEndOfInput { position, .. }
            | FilterError::UnclosedBracket { position }
            | FilterError::UnmatchedBracket { position }
            | FilterError::UnterminatedQuote { position }
            | FilterError::UnterminatedRegex { position } => Some(*position),
            FilterError::EmptyExpression => Some(0),
            FilterError::InvalidPattern { .. } | FilterError::UnsupportedLiteral { .. } => None,
        }
    }
}
