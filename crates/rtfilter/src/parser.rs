//! Recursive descent parser for filter expressions.

use super::error::{FilterError, FilterResult};
use super::lexer::{FilterToken, Lexer, PositionedToken, RawCondition};

/// A parse tree node, mirroring the grammar productions.
///
/// Single-element `Or`/`And` productions are collapsed into their only
/// child, so `a` parses to a bare `Condition`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxNode {
    /// `term ("OR" term)+`
    Or(Vec<SyntaxNode>),
    /// `notfactor notfactor+`
    And(Vec<SyntaxNode>),
    /// `"NOT" factor`
    Not(Box<SyntaxNode>),
    /// `"[" expr "]"`
    Bracket(Box<SyntaxNode>),
    /// `field op value` or a bare value.
    Condition(RawCondition),
}

/// Parser for filter expressions.
///
/// # Grammar
///
/// ```text
/// query      ::= expr
/// expr       ::= term ("OR" term)*
/// term       ::= notfactor notfactor*          (implicit AND)
/// notfactor  ::= "NOT" factor | factor
/// factor     ::= condition | "[" expr "]"
/// condition  ::= fieldname op value | value
/// op         ::= "==" | "!=" | "<>" | ">=" | "<=" | ">" | "<" | "="
/// ```
///
/// # Operator Precedence (highest to lowest)
///
/// 1. `[ ]` (brackets)
/// 2. `NOT` - applies to the next condition or bracket group
/// 3. juxtaposition (AND)
/// 4. `OR`
///
/// # Example
///
/// ```
/// use rtfilter_rs::{FilterParser, SyntaxNode};
///
/// let tree = FilterParser::parse("name=arch* OR size>1G").unwrap();
/// assert!(matches!(tree, SyntaxNode::Or(_)));
/// ```
pub struct FilterParser {
    tokens: Vec<PositionedToken>,
    position: usize,
}

impl FilterParser {
    /// Parses a filter expression string into a parse tree.
    ///
    /// # Errors
    ///
    /// Returns `FilterError::EmptyExpression` if the input is blank,
    /// `FilterError::UnexpectedEndOfInput` for a dangling `NOT`/`OR`,
    /// bracket errors for unbalanced brackets, and lexer errors for
    /// unterminated quotes or regexes.
    pub fn parse(input: &str) -> FilterResult<SyntaxNode> {
        if input.trim().is_empty() {
            return Err(FilterError::EmptyExpression);
        }

        let tokens = Lexer::new(input).tokenize()?;
        if tokens.is_empty() {
            return Err(FilterError::EmptyExpression);
        }

        let mut parser = Self {
            tokens,
            position: 0,
        };
        let tree = parser.parse_expression()?;

        // Check that we consumed all tokens
        if let Some(remaining) = parser.peek() {
            return Err(match remaining.token {
                FilterToken::CloseBracket => FilterError::UnmatchedBracket {
                    position: remaining.position,
                },
                _ => FilterError::unexpected_token(remaining.token.describe(), remaining.position),
            });
        }

        Ok(tree)
    }

    /// Returns the current token without consuming it.
    fn peek(&self) -> Option<&PositionedToken> {
        self.tokens.get(self.position)
    }

    /// Consumes and returns the current token.
    fn advance(&mut self) -> Option<PositionedToken> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    /// Checks if the current token matches the expected token type.
    fn check(&self, expected: &FilterToken) -> bool {
        self.peek().is_some_and(|pt| &pt.token == expected)
    }

    /// Returns true if the current token can start a `notfactor`.
    fn at_factor_start(&self) -> bool {
        matches!(
            self.peek().map(|pt| &pt.token),
            Some(FilterToken::Condition(_) | FilterToken::OpenBracket | FilterToken::Not)
        )
    }

    /// Parses OR expressions: `term ("OR" term)*`
    fn parse_expression(&mut self) -> FilterResult<SyntaxNode> {
        let mut terms = vec![self.parse_term()?];

        while self.check(&FilterToken::Or) {
            let Some(or) = self.advance() else { break };
            if self.peek().is_none() {
                return Err(FilterError::unexpected_end("OR", or.position));
            }
            terms.push(self.parse_term()?);
        }

        Ok(collapse(terms, SyntaxNode::Or))
    }

    /// Parses implicit AND: `notfactor notfactor*`
    fn parse_term(&mut self) -> FilterResult<SyntaxNode> {
        let mut factors = vec![self.parse_not_factor()?];

        while self.at_factor_start() {
            factors.push(self.parse_not_factor()?);
        }

        Ok(collapse(factors, SyntaxNode::And))
    }

    /// Parses `"NOT" factor | factor`
    fn parse_not_factor(&mut self) -> FilterResult<SyntaxNode> {
        if self.check(&FilterToken::Not) {
            let Some(not) = self.advance() else {
                return self.parse_factor();
            };
            if self.peek().is_none() {
                return Err(FilterError::unexpected_end("NOT", not.position));
            }
            let inner = self.parse_factor()?;
            return Ok(SyntaxNode::Not(Box::new(inner)));
        }

        self.parse_factor()
    }

    /// Parses `condition | "[" expr "]"`
    fn parse_factor(&mut self) -> FilterResult<SyntaxNode> {
        let Some(PositionedToken { token, position }) = self.advance() else {
            let last = self.tokens.last().map(|pt| pt.position).unwrap_or(0);
            return Err(FilterError::unexpected_end("expression", last));
        };

        match token {
            FilterToken::Condition(raw) => Ok(SyntaxNode::Condition(raw)),

            FilterToken::OpenBracket => {
                if self.peek().is_none() {
                    return Err(FilterError::UnclosedBracket { position });
                }
                let inner = self.parse_expression()?;
                if !self.check(&FilterToken::CloseBracket) {
                    return Err(FilterError::UnclosedBracket { position });
                }
                self.advance(); // consume ']'
                Ok(SyntaxNode::Bracket(Box::new(inner)))
            }

            // Unexpected tokens
            other @ (FilterToken::Or | FilterToken::Not | FilterToken::CloseBracket) => {
                Err(FilterError::unexpected_token(other.describe(), position))
            }
        }
    }
}

/// Wraps several nodes with `wrap`, or returns a single node as is.
fn collapse(mut nodes: Vec<SyntaxNode>, wrap: fn(Vec<SyntaxNode>) -> SyntaxNode) -> SyntaxNode {
    if nodes.len() == 1 {
        nodes.remove(0)
    } else {
        wrap(nodes)
    }
}
