//! Parsed and compiled filter expressions.

use std::fmt;
use std::sync::OnceLock;

use tracing::debug;

use super::ast::{AstBuilder, Node};
use super::error::FilterResult;
use super::fields::FieldRegistry;
use super::item::Item;
use super::matcher::Matcher;
use super::parser::FilterParser;
use super::prefilter::PreFilter;

/// A filter expression, parsed once and reused for many items.
///
/// The matcher is compiled when the expression is parsed, so every error
/// surfaces up front. The pre-filter is derived on first use.
///
/// # Example
///
/// ```
/// use rtfilter_rs::{Expression, Record};
///
/// let expr = Expression::parse("name=arch* OR tagged=linux").unwrap();
/// assert!(expr.matches(&Record::new().with("name", "Arch-Linux")));
/// assert!(expr.prefilter().is_none());
/// ```
#[derive(Debug)]
pub struct Expression {
    source: String,
    ast: Node,
    matcher: Matcher,
    registry: FieldRegistry,
    prefilter: OnceLock<Option<PreFilter>>,
}

impl Expression {
    /// Parses an expression against the built-in torrent fields.
    ///
    /// # Errors
    ///
    /// Returns a syntax error for malformed input, or a compile error for a
    /// condition that can never be evaluated.
    pub fn parse(input: &str) -> FilterResult<Self> {
        Self::parse_with(input, &FieldRegistry::torrent())
    }

    /// Parses an expression against a custom field registry.
    pub fn parse_with(input: &str, registry: &FieldRegistry) -> FilterResult<Self> {
        let syntax = FilterParser::parse(input)?;
        let ast = AstBuilder::new(registry.default_field()).build(&syntax);
        let matcher = Matcher::compile(&ast, registry)?;
        debug!(input, canonical = %ast, "Parsed filter expression");

        Ok(Self {
            source: input.to_string(),
            ast,
            matcher,
            registry: registry.clone(),
            prefilter: OnceLock::new(),
        })
    }

    /// Returns the expression as written.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the filter tree.
    pub fn ast(&self) -> &Node {
        &self.ast
    }

    /// Returns the compiled matcher.
    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Returns true if the item matches.
    pub fn matches(&self, item: &dyn Item) -> bool {
        self.matcher.matches(item)
    }

    /// Filters a slice of items, returning only those that match.
    pub fn filter_items<'b, T: Item>(&self, items: &'b [T]) -> Vec<&'b T> {
        self.matcher.filter_items(items)
    }

    /// Returns the server-side pre-filter, if the expression has one.
    pub fn prefilter(&self) -> Option<&PreFilter> {
        self.prefilter
            .get_or_init(|| PreFilter::compile(&self.ast, &self.registry))
            .as_ref()
    }
}

/// Writes the canonical form.
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ast)
    }
}
