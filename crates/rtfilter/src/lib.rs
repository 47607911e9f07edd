//! Filter expressions for torrent items.
//!
//! This crate parses compact boolean filter expressions, evaluates them
//! against any item that can answer field lookups, and translates the
//! part of an expression rTorrent understands into a server-side
//! pre-filter.
//!
//! # Syntax
//!
//! ## Conditions
//! - `field=value`, `field!=value` (also `==` and `<>`)
//! - `field>value`, `field>=value`, `field<value`, `field<=value`
//! - A bare `value` compares the default field (`name`) with `=`
//!
//! ## Values
//! - Globs: `arch*`, `*.iso`, `file?.[!t]xt` (case-insensitive)
//! - Regexes: `/arch$/` (case-sensitive), `/arch/i`
//! - Quoted strings: `"The Thing"`, still matched as globs
//! - Sizes: `1G`, `500M`, `10k`; durations and ages: `30s`, `5m`, `2h`, `1d`, `1w`
//! - Booleans: `yes`, `true`, `1`, `no`, `false`, `0`
//! - Templates: `{{d.alias}}*`, resolved per item
//!
//! ## Boolean Operators
//! - Juxtaposition - AND
//! - `OR` - OR
//! - `NOT` - negates the next condition or group
//! - `[ ]` - Grouping
//!
//! # Example
//!
//! ```
//! use rtfilter_rs::{Expression, Record};
//!
//! let expr = Expression::parse("name=ubuntu* size>1G NOT tagged=:hidden").unwrap();
//!
//! let item = Record::new()
//!     .with("name", "Ubuntu-22.04.iso")
//!     .with("size", 3u64 * 1024 * 1024 * 1024)
//!     .with("tagged", vec!["linux"]);
//! assert!(expr.matches(&item));
//!
//! // Sizes and tags have no rTorrent pre-filter, so nothing is pushed down.
//! assert!(expr.prefilter().is_none());
//! ```

mod ast;
mod cache;
mod error;
mod expression;
mod fields;
mod item;
mod lexer;
mod matcher;
mod parser;
mod prefilter;
mod source;
mod value;

pub use ast::{AstBuilder, Condition, FieldRef, Node, Operator};
pub use cache::{ExpressionCache, DEFAULT_CAPACITY};
pub use error::{FilterError, FilterResult};
pub use expression::Expression;
pub use fields::{FieldKind, FieldRegistry, DEFAULT_FIELD};
pub use item::{Item, Record, Value};
pub use lexer::{FilterToken, Lexer, PositionedToken, RawCondition, RawValue};
pub use matcher::Matcher;
pub use parser::{FilterParser, SyntaxNode};
pub use prefilter::PreFilter;
pub use source::{select, ItemSource};
pub use value::{Literal, Pattern, Template};
