//! Output formatting utilities for the rtq CLI.
//!
//! This module provides functions for formatting data as tables or JSON:
//!
//! - [`items`] - Matched item output (match)
//! - [`check`] - Parsed expression output (check)
//! - [`fields`] - Field registry output (fields)
//! - [`helpers`] - Common formatting utilities (truncation, padding, headers)

mod check;
mod fields;
pub mod helpers;
mod items;

pub use check::{format_check_json, format_check_table};
pub use fields::{format_fields_json, format_fields_table};
pub use items::{format_items_json, format_items_table};
