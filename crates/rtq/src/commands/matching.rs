//! Match command implementation.
//!
//! Filters items read from a JSON document and prints the ones that match.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use rtfilter_rs::FieldRef;
use serde::de::Error as _;
use serde_json::Value as Json;
use tracing::debug;

use super::{CommandContext, CommandError, Result};
use crate::output::{format_items_json, format_items_table};

/// Options for the match command.
pub struct MatchOptions {
    /// Expression to evaluate.
    pub expression: String,
    /// Items document, or `-` for stdin.
    pub items: PathBuf,
    /// Maximum number of items to print.
    pub limit: Option<usize>,
    /// Fields to print; empty means the default field.
    pub fields: Vec<FieldRef>,
}

/// Executes the match command.
pub fn execute(ctx: &CommandContext, opts: &MatchOptions) -> Result<()> {
    // Parse first so a bad expression fails before any input is read.
    let expression = ctx.parse(&opts.expression)?;
    let items = load_items(&opts.items)?;

    let mut matched = expression.filter_items(&items);
    let total = matched.len();
    debug!(
        expression = %expression,
        read = items.len(),
        matched = total,
        "Filtered items"
    );

    if let Some(limit) = opts.limit {
        matched.truncate(limit);
    }

    let fields = match opts.fields.as_slice() {
        [] => vec![FieldRef::new(ctx.registry.default_field())],
        fields => fields.to_vec(),
    };

    if ctx.json_output {
        let projection = (!opts.fields.is_empty()).then_some(fields.as_slice());
        println!(
            "{}",
            format_items_json(expression.source(), &matched, projection, total)?
        );
    } else if !ctx.quiet {
        print!(
            "{}",
            format_items_table(&matched, &fields, total, ctx.use_colors)
        );
    }

    Ok(())
}

/// Reads the items document from a file or stdin.
fn load_items(path: &Path) -> Result<Vec<Json>> {
    let content = if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        fs::read_to_string(path)?
    };

    parse_items(&content)
}

/// Parses an items document: an array of objects, or a single object.
fn parse_items(content: &str) -> Result<Vec<Json>> {
    match serde_json::from_str(content)? {
        Json::Array(items) => {
            if items.iter().all(Json::is_object) {
                Ok(items)
            } else {
                Err(CommandError::Json(serde_json::Error::custom(
                    "expected every item to be a JSON object",
                )))
            }
        }
        object @ Json::Object(_) => Ok(vec![object]),
        _ => Err(CommandError::Json(serde_json::Error::custom(
            "expected a JSON array of items or a single item object",
        ))),
    }
}
