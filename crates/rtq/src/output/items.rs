//! Matched item output formatting.

use rtfilter_rs::{FieldRef, Item};
use serde::Serialize;
use serde_json::{Map, Value as Json};

use super::helpers::{format_header, pad, truncate_str, MAX_COLUMN_WIDTH};

/// JSON output structure for the match command.
#[derive(Serialize)]
pub struct MatchOutput<'a> {
    pub expression: &'a str,
    pub total: usize,
    pub items: Vec<Json>,
}

/// Returns the display text of a field, or an empty string if it is missing.
fn cell(item: &Json, field: &FieldRef) -> String {
    Item::get(item, field)
        .and_then(|value| value.to_text())
        .unwrap_or_default()
}

/// Keeps only the requested fields of an item.
fn project(item: &Json, fields: &[FieldRef]) -> Json {
    let mut object = Map::new();
    for field in fields {
        let value = Item::get(item, field)
            .and_then(|value| serde_json::to_value(value).ok())
            .unwrap_or(Json::Null);
        object.insert(field.path().to_string(), value);
    }
    Json::Object(object)
}

/// Formats matched items as JSON.
///
/// With no `projection`, items are written as they were read.
pub fn format_items_json(
    expression: &str,
    items: &[&Json],
    projection: Option<&[FieldRef]>,
    total: usize,
) -> Result<String, serde_json::Error> {
    let items = items
        .iter()
        .map(|item| match projection {
            Some(fields) => project(item, fields),
            None => (*item).clone(),
        })
        .collect();

    let output = MatchOutput {
        expression,
        total,
        items,
    };

    serde_json::to_string_pretty(&output)
}

/// Formats matched items as a table with one column per field.
pub fn format_items_table(
    items: &[&Json],
    fields: &[FieldRef],
    total: usize,
    use_colors: bool,
) -> String {
    if items.is_empty() {
        return "No items matched.\n".to_string();
    }

    let rows: Vec<Vec<String>> = items
        .iter()
        .map(|item| {
            fields
                .iter()
                .map(|field| truncate_str(&cell(item, field), MAX_COLUMN_WIDTH))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = fields
        .iter()
        .enumerate()
        .map(|(i, field)| {
            rows.iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(field.path().chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut output = String::new();

    // Header
    let header: Vec<String> = fields
        .iter()
        .zip(&widths)
        .map(|(field, width)| pad(field.path(), *width))
        .collect();
    output.push_str(&format_header(header.join(" ").trim_end(), use_colors));

    for row in &rows {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(text, width)| pad(text, *width))
            .collect();
        output.push_str(line.join(" ").trim_end());
        output.push('\n');
    }

    if total > items.len() {
        output.push_str(&format!("({} of {} matches shown)\n", items.len(), total));
    }

    output
}
