//! Field list output formatting.

use rtfilter_rs::{FieldKind, FieldRegistry};
use serde::Serialize;

use super::helpers::{format_header, pad};

/// JSON output structure for the fields command.
#[derive(Serialize)]
pub struct FieldsOutput<'a> {
    pub default_field: &'a str,
    pub fields: Vec<FieldOutput<'a>>,
}

/// JSON output structure for a single field.
#[derive(Serialize)]
pub struct FieldOutput<'a> {
    pub name: &'a str,
    pub kind: FieldKind,
}

/// Formats the registry as JSON.
pub fn format_fields_json(registry: &FieldRegistry) -> Result<String, serde_json::Error> {
    let output = FieldsOutput {
        default_field: registry.default_field(),
        fields: registry
            .fields()
            .into_iter()
            .map(|(name, kind)| FieldOutput { name, kind })
            .collect(),
    };

    serde_json::to_string_pretty(&output)
}

/// Formats the registry as a table.
pub fn format_fields_table(registry: &FieldRegistry, use_colors: bool) -> String {
    let fields = registry.fields();
    if fields.is_empty() {
        return "No fields registered.\n".to_string();
    }

    let width = fields
        .iter()
        .map(|(name, _)| name.chars().count())
        .max()
        .unwrap_or(0)
        .max("Field".len());

    let mut output = String::new();
    output.push_str(&format_header(&format!("{} Kind", pad("Field", width)), use_colors));

    for (name, kind) in fields {
        let marker = if name == registry.default_field() {
            " (default)"
        } else {
            ""
        };
        output.push_str(&format!("{} {kind}{marker}\n", pad(name, width)));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_table() {
        let registry = FieldRegistry::empty()
            .with_field("name", FieldKind::Pattern)
            .with_field("size", FieldKind::Size);

        assert_eq!(
            format_fields_table(&registry, false),
            "Field Kind\nname  pattern (default)\nsize  size\n"
        );
    }

    #[test]
    fn test_fields_table_empty() {
        assert_eq!(
            format_fields_table(&FieldRegistry::empty(), false),
            "No fields registered.\n"
        );
    }

    #[test]
    fn test_fields_json() {
        let registry = FieldRegistry::torrent().with_default_field("alias");
        let out = format_fields_json(&registry).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();

        assert_eq!(parsed["default_field"], "alias");
        let size = parsed["fields"]
            .as_array()
            .unwrap()
            .iter()
            .find(|f| f["name"] == "size")
            .unwrap();
        assert_eq!(size["kind"], "size");
    }
}
