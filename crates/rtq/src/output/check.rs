//! Expression check output formatting.

use rtfilter_rs::{Expression, Node};
use serde::Serialize;

use super::helpers::format_title;

/// JSON output structure for the check command.
#[derive(Serialize)]
pub struct CheckOutput<'a> {
    pub expressions: Vec<ExpressionOutput<'a>>,
}

/// JSON output structure for a single checked expression.
#[derive(Serialize)]
pub struct ExpressionOutput<'a> {
    pub source: &'a str,
    pub canonical: String,
    pub conditions: usize,
    pub prefilter: Option<&'a str>,
    pub prefilter_argument: Option<String>,
}

/// Writes the tree as an indented outline, one node per line.
pub fn format_tree(node: &Node) -> String {
    fn walk(node: &Node, depth: usize, out: &mut String) {
        let indent = "  ".repeat(depth);
        match node {
            Node::And(children) | Node::Or(children) => {
                let label = if matches!(node, Node::And(_)) { "AND" } else { "OR" };
                out.push_str(&format!("{indent}{label}\n"));
                for child in children {
                    walk(child, depth + 1, out);
                }
            }
            Node::Not(inner) => {
                out.push_str(&format!("{indent}NOT\n"));
                walk(inner, depth + 1, out);
            }
            Node::Group(inner) => {
                out.push_str(&format!("{indent}[ ]\n"));
                walk(inner, depth + 1, out);
            }
            Node::Leaf(condition) => out.push_str(&format!("{indent}{condition}\n")),
        }
    }

    let mut out = String::new();
    walk(node, 0, &mut out);
    out
}

/// Formats checked expressions as JSON.
pub fn format_check_json(expressions: &[&Expression]) -> Result<String, serde_json::Error> {
    let output = CheckOutput {
        expressions: expressions
            .iter()
            .map(|expr| ExpressionOutput {
                source: expr.source(),
                canonical: expr.to_string(),
                conditions: expr.ast().conditions().len(),
                prefilter: expr.prefilter().map(|p| p.as_str()),
                prefilter_argument: expr.prefilter().map(|p| p.quoted()),
            })
            .collect(),
    };

    serde_json::to_string_pretty(&output)
}

/// Formats a checked expression for display.
pub fn format_check_table(expr: &Expression, use_colors: bool) -> String {
    let mut output = String::new();

    output.push_str(&format!("{}\n", format_title(expr.source(), use_colors)));
    output.push_str(&format!("  Canonical: {expr}\n"));
    match expr.prefilter() {
        Some(prefilter) => output.push_str(&format!("  Pre-filter: {}\n", prefilter.quoted())),
        None => output.push_str("  Pre-filter: (none)\n"),
    }
    output.push_str("  Tree:\n");
    for line in format_tree(expr.ast()).lines() {
        output.push_str(&format!("    {line}\n"));
    }

    output
}
