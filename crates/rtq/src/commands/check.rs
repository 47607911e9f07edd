//! Check command implementation.
//!
//! Parses expressions without evaluating them, showing the canonical form,
//! the condition tree and the server-side pre-filter.

use std::sync::Arc;

use rtfilter_rs::Expression;

use super::{CommandContext, Result};
use crate::output::{format_check_json, format_check_table};

/// Executes the check command.
///
/// Every expression is parsed before anything is printed, so a single
/// invalid expression fails the whole command.
pub fn execute(ctx: &CommandContext, expressions: &[String]) -> Result<()> {
    let parsed: Vec<Arc<Expression>> = expressions
        .iter()
        .map(|input| ctx.parse(input))
        .collect::<Result<_>>()?;

    if ctx.json_output {
        let refs: Vec<&Expression> = parsed.iter().map(Arc::as_ref).collect();
        println!("{}", format_check_json(&refs)?);
    } else if !ctx.quiet {
        let sections: Vec<String> = parsed
            .iter()
            .map(|expr| format_check_table(expr, ctx.use_colors))
            .collect();
        print!("{}", sections.join("\n"));
    }

    Ok(())
}
