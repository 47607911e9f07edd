//! Fields command implementation.
//!
//! Lists the fields expressions can name, with the kind of each.

use super::{CommandContext, Result};
use crate::output::{format_fields_json, format_fields_table};

/// Executes the fields command.
pub fn execute(ctx: &CommandContext) -> Result<()> {
    if ctx.json_output {
        println!("{}", format_fields_json(&ctx.registry)?);
    } else if !ctx.quiet {
        print!("{}", format_fields_table(&ctx.registry, ctx.use_colors));
    }

    Ok(())
}
