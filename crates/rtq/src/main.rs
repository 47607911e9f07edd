use clap::Parser;
use std::process::ExitCode;

mod cli;
mod commands;
mod logging;
mod output;

use cli::{Cli, Commands, ConfigCommands};
use commands::config::{self as config_cmd, load_config, Config};
use commands::matching::MatchOptions;
use commands::{CommandContext, CommandError};

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(logging::level(cli.verbose, cli.quiet));

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                let error_json = serde_json::json!({
                    "error": {
                        "code": e.code(),
                        "message": e.to_string(),
                    }
                });
                match serde_json::to_string_pretty(&error_json) {
                    Ok(text) => eprintln!("{text}"),
                    Err(_) => eprintln!("Error: {e}"),
                }
            } else {
                eprintln!("Error: {e}");
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(cli: &Cli) -> commands::Result<()> {
    match &cli.command {
        Commands::Completions { shell } => Ok(commands::completions::execute(shell)?),
        Commands::Config { command } => {
            // Config commands must work even when the config file is broken.
            let ctx = CommandContext::from_cli(cli, &Config::default());
            match command {
                None | Some(ConfigCommands::Show) => config_cmd::execute_show(&ctx),
                Some(ConfigCommands::Path) => config_cmd::execute_path(&ctx),
                Some(ConfigCommands::Init) => config_cmd::execute_init(&ctx),
            }
        }
        Commands::Match {
            expression,
            items,
            limit,
            fields,
        } => {
            let ctx = configured_context(cli)?;
            let opts = MatchOptions {
                expression: expression.clone(),
                items: items.clone(),
                limit: *limit,
                fields: fields.clone(),
            };
            commands::matching::execute(&ctx, &opts)
        }
        Commands::Check { expressions } => {
            commands::check::execute(&configured_context(cli)?, expressions)
        }
        Commands::Fields => commands::fields::execute(&configured_context(cli)?),
    }
}

/// Builds the command context from the CLI flags and the config file.
fn configured_context(cli: &Cli) -> Result<CommandContext, CommandError> {
    let config = load_config()?;
    Ok(CommandContext::from_cli(cli, &config))
}
