//! CLI argument parsing using clap derive macros.
//!
//! This module defines the command-line interface for the rtq CLI.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use rtfilter_rs::FieldRef;

/// rtq - Query torrent items with filter expressions
#[derive(Parser, Debug)]
#[command(name = "rtq")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbose output (show debug information)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the items that match an expression
    #[command(alias = "m")]
    Match {
        /// Filter expression (e.g., "name=arch* size>1G")
        expression: String,

        /// JSON file with the items to filter ("-" reads stdin)
        #[arg(short, long, default_value = "-")]
        items: PathBuf,

        /// Maximum number of items to print
        #[arg(long)]
        limit: Option<usize>,

        /// Fields to show, comma-separated (default: the default field)
        #[arg(short, long, value_delimiter = ',', value_parser = parse_field)]
        fields: Vec<FieldRef>,
    },

    /// Show how expressions are parsed and pre-filtered
    #[command(alias = "c")]
    Check {
        /// One or more filter expressions
        #[arg(required = true)]
        expressions: Vec<String>,
    },

    /// List the known fields and their kinds
    Fields,

    /// View or manage configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Parses a field path given on the command line.
fn parse_field(s: &str) -> Result<FieldRef, String> {
    FieldRef::parse(s.trim()).ok_or_else(|| format!("invalid field name '{s}'"))
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Print config file path
    Path,

    /// Write a default config file if none exists
    Init,
}

/// Supported shells for completions
#[derive(ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_match_defaults() {
        let cli = Cli::parse_from(["rtq", "match", "name=arch*"]);
        if let Commands::Match {
            expression,
            items,
            limit,
            fields,
        } = cli.command
        {
            assert_eq!(expression, "name=arch*");
            assert_eq!(items, PathBuf::from("-"));
            assert!(limit.is_none());
            assert!(fields.is_empty());
        } else {
            panic!("Expected Match command");
        }
    }

    #[test]
    fn test_match_with_options() {
        let cli = Cli::parse_from([
            "rtq",
            "match",
            "size>1G",
            "--items",
            "items.json",
            "--limit",
            "5",
            "--fields",
            "name,size",
        ]);
        if let Commands::Match {
            items,
            limit,
            fields,
            ..
        } = cli.command
        {
            assert_eq!(items, PathBuf::from("items.json"));
            assert_eq!(limit, Some(5));
            assert_eq!(fields, vec![FieldRef::new("name"), FieldRef::new("size")]);
        } else {
            panic!("Expected Match command");
        }
    }

    #[test]
    fn test_match_rejects_bad_field() {
        assert!(Cli::try_parse_from(["rtq", "match", "arch", "--fields", "name,a b"]).is_err());
        assert!(Cli::try_parse_from(["rtq", "match", "arch", "--fields", "1st"]).is_err());
    }

    #[test]
    fn test_match_alias() {
        let cli = Cli::parse_from(["rtq", "m", "arch"]);
        assert!(matches!(cli.command, Commands::Match { .. }));
    }

    #[test]
    fn test_expression_starting_with_not() {
        let cli = Cli::parse_from(["rtq", "check", "NOT [ name=a OR name=b ]"]);
        if let Commands::Check { expressions } = cli.command {
            assert_eq!(expressions, vec!["NOT [ name=a OR name=b ]"]);
        } else {
            panic!("Expected Check command");
        }
    }

    #[test]
    fn test_check_requires_expression() {
        assert!(Cli::try_parse_from(["rtq", "check"]).is_err());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["rtq", "fields", "--json", "--no-color", "-v"]);
        assert!(cli.json);
        assert!(cli.no_color);
        assert!(cli.verbose);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["rtq", "fields", "-v", "-q"]).is_err());
    }

    #[test]
    fn test_config_subcommands() {
        let cli = Cli::parse_from(["rtq", "config"]);
        assert!(matches!(cli.command, Commands::Config { command: None }));

        let cli = Cli::parse_from(["rtq", "config", "init"]);
        assert!(matches!(
            cli.command,
            Commands::Config {
                command: Some(ConfigCommands::Init)
            }
        ));
    }

    #[test]
    fn test_completions() {
        let cli = Cli::parse_from(["rtq", "completions", "zsh"]);
        if let Commands::Completions { shell } = cli.command {
            assert!(matches!(shell, Shell::Zsh));
        } else {
            panic!("Expected Completions command");
        }
    }
}
