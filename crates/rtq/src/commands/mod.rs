//! Command implementations for the rtq CLI.
//!
//! This module contains the actual command handlers that are invoked by the CLI.

pub mod check;
pub mod completions;
pub mod config;
pub mod fields;
pub mod matching;

use std::env;
use std::sync::Arc;

use rtfilter_rs::{Expression, ExpressionCache, FieldRegistry, FilterError};

use crate::cli::Cli;
use config::Config;

/// Error type for command execution.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Filter parsing or compile error.
    #[error("filter error: {0}")]
    Filter(#[from] FilterError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CommandError {
    /// Returns the error code string for JSON output.
    pub fn code(&self) -> &'static str {
        match self {
            CommandError::Filter(_) => "FILTER_ERROR",
            CommandError::Config(_) => "CONFIG_ERROR",
            CommandError::Io(_) => "IO_ERROR",
            CommandError::Json(_) => "JSON_ERROR",
        }
    }

    /// Returns the process exit code for the error.
    pub fn exit_code(&self) -> u8 {
        match self {
            CommandError::Filter(_) => 2,
            CommandError::Json(_) => 3,
            CommandError::Io(_) => 4,
            CommandError::Config(_) => 5,
        }
    }
}

/// Result type for command execution.
pub type Result<T> = std::result::Result<T, CommandError>;

/// Context for command execution, containing common dependencies.
pub struct CommandContext {
    /// Whether to output JSON.
    pub json_output: bool,
    /// Whether to use colors.
    pub use_colors: bool,
    /// Whether to be quiet (errors only).
    pub quiet: bool,
    /// Fields known to expressions, including configured ones.
    pub registry: FieldRegistry,
    cache: ExpressionCache,
}

impl CommandContext {
    /// Creates a new command context from CLI arguments and the loaded config.
    pub fn from_cli(cli: &Cli, config: &Config) -> Self {
        let registry = config.registry();
        let color_enabled =
            config.output.color.unwrap_or(true) && env::var_os("NO_COLOR").is_none();

        Self {
            json_output: cli.json,
            use_colors: !cli.no_color && color_enabled,
            quiet: cli.quiet,
            cache: ExpressionCache::with_config(config.cache_capacity(), registry.clone()),
            registry,
        }
    }

    /// Parses an expression against the configured fields.
    ///
    /// Repeated expressions within one invocation are parsed once.
    pub fn parse(&self, input: &str) -> Result<Arc<Expression>> {
        Ok(self.cache.get_or_parse(input)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_error_codes() {
        let filter = CommandError::from(FilterError::EmptyExpression);
        assert_eq!(filter.code(), "FILTER_ERROR");
        assert_eq!(filter.exit_code(), 2);

        let config = CommandError::Config("bad".to_string());
        assert_eq!(config.code(), "CONFIG_ERROR");
        assert_eq!(config.exit_code(), 5);

        let io = CommandError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(io.code(), "IO_ERROR");
        assert_eq!(io.exit_code(), 4);
    }

    #[test]
    fn test_error_messages() {
        let err = CommandError::from(FilterError::EmptyExpression);
        assert!(err.to_string().starts_with("filter error: "));
    }

    #[test]
    fn test_context_uses_configured_fields() {
        let cli = Cli::parse_from(["rtq", "--no-color", "fields"]);
        let config: Config = toml::from_str(
            r#"
default_field = "alias"

[fields]
rating = "number"
"#,
        )
        .unwrap();
        let ctx = CommandContext::from_cli(&cli, &config);

        assert!(!ctx.use_colors);
        assert_eq!(ctx.registry.default_field(), "alias");
        assert!(ctx.registry.contains("rating"));

        let expr = ctx.parse("ubuntu").unwrap();
        assert_eq!(expr.to_string(), "alias=ubuntu");
        assert!(Arc::ptr_eq(&expr, &ctx.parse("ubuntu").unwrap()));
    }

    #[test]
    fn test_context_parse_error() {
        let cli = Cli::parse_from(["rtq", "fields"]);
        let ctx = CommandContext::from_cli(&cli, &Config::default());
        assert!(matches!(ctx.parse("NOT"), Err(CommandError::Filter(_))));
    }
}
