//! Logging initialization.

use tracing::Level;
use tracing_subscriber::fmt;

/// Picks the log level for the verbosity flags.
pub fn level(verbose: bool, quiet: bool) -> Level {
    if verbose {
        Level::DEBUG
    } else if quiet {
        Level::ERROR
    } else {
        Level::WARN
    }
}

/// Initialize logging at the given level.
///
/// Logs are written to stderr so stdout remains clean for program output.
pub fn init_logging(level: Level) {
    fmt::Subscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
