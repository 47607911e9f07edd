//! Config command implementation.
//!
//! View and manage configuration settings.
//! Config file is located at ~/.config/rtq/config.toml.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::PathBuf;

use directories::BaseDirs;
use rtfilter_rs::{FieldKind, FieldRegistry, DEFAULT_CAPACITY};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{CommandContext, CommandError, Result};

/// Current config file version. Increment when making breaking changes to schema.
const CONFIG_VERSION: u32 = 1;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "RTQ_CONFIG";

/// Default config file contents.
const DEFAULT_CONFIG: &str = r#"# rtq - filter expression CLI configuration

# Config schema version (do not modify)
version = 1

# Field compared by a bare value such as `ubuntu*`
# default_field = "name"

# Extra fields and their kinds: pattern, number, size, duration,
# timestamp, bool, tags, files
[fields]
# rating = "number"
# label = "tags"

# Output preferences
[output]
# color = true              # Enable colors (respects NO_COLOR env)

# Parsed expression cache
[cache]
# capacity = 64             # 0 disables caching
"#;

/// Configuration file structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Config schema version for migrations.
    /// Defaults to current version when not present in file.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Field compared by bare values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_field: Option<String>,

    /// Extra fields, added to the built-in torrent fields.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, FieldKind>,

    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,

    /// Cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Returns the current config version (used by serde default).
fn default_version() -> u32 {
    CONFIG_VERSION
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            default_field: None,
            fields: BTreeMap::new(),
            output: OutputConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl Config {
    /// Builds the field registry described by this config.
    pub fn registry(&self) -> FieldRegistry {
        let mut registry = FieldRegistry::torrent();
        for (name, kind) in &self.fields {
            registry = registry.with_field(name.as_str(), *kind);
        }
        if let Some(ref field) = self.default_field {
            registry = registry.with_default_field(field.as_str());
        }
        registry
    }

    /// Returns the expression cache capacity.
    pub fn cache_capacity(&self) -> usize {
        self.cache.capacity.unwrap_or(DEFAULT_CAPACITY)
    }
}

/// Output configuration.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Enable colors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<bool>,
}

/// Cache configuration.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of parsed expressions kept.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<usize>,
}

/// Gets the config directory path.
/// Uses XDG-style paths: ~/.config/rtq/ on all platforms.
fn get_config_dir() -> Result<PathBuf> {
    if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(xdg_config).join("rtq"));
    }

    BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".config").join("rtq"))
        .ok_or_else(|| {
            CommandError::Config("Could not determine config directory".to_string())
        })
}

/// Gets the config file path.
pub fn get_config_path() -> Result<PathBuf> {
    // Check for override env var first
    if let Ok(path) = env::var(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }

    let config_dir = get_config_dir()?;
    Ok(config_dir.join("config.toml"))
}

/// Loads the configuration from disk.
pub fn load_config() -> Result<Config> {
    let path = get_config_path()?;

    if !path.exists() {
        debug!(path = %path.display(), "No config file, using defaults");
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&path)
        .map_err(|e| CommandError::Config(format!("Failed to read config: {}", e)))?;

    let config = parse_config(&content)?;
    debug!(path = %path.display(), fields = config.fields.len(), "Loaded config");
    Ok(config)
}

/// Parses and migrates config file contents.
fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)
        .map_err(|e| CommandError::Config(format!("Failed to parse config: {}", e)))?;

    migrate_config(config)
}

/// Migrates config to current version if needed.
/// Returns the config as-is if already at current version.
fn migrate_config(mut config: Config) -> Result<Config> {
    if config.version > CONFIG_VERSION {
        return Err(CommandError::Config(format!(
            "Config version {} is newer than supported version {}",
            config.version, CONFIG_VERSION
        )));
    }

    // Version 1 is the initial schema; later versions migrate here in order.
    config.version = CONFIG_VERSION;
    Ok(config)
}

/// Executes the config show command.
pub fn execute_show(ctx: &CommandContext) -> Result<()> {
    let config = load_config()?;
    let path = get_config_path()?;

    if ctx.json_output {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
            "config": config,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        use owo_colors::OwoColorize;

        let header = "Configuration";
        if ctx.use_colors {
            println!("{}\n", header.green().bold());
        } else {
            println!("{}\n", header);
        }

        println!("File: {}", path.display());
        println!("Exists: {}\n", path.exists());

        if path.exists() {
            println!("Settings:");
            if let Some(ref field) = config.default_field {
                println!("  default_field: {}", field);
            }

            if !config.fields.is_empty() {
                println!("\n[fields]");
                for (name, kind) in &config.fields {
                    println!("  {}: {}", name, kind);
                }
            }

            println!("\n[output]");
            if let Some(color) = config.output.color {
                println!("  color: {}", color);
            }

            println!("\n[cache]");
            if let Some(capacity) = config.cache.capacity {
                println!("  capacity: {}", capacity);
            }
        } else {
            println!("(No config file exists. Run 'rtq config init' to create one.)");
        }
    }

    Ok(())
}

/// Executes the config path command.
pub fn execute_path(ctx: &CommandContext) -> Result<()> {
    let path = get_config_path()?;

    if ctx.json_output {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", path.display());
    }

    Ok(())
}

/// Executes the config init command.
///
/// An existing config file is left untouched.
pub fn execute_init(ctx: &CommandContext) -> Result<()> {
    let path = get_config_path()?;
    let created = !path.exists();

    if created {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                CommandError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }
        fs::write(&path, DEFAULT_CONFIG)
            .map_err(|e| CommandError::Config(format!("Failed to create config file: {}", e)))?;
    }

    if ctx.json_output {
        let output = serde_json::json!({
            "status": if created { "created" } else { "exists" },
            "path": path.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        if created {
            println!("Created default config at: {}", path.display());
        } else {
            println!("Config already exists at: {}", path.display());
        }
    }

    Ok(())
}
