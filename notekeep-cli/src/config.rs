//! CLI configuration handling.
//!
//! Settings come from three places, highest precedence first: command-line
//! flags (and their `NOTEKEEP_*` environment variables), the `notekeep.toml`
//! file, then built-in defaults.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use notekeep_mongodb::{StoreConfig, WriteConcern};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cli::GlobalArgs;
use crate::error::{CliError, CliResult};

/// Default config file name
pub const CONFIG_FILE_NAME: &str = "notekeep.toml";

/// Default MongoDB URI
pub const DEFAULT_URI: &str = "mongodb://127.0.0.1:27017";

/// Default database name
pub const DEFAULT_DATABASE: &str = "glottery";

/// Default collection name
pub const DEFAULT_COLLECTION: &str = "notes";

static ENV_VAR: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").ok());

/// Notekeep configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Database configuration
    pub database: DatabaseConfig,

    /// Timeout configuration
    pub timeouts: TimeoutConfig,
}

/// Database configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// MongoDB connection URI
    pub uri: Option<String>,

    /// Database name
    pub name: Option<String>,

    /// Collection name
    pub collection: Option<String>,

    /// Application name reported to the server
    pub app_name: Option<String>,

    /// Write acknowledgement: `"majority"`, a node count, or a tag set name
    pub write_concern: Option<String>,
}

/// Timeout configuration, as duration strings like `"10s"`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimeoutConfig {
    /// Connection timeout
    pub connect: Option<String>,

    /// Per-operation timeout
    pub operation: Option<String>,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML, expanding `${VAR}` references
    pub fn parse(content: &str) -> CliResult<Self> {
        let expanded = expand_env_vars(content);
        let config: Config = toml::from_str(&expanded)?;
        Ok(config)
    }
}

/// Resolved settings for one invocation
#[derive(Debug, Clone)]
pub struct Settings {
    /// Store configuration
    pub store: StoreConfig,

    /// Use the in-memory backend
    pub memory: bool,
}

impl Settings {
    /// Resolve settings from flags, the config file and defaults.
    ///
    /// A missing default config file is fine; a missing file named with
    /// `--config` is an error.
    pub fn resolve(args: &GlobalArgs) -> CliResult<Self> {
        let file = match args.config {
            Some(ref path) => Config::load(path)?,
            None => {
                let path = PathBuf::from(CONFIG_FILE_NAME);
                if path.exists() {
                    Config::load(&path)?
                } else {
                    debug!(path = %path.display(), "No config file, using defaults");
                    Config::default()
                }
            }
        };
        Self::merge(args, file)
    }

    /// Layer flags over a loaded config file.
    pub fn merge(args: &GlobalArgs, file: Config) -> CliResult<Self> {
        let uri = args
            .uri
            .clone()
            .or(file.database.uri)
            .unwrap_or_else(|| DEFAULT_URI.to_string());
        let database = args
            .database
            .clone()
            .or(file.database.name)
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string());
        let collection = args
            .collection
            .clone()
            .or(file.database.collection)
            .unwrap_or_else(|| DEFAULT_COLLECTION.to_string());

        let mut builder = StoreConfig::builder()
            .uri(uri)
            .database(database)
            .collection(collection);

        if let Some(app_name) = file.database.app_name {
            builder = builder.app_name(app_name);
        }
        if let Some(ref raw) = file.database.write_concern {
            builder = builder.write_concern(parse_write_concern(raw)?);
        }
        if let Some(ref connect) = file.timeouts.connect {
            builder = builder.connect_timeout(parse_setting("timeouts.connect", connect)?);
        }

        let operation = match (args.timeout, file.timeouts.operation) {
            (Some(timeout), _) => Some(timeout),
            (None, Some(ref raw)) => Some(parse_setting("timeouts.operation", raw)?),
            (None, None) => None,
        };
        if let Some(timeout) = operation {
            builder = builder.operation_timeout(timeout);
        }

        let store = builder.build().map_err(|e| CliError::Config(e.to_string()))?;
        Ok(Self {
            store,
            memory: args.memory,
        })
    }
}

fn parse_setting(key: &str, raw: &str) -> CliResult<Duration> {
    parse_duration(raw).map_err(|e| CliError::Config(format!("{}: {}", key, e)))
}

/// Parse a write concern: `majority`, a number of nodes, or a tag set name.
fn parse_write_concern(raw: &str) -> CliResult<WriteConcern> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(CliError::Config("database.write_concern must not be empty".into()));
    }
    if raw.eq_ignore_ascii_case("majority") {
        return Ok(WriteConcern::Majority);
    }
    if raw.chars().all(|c| c.is_ascii_digit()) {
        return raw
            .parse()
            .map(WriteConcern::W)
            .map_err(|_| CliError::Config(format!("database.write_concern: '{}' is out of range", raw)));
    }
    Ok(WriteConcern::Custom(raw.to_string()))
}

/// Parse a duration like `500ms`, `10s`, `2m` or `1h`. A bare number is seconds.
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split);

    let value: u64 = digits
        .parse()
        .map_err(|_| format!("invalid duration '{}'", raw))?;

    let seconds = |factor: u64| {
        value
            .checked_mul(factor)
            .map(Duration::from_secs)
            .ok_or_else(|| format!("duration too large: '{}'", raw))
    };

    match unit.trim() {
        "ms" => Ok(Duration::from_millis(value)),
        "" | "s" => seconds(1),
        "m" => seconds(60),
        "h" => seconds(3600),
        other => Err(format!("unknown duration unit '{}' in '{}'", other, raw)),
    }
}

/// Expand environment variables in the format `${VAR_NAME}`.
///
/// Unset variables are left as written.
fn expand_env_vars(content: &str) -> String {
    let Some(ref re) = *ENV_VAR else {
        return content.to_string();
    };

    re.replace_all(content, |caps: &regex_lite::Captures<'_>| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    })
    .into_owned()
}
