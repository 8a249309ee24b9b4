//! Configuration for an introspection pass.
//!
//! The code generator hands the driver a flat JSON object. [`Config::from_json`]
//! parses it, applies defaults and rejects missing required options.

use heck::ToUpperCamelCase;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// CockroachDB's SQL port.
pub const DEFAULT_PORT: u16 = 26257;

/// Schema used when none is configured.
pub const DEFAULT_SCHEMA: &str = "public";

/// Prefix for nullable enum type names when none is configured.
pub const DEFAULT_ENUM_NULL_PREFIX: &str = "Null";

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required option is absent or empty
    #[error("missing required config option `{0}`")]
    Missing(&'static str),

    /// `sslmode` is not one we know
    #[error("unsupported sslmode `{0}` (expected disable, prefer, require, verify-ca or verify-full)")]
    InvalidSslMode(String),

    /// The input is not the JSON object we expect
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Transport security for the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SslMode {
    /// Plain TCP
    #[default]
    Disable,
    /// TLS if the server offers it
    Prefer,
    /// TLS or fail
    Require,
}

impl FromStr for SslMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "disable" => Ok(SslMode::Disable),
            "allow" | "prefer" => Ok(SslMode::Prefer),
            "require" | "verify-ca" | "verify-full" => Ok(SslMode::Require),
            other => Err(ConfigError::InvalidSslMode(other.to_string())),
        }
    }
}

impl fmt::Display for SslMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SslMode::Disable => write!(f, "disable"),
            SslMode::Prefer => write!(f, "prefer"),
            SslMode::Require => write!(f, "require"),
        }
    }
}

/// Validated configuration for one introspection pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub user: String,
    pub password: Option<String>,
    pub dbname: String,
    pub host: String,
    pub port: u16,
    pub ssl_mode: SslMode,
    /// Schema to introspect
    pub schema: String,
    /// Relations (`name`) and columns (`table.column`, `*.column`) to keep
    pub whitelist: Vec<String>,
    /// Relations and columns to drop; ignored when the whitelist is set
    pub blacklist: Vec<String>,
    /// Emit enum columns as named types instead of strings
    pub add_enum_types: bool,
    /// TitleCased prefix for nullable enum type names
    pub enum_null_prefix: String,
}

/// The wire shape, before defaults and validation.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    user: Option<String>,
    pass: Option<String>,
    dbname: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    sslmode: Option<String>,
    schema: Option<String>,
    whitelist: Vec<String>,
    blacklist: Vec<String>,
    #[serde(rename = "add-enum-types")]
    add_enum_types: bool,
    #[serde(rename = "enum-null-prefix")]
    enum_null_prefix: Option<String>,
}

fn required(value: Option<String>, option: &'static str) -> Result<String, ConfigError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(option))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl Config {
    /// Parse and validate the host's JSON configuration object.
    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(input)?;

        let ssl_mode = match raw.sslmode.as_deref() {
            Some(mode) => mode.parse()?,
            None => SslMode::default(),
        };

        Ok(Self {
            user: required(raw.user, "user")?,
            password: non_empty(raw.pass),
            dbname: required(raw.dbname, "dbname")?,
            host: required(raw.host, "host")?,
            port: raw.port.unwrap_or(DEFAULT_PORT),
            ssl_mode,
            schema: non_empty(raw.schema).unwrap_or_else(|| DEFAULT_SCHEMA.to_string()),
            whitelist: raw.whitelist,
            blacklist: raw.blacklist,
            add_enum_types: raw.add_enum_types,
            enum_null_prefix: non_empty(raw.enum_null_prefix)
                .unwrap_or_else(|| DEFAULT_ENUM_NULL_PREFIX.to_string())
                .to_upper_camel_case(),
        })
    }

    /// Whether generated SQL must qualify names with the schema.
    pub fn uses_schema(&self) -> bool {
        self.schema != DEFAULT_SCHEMA
    }
}
