//! Engine configuration.
//!
//! Configuration is read from environment variables, with defaults for
//! everything.
//!
//! # Environment Variables
//!
//! - `TRELLIS_SLICE_DEFAULT`: service page size when no `slice` hook overrides it (default: `20`)
//! - `TRELLIS_SERVICE_TIMEOUT_MS`: default service timeout, `0` for none (default: `0`)
//! - `TRELLIS_MAX_PATH_VISITED`: per-origin visited bound for path repetition (default: `10000`)
//! - `TRELLIS_MAX_NESTING`: maximum depth of hook-initiated queries (default: `32`)
//! - `TRELLIS_ACCESS_LEVEL`: `public`, `restricted`, `default`, `private` or `super` (default: `default`)
//!
//! # Invariants
//!
//! - `slice_default`, `max_path_visited` and `max_nesting` are never zero

use std::num::NonZeroUsize;

use crate::access::AccessLevel;
use crate::constants::{DEFAULT_MAX_NESTING, DEFAULT_MAX_PATH_VISITED, SLICE_DEFAULT};

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Page size used to send bindings to a service.
    pub slice_default: NonZeroUsize,
    /// Service timeout in milliseconds when no `timeout` hook overrides it.
    /// `0` means no limit.
    pub service_timeout_ms: u64,
    /// Maximum nodes visited from one origin during `*`/`+` traversal.
    pub max_path_visited: NonZeroUsize,
    /// Maximum depth of queries started from hook handlers.
    pub max_nesting: NonZeroUsize,
    /// Access level queries run at.
    pub access_level: AccessLevel,
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    InvalidValue { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

const fn non_zero(n: usize) -> NonZeroUsize {
    match NonZeroUsize::new(n) {
        Some(n) => n,
        None => NonZeroUsize::MIN,
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            slice_default: non_zero(SLICE_DEFAULT),
            service_timeout_ms: 0,
            max_path_visited: non_zero(DEFAULT_MAX_PATH_VISITED),
            max_nesting: non_zero(DEFAULT_MAX_NESTING),
            access_level: AccessLevel::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through a variable lookup function.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            slice_default: load_non_zero(&lookup, "TRELLIS_SLICE_DEFAULT", defaults.slice_default)?,
            service_timeout_ms: load_number(
                &lookup,
                "TRELLIS_SERVICE_TIMEOUT_MS",
                defaults.service_timeout_ms,
            )?,
            max_path_visited: load_non_zero(
                &lookup,
                "TRELLIS_MAX_PATH_VISITED",
                defaults.max_path_visited,
            )?,
            max_nesting: load_non_zero(&lookup, "TRELLIS_MAX_NESTING", defaults.max_nesting)?,
            access_level: load_access_level(&lookup, defaults.access_level)?,
        })
    }
}

fn load_number(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: u64,
) -> Result<u64, ConfigError> {
    match lookup(name) {
        Some(value) => value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidValue {
            name: name.to_string(),
            message: format!("'{value}' is not a non-negative integer"),
        }),
        None => Ok(default),
    }
}

fn load_non_zero(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: NonZeroUsize,
) -> Result<NonZeroUsize, ConfigError> {
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse::<NonZeroUsize>()
            .map_err(|_| ConfigError::InvalidValue {
                name: name.to_string(),
                message: format!("'{value}' is not a positive integer"),
            }),
        None => Ok(default),
    }
}

fn load_access_level(
    lookup: &impl Fn(&str) -> Option<String>,
    default: AccessLevel,
) -> Result<AccessLevel, ConfigError> {
    match lookup("TRELLIS_ACCESS_LEVEL") {
        Some(value) => value
            .trim()
            .parse::<AccessLevel>()
            .map_err(|message| ConfigError::InvalidValue {
                name: "TRELLIS_ACCESS_LEVEL".to_string(),
                message,
            }),
        None => Ok(default),
    }
}
