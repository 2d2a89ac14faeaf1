//! Configuration and dependency wiring for the activity feed binary.

mod dependencies;

pub use dependencies::Dependencies;

use std::env;
use std::path::PathBuf;

use activity_repository::ActivityServiceConfig;

use crate::errors::ReplayError;

/// Default tracing filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "activity_feed=info,activity_repository=info";

/// Output format for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Result<Self, ReplayError> {
        match value.to_lowercase().as_str() {
            "pretty" | "console" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ReplayError::config(format!(
                "LOG_FORMAT must be 'pretty' or 'json', got '{}'",
                other
            ))),
        }
    }
}

/// Runtime configuration of the binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    /// JSON-lines file to replay; stdin when `None`.
    pub events_path: Option<PathBuf>,
    pub log_format: LogFormat,
    pub service: ActivityServiceConfig,
}

impl FeedConfig {
    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `ACTIVITY_EVENTS_PATH`: JSON-lines event file (default: stdin)
    /// - `ACTIVITY_MAX_READ_COUNT`: largest read window, `0` for no limit (default: 1000)
    /// - `ACTIVITY_MAX_START_INDEX`: largest read offset, `0` for no limit (default: 10000)
    /// - `LOG_FORMAT`: `pretty` or `json` (default: pretty)
    pub fn from_env() -> Result<Self, ReplayError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ReplayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let events_path = lookup("ACTIVITY_EVENTS_PATH")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        let log_format = match lookup("LOG_FORMAT") {
            Some(value) => LogFormat::parse(&value)?,
            None => LogFormat::default(),
        };

        let defaults = ActivityServiceConfig::default();
        let service = ActivityServiceConfig {
            max_read_count: parse_limit(
                "ACTIVITY_MAX_READ_COUNT",
                lookup("ACTIVITY_MAX_READ_COUNT"),
                defaults.max_read_count,
            )?,
            max_start_index: parse_limit(
                "ACTIVITY_MAX_START_INDEX",
                lookup("ACTIVITY_MAX_START_INDEX"),
                defaults.max_start_index,
            )?,
        };

        Ok(Self {
            events_path,
            log_format,
            service,
        })
    }
}

/// Parse a read limit; `0` disables the limit.
fn parse_limit(
    name: &str,
    value: Option<String>,
    default: Option<usize>,
) -> Result<Option<usize>, ReplayError> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.trim().parse::<usize>() {
        Ok(0) => Ok(None),
        Ok(limit) => Ok(Some(limit)),
        Err(e) => Err(ReplayError::config(format!(
            "{} must be a non-negative integer: {}",
            name, e
        ))),
    }
}
