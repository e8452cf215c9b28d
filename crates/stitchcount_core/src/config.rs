//! Runtime configuration checks.
//!
//! # Responsibility
//! - Turn host-supplied settings (flags, environment) into a validated [`AppConfig`].
//! - Reject malformed values instead of guessing.
//!
//! # Invariants
//! - Unset settings fall back to documented defaults.
//! - `log_dir`, when set, must be absolute (same rule as `init_logging`).
//! - `log_level` must be a level `init_logging` accepts.

use crate::logging::{default_log_level, parse_level};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_DB_FILE_NAME: &str = "stitchcount.sqlite3";
const DEFAULT_TICK_MS: u64 = 1000;
const MIN_TICK_MS: u64 = 50;
const MAX_TICK_MS: u64 = 60_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Empty(&'static str),
    UnknownLogLevel(String),
    TickOutOfRange(u64),
    RelativeLogDir(PathBuf),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty(setting) => write!(f, "{setting} is set but empty"),
            Self::UnknownLogLevel(value) => write!(
                f,
                "log level must be one of error|warn|info|debug|trace, got `{value}`"
            ),
            Self::TickOutOfRange(value) => write!(
                f,
                "tick interval must be within {MIN_TICK_MS}..={MAX_TICK_MS} ms, got {value}"
            ),
            Self::RelativeLogDir(value) => {
                write!(f, "log dir must be an absolute path, got `{}`", value.display())
            }
        }
    }
}

impl Error for ConfigError {}

/// Raw settings as a host collected them; `None` means "use the default".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigInput {
    pub db_path: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_dir: Option<PathBuf>,
    pub tick_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// File logging is disabled when `None`.
    pub log_dir: Option<PathBuf>,
    pub tick_interval: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
            tick_interval: Duration::from_millis(DEFAULT_TICK_MS),
        }
    }
}

impl AppConfig {
    /// Validates `input` and fills unset settings with defaults.
    pub fn resolve(input: ConfigInput) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = input.db_path {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Empty("db path"));
            }
            config.db_path = path;
        }
        if let Some(level) = input.log_level {
            if level.trim().is_empty() {
                return Err(ConfigError::Empty("log level"));
            }
            let parsed = parse_level(&level)
                .map_err(|_| ConfigError::UnknownLogLevel(level.trim().to_string()))?;
            config.log_level = parsed.to_string();
        }
        if let Some(dir) = input.log_dir {
            if dir.as_os_str().is_empty() {
                return Err(ConfigError::Empty("log dir"));
            }
            if !dir.is_absolute() {
                return Err(ConfigError::RelativeLogDir(dir));
            }
            config.log_dir = Some(dir);
        }
        if let Some(millis) = input.tick_ms {
            if !(MIN_TICK_MS..=MAX_TICK_MS).contains(&millis) {
                return Err(ConfigError::TickOutOfRange(millis));
            }
            config.tick_interval = Duration::from_millis(millis);
        }

        Ok(config)
    }
}
