//! Runtime configuration for a journal session.
//!
//! # Responsibility
//! - Hold timing, storage and logging settings with working defaults.
//! - Expose them as command line flags with `DAYLOG_*` environment
//!   fallbacks, for any binary that flattens [`ConfigArgs`].
//!
//! # Invariants
//! - Defaults: 1000 ms autosave debounce, 3000 ms notification window.
//! - Unset flags and variables keep defaults; malformed values are
//!   rejected by the parser.

use crate::logging::default_log_level;
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_AUTOSAVE_MS: u64 = 1000;
pub const DEFAULT_NOTIFICATION_MS: u64 = 3000;
pub const DEFAULT_DB_FILE_NAME: &str = "daylog.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalConfig {
    /// Quiet period before an edited field group is autosaved.
    pub autosave_delay: Duration,
    /// Display window of save notifications.
    pub notification_ttl: Duration,
    pub db_path: PathBuf,
    pub log_level: String,
    /// Rolling log directory; logging stays off when `None`.
    pub log_dir: Option<PathBuf>,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            autosave_delay: Duration::from_millis(DEFAULT_AUTOSAVE_MS),
            notification_ttl: Duration::from_millis(DEFAULT_NOTIFICATION_MS),
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

/// Journal settings as command line flags.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ConfigArgs {
    /// SQLite database file
    #[arg(long, env = "DAYLOG_DB_PATH", default_value = DEFAULT_DB_FILE_NAME)]
    pub db_path: PathBuf,

    /// Autosave debounce window in milliseconds
    #[arg(long, env = "DAYLOG_AUTOSAVE_MS", default_value_t = DEFAULT_AUTOSAVE_MS)]
    pub autosave_ms: u64,

    /// How long a save notification stays visible, in milliseconds
    #[arg(long, env = "DAYLOG_NOTIFICATION_MS", default_value_t = DEFAULT_NOTIFICATION_MS)]
    pub notification_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "DAYLOG_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Rolling log directory; logging is off when unset
    #[arg(long, env = "DAYLOG_LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

impl From<ConfigArgs> for JournalConfig {
    fn from(args: ConfigArgs) -> Self {
        Self {
            autosave_delay: Duration::from_millis(args.autosave_ms),
            notification_ttl: Duration::from_millis(args.notification_ms),
            db_path: args.db_path,
            log_level: args
                .log_level
                .map(|level| level.trim().to_string())
                .filter(|level| !level.is_empty())
                .unwrap_or_else(|| default_log_level().to_string()),
            log_dir: args.log_dir,
        }
    }
}
