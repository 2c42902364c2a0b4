//! Structured logging, mirroring the teacher crate's `tracing` +
//! `tracing-subscriber` setup but stripped of on-disk state (§0.1 of
//! SPEC_FULL.md): this binary is a single stdin -> stdout JSON filter, so
//! logs must never touch stdout, and there is no rotation or retention
//! concept because nothing is written to disk.
//!
//! Every pipeline stage emits `info!`/`debug!`/`warn!`/`error!` spans the
//! way the teacher's `solver`/`commands` modules did: entry/exit of each
//! stage, counts of sessions/slots built, constraint counts posted, and
//! solver status/wall-clock time.

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging configuration. A trimmed version of the teacher's `LogConfig`:
/// the `log_dir`/`file_output`/`retention_days` fields are dropped since
/// this crate keeps no on-disk state.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: Level,
    pub with_target: bool,
    pub with_location: bool,
    pub with_thread_info: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: if cfg!(debug_assertions) {
                Level::DEBUG
            } else {
                Level::INFO
            },
            with_target: true,
            with_location: true,
            with_thread_info: false,
        }
    }
}

impl LogConfig {
    pub fn development() -> Self {
        LogConfig {
            level: Level::DEBUG,
            with_thread_info: true,
            ..Default::default()
        }
    }

    pub fn production() -> Self {
        LogConfig {
            level: Level::INFO,
            with_location: false,
            ..Default::default()
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("logging subscriber already initialised")]
    AlreadyInitialised,
}

/// Initialises the global `tracing` subscriber. Writes exclusively to
/// stderr — stdout is reserved for the single JSON response object
/// (§4.6/§6). `RUST_LOG` overrides `config.level` when set.
pub fn init_logging(config: LogConfig) -> Result<(), LoggingError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{}={}",
            env!("CARGO_PKG_NAME").replace('-', "_"),
            config.level
        ))
    });

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(config.with_target)
        .with_file(config.with_location)
        .with_line_number(config.with_location)
        .with_thread_ids(config.with_thread_info)
        .with_thread_names(config.with_thread_info)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInitialised)
}

/// Initialises logging with the debug/release default preset, ignoring
/// a double-init (harmless in tests that call it repeatedly).
pub fn init_default_logging() {
    let config = if cfg!(debug_assertions) {
        LogConfig::development()
    } else {
        LogConfig::production()
    };
    let _ = init_logging(config);
}
