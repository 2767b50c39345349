//! Structured file logging for taskgraph.
//!
//! Log levels:
//! - ERROR: A command could not complete (unreadable task file, bad config)
//! - WARN: Recoverable conditions (malformed snapshot skipped, stale snapshot dropped)
//! - INFO: Command lifecycle (startup, watch started, graph rendered)
//! - DEBUG: Reconcile traces (build sizes, deltas, placements)
//! - TRACE: Per-node and per-edge detail
//!
//! Debug mode can be enabled with `--debug` flag or `TASKGRAPH_DEBUG=1` env var.
//! `TASKGRAPH_DEBUG=trace` additionally enables TRACE output.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::OnceLock;

static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();
static LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

/// Log levels for filtering messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            0 => LogLevel::Error,
            1 => LogLevel::Warn,
            2 => LogLevel::Info,
            3 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }
}

/// Level selected by the `--debug` flag and the `TASKGRAPH_DEBUG` value.
fn level_for(debug: bool, env: Option<&str>) -> LogLevel {
    let env = env.map(str::trim).unwrap_or("");
    let env_debug =
        env == "1" || env.eq_ignore_ascii_case("true") || env.eq_ignore_ascii_case("debug");
    if env.eq_ignore_ascii_case("trace") {
        LogLevel::Trace
    } else if debug || env_debug {
        LogLevel::Debug
    } else {
        LogLevel::Info
    }
}

/// Initialize logging to ~/.taskgraph/taskgraph.log.
///
/// Without a home directory logging stays disabled; nothing else changes.
pub fn init_with_debug(debug: bool) {
    let env = std::env::var("TASKGRAPH_DEBUG").ok();
    set_level(level_for(debug, env.as_deref()));

    if let Some(dir) = dirs::home_dir().map(|h| h.join(".taskgraph")) {
        if std::fs::create_dir_all(&dir).is_ok() {
            init_at(&dir.join("taskgraph.log"));
        }
    }
}

/// Point the logger at an explicit file, truncating it.
///
/// Only the first call takes effect for the lifetime of the process.
pub fn init_at(path: &Path) {
    let _ = std::fs::write(path, "");
    LOG_PATH.set(path.to_path_buf()).ok();
}

/// Check if debug output is enabled.
pub fn is_debug() -> bool {
    get_level() >= LogLevel::Debug
}

/// Set the minimum log level for output.
pub fn set_level(level: LogLevel) {
    LOG_LEVEL.store(level as u8, Ordering::SeqCst);
}

/// Get the current log level.
pub fn get_level() -> LogLevel {
    LogLevel::from_u8(LOG_LEVEL.load(Ordering::Relaxed))
}

/// Log a message at the specified level.
pub fn log_at(level: LogLevel, msg: &str) {
    if level > get_level() {
        return;
    }

    if let Some(path) = LOG_PATH.get() {
        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
            let timestamp = chrono::Local::now().format("%H:%M:%S%.3f");
            let _ = writeln!(file, "[{}] [{}] {}", timestamp, level.as_str(), msg);
        }
    }
}

pub fn error(msg: &str) {
    log_at(LogLevel::Error, msg);
}

pub fn warn(msg: &str) {
    log_at(LogLevel::Warn, msg);
}

pub fn info(msg: &str) {
    log_at(LogLevel::Info, msg);
}

pub fn debug(msg: &str) {
    log_at(LogLevel::Debug, msg);
}

pub fn trace(msg: &str) {
    log_at(LogLevel::Trace, msg);
}

/// Log at INFO level.
#[macro_export]
macro_rules! tglog {
    ($($arg:tt)*) => {
        $crate::log::info(&format!($($arg)*))
    };
}

/// Log at ERROR level.
#[macro_export]
macro_rules! tglog_error {
    ($($arg:tt)*) => {
        $crate::log::error(&format!($($arg)*))
    };
}

/// Log at WARN level.
#[macro_export]
macro_rules! tglog_warn {
    ($($arg:tt)*) => {
        $crate::log::warn(&format!($($arg)*))
    };
}

/// Log at DEBUG level (only written in debug mode).
#[macro_export]
macro_rules! tglog_debug {
    ($($arg:tt)*) => {
        $crate::log::debug(&format!($($arg)*))
    };
}

/// Log at TRACE level.
#[macro_export]
macro_rules! tglog_trace {
    ($($arg:tt)*) => {
        $crate::log::trace(&format!($($arg)*))
    };
}
