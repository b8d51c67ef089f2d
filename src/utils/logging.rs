//! Diagnostic logging to a file.
//!
//! The terminal belongs to the UI while a session runs, so nothing is ever
//! logged to stdout or stderr. Without a log file no subscriber is installed
//! and every `tracing` macro is a no-op.

use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::core::constants::LOG_FILTER_ENV_VAR;

const DEFAULT_FILTER: &str = "sidenote=info";

/// The filter from `SIDENOTE_LOG`, or the default when it is unset or
/// does not parse.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_FILTER_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Append log records to `path`, creating it if needed.
pub fn init_file_logging(path: &Path) -> io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    // A subscriber may already be installed (tests); keep the existing one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init();
    Ok(())
}
