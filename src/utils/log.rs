// src/utils/log.rs

//! Logging setup and server-style report helpers.
//!
//! The subscriber is installed for the caller's scope only: `init` returns a
//! guard that the binary holds from start to exit.

use tracing::subscriber::DefaultGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::util::SubscriberInitExt;

/// Log level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "debug" | "trace" => LogLevel::Debug,
            "info" => LogLevel::Info,
            "warn" => LogLevel::Warn,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

/// Resolve the effective level from the config value and `--verbose`.
pub fn effective_level(configured: &str, verbose: bool) -> LogLevel {
    if verbose {
        LogLevel::Debug
    } else {
        LogLevel::from_str(configured)
    }
}

/// Install a levelled fmt subscriber for the current thread.
///
/// `RUST_LOG` overrides the level when set.
pub fn init(level: LogLevel) -> DefaultGuard {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .finish()
        .set_default()
}

/// Log a header
pub fn header(title: &str) {
    let border = "═".repeat(60);
    tracing::info!("{}", border);
    tracing::info!("  {}", title);
    tracing::info!("{}", border);
}

/// Log a summary section
pub fn summary(title: &str, items: &[(&str, String)]) {
    tracing::info!("[SUMMARY] {}", title);
    for (key, value) in items {
        tracing::info!("    {}: {}", key, value);
    }
}
