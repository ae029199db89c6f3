//! Logging setup.
//!
//! The library itself only emits `tracing` events; nothing is printed unless
//! the host installs a subscriber. [`init_tracing`] is the stock one, writing
//! to stderr and honouring `RUST_LOG`.
//!
//! ```no_run
//! use clipsync_core::logging::{init_tracing, LogLevel};
//!
//! init_tracing(LogLevel::Debug);
//! ```

mod types;

pub use types::LogLevel;

use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter};

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `default_level`. Call once at startup;
/// a second call panics inside `tracing-subscriber`, use
/// [`try_init_tracing`] when that cannot be guaranteed.
pub fn init_tracing(default_level: LogLevel) {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(env_filter(default_level))
        .init();
}

/// Like [`init_tracing`], but returns false if a subscriber is already set.
pub fn try_init_tracing(default_level: LogLevel) -> bool {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(env_filter(default_level))
        .try_init()
        .is_ok()
}

/// Initialize tracing for tests (only logs warnings and above).
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

/// `RUST_LOG` if set, otherwise everything at `default_level` and above.
fn env_filter(default_level: LogLevel) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(default_level.to_tracing_level()).into())
        .from_env_lossy()
}
