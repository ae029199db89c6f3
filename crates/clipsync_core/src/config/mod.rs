//! TOML configuration for alignment runs.
//!
//! ```no_run
//! use clipsync_core::config::ConfigManager;
//! use clipsync_core::Aligner;
//!
//! let mut config = ConfigManager::new("clipsync.toml");
//! config.load_or_create()?;
//! let aligner = Aligner::from_settings(&config.settings().alignment);
//! # Ok::<(), clipsync_core::config::ConfigError>(())
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{AlignmentSettings, ConfigSection, LoggingSettings, Settings};
