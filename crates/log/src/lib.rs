//! # Strata Log
//!
//! Logging setup shared by the strata crates.
//!
//! Library crates log through the re-exported `tracing` macros; binaries and
//! tests install a subscriber once with [`init`], [`init_with`] or
//! [`init_test`].
//!
//! ```no_run
//! use strata_log::{Config, info};
//!
//! fn main() -> strata_log::LogResult<()> {
//!     let _guard = strata_log::init_with(Config::development())?;
//!     info!(arena = "frame", committed = 4096, "arena grown");
//!     Ok(())
//! }
//! ```
//!
//! ## Environment
//!
//! - `STRATA_LOG` (or `RUST_LOG`): filter directives
//! - `STRATA_LOG_FORMAT`: `pretty`, `compact` or `json`
//! - `STRATA_LOG_SOURCE`: include file and line
//! - `NO_COLOR`: disable ANSI colors

#![warn(missing_docs)]

mod builder;
mod config;
mod error;
mod macros;

use std::sync::Once;

pub use builder::{LoggerBuilder, LoggerGuard};
pub use config::{Config, DisplayConfig, Format, Writer};
pub use error::{LogError, LogResult};

// Re-export tracing so dependents need no direct dependency
pub use tracing;
pub use tracing::{
    Level, debug, debug_span, error, error_span, info, info_span, instrument, span, trace,
    trace_span, warn, warn_span,
};

/// Install the global subscriber from the environment
pub fn init() -> LogResult<LoggerGuard> {
    init_with(Config::from_env())
}

/// Install the global subscriber from an explicit configuration
pub fn init_with(config: Config) -> LogResult<LoggerGuard> {
    LoggerBuilder::from_config(config).build()
}

/// Install the test subscriber; safe to call from every test
pub fn init_test() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        // Another harness may own the global subscriber already
        let _ = init_with(Config::test());
    });
}
