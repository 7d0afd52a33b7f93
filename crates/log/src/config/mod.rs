//! Logger configuration

mod presets;

use serde::{Deserialize, Serialize};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Multi-line, human oriented
    Pretty,
    /// Single line per event
    #[default]
    Compact,
    /// Newline-delimited JSON
    Json,
}

/// Where formatted events are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Writer {
    /// Standard output
    Stdout,
    /// Standard error
    #[default]
    Stderr,
    /// libtest's captured output, shown only for failing tests
    Test,
}

/// Display options for formatted events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// ANSI colors
    pub colors: bool,
    /// Timestamps
    pub time: bool,
    /// Event target (module path)
    pub target: bool,
    /// Source file and line
    pub source: bool,
    /// Thread names
    pub thread_names: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            colors: true,
            time: true,
            target: true,
            source: false,
            thread_names: false,
        }
    }
}

impl DisplayConfig {
    /// Apply `NO_COLOR` and `STRATA_LOG_SOURCE` overrides
    pub fn parse_env(&mut self) {
        if std::env::var_os("NO_COLOR").is_some() {
            self.colors = false;
        }
        if let Ok(source) = std::env::var("STRATA_LOG_SOURCE") {
            self.source = matches!(source.as_str(), "1" | "true" | "yes");
        }
    }
}

/// Logger configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `EnvFilter` directive string, e.g. `info,strata_memory=debug`
    pub level: String,
    /// Output format
    pub format: Format,
    /// Display options
    pub display: DisplayConfig,
    /// Output destination
    pub writer: Writer,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: Format::default(),
            display: DisplayConfig::default(),
            writer: Writer::default(),
        }
    }
}
