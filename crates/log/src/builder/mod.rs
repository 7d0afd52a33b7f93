//! Logger builder implementation

use tracing::Subscriber;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, Format, Writer};
use crate::error::{LogError, LogResult};

/// Logger builder
#[derive(Debug)]
pub struct LoggerBuilder {
    config: Config,
}

/// Guard returned by a successful [`LoggerBuilder::build`]
///
/// The subscriber is global; the guard records what was installed.
#[derive(Debug)]
pub struct LoggerGuard {
    level: String,
    format: Format,
}

impl LoggerGuard {
    /// Filter directives in effect
    #[must_use]
    pub fn level(&self) -> &str {
        &self.level
    }

    /// Output format in effect
    #[must_use]
    pub fn format(&self) -> Format {
        self.format
    }
}

impl LoggerBuilder {
    /// Create builder from config
    #[must_use]
    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    /// Override the filter directives
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.config.level = level.into();
        self
    }

    /// Override the output format
    #[must_use]
    pub fn with_format(mut self, format: Format) -> Self {
        self.config.format = format;
        self
    }

    /// Build and install the global subscriber
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Filter string cannot be parsed
    /// - A global subscriber is already installed
    pub fn build(self) -> LogResult<LoggerGuard> {
        let filter = EnvFilter::try_new(&self.config.level)
            .map_err(|e| LogError::Filter(format!("{}: {}", &self.config.level, e)))?;

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer(&self.config))
            .try_init()
            .map_err(|e| LogError::AlreadyInitialized(e.to_string()))?;

        Ok(LoggerGuard {
            level: self.config.level,
            format: self.config.format,
        })
    }
}

fn make_writer(writer: Writer) -> BoxMakeWriter {
    match writer {
        Writer::Stdout => BoxMakeWriter::new(std::io::stdout),
        Writer::Stderr => BoxMakeWriter::new(std::io::stderr),
        Writer::Test => BoxMakeWriter::new(tracing_subscriber::fmt::TestWriter::new()),
    }
}

fn fmt_layer<S>(config: &Config) -> Box<dyn Layer<S> + Send + Sync + 'static>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let display = &config.display;
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(make_writer(config.writer))
        .with_ansi(display.colors)
        .with_target(display.target)
        .with_file(display.source)
        .with_line_number(display.source)
        .with_thread_names(display.thread_names);

    match (config.format, display.time) {
        (Format::Pretty, true) => layer.pretty().boxed(),
        (Format::Pretty, false) => layer.pretty().without_time().boxed(),
        (Format::Compact, true) => layer.compact().boxed(),
        (Format::Compact, false) => layer.compact().without_time().boxed(),
        (Format::Json, true) => layer.json().boxed(),
        (Format::Json, false) => layer.json().without_time().boxed(),
    }
}
