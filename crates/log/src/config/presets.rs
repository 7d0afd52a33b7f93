//! Configuration presets for common scenarios

use super::{Config, DisplayConfig, Format, Writer};

impl Config {
    /// Create configuration from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // Parse STRATA_LOG or RUST_LOG
        if let Ok(level) = std::env::var("STRATA_LOG") {
            config.level = level;
        } else if let Ok(level) = std::env::var("RUST_LOG") {
            config.level = level;
        }

        // Parse format
        if let Ok(format) = std::env::var("STRATA_LOG_FORMAT") {
            config.format = parse_format(&format);
        }

        config.display.parse_env();
        config
    }

    /// Development configuration (pretty, debug level)
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            format: Format::Pretty,
            display: DisplayConfig {
                colors: true,
                source: true,
                ..DisplayConfig::default()
            },
            ..Self::default()
        }
    }

    /// Production configuration (JSON, info level)
    #[must_use]
    pub fn production() -> Self {
        Self {
            level: "info".to_string(),
            format: Format::Json,
            display: DisplayConfig {
                colors: false,
                source: false,
                ..DisplayConfig::default()
            },
            ..Self::default()
        }
    }

    /// Test configuration (captured by the test harness)
    ///
    /// Honors `STRATA_LOG` so a failing test can be rerun with more detail.
    #[must_use]
    pub fn test() -> Self {
        Self {
            level: std::env::var("STRATA_LOG").unwrap_or_else(|_| "debug".to_string()),
            format: Format::Compact,
            display: DisplayConfig {
                colors: false,
                time: false,
                ..DisplayConfig::default()
            },
            writer: Writer::Test,
        }
    }
}

fn parse_format(value: &str) -> Format {
    match value.to_lowercase().as_str() {
        "pretty" => Format::Pretty,
        "json" => Format::Json,
        _ => Format::Compact,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("pretty", Format::Pretty)]
    #[case("JSON", Format::Json)]
    #[case("compact", Format::Compact)]
    #[case("logfmt", Format::Compact)]
    fn test_parse_format(#[case] input: &str, #[case] expected: Format) {
        assert_eq!(parse_format(input), expected);
    }

    #[test]
    fn test_presets() {
        let dev = Config::development();
        assert_eq!(dev.format, Format::Pretty);
        assert!(dev.display.source);

        let prod = Config::production();
        assert_eq!(prod.format, Format::Json);
        assert!(!prod.display.colors);

        let test = Config::test();
        assert_eq!(test.writer, Writer::Test);
        assert!(!test.display.time);
    }
}
