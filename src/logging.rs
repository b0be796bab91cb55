//! Logging setup for the gauge binary.
//!
//! Library code only emits `tracing` events; installing a subscriber is left
//! to the caller. Logs always go to stderr so `--json` output stays clean.

use tracing::Level;

/// Environment variable holding an `EnvFilter` directive (e.g. `gauge=debug`)
pub const LOG_ENV: &str = "GAUGE_LOG";

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Level applied when no filter override is present
    pub level: Level,
    /// Emit one JSON object per event
    pub json_format: bool,
    /// Explicit filter directive, takes precedence over `level`
    pub env_filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            json_format: false,
            env_filter: None,
        }
    }
}

impl LoggingConfig {
    /// Debug-level configuration used by `--verbose`
    pub fn verbose() -> Self {
        Self {
            level: Level::DEBUG,
            ..Self::default()
        }
    }

    pub fn with_json_format(mut self, enabled: bool) -> Self {
        self.json_format = enabled;
        self
    }

    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Builds the environment filter string.
    pub fn env_filter(&self) -> String {
        match self.env_filter {
            Some(ref filter) => filter.clone(),
            None => {
                let level = self.level.as_str().to_lowercase();
                format!("warn,gauge={}", level)
            }
        }
    }
}

/// Install the global subscriber. `GAUGE_LOG` wins over the configuration.
///
/// Fails if a global subscriber is already set.
pub fn init_logging(
    config: &LoggingConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let env_filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(config.env_filter()))?;

    let fmt_layer = if config.json_format {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_quiet() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, Level::WARN);
        assert!(!config.json_format);
        assert_eq!(config.env_filter(), "warn,gauge=warn");
    }

    #[test]
    fn test_verbose_raises_crate_level_only() {
        assert_eq!(LoggingConfig::verbose().env_filter(), "warn,gauge=debug");
    }

    #[test]
    fn test_explicit_filter_wins() {
        let config = LoggingConfig::verbose()
            .with_json_format(true)
            .with_env_filter("gauge=trace");
        assert!(config.json_format);
        assert_eq!(config.env_filter(), "gauge=trace");
    }
}
