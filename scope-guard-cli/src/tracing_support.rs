//! Tracing and logging support.
//!
//! Logs go to stderr so command output on stdout stays machine-readable.
//! `RUST_LOG` overrides the default `warn` level, e.g.
//! `RUST_LOG=scope_guard=debug` to see every rejection reason.

use std::str::FromStr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Tracing output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TracingFormat {
    /// Human-readable, multi-line.
    Pretty,

    /// One line per event (default).
    #[default]
    Compact,

    /// JSON lines, for log shippers.
    Json,
}

impl FromStr for TracingFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "unknown log format '{}' (expected pretty, compact or json)",
                other
            )),
        }
    }
}

/// Tracing configuration.
#[derive(Debug, Clone, Default)]
pub struct TracingConfig {
    /// Log level filter.
    ///
    /// If None, uses RUST_LOG or defaults to "warn".
    pub level: Option<tracing::Level>,

    pub format: TracingFormat,
}

impl TracingConfig {
    /// Level from a `-v` count: none defers to RUST_LOG, then info, debug, trace
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.level = match verbosity {
            0 => None,
            1 => Some(tracing::Level::INFO),
            2 => Some(tracing::Level::DEBUG),
            _ => Some(tracing::Level::TRACE),
        };
        self
    }

    fn filter(&self) -> EnvFilter {
        match self.level {
            Some(level) => EnvFilter::new(level.to_string()),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        }
    }
}

/// Install the global subscriber.
///
/// Fails if a subscriber is already installed.
pub fn init_subscriber(config: &TracingConfig) -> anyhow::Result<()> {
    let registry = tracing_subscriber::registry().with(config.filter());
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    match config.format {
        TracingFormat::Pretty => registry.with(layer.pretty()).try_init()?,
        TracingFormat::Compact => registry.with(layer.compact()).try_init()?,
        TracingFormat::Json => registry.with(layer.json()).try_init()?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TracingConfig::default();
        assert_eq!(config.format, TracingFormat::Compact);
        assert!(config.level.is_none());
    }

    #[test]
    fn test_verbosity_levels() {
        let level = |v| TracingConfig::default().with_verbosity(v).level;
        assert_eq!(level(0), None);
        assert_eq!(level(1), Some(tracing::Level::INFO));
        assert_eq!(level(2), Some(tracing::Level::DEBUG));
        assert_eq!(level(5), Some(tracing::Level::TRACE));
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("JSON".parse::<TracingFormat>(), Ok(TracingFormat::Json));
        assert_eq!("pretty".parse::<TracingFormat>(), Ok(TracingFormat::Pretty));
        assert!("xml".parse::<TracingFormat>().is_err());
    }
}
