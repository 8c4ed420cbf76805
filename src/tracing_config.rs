//! Tracing setup for binaries and tests that embed the pipeline
//!
//! The library only emits events. Installing a subscriber is left to the
//! application, and is available here behind the `tracing-init` feature.

#[cfg(feature = "tracing-init")]
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Output format for the fmt layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracingFormat {
    /// Colored compact output
    Console,
    /// Plain compact output for logs and CI
    Compact,
}

#[derive(Debug)]
pub struct TracingConfig {
    /// 0 = info, 1 = debug, 2+ = trace
    pub verbosity: u8,
    pub format: TracingFormat,
    /// Overrides `verbosity` when set, e.g. `wardrobe_segment=debug,reqwest=warn`
    pub env_filter: Option<String>,
    pub session_id: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            verbosity: 0,
            format: TracingFormat::Console,
            env_filter: None,
            session_id: None,
        }
    }
}

impl TracingConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_env_filter<S: Into<String>>(mut self, filter: S) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    #[must_use]
    pub fn with_session_id<S: Into<String>>(mut self, session_id: S) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    #[must_use]
    pub fn verbosity_to_filter(&self) -> &'static str {
        match self.verbosity {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    /// The filter directive `init` will install
    #[must_use]
    pub fn filter_directive(&self) -> &str {
        self.env_filter
            .as_deref()
            .unwrap_or_else(|| self.verbosity_to_filter())
    }

    /// Install the global subscriber
    ///
    /// # Errors
    /// - Invalid filter directive
    /// - A global subscriber is already installed
    #[cfg(feature = "tracing-init")]
    pub fn init(self) -> anyhow::Result<()> {
        use tracing_subscriber::fmt;

        let filter = EnvFilter::try_new(self.filter_directive())?;
        let registry = Registry::default().with(filter);

        let ansi = self.format == TracingFormat::Console;
        let fmt_layer = fmt::layer()
            .with_ansi(ansi)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .compact();
        registry.with(fmt_layer).try_init()?;

        if let Some(session_id) = &self.session_id {
            tracing::info!(session_id = %session_id, "wardrobe segmentation session started");
        }

        Ok(())
    }
}

/// Install the subscriber described by `config`
///
/// # Errors
/// - Same as [`TracingConfig::init`]
#[cfg(feature = "tracing-init")]
pub fn init_tracing(config: TracingConfig) -> anyhow::Result<()> {
    config.init()
}

/// Span helpers for the remote calls made while segmenting
pub mod spans {
    use tracing::{Level, Span};

    pub fn annotation(dimensions: (u32, u32), payload_bytes: usize) -> Span {
        tracing::span!(
            Level::DEBUG,
            "annotation",
            width = %dimensions.0,
            height = %dimensions.1,
            payload_bytes = %payload_bytes
        )
    }

    pub fn background_removal(label: &str) -> Span {
        tracing::span!(Level::DEBUG, "background_removal", label = %label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_mapping() {
        assert_eq!(TracingConfig::new().with_verbosity(0).verbosity_to_filter(), "info");
        assert_eq!(TracingConfig::new().with_verbosity(1).verbosity_to_filter(), "debug");
        assert_eq!(TracingConfig::new().with_verbosity(2).verbosity_to_filter(), "trace");
        assert_eq!(TracingConfig::new().with_verbosity(9).verbosity_to_filter(), "trace");
    }

    #[test]
    fn test_env_filter_overrides_verbosity() {
        let config = TracingConfig::new()
            .with_verbosity(2)
            .with_env_filter("wardrobe_segment=debug");
        assert_eq!(config.filter_directive(), "wardrobe_segment=debug");
        assert_eq!(TracingConfig::new().filter_directive(), "info");
    }

    #[test]
    fn test_builder() {
        let config = TracingConfig::new()
            .with_format(TracingFormat::Compact)
            .with_session_id("s-1");
        assert_eq!(config.format, TracingFormat::Compact);
        assert_eq!(config.session_id.as_deref(), Some("s-1"));
        assert!(config.env_filter.is_none());
    }
}
