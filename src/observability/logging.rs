//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Pick the output format and level from configuration
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Compact format by default, pretty format for development
//! - `RUST_LOG` overrides the configured level
//! - Written to stderr so command output stays clean on stdout
//! - Level and format sit behind reload layers: the subscriber is installed
//!   from defaults before the route file is read, then re-applied from it

use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, reload, EnvFilter, Layer, Registry};

use crate::config::schema::{LogFormat, ObservabilityConfig};

type FormatLayer = Box<dyn Layer<Registry> + Send + Sync>;
type FormatSubscriber = Layered<reload::Layer<FormatLayer, Registry>, Registry>;

/// Handle to the installed subscriber.
pub struct LogHandle {
    format: reload::Handle<FormatLayer, Registry>,
    filter: reload::Handle<EnvFilter, FormatSubscriber>,
}

impl LogHandle {
    /// Switch level and format to `config`.
    pub fn apply(&self, config: &ObservabilityConfig) -> Result<(), reload::Error> {
        self.format.reload(format_layer(config.log_format))?;
        self.filter.reload(filter(config))
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init(config: &ObservabilityConfig) -> Result<LogHandle, TryInitError> {
    let (format, format_handle) = reload::Layer::new(format_layer(config.log_format));
    let (filter, filter_handle) = reload::Layer::new(filter(config));
    tracing_subscriber::registry()
        .with(format)
        .with(filter)
        .try_init()?;

    Ok(LogHandle {
        format: format_handle,
        filter: filter_handle,
    })
}

fn format_layer(format: LogFormat) -> FormatLayer {
    match format {
        LogFormat::Compact => fmt::layer().compact().with_writer(std::io::stderr).boxed(),
        LogFormat::Pretty => fmt::layer().pretty().with_writer(std::io::stderr).boxed(),
    }
}

fn filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("spa_router={}", config.log_level)))
}
