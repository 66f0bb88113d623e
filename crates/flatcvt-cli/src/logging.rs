//! Subscriber setup for the command line.

use std::env;
use std::io;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug)]
pub struct LoggingError(String);

impl std::fmt::Display for LoggingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[LOGGING_INIT_FAILED] {}", self.0)
    }
}

impl std::error::Error for LoggingError {}

fn filter_for(level: &str) -> Result<EnvFilter, LoggingError> {
    if level.eq_ignore_ascii_case("off") {
        return Ok(EnvFilter::default().add_directive(LevelFilter::OFF.into()));
    }
    EnvFilter::try_new(level).map_err(|err| LoggingError(format!("Invalid log filter: {err}")))
}

/// Install a stderr subscriber.
///
/// The filter comes from `level`, else `FLATCVT_TRACE`, else `off`.
/// `FLATCVT_LOG_FORMAT` selects `pretty` (default) or `json` output.
pub fn init(level: Option<String>) -> Result<(), LoggingError> {
    let level = level
        .or_else(|| env::var("FLATCVT_TRACE").ok())
        .unwrap_or_else(|| "off".to_string());
    let filter = filter_for(&level)?;

    let format = env::var("FLATCVT_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
    let registry = tracing_subscriber::registry().with(filter);
    let result = if format.eq_ignore_ascii_case("json") {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr).json())
            .try_init()
    } else if format.eq_ignore_ascii_case("pretty") {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr).pretty())
            .try_init()
    } else {
        return Err(LoggingError(format!(
            "Invalid FLATCVT_LOG_FORMAT '{format}' (expected 'json' or 'pretty')"
        )));
    };
    result.map_err(|err| LoggingError(err.to_string()))
}
