#![forbid(unsafe_code)]

//! Logging facade.
//!
//! Every splitdock crate logs through `tracing`. This module re-exports the
//! macros so downstream code can depend on `splitdock-core` alone, and with the
//! `tracing-json` feature it can install a process-wide JSON subscriber.
//!
//! The filter is read from `SPLITDOCK_LOG` using `EnvFilter` syntax, e.g.
//! `SPLITDOCK_LOG=splitdock_layout=debug,warn`.

pub use tracing::{
    debug, debug_span, error, error_span, info, info_span, trace, trace_span, warn, warn_span,
};

/// Environment variable holding the filter directives.
pub const LOG_ENV_VAR: &str = "SPLITDOCK_LOG";

/// Filter used when `SPLITDOCK_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "warn";

/// Error returned when a global subscriber is already installed.
#[derive(Debug)]
pub struct LoggingInitError(String);

impl std::fmt::Display for LoggingInitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to install tracing subscriber: {}", self.0)
    }
}

impl std::error::Error for LoggingInitError {}

/// Install a JSON subscriber filtered by [`LOG_ENV_VAR`].
#[cfg(feature = "tracing-json")]
pub fn init_json_logging() -> Result<(), LoggingInitError> {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_current_span(false)
        .try_init()
        .map_err(|err| LoggingInitError(err.to_string()))
}
