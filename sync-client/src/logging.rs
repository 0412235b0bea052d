//! Log output setup.
//!
//! The library only emits `tracing` events; installing a subscriber is left to
//! the host. [`init`] is a convenience for hosts without one.

use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Logging setup errors.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// The configured filter is not a valid `EnvFilter` directive.
    #[error("invalid log filter {filter:?}: {source}")]
    InvalidFilter {
        /// Directive as configured.
        filter: String,
        /// Underlying parse error.
        source: ParseError,
    },
}

/// Install a formatted stderr subscriber filtered by `config.filter`.
///
/// Returns `Ok(false)` if a global subscriber was already installed, in which
/// case nothing changes.
///
/// # Errors
///
/// [`LoggingError::InvalidFilter`] if the filter does not parse. Nothing is
/// installed in that case.
pub fn init(config: &LoggingConfig) -> Result<bool, LoggingError> {
    let filter =
        EnvFilter::try_new(&config.filter).map_err(|e| LoggingError::InvalidFilter {
            filter: config.filter.clone(),
            source: e,
        })?;

    Ok(tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok())
}
