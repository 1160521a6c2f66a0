//! Logging setup using tracing
//!
//! Logs always go to stderr; stdout is reserved for the secret output.

use super::error::FetchError;
use std::io;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Parse a log level name
pub fn parse_log_level(level: &str) -> Result<Level, FetchError> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => Err(FetchError::InvalidConfig(format!(
            "invalid log level {:?}, must be one of: trace, debug, info, warn, error",
            other
        ))),
    }
}

/// Install the global subscriber
///
/// `RUST_LOG` directives refine the default level.
pub fn init_logging(level: &str, format: LogFormat) -> Result<(), FetchError> {
    let default_level = parse_log_level(level)?;

    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false);

    let installed = match format {
        LogFormat::Json => builder.json().with_current_span(true).try_init(),
        LogFormat::Pretty => builder.compact().try_init(),
    };

    installed.map_err(|e| FetchError::InvalidConfig(format!("failed to initialize logging: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("info").unwrap(), Level::INFO);
        assert_eq!(parse_log_level("WARN").unwrap(), Level::WARN);
        assert_eq!(parse_log_level("warning").unwrap(), Level::WARN);
        assert_eq!(parse_log_level("trace").unwrap(), Level::TRACE);
    }

    #[test]
    fn test_parse_log_level_rejects_unknown() {
        let error = parse_log_level("loud").unwrap_err();
        assert!(error.to_string().contains("loud"));
    }
}
