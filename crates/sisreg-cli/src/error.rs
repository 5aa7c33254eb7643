//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Scrape failure
    #[error("{0}")]
    Scrape(#[from] sisreg::ScrapeError),

    /// API server failure
    #[error("Server error: {message}")]
    Server {
        /// Error message
        message: String,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a server error
    #[must_use]
    pub fn server(message: impl Into<String>) -> Self {
        Self::Server {
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let err = CliError::config("bad port");
        assert!(err.to_string().contains("Configuration"));
        assert!(err.to_string().contains("bad port"));
    }

    #[test]
    fn test_server_error() {
        let err = CliError::server("address in use");
        assert!(err.to_string().contains("Server"));
    }

    #[test]
    fn test_scrape_error_is_transparent() {
        let err: CliError = sisreg::ScrapeError::EmptyCode.into();
        assert_eq!(err.to_string(), "search code is empty");
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::AddrInUse, "port taken");
        let cli_err: CliError = io_err.into();
        assert!(cli_err.to_string().contains("I/O"));
    }

    #[test]
    fn test_json_error_from() {
        let json_err = serde_json::from_str::<u8>("x").unwrap_err();
        let cli_err: CliError = json_err.into();
        assert!(cli_err.to_string().contains("JSON"));
    }
}
