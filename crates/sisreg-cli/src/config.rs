//! CLI configuration

use std::net::{IpAddr, SocketAddr};

use clap::ValueEnum;

use crate::error::{CliError, CliResult};

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Quiet - errors only
    Quiet,
    /// Normal - default output
    #[default]
    Normal,
    /// Verbose - per-attempt diagnostics
    Verbose,
    /// Debug - everything
    Debug,
}

impl Verbosity {
    /// Map `-q` and the `-v` count to a level
    #[must_use]
    pub const fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Debug,
        }
    }

    /// Check if quiet mode
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Check if verbose or higher
    #[must_use]
    pub const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose | Self::Debug)
    }

    /// Default `tracing` filter directive for this level
    #[must_use]
    pub const fn filter_level(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "info",
            Self::Verbose => "debug",
            Self::Debug => "trace",
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable multi-line output
    #[default]
    Pretty,
    /// Single-line output
    Compact,
    /// One JSON object per event
    Json,
}

/// API server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Shared secret; `None` disables authentication
    pub token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            token: None,
        }
    }
}

impl ApiConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set bind host
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set bind port
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the shared secret; blank values disable authentication
    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        self
    }

    /// Whether requests must carry the token
    #[must_use]
    pub const fn auth_enabled(&self) -> bool {
        self.token.is_some()
    }

    /// Socket address to bind
    pub fn socket_addr(&self) -> CliResult<SocketAddr> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|_| CliError::config(format!("invalid host address: {}", self.host)))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod verbosity_tests {
        use super::*;

        #[test]
        fn test_from_flags() {
            assert_eq!(Verbosity::from_flags(false, 0), Verbosity::Normal);
            assert_eq!(Verbosity::from_flags(false, 1), Verbosity::Verbose);
            assert_eq!(Verbosity::from_flags(false, 5), Verbosity::Debug);
            assert_eq!(Verbosity::from_flags(true, 2), Verbosity::Quiet);
        }

        #[test]
        fn test_filter_levels() {
            assert_eq!(Verbosity::Quiet.filter_level(), "error");
            assert_eq!(Verbosity::Normal.filter_level(), "info");
            assert!(Verbosity::Debug.is_verbose());
            assert!(Verbosity::Quiet.is_quiet());
        }
    }

    mod api_config_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let config = ApiConfig::default();
            assert_eq!(config.port, 8000);
            assert!(!config.auth_enabled());
            assert_eq!(
                config.socket_addr().unwrap(),
                "0.0.0.0:8000".parse().unwrap()
            );
        }

        #[test]
        fn test_blank_token_disables_auth() {
            let config = ApiConfig::new().with_token(Some("   ".to_string()));
            assert!(!config.auth_enabled());
            let config = ApiConfig::new().with_token(Some(" s3cret ".to_string()));
            assert_eq!(config.token.as_deref(), Some("s3cret"));
        }

        #[test]
        fn test_invalid_host() {
            let err = ApiConfig::new().with_host("not a host").socket_addr().unwrap_err();
            assert!(err.to_string().contains("invalid host address"));
        }

        #[test]
        fn test_ipv6_host() {
            let addr = ApiConfig::new().with_host("::1").with_port(9).socket_addr().unwrap();
            assert_eq!(addr.port(), 9);
            assert!(addr.is_ipv6());
        }
    }
}
