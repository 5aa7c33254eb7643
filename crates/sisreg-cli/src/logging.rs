//! Logging setup using `tracing` and `tracing-subscriber`.
//!
//! Events go to stderr so JSON printed by `consulta` and `lote` stays clean
//! on stdout. `RUST_LOG` overrides the level derived from `-q`/`-v`.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, Verbosity};
use crate::error::{CliError, CliResult};

/// Logging behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogConfig {
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Output format
    pub format: LogFormat,
    /// Use ANSI colors
    pub with_ansi: bool,
}

impl LogConfig {
    /// Create a configuration from verbosity and format
    #[must_use]
    pub fn new(verbosity: Verbosity, format: LogFormat) -> Self {
        Self {
            verbosity,
            format,
            with_ansi: std::io::IsTerminal::is_terminal(&std::io::stderr()),
        }
    }

    /// Filter directives used when `RUST_LOG` is unset: our crates at the
    /// chosen level, everything else at warn
    #[must_use]
    pub fn default_directives(&self) -> String {
        let level = self.verbosity.filter_level();
        if self.verbosity.is_quiet() {
            return level.to_string();
        }
        format!("warn,sisreg={level},sisreg_cli={level},tower_http={level}")
    }
}

/// Install the global subscriber
pub fn init_logging(config: &LogConfig) -> CliResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.default_directives()))
        .map_err(|e| CliError::config(format!("invalid log filter: {e}")))?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr)
                    .with_ansi(config.with_ansi)
                    .with_target(false),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(config.with_ansi)
                    .with_target(false),
            )
            .try_init(),
    };
    result.map_err(|e| CliError::config(format!("logging already initialized: {e}")))
}
