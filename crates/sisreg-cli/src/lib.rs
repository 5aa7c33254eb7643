//! Sisreg CLI Library
//!
//! Command line and HTTP API on top of the `sisreg` scraper.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // Error types are self-documenting

pub mod api_server;
mod commands;
mod config;
mod error;
pub mod logging;

pub use api_server::{build_router, extract_token, serve, ApiError};
pub use commands::{Cli, Commands, ConsultaArgs, LoteArgs, ScraperArgs, ServeArgs};
pub use config::{ApiConfig, LogFormat, Verbosity};
pub use error::{CliError, CliResult};
pub use logging::{init_logging, LogConfig};
