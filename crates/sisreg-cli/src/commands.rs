//! CLI command definitions using clap

use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use sisreg::{
    BrowserConfig, ScraperConfig, Timeouts, UnlockPolicy, DEFAULT_ACTION_TIMEOUT_MS,
    DEFAULT_POLITENESS_DELAY_MS, DEFAULT_RESULTS_TIMEOUT_MS, DEFAULT_TARGET_URL,
};

use crate::config::{ApiConfig, LogFormat, Verbosity};

/// Sisreg: wait-list lookups for SISREG-DF request codes
#[derive(Parser, Debug)]
#[command(name = "sisreg")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log output format
    #[arg(long, value_enum, default_value = "pretty", global = true)]
    pub log_format: LogFormat,

    /// Scraper options
    #[command(flatten)]
    pub scraper: ScraperArgs,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API
    Serve(ServeArgs),

    /// Look up one request code and print the record as JSON
    Consulta(ConsultaArgs),

    /// Look up several request codes in order and print the results as JSON
    Lote(LoteArgs),
}

/// Options shared by every command that scrapes
#[derive(Args, Debug, Clone)]
pub struct ScraperArgs {
    /// Wait-list page URL
    #[arg(long, env = "SISREG_URL", default_value = DEFAULT_TARGET_URL, global = true)]
    pub url: String,

    /// Path to the chromium binary (auto-detected when omitted)
    #[arg(long, env = "CHROMIUM_PATH", global = true)]
    pub chromium_path: Option<String>,

    /// Show the browser window
    #[arg(long, global = true)]
    pub headful: bool,

    /// Navigation and action timeout in milliseconds
    #[arg(long, default_value_t = DEFAULT_ACTION_TIMEOUT_MS, global = true)]
    pub action_timeout_ms: u64,

    /// Result table timeout in milliseconds
    #[arg(long, default_value_t = DEFAULT_RESULTS_TIMEOUT_MS, global = true)]
    pub results_timeout_ms: u64,

    /// Field unlock rounds before the last-resort assignment
    #[arg(long, default_value_t = 16, global = true)]
    pub rounds: u32,

    /// Pause between batch items in milliseconds
    #[arg(long, default_value_t = DEFAULT_POLITENESS_DELAY_MS, global = true)]
    pub politeness_ms: u64,
}

/// Arguments for the serve command
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// HTTP port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    /// Shared secret required from clients (unset disables authentication)
    #[arg(long, env = "API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

/// Arguments for the consulta command
#[derive(Args, Debug)]
pub struct ConsultaArgs {
    /// Request code
    pub codigo: String,
}

/// Arguments for the lote command
#[derive(Args, Debug)]
pub struct LoteArgs {
    /// Request codes, processed in order
    #[arg(required = true, num_args = 1..)]
    pub codigos: Vec<String>,
}

impl Cli {
    /// Verbosity from `-q` and `-v`
    #[must_use]
    pub const fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}

impl ScraperArgs {
    /// Build the scraper configuration
    #[must_use]
    pub fn to_config(&self) -> ScraperConfig {
        let mut browser = BrowserConfig::default().with_headless(!self.headful);
        if let Some(ref path) = self.chromium_path {
            browser = browser.with_chromium_path(path);
        }
        let timeouts = Timeouts::default()
            .with_action(Duration::from_millis(self.action_timeout_ms))
            .with_results(Duration::from_millis(self.results_timeout_ms));
        ScraperConfig::new()
            .with_target_url(self.url.clone())
            .with_browser(browser)
            .with_timeouts(timeouts)
            .with_unlock(UnlockPolicy::default().with_rounds(self.rounds))
            .with_politeness_delay(Duration::from_millis(self.politeness_ms))
    }
}

impl ServeArgs {
    /// Build the API configuration
    #[must_use]
    pub fn to_config(&self) -> ApiConfig {
        ApiConfig::new()
            .with_host(self.host.clone())
            .with_port(self.port)
            .with_token(self.token.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    mod cli_tests {
        use super::*;

        #[test]
        fn test_parse_consulta() {
            let cli = Cli::parse_from(["sisreg", "consulta", "123456"]);
            if let Commands::Consulta(args) = cli.command {
                assert_eq!(args.codigo, "123456");
            } else {
                panic!("expected Consulta command");
            }
        }

        #[test]
        fn test_parse_lote() {
            let cli = Cli::parse_from(["sisreg", "lote", "1", "2", "3"]);
            if let Commands::Lote(args) = cli.command {
                assert_eq!(args.codigos, vec!["1", "2", "3"]);
            } else {
                panic!("expected Lote command");
            }
        }

        #[test]
        fn test_lote_requires_codes() {
            assert!(Cli::try_parse_from(["sisreg", "lote"]).is_err());
        }

        #[test]
        fn test_parse_serve() {
            let cli = Cli::parse_from([
                "sisreg", "serve", "--host", "127.0.0.1", "--port", "9000", "--token", "abc",
            ]);
            if let Commands::Serve(args) = cli.command {
                let config = args.to_config();
                assert_eq!(config.host, "127.0.0.1");
                assert_eq!(config.port, 9000);
                assert_eq!(config.token.as_deref(), Some("abc"));
            } else {
                panic!("expected Serve command");
            }
        }

        #[test]
        fn test_global_flags_after_subcommand() {
            let cli = Cli::parse_from(["sisreg", "consulta", "1", "-vv", "--log-format", "json"]);
            assert_eq!(cli.verbosity(), Verbosity::Debug);
            assert_eq!(cli.log_format, LogFormat::Json);
        }

        #[test]
        fn test_quiet_wins() {
            let cli = Cli::parse_from(["sisreg", "-q", "-v", "consulta", "1"]);
            assert_eq!(cli.verbosity(), Verbosity::Quiet);
        }
    }

    mod scraper_args_tests {
        use super::*;

        #[test]
        fn test_to_config() {
            let cli = Cli::parse_from([
                "sisreg",
                "consulta",
                "1",
                "--url",
                "http://127.0.0.1:9/lista-de-espera",
                "--headful",
                "--chromium-path",
                "/opt/chromium",
                "--results-timeout-ms",
                "1000",
                "--rounds",
                "4",
                "--politeness-ms",
                "0",
            ]);
            let config = cli.scraper.to_config();
            assert_eq!(config.target_url, "http://127.0.0.1:9/lista-de-espera");
            assert!(!config.browser.headless);
            assert_eq!(config.browser.chromium_path.as_deref(), Some("/opt/chromium"));
            assert_eq!(config.timeouts.results, Duration::from_secs(1));
            assert_eq!(config.unlock.rounds, 4);
            assert_eq!(config.politeness_delay, Duration::ZERO);
        }

        #[test]
        fn test_rounds_default() {
            let cli = Cli::parse_from(["sisreg", "consulta", "1"]);
            let config = cli.scraper.to_config();
            assert_eq!(config.unlock.rounds, 16);
            assert!(config.browser.headless);
        }
    }
}
