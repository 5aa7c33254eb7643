//! Sisreg CLI: wait-list lookups from the shell or over HTTP
//!
//! ## Usage
//!
//! ```bash
//! sisreg serve --port 8000          # Run the API (API_TOKEN enables auth)
//! sisreg consulta 123456            # One code, JSON to stdout
//! sisreg lote 123456 654321         # Several codes, in order
//! sisreg -v --log-format json lote 1 2
//! ```

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use serde::Serialize;
use sisreg::WaitListLookup;
use sisreg_cli::api_server::LoteResponse;
use sisreg_cli::{init_logging, Cli, CliResult, Commands, LogConfig, ScraperArgs};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(&LogConfig::new(cli.verbosity(), cli.log_format))?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(dispatch(cli))
}

async fn dispatch(cli: Cli) -> CliResult<()> {
    let lookup = build_lookup(&cli.scraper)?;
    match cli.command {
        Commands::Serve(args) => sisreg_cli::serve(lookup, &args.to_config()).await,
        Commands::Consulta(args) => {
            let record = lookup.scrape_by_code(&args.codigo).await?;
            print_json(&record)
        }
        Commands::Lote(args) => {
            let resultados = lookup.scrape_batch(&args.codigos).await;
            print_json(&LoteResponse { resultados })
        }
    }
}

#[cfg(feature = "browser")]
fn build_lookup(args: &ScraperArgs) -> CliResult<Arc<dyn WaitListLookup>> {
    Ok(Arc::new(sisreg::Scraper::chromium(args.to_config())))
}

#[cfg(not(feature = "browser"))]
fn build_lookup(_args: &ScraperArgs) -> CliResult<Arc<dyn WaitListLookup>> {
    Err(sisreg_cli::CliError::config(
        "browser support not enabled. Rebuild with --features browser",
    ))
}

fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
