//! Pokedex - browse PokeAPI from the terminal
//!
//! An interactive prompt for exploring location areas, catching Pokemon and
//! inspecting the ones already caught. Caught Pokemon are saved between runs.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use pokedex::cache::ResponseCache;
use pokedex::cli::{Cli, Settings};
use pokedex::commands::Session;
use pokedex::data::PokeApiClient;
use pokedex::logging;
use pokedex::store::Pokedex;
use pokedex::repl;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let settings = match Settings::from_cli(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "pokedex stopped");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    if let Err(err) = logging::init(settings.log_filter) {
        eprintln!("Warning: diagnostics disabled: {}", err);
    }

    let cache = Arc::new(ResponseCache::new(settings.cache_ttl));
    info!(ttl = ?cache.ttl(), "response cache started");
    let client = PokeApiClient::with_base_url(cache, settings.base_url);

    let mut pokedex = Pokedex::new(settings.pokedex_file);
    pokedex.load()?;
    info!(caught = pokedex.len(), "pokedex ready");

    let mut session = Session::new(client, pokedex, std::io::stdout());
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    repl::run(&mut session, stdin).await?;

    Ok(())
}
