//! Command-line interface parsing for the Pokedex
//!
//! This module handles parsing of startup flags using clap. Each flag can also
//! be set through an environment variable, and the parsed values are checked
//! and turned into [`Settings`].

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

use crate::data::DEFAULT_BASE_URL;
use crate::store::default_pokedex_path;

/// Default lifetime of a cached API response in seconds
pub const DEFAULT_CACHE_TTL_SECS: u64 = 15;

/// Longest accepted cache lifetime in seconds (one year)
pub const MAX_CACHE_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// A zero TTL would make the cache sweep spin
    #[error("Invalid cache TTL: must be at least 1 second")]
    ZeroCacheTtl,

    /// Longer than the sweep timer can schedule
    #[error("Invalid cache TTL: must be at most {max} seconds, got {got}")]
    CacheTtlTooLarge { got: u64, max: u64 },

    /// The log filter directive could not be parsed
    #[error("Invalid log filter '{filter}': {source}")]
    InvalidLogFilter {
        filter: String,
        #[source]
        source: ParseError,
    },
}

/// Pokedex - browse PokeAPI location areas and catch Pokemon from your terminal
#[derive(Parser, Debug)]
#[command(name = "pokedex")]
#[command(about = "An interactive Pokedex backed by PokeAPI")]
#[command(version)]
pub struct Cli {
    /// Seconds an API response stays cached
    #[arg(
        long,
        value_name = "SECONDS",
        env = "POKEDEX_CACHE_TTL",
        default_value_t = DEFAULT_CACHE_TTL_SECS
    )]
    pub cache_ttl: u64,

    /// File the caught Pokemon are saved to
    ///
    /// Defaults to pokedex.json in the user data directory.
    #[arg(long, value_name = "PATH", env = "POKEDEX_FILE")]
    pub pokedex_file: Option<PathBuf>,

    /// Base URL of the PokeAPI server
    #[arg(long, value_name = "URL", env = "POKEDEX_API_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Log filter for diagnostics on stderr (e.g. "debug", "pokedex=trace")
    #[arg(long, value_name = "FILTER", env = "POKEDEX_LOG", default_value = "warn")]
    pub log_level: String,
}

/// Validated configuration derived from CLI arguments for application startup
#[derive(Debug)]
pub struct Settings {
    /// Lifetime of cached responses, also the cache sweep period
    pub cache_ttl: Duration,
    /// Where the pokedex is loaded from and saved to
    pub pokedex_file: PathBuf,
    /// PokeAPI base URL
    pub base_url: String,
    /// Filter for the log subscriber
    pub log_filter: EnvFilter,
}

impl Settings {
    /// Creates Settings from parsed CLI arguments.
    ///
    /// # Arguments
    /// * `cli` - The parsed CLI struct
    ///
    /// # Returns
    /// * `Ok(Settings)` with defaults filled in
    /// * `Err(CliError)` if the TTL is out of range or the log filter is malformed
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        if cli.cache_ttl == 0 {
            return Err(CliError::ZeroCacheTtl);
        }
        if cli.cache_ttl > MAX_CACHE_TTL_SECS {
            return Err(CliError::CacheTtlTooLarge {
                got: cli.cache_ttl,
                max: MAX_CACHE_TTL_SECS,
            });
        }

        let log_filter =
            EnvFilter::try_new(&cli.log_level).map_err(|source| CliError::InvalidLogFilter {
                filter: cli.log_level.clone(),
                source,
            })?;

        Ok(Settings {
            cache_ttl: Duration::from_secs(cli.cache_ttl),
            pokedex_file: cli
                .pokedex_file
                .clone()
                .unwrap_or_else(default_pokedex_path),
            base_url: cli.base_url.clone(),
            log_filter,
        })
    }
}
