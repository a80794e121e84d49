//! Diagnostic logging
//!
//! Log output goes to stderr so it never mixes with the prompt on stdout.

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global subscriber with the given filter
///
/// Fails if a global subscriber is already installed; the caller decides
/// whether that matters.
pub fn init(filter: EnvFilter) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()
}
