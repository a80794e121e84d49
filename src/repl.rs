//! The read-eval-print loop
//!
//! Reads one line at a time, turns it into lowercase tokens and hands them to
//! the command dispatcher until `exit` or the end of input. The pokedex is
//! saved whenever the loop ends.

use std::io::{self, Write};

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

use crate::commands::{Flow, Session};
use crate::store::StoreError;

/// Prompt printed before every line of input
pub const PROMPT: &str = "Pokedex > ";

/// Errors that end the loop
#[derive(Debug, Error)]
pub enum ReplError {
    /// Standard input could not be read
    #[error("failed to read input: {0}")]
    Input(#[source] io::Error),

    /// The terminal could not be written
    #[error("failed to write output: {0}")]
    Output(#[source] io::Error),

    /// The pokedex could not be saved on the way out
    #[error(transparent)]
    Save(#[from] StoreError),
}

/// Splits a line into lowercase, whitespace-separated tokens
pub fn clean_input(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

/// Runs the prompt until `exit` or end of input, then saves the pokedex
///
/// Command errors are printed and the loop carries on. Lines that are not
/// valid UTF-8 are decoded lossily rather than ending the session. The
/// pokedex is saved however the loop ends; a terminal I/O error is reported
/// ahead of a failed save.
pub async fn run<R, W>(session: &mut Session<W>, mut input: R) -> Result<(), ReplError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let looped = read_eval_loop(session, &mut input).await;
    let saved = session.pokedex().save();
    looped?;
    saved?;
    Ok(())
}

async fn read_eval_loop<R, W>(session: &mut Session<W>, input: &mut R) -> Result<(), ReplError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut buf = Vec::new();

    loop {
        prompt(session.output()).map_err(ReplError::Output)?;

        buf.clear();
        let read = input
            .read_until(b'\n', &mut buf)
            .await
            .map_err(ReplError::Input)?;
        if read == 0 {
            debug!("end of input");
            writeln!(session.output()).map_err(ReplError::Output)?;
            return Ok(());
        }

        let tokens = clean_input(&String::from_utf8_lossy(&buf));
        if tokens.is_empty() {
            continue;
        }

        match session.dispatch(&tokens).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Exit) => return Ok(()),
            Err(err) => {
                debug!(error = %err, "command failed");
                writeln!(session.output(), "Error: {}", err).map_err(ReplError::Output)?;
            }
        }
    }
}

fn prompt<W: Write>(out: &mut W) -> io::Result<()> {
    write!(out, "{}", PROMPT)?;
    out.flush()
}
