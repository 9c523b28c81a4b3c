//! Stdin/stdout framing shared by both hook subcommands.

use serde::Serialize;
use std::io::{self, Read, Write};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HookError {
    #[error("Failed to read stdin: {0}")]
    Stdin(#[source] io::Error),

    #[error("Failed to serialize hook output: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write stdout: {0}")]
    Stdout(#[source] io::Error),
}

pub fn read_stdin() -> Result<String, HookError> {
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .map_err(HookError::Stdin)?;
    Ok(input)
}

/// Writes `output` as a single JSON line on stdout.
pub fn emit<T: Serialize>(output: &T) -> Result<(), HookError> {
    let line = serde_json::to_string(output)?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", line).map_err(HookError::Stdout)?;
    stdout.flush().map_err(HookError::Stdout)
}
