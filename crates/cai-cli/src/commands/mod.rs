//! Command implementations for cai-cli

pub mod convert;
pub mod inspect;
pub mod merge;

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{CliError, Result};

pub use convert::{ConvertOptions, run_convert};
pub use inspect::{run_flatten, run_get, run_kinds, run_name};
pub use merge::run_merge;

/// Read and parse a JSON input file.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| CliError::user(format!("Cannot read {}: {e}", path.display())))?;
    Ok(serde_json::from_str(&content)?)
}

/// Print `value` to stdout as pretty JSON.
fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
