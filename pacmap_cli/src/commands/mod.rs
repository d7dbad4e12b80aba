//! CLI subcommand implementations.

pub mod clean;
pub mod fetch_codes;
pub mod map;
pub mod pacs;
pub mod parse_name;

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

/// The `--db` argument, falling back to `PACMAP_DB`.
pub fn db_path(arg: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = arg {
        return Ok(path.to_path_buf());
    }
    match std::env::var("PACMAP_DB") {
        Ok(path) if !path.trim().is_empty() => Ok(PathBuf::from(path.trim())),
        _ => bail!("No database given: pass --db or set PACMAP_DB"),
    }
}
