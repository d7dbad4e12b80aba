//! The `parse-name` subcommand.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use pacmap_lib::names::{load_default_name_exceptions, load_name_exceptions};
use pacmap_lib::parse_name_for_entity;

use crate::output::{print_parsed_name, OutputFormat};

#[derive(Args)]
pub struct ParseNameArgs {
    /// Raw name as it appears in a bulk file, e.g. "SMITH, JOHN Q MR"
    pub name: String,

    /// FEC entity type code (IND, ORG, PAC, ...)
    #[arg(long)]
    pub entity: Option<String>,

    /// Name exception TOML replacing the built-in list
    #[arg(long)]
    pub exceptions: Option<PathBuf>,
}

pub fn run(args: &ParseNameArgs, format: &OutputFormat) -> Result<()> {
    let exceptions = match &args.exceptions {
        Some(path) => load_name_exceptions(path)?,
        None => load_default_name_exceptions()?,
    };
    let parsed = parse_name_for_entity(&args.name, args.entity.as_deref(), &exceptions);
    print_parsed_name(&parsed, format)
}
