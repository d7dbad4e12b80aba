//! The `fetch-codes` subcommand: refresh code descriptions from fec.gov and
//! write a code table file usable with `--codes`.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use pacmap_lib::scrape::default_sources;
use pacmap_lib::{load_default_code_tables, CodeScraper};

#[derive(Args)]
pub struct FetchCodesArgs {
    /// Output YAML path
    #[arg(long)]
    pub out: PathBuf,

    /// Override the FEC site root (defaults to PACMAP_FEC_BASE_URL, then fec.gov)
    #[arg(long)]
    pub base_url: Option<String>,
}

pub async fn run(args: &FetchCodesArgs) -> Result<()> {
    let scraper = match args
        .base_url
        .clone()
        .or_else(|| std::env::var("PACMAP_FEC_BASE_URL").ok())
    {
        Some(url) => CodeScraper::with_base_url(&url)?,
        None => CodeScraper::new()?,
    };

    let sources = default_sources();
    eprintln!("Fetching {} code tables...", sources.len());
    let (tables, failures) = scraper
        .refresh_tables(load_default_code_tables()?, &sources)
        .await;

    if failures.len() == sources.len() {
        bail!("Every code page failed to download; nothing written");
    }
    for (table, err) in &failures {
        eprintln!("  kept built-in {} codes: {}", table, err);
    }

    std::fs::write(&args.out, tables.to_yaml()?)?;
    eprintln!(
        "Wrote {} ({} of {} tables refreshed)",
        args.out.display(),
        sources.len() - failures.len(),
        sources.len()
    );
    Ok(())
}
