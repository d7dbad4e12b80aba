//! The `pacs` subcommand: rank receiving committees by contribution total.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use pacmap_lib::{pac_summaries, Db};

use crate::output::{print_pacs, OutputFormat};

#[derive(Args)]
pub struct PacsArgs {
    /// SQLite database path (defaults to PACMAP_DB)
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Maximum committees to list
    #[arg(long, default_value = "25")]
    pub limit: usize,
}

pub fn run(args: &PacsArgs, format: &OutputFormat) -> Result<()> {
    let db_path = super::db_path(args.db.as_deref())?;
    let db = Db::open(&db_path)?;
    db.init()?;

    let counts = db.table_counts()?;
    if counts.individuals == 0 && counts.transfers == 0 {
        bail!(
            "No contributions in {}. Run 'pacmap clean --db {}' first.",
            db_path.display(),
            db_path.display()
        );
    }

    let tables = db.load_tables()?;
    let mut summaries = pac_summaries(&tables);
    summaries.truncate(args.limit);

    print_pacs(&summaries, format)
}
