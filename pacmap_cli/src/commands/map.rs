//! The `map` subcommand: build one PAC's map layers and write them as GeoJSON.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use pacmap_lib::{
    build_pac_map, load_code_tables, load_default_code_tables, Db, GeoJsonRenderer, MapRenderer,
    StaticGeometry,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Args)]
pub struct MapArgs {
    /// SQLite database path (defaults to PACMAP_DB)
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Receiving committee name, as listed by `pacmap pacs`
    #[arg(long)]
    pub pac: String,

    /// Geometry JSON with ZIP bounds and state outlines
    #[arg(long)]
    pub geometry: PathBuf,

    /// Output file (stdout if omitted)
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Seed for marker placement
    #[arg(long)]
    pub seed: Option<u64>,

    /// Code table YAML for state names
    #[arg(long)]
    pub codes: Option<PathBuf>,

    /// Pretty-print the GeoJSON
    #[arg(long)]
    pub pretty: bool,

    /// One marker per contribution instead of ZIP totals
    #[arg(long)]
    pub individual: bool,
}

pub fn run(args: &MapArgs) -> Result<()> {
    let db_path = super::db_path(args.db.as_deref())?;
    let db = Db::open(&db_path)?;
    db.init()?;
    let tables = db.load_tables()?;

    let geometry = StaticGeometry::load(&args.geometry)?;
    let codes = match &args.codes {
        Some(path) => load_code_tables(path)?,
        None => load_default_code_tables()?,
    };
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let data = build_pac_map(&args.pac, &tables, &geometry, &codes, &mut rng);
    if data.contributions.is_empty() && data.transfers.is_empty() {
        bail!("No contributions or transfers found for '{}'", args.pac);
    }

    let renderer = GeoJsonRenderer {
        pretty: args.pretty,
        individual: args.individual,
    };
    let rendered = renderer.render(&data)?;
    match &args.out {
        Some(path) => {
            std::fs::write(path, rendered)?;
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{}", rendered),
    }

    eprintln!(
        "{}: {} ZIP codes, {} states, {} transfers ({} incomplete contributions skipped)",
        data.pac,
        data.contributions.len(),
        data.state_totals.len(),
        data.transfers.len(),
        data.incomplete_contributions
    );
    Ok(())
}
