//! The `clean` subcommand: run the pipeline over a directory of bulk files
//! and persist the cleaned tables to SQLite.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use pacmap_lib::pipeline::PipelineStage;
use pacmap_lib::{load_reference_data, run_pipeline_with_progress, Db, PipelineConfig};

use crate::output::{print_report, OutputFormat};

#[derive(Args)]
pub struct CleanArgs {
    /// Directory holding itcont.txt, cm.txt, cn.txt, itoth.txt, oppexp.txt
    #[arg(long)]
    pub input_dir: PathBuf,

    /// SQLite database path (defaults to PACMAP_DB)
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Pipeline config TOML
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Code table YAML replacing the built-in tables
    #[arg(long)]
    pub codes: Option<PathBuf>,
}

pub fn run(args: &CleanArgs, format: &OutputFormat) -> Result<()> {
    if !args.input_dir.is_dir() {
        bail!("Input directory {} does not exist", args.input_dir.display());
    }
    let db_path = super::db_path(args.db.as_deref())?;

    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    }
    .with_env_overrides()?;
    if let Some(codes) = &args.codes {
        config.codes_path = Some(codes.clone());
    }

    let (codes, exceptions) = load_reference_data(&config)?;
    let start = Instant::now();

    let pb = ProgressBar::new(PipelineStage::COUNT);
    pb.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")?,
    );

    let (tables, report) = run_pipeline_with_progress(
        &args.input_dir,
        &config,
        &codes,
        &exceptions,
        &mut |stage| {
            pb.inc(1);
            pb.set_message(stage.describe());
        },
    )?;
    pb.finish_with_message(format!("{} rows cleaned", tables.total_rows()));

    let mut db = Db::open(&db_path)?;
    db.init()?;
    db.save_tables(&tables)?;
    db.set_meta_json("last_report", &report)?;
    db.set_meta("last_clean_at", &chrono::Utc::now().to_rfc3339())?;
    db.set_meta("input_dir", &args.input_dir.display().to_string())?;

    tracing::info!(
        "Saved {} rows to {} in {:.1}s",
        tables.total_rows(),
        db_path.display(),
        start.elapsed().as_secs_f64()
    );

    print_report(&report, format)
}
