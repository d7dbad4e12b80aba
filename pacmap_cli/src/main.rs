mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "pacmap")]
#[command(about = "Clean FEC bulk data and prepare PAC contribution maps")]
struct Cli {
    /// Output format: table, json, csv, or markdown
    #[arg(long, default_value = "table", global = true)]
    output: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the cleaning pipeline over a directory of bulk files
    Clean(commands::clean::CleanArgs),
    /// List committees that received contributions
    Pacs(commands::pacs::PacsArgs),
    /// Build the GeoJSON map for one PAC
    Map(commands::map::MapArgs),
    /// Show how a raw FEC name is parsed
    ParseName(commands::parse_name::ParseNameArgs),
    /// Scrape FEC code descriptions into a code table file
    FetchCodes(commands::fetch_codes::FetchCodesArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("pacmap=info".parse()?),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let format = match cli.output.as_str() {
        "json" => OutputFormat::Json,
        "csv" => OutputFormat::Csv,
        "md" | "markdown" => OutputFormat::Markdown,
        _ => OutputFormat::Table,
    };

    match &cli.command {
        Commands::Clean(args) => commands::clean::run(args, &format)?,
        Commands::Pacs(args) => commands::pacs::run(args, &format)?,
        Commands::Map(args) => commands::map::run(args)?,
        Commands::ParseName(args) => commands::parse_name::run(args, &format)?,
        Commands::FetchCodes(args) => commands::fetch_codes::run(args).await?,
    }

    Ok(())
}
