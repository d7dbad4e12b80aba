//! Library layer for pacmap: FEC bulk-file cleaning, reconciliation and PAC
//! map preparation.
//!
//! The pipeline reads the five pipe-delimited bulk files, parses names, ZIPs,
//! dates and codes, drops reversed transactions, joins the registries, and
//! resolves a party for every committee transfer. The cleaned tables persist
//! to SQLite and feed the map layer.

pub mod codes;
pub mod config;
pub mod dates;
pub mod db;
pub mod error;
pub mod filter;
pub mod fuzzy;
pub mod geo;
pub mod ingest;
pub mod map;
pub mod merge;
pub mod names;
pub mod normalize;
pub mod party;
pub mod pipeline;
pub mod records;
pub mod scrape;
pub mod zip;

pub use codes::{load_code_tables, load_default_code_tables, CodeTable, CodeTables, Coded};
pub use config::PipelineConfig;
pub use db::{Db, DbError, TableCounts};
pub use error::PacMapError;
pub use geo::{GeometryProvider, StaticGeometry};
pub use map::{build_pac_map, pac_summaries, GeoJsonRenderer, MapRenderer, PacMapData};
pub use names::{parse_name, parse_name_for_entity, NameExceptions, ParsedName};
pub use pipeline::{load_reference_data, run_pipeline, run_pipeline_with_progress, PipelineReport};
pub use records::CleanTables;
pub use scrape::{CodeScraper, ScrapeError};
