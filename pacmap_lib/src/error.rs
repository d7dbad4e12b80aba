//! Error types for the library layer.

use std::fmt;

use crate::codes::CodeTableError;
use crate::config::ConfigError;
use crate::db::DbError;
use crate::ingest::IngestError;
use crate::map::MapError;
use crate::names::NameExceptionError;
use crate::scrape::ScrapeError;

/// Errors surfaced by the pipeline and its collaborators.
///
/// Row-level problems never reach this type; they are recovered in place and
/// counted in the run report. Only table-level failures propagate.
#[derive(Debug)]
pub enum PacMapError {
    /// A bulk input file could not be opened or read.
    Ingest(IngestError),
    /// Code tables failed to load or validate.
    CodeTable(CodeTableError),
    /// The name exception table failed to load.
    NameExceptions(NameExceptionError),
    /// Invalid pipeline configuration.
    Config(ConfigError),
    /// SQLite storage failed.
    Db(DbError),
    /// Fetching code descriptions failed.
    Scrape(ScrapeError),
    /// Map preparation failed.
    Map(MapError),
}

impl fmt::Display for PacMapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ingest(e) => write!(f, "Ingest error: {}", e),
            Self::CodeTable(e) => write!(f, "Code table error: {}", e),
            Self::NameExceptions(e) => write!(f, "Name exception error: {}", e),
            Self::Config(e) => write!(f, "Configuration error: {}", e),
            Self::Db(e) => write!(f, "Database error: {}", e),
            Self::Scrape(e) => write!(f, "Scrape error: {}", e),
            Self::Map(e) => write!(f, "Map error: {}", e),
        }
    }
}

impl std::error::Error for PacMapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Ingest(e) => Some(e),
            Self::CodeTable(e) => Some(e),
            Self::NameExceptions(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Db(e) => Some(e),
            Self::Scrape(e) => Some(e),
            Self::Map(e) => Some(e),
        }
    }
}

impl From<IngestError> for PacMapError {
    fn from(e: IngestError) -> Self {
        Self::Ingest(e)
    }
}

impl From<CodeTableError> for PacMapError {
    fn from(e: CodeTableError) -> Self {
        Self::CodeTable(e)
    }
}

impl From<NameExceptionError> for PacMapError {
    fn from(e: NameExceptionError) -> Self {
        Self::NameExceptions(e)
    }
}

impl From<ConfigError> for PacMapError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<DbError> for PacMapError {
    fn from(e: DbError) -> Self {
        Self::Db(e)
    }
}

impl From<ScrapeError> for PacMapError {
    fn from(e: ScrapeError) -> Self {
        Self::Scrape(e)
    }
}

impl From<MapError> for PacMapError {
    fn from(e: MapError) -> Self {
        Self::Map(e)
    }
}
