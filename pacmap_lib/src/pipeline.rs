//! End-to-end cleaning run: ingest, filter, merge, resolve.

use std::path::Path;

use serde::Serialize;

use crate::codes::{load_code_tables, load_default_code_tables, CodeTables};
use crate::config::PipelineConfig;
use crate::error::PacMapError;
use crate::filter::{remove_invalid_transactions, FilterReport};
use crate::ingest::{
    read_candidates_file, read_committees_file, read_contributions_file, read_expenditures_file,
    read_transfers_file, IngestStats,
};
use crate::merge::{merge_tables, MergeReport};
use crate::names::{load_default_name_exceptions, load_name_exceptions, NameExceptions};
use crate::normalize::Normalizer;
use crate::party::{PartyResolver, PartyStats};
use crate::records::CleanTables;

/// Pipeline stages in execution order, reported to progress callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    ReadCommittees,
    ReadCandidates,
    ReadIndividuals,
    ReadExpenditures,
    ReadTransfers,
    Filter,
    Merge,
    ResolveParties,
}

impl PipelineStage {
    pub const COUNT: u64 = 8;

    pub fn describe(&self) -> &'static str {
        match self {
            Self::ReadCommittees => "reading committees",
            Self::ReadCandidates => "reading candidates",
            Self::ReadIndividuals => "reading individual contributions",
            Self::ReadExpenditures => "reading operating expenditures",
            Self::ReadTransfers => "reading committee transfers",
            Self::Filter => "removing reversed transactions",
            Self::Merge => "joining registries",
            Self::ResolveParties => "resolving transfer parties",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestSummary {
    pub committees: IngestStats,
    pub candidates: IngestStats,
    pub individuals: IngestStats,
    pub expenditures: IngestStats,
    pub transfers: IngestStats,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterSummary {
    pub individuals: FilterReport,
    pub expenditures: FilterReport,
    pub transfers: FilterReport,
}

/// Everything counted during one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineReport {
    pub ingest: IngestSummary,
    pub filter: FilterSummary,
    pub merge: MergeReport,
    pub party: PartyStats,
}

/// Code tables and name exceptions selected by the config, falling back to
/// the embedded defaults.
pub fn load_reference_data(
    config: &PipelineConfig,
) -> Result<(CodeTables, NameExceptions), PacMapError> {
    let codes = match &config.codes_path {
        Some(path) => load_code_tables(path)?,
        None => load_default_code_tables()?,
    };
    let exceptions = match &config.exceptions_path {
        Some(path) => load_name_exceptions(path)?,
        None => load_default_name_exceptions()?,
    };
    Ok((codes, exceptions))
}

pub fn run_pipeline(
    input_dir: &Path,
    config: &PipelineConfig,
    codes: &CodeTables,
    exceptions: &NameExceptions,
) -> Result<(CleanTables, PipelineReport), PacMapError> {
    run_pipeline_with_progress(input_dir, config, codes, exceptions, &mut |_| {})
}

pub fn run_pipeline_with_progress(
    input_dir: &Path,
    config: &PipelineConfig,
    codes: &CodeTables,
    exceptions: &NameExceptions,
    progress: &mut dyn FnMut(PipelineStage),
) -> Result<(CleanTables, PipelineReport), PacMapError> {
    config.validate()?;
    let normalizer = Normalizer::new(codes, exceptions);
    let files = &config.files;
    let mut report = PipelineReport::default();

    progress(PipelineStage::ReadCommittees);
    let (committees, stats) = read_committees_file(&input_dir.join(&files.committees), &normalizer)?;
    report.ingest.committees = stats;

    progress(PipelineStage::ReadCandidates);
    let (candidates, stats) = read_candidates_file(&input_dir.join(&files.candidates), &normalizer)?;
    report.ingest.candidates = stats;

    progress(PipelineStage::ReadIndividuals);
    let (individuals, stats) =
        read_contributions_file(&input_dir.join(&files.individuals), &normalizer)?;
    report.ingest.individuals = stats;

    progress(PipelineStage::ReadExpenditures);
    let (expenditures, stats) =
        read_expenditures_file(&input_dir.join(&files.expenditures), &normalizer)?;
    report.ingest.expenditures = stats;

    progress(PipelineStage::ReadTransfers);
    let (transfers, stats) = read_transfers_file(&input_dir.join(&files.transfers), &normalizer)?;
    report.ingest.transfers = stats;

    tracing::info!(
        "Read {} committees, {} candidates, {} contributions, {} expenditures, {} transfers",
        committees.len(),
        candidates.len(),
        individuals.len(),
        expenditures.len(),
        transfers.len()
    );

    progress(PipelineStage::Filter);
    let (individuals, individuals_report) = remove_invalid_transactions(individuals);
    let (expenditures, expenditures_report) = remove_invalid_transactions(expenditures);
    let (transfers, transfers_report) = remove_invalid_transactions(transfers);
    report.filter = FilterSummary {
        individuals: individuals_report,
        expenditures: expenditures_report,
        transfers: transfers_report,
    };
    tracing::info!(
        "Removed {} contribution, {} expenditure, {} transfer rows as reversals",
        individuals_report.rows_removed(),
        expenditures_report.rows_removed(),
        transfers_report.rows_removed()
    );

    let mut tables = CleanTables {
        committees,
        individuals,
        expenditures,
        candidates,
        transfers,
    };

    progress(PipelineStage::Merge);
    report.merge = merge_tables(&mut tables);

    progress(PipelineStage::ResolveParties);
    let resolver = PartyResolver::new(&tables.candidates, &tables.committees)
        .with_thresholds(config.candidate_threshold, config.committee_threshold);
    report.party = resolver.annotate_transfers(&mut tables.transfers);

    Ok((tables, report))
}
