use std::path::{Path, PathBuf};

use pacmap_lib::codes::load_default_code_tables;
use pacmap_lib::db::Db;
use pacmap_lib::error::PacMapError;
use pacmap_lib::map::{build_pac_map, pac_summaries, GeoJsonRenderer, MapRenderer};
use pacmap_lib::names::load_default_name_exceptions;
use pacmap_lib::pipeline::{run_pipeline, run_pipeline_with_progress, PipelineReport, PipelineStage};
use pacmap_lib::records::CleanTables;
use pacmap_lib::{PipelineConfig, StaticGeometry};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_decimal_macros::dec;

fn fixture_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn clean_fixtures() -> (CleanTables, PipelineReport) {
    let codes = load_default_code_tables().unwrap();
    let exceptions = load_default_name_exceptions().unwrap();
    run_pipeline(&fixture_dir(), &PipelineConfig::default(), &codes, &exceptions).unwrap()
}

// ============================================================================
// End-to-end pipeline
// ============================================================================

#[test]
fn pipeline_reads_every_table() {
    let (tables, report) = clean_fixtures();

    assert_eq!(report.ingest.committees.rows, 4);
    assert_eq!(report.ingest.candidates.rows, 2);
    assert_eq!(report.ingest.individuals.rows, 6);
    assert_eq!(report.ingest.individuals.short_rows, 1);
    assert_eq!(report.ingest.transfers.rows, 5);
    assert_eq!(report.ingest.expenditures.rows, 4);

    assert_eq!(tables.committees.len(), 4);
    assert_eq!(tables.candidates.len(), 2);
}

#[test]
fn pipeline_removes_reversed_transactions() {
    let (tables, report) = clean_fixtures();

    assert_eq!(report.filter.individuals.negatives_removed, 1);
    assert_eq!(report.filter.individuals.positives_cancelled, 1);
    assert_eq!(tables.individuals.len(), 4);
    assert!(tables.individuals.iter().all(|r| r.amount >= dec!(0)));

    // The $100 contribution from the same donor survives.
    let smith: Vec<_> = tables
        .individuals
        .iter()
        .filter(|r| r.name.first_last.eq_ignore_ascii_case("John Smith"))
        .collect();
    assert_eq!(smith.len(), 1);
    assert_eq!(smith[0].amount, dec!(100));

    // "2,000.00" and "-2000" are the same magnitude.
    assert_eq!(report.filter.expenditures.rows_removed(), 2);
    assert_eq!(tables.expenditures.len(), 2);

    assert_eq!(report.filter.transfers.rows_removed(), 2);
    assert_eq!(tables.transfers.len(), 3);
}

#[test]
fn pipeline_parses_fields() {
    let (tables, _) = clean_fixtures();

    let smith = &tables.individuals[0];
    assert!(smith.name.name_full.eq_ignore_ascii_case("John Q Smith"));
    assert!(smith.name.middle.eq_ignore_ascii_case("Q"));
    assert_eq!(smith.address.zip_primary.as_deref(), Some("19103"));
    assert_eq!(smith.address.zip_secondary.as_deref(), Some("1234"));
    assert_eq!(smith.date, chrono::NaiveDate::from_ymd_opt(2020, 1, 2));
    assert_eq!(smith.entity_type.label.as_deref(), Some("Individual"));

    // Seven-digit date with a dropped leading zero.
    let jane = &tables.individuals[1];
    assert_eq!(jane.date, chrono::NaiveDate::from_ymd_opt(2020, 2, 1));

    let staples = &tables.expenditures[0];
    assert!(staples.payee.is_organization());
    assert_eq!(staples.date, chrono::NaiveDate::from_ymd_opt(2020, 2, 15));
    assert_eq!(staples.amount, dec!(123.45));

    let doe = &tables.candidates[0];
    assert_eq!(doe.party.label.as_deref(), Some("Democratic Party"));
}

#[test]
fn pipeline_joins_registries() {
    let (tables, report) = clean_fixtures();

    assert_eq!(tables.individuals[0].recipient_name.as_deref(), Some("ACTBLUE"));
    assert_eq!(report.merge.individuals_unmatched, 1);
    assert_eq!(report.merge.expenditures_unmatched, 1);
    assert_eq!(report.merge.candidates_committee_unmatched, 1);
    assert_eq!(
        tables.candidates[0].committee_name.as_deref(),
        Some("DOE FOR CONGRESS")
    );

    let from_candidate = tables
        .transfers
        .iter()
        .find(|t| t.raw_sender == "DOE, JOHN")
        .unwrap();
    assert!(from_candidate
        .candidate_name
        .as_deref()
        .unwrap()
        .eq_ignore_ascii_case("John Doe"));
    assert_eq!(from_candidate.committee_name.as_deref(), Some("DOE FOR CONGRESS"));
    assert_eq!(report.merge.transfers_candidate_matched, 1);
}

#[test]
fn pipeline_resolves_parties() {
    let (tables, report) = clean_fixtures();

    let party_of = |raw: &str| {
        tables
            .transfers
            .iter()
            .find(|t| t.raw_sender == raw)
            .and_then(|t| t.party.clone())
    };

    assert_eq!(party_of("DOE FOR CONGRESS").as_deref(), Some("Democratic Party"));
    assert_eq!(
        party_of("PENNSYLVANIA DEMOCRATIC PARTY").as_deref(),
        Some("Democratic Party")
    );
    assert_eq!(party_of("DOE, JOHN").as_deref(), Some("Unresolved"));

    assert_eq!(report.party.candidate_matches, 1);
    assert_eq!(report.party.committee_matches, 1);
    assert_eq!(report.party.unresolved, 1);
    assert_eq!(report.party.rows_annotated, 3);
}

#[test]
fn pipeline_reports_stages_in_order() {
    let codes = load_default_code_tables().unwrap();
    let exceptions = load_default_name_exceptions().unwrap();
    let mut stages = Vec::new();

    run_pipeline_with_progress(
        &fixture_dir(),
        &PipelineConfig::default(),
        &codes,
        &exceptions,
        &mut |stage| stages.push(stage),
    )
    .unwrap();

    assert_eq!(stages.len() as u64, PipelineStage::COUNT);
    assert_eq!(stages[0], PipelineStage::ReadCommittees);
    assert_eq!(stages.last(), Some(&PipelineStage::ResolveParties));
}

#[test]
fn pipeline_missing_file_is_ingest_error() {
    let codes = load_default_code_tables().unwrap();
    let exceptions = load_default_name_exceptions().unwrap();
    let mut config = PipelineConfig::default();
    config.files.transfers = "missing.txt".to_string();

    let result = run_pipeline(&fixture_dir(), &config, &codes, &exceptions);
    match result {
        Err(PacMapError::Ingest(e)) => assert!(e.to_string().contains("missing.txt")),
        other => panic!("expected ingest error, got {:?}", other.map(|(_, r)| r)),
    }
}

#[test]
fn pipeline_rejects_invalid_thresholds() {
    let codes = load_default_code_tables().unwrap();
    let exceptions = load_default_name_exceptions().unwrap();
    let config = PipelineConfig {
        committee_threshold: 140.0,
        ..PipelineConfig::default()
    };

    let result = run_pipeline(&fixture_dir(), &config, &codes, &exceptions);
    assert!(matches!(result, Err(PacMapError::Config(_))));
}

// ============================================================================
// Storage
// ============================================================================

#[test]
fn sqlite_round_trip_preserves_tables() {
    let (tables, report) = clean_fixtures();

    let mut db = Db::open_in_memory().unwrap();
    db.init().unwrap();
    db.save_tables(&tables).unwrap();
    db.set_meta_json("last_report", &report).unwrap();

    let loaded = db.load_tables().unwrap();
    assert_eq!(loaded, tables);

    let counts = db.table_counts().unwrap();
    assert_eq!(counts.individuals, 4);
    assert_eq!(counts.transfers, 3);

    let stored: serde_json::Value =
        serde_json::from_str(&db.get_meta("last_report").unwrap().unwrap()).unwrap();
    assert_eq!(stored["party"]["candidate_matches"], 1);
}

// ============================================================================
// Map preparation
// ============================================================================

#[test]
fn pac_summaries_rank_recipients() {
    let (tables, _) = clean_fixtures();
    let summaries = pac_summaries(&tables);

    assert_eq!(summaries[0].name, "ACTBLUE");
    assert_eq!(summaries[0].contributions, 3);
    assert_eq!(summaries[0].contribution_total, dec!(150));
    assert_eq!(summaries[0].transfers, 2);
    assert_eq!(summaries[0].transfer_total, dec!(1500));
    assert!(summaries.iter().any(|s| s.name == "DOE FOR CONGRESS"));
}

#[test]
fn map_dataset_from_cleaned_tables() {
    let (tables, _) = clean_fixtures();
    let geometry = StaticGeometry::from_json(include_str!("fixtures/geometry.json")).unwrap();
    let codes = load_default_code_tables().unwrap();
    let mut rng = StdRng::seed_from_u64(2020);

    let data = build_pac_map("ActBlue", &tables, &geometry, &codes, &mut rng);

    assert_eq!(data.contributions.len(), 2);
    assert_eq!(data.incomplete_contributions, 1);
    assert_eq!(data.state_totals.len(), 1);
    assert_eq!(data.state_totals[0].state_name, "Pennsylvania");
    assert_eq!(data.state_totals[0].total, dec!(150));

    assert_eq!(data.transfers.len(), 2);
    assert!(data.transfers.iter().all(|t| t.location.is_some()));
    assert!(data
        .transfers
        .iter()
        .all(|t| t.document_url.as_deref().unwrap().starts_with("https://docquery.fec.gov/")));

    let rendered = GeoJsonRenderer {
        pretty: true,
        ..Default::default()
    }
    .render(&data)
    .unwrap();
    let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
    assert_eq!(value["features"].as_array().unwrap().len(), 5);
}

#[test]
fn map_individual_mode_has_one_marker_per_contribution() {
    let (tables, _) = clean_fixtures();
    let geometry = StaticGeometry::from_json(include_str!("fixtures/geometry.json")).unwrap();
    let codes = load_default_code_tables().unwrap();
    let mut rng = StdRng::seed_from_u64(7);

    let data = build_pac_map("ActBlue", &tables, &geometry, &codes, &mut rng);
    let complete: usize = data.contributions.iter().map(|z| z.count).sum();
    assert_eq!(data.individual_contributions.len(), complete);

    let renderer = GeoJsonRenderer {
        pretty: false,
        individual: true,
    };
    let value = renderer.to_value(&data);
    let markers = value["features"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|f| f["properties"]["layer"] == "contribution")
        .count();
    let located = data
        .individual_contributions
        .iter()
        .filter(|m| m.location.is_some())
        .count();
    assert_eq!(markers, located);
}
