use anyhow::Result;
use pacmap_lib::filter::FilterReport;
use pacmap_lib::ingest::IngestStats;
use pacmap_lib::map::{format_dollars, PacSummary};
use pacmap_lib::{ParsedName, PipelineReport};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Clone, Debug)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
    Markdown,
}

#[derive(Tabled, Serialize)]
struct PacRow {
    #[tabled(rename = "Committee")]
    #[serde(rename = "Committee")]
    name: String,
    #[tabled(rename = "Contributions")]
    #[serde(rename = "Contributions")]
    contributions: usize,
    #[tabled(rename = "Total")]
    #[serde(rename = "Total")]
    contribution_total: String,
    #[tabled(rename = "Transfers")]
    #[serde(rename = "Transfers")]
    transfers: usize,
    #[tabled(rename = "Transfer Total")]
    #[serde(rename = "Transfer Total")]
    transfer_total: String,
}

#[derive(Tabled, Serialize)]
struct NameRow {
    #[tabled(rename = "Full Name")]
    #[serde(rename = "Full Name")]
    name_full: String,
    #[tabled(rename = "First Last")]
    #[serde(rename = "First Last")]
    first_last: String,
    #[tabled(rename = "First")]
    #[serde(rename = "First")]
    first: String,
    #[tabled(rename = "Middle")]
    #[serde(rename = "Middle")]
    middle: String,
    #[tabled(rename = "Last")]
    #[serde(rename = "Last")]
    last: String,
}

#[derive(Tabled, Serialize)]
struct StageRow {
    #[tabled(rename = "Table")]
    #[serde(rename = "Table")]
    table: String,
    #[tabled(rename = "Rows")]
    #[serde(rename = "Rows")]
    rows: usize,
    #[tabled(rename = "Short Rows")]
    #[serde(rename = "Short Rows")]
    short_rows: usize,
    #[tabled(rename = "Reversals Removed")]
    #[serde(rename = "Reversals Removed")]
    removed: usize,
    #[tabled(rename = "Unmatched Negatives")]
    #[serde(rename = "Unmatched Negatives")]
    unmatched_negatives: usize,
}

// -- Row builders --

fn build_pac_rows(summaries: &[PacSummary]) -> Vec<PacRow> {
    summaries
        .iter()
        .map(|s| PacRow {
            name: s.name.clone(),
            contributions: s.contributions,
            contribution_total: format_dollars(s.contribution_total),
            transfers: s.transfers,
            transfer_total: format_dollars(s.transfer_total),
        })
        .collect()
}

fn build_name_rows(names: &[ParsedName]) -> Vec<NameRow> {
    names
        .iter()
        .map(|n| NameRow {
            name_full: n.name_full.clone(),
            first_last: n.first_last.clone(),
            first: n.first.clone(),
            middle: n.middle.clone(),
            last: n.last.clone(),
        })
        .collect()
}

fn stage_row(table: &str, ingest: &IngestStats, filter: Option<&FilterReport>) -> StageRow {
    StageRow {
        table: table.to_string(),
        rows: ingest.rows,
        short_rows: ingest.short_rows,
        removed: filter.map_or(0, FilterReport::rows_removed),
        unmatched_negatives: filter.map_or(0, |f| f.unmatched_negatives),
    }
}

fn build_stage_rows(report: &PipelineReport) -> Vec<StageRow> {
    vec![
        stage_row("committees", &report.ingest.committees, None),
        stage_row("candidates", &report.ingest.candidates, None),
        stage_row(
            "individuals",
            &report.ingest.individuals,
            Some(&report.filter.individuals),
        ),
        stage_row(
            "expenditures",
            &report.ingest.expenditures,
            Some(&report.filter.expenditures),
        ),
        stage_row(
            "transfers",
            &report.ingest.transfers,
            Some(&report.filter.transfers),
        ),
    ]
}

// -- Generic printers --

fn print_table<T: Tabled>(rows: Vec<T>) {
    println!("{}", Table::new(rows));
}

fn print_markdown<T: Tabled>(rows: Vec<T>) {
    let mut table = Table::new(rows);
    table.with(Style::markdown());
    println!("{}", table);
}

fn print_csv<T: Serialize>(rows: Vec<T>) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(std::io::stdout());
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

fn print_rows<T: Tabled + Serialize>(rows: Vec<T>, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => print_table(rows),
        OutputFormat::Markdown => print_markdown(rows),
        OutputFormat::Csv => print_csv(rows)?,
        OutputFormat::Json => print_json(&rows),
    }
    Ok(())
}

// -- Per-command output --

pub fn print_pacs(summaries: &[PacSummary], format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            print_json(&summaries);
            Ok(())
        }
        _ => print_rows(build_pac_rows(summaries), format),
    }
}

pub fn print_parsed_name(name: &ParsedName, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            print_json(name);
            Ok(())
        }
        _ => print_rows(build_name_rows(std::slice::from_ref(name)), format),
    }
}

pub fn print_report(report: &PipelineReport, format: &OutputFormat) -> Result<()> {
    if let OutputFormat::Json = format {
        print_json(report);
        return Ok(());
    }
    print_rows(build_stage_rows(report), format)?;
    eprintln!(
        "Merge: {} contributions and {} expenditures without a committee, {} transfers matched a candidate",
        report.merge.individuals_unmatched,
        report.merge.expenditures_unmatched,
        report.merge.transfers_candidate_matched
    );
    eprintln!(
        "Parties: {} names, {} by candidate, {} by committee, {} unresolved",
        report.party.distinct_names,
        report.party.candidate_matches,
        report.party.committee_matches,
        report.party.unresolved
    );
    Ok(())
}

// -- JSON output --

pub fn print_json<T: serde::Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn summary(name: &str, total: i64) -> PacSummary {
        PacSummary {
            name: name.to_string(),
            contributions: 3,
            contribution_total: Decimal::new(total, 2),
            transfers: 1,
            transfer_total: Decimal::new(50_000, 2),
        }
    }

    fn csv_from_rows<T: Serialize>(rows: &[T]) -> String {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        for row in rows {
            wtr.serialize(row).unwrap();
        }
        String::from_utf8(wtr.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_build_pac_rows_formats_dollars() {
        let rows = build_pac_rows(&[summary("Actblue", 123_450)]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Actblue");
        assert_eq!(rows[0].contribution_total, "$1,234.50");
        assert_eq!(rows[0].transfer_total, "$500");
    }

    #[test]
    fn test_csv_pac_headers() {
        let csv = csv_from_rows(&build_pac_rows(&[summary("Actblue", 100)]));
        let header = csv.lines().next().unwrap();
        assert_eq!(
            header,
            "Committee,Contributions,Total,Transfers,Transfer Total"
        );
    }

    #[test]
    fn test_build_name_rows() {
        let name = ParsedName {
            name_full: "John Q Smith".to_string(),
            first_last: "John Smith".to_string(),
            first: "John".to_string(),
            middle: "Q".to_string(),
            last: "Smith".to_string(),
        };
        let rows = build_name_rows(std::slice::from_ref(&name));
        assert_eq!(rows[0].first_last, "John Smith");
        assert_eq!(rows[0].middle, "Q");
    }

    #[test]
    fn test_stage_rows_cover_all_tables() {
        let rows = build_stage_rows(&PipelineReport::default());
        let tables: Vec<&str> = rows.iter().map(|r| r.table.as_str()).collect();
        assert_eq!(
            tables,
            vec!["committees", "candidates", "individuals", "expenditures", "transfers"]
        );
    }

    #[test]
    fn test_markdown_pac_structure() {
        let mut table = Table::new(build_pac_rows(&[summary("Actblue", 100)]));
        table.with(Style::markdown());
        let rendered = table.to_string();
        assert!(rendered.contains("| Committee"));
        assert!(rendered.contains("Actblue"));
    }
}
