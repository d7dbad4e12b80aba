//! Pipe-delimited bulk file reader.
//!
//! FEC bulk files have no header row, use `|` as the separator and never
//! quote fields, so a literal `"` is ordinary data. Rows are decoded lossily
//! because older filings contain Latin-1 bytes.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ByteRecord, ReaderBuilder};
use serde::Serialize;
use thiserror::Error;

use crate::normalize::{
    candidate_cols, committee_cols, expenditure_cols, individual_cols, transfer_cols, Normalizer,
};
use crate::records::{
    CandidateRecord, CommitteeRecord, ContributionRecord, ExpenditureRecord, TransferRecord,
};

/// Error types for bulk file ingestion.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Failed to open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed row {row}: {source}")]
    Csv {
        row: usize,
        #[source]
        source: csv::Error,
    },
}

/// Row counts for one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    pub rows: usize,
    /// Rows with fewer fields than the layout expects; missing fields read as
    /// blank.
    pub short_rows: usize,
    /// Rows with more fields than the layout expects; extras are ignored.
    pub long_rows: usize,
}

/// Read every row of a bulk file, handing the positional fields to `build`.
pub fn read_rows<R, T, F>(
    reader: R,
    expected_fields: usize,
    mut build: F,
) -> Result<(Vec<T>, IngestStats), IngestError>
where
    R: Read,
    F: FnMut(&[&str]) -> T,
{
    let mut csv_reader = ReaderBuilder::new()
        .delimiter(b'|')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(reader);

    let mut stats = IngestStats::default();
    let mut rows = Vec::new();
    let mut record = ByteRecord::new();

    loop {
        let more = csv_reader
            .read_byte_record(&mut record)
            .map_err(|source| IngestError::Csv {
                row: stats.rows + 1,
                source,
            })?;
        if !more {
            break;
        }
        // Skip blank lines (trailing newline at end of file).
        if record.len() == 1 && record.get(0).map_or(true, |f| f.is_empty()) {
            continue;
        }

        stats.rows += 1;
        if record.len() < expected_fields {
            stats.short_rows += 1;
        } else if record.len() > expected_fields {
            stats.long_rows += 1;
        }

        let decoded: Vec<String> = record
            .iter()
            .map(|field| String::from_utf8_lossy(field).into_owned())
            .collect();
        let fields: Vec<&str> = decoded.iter().map(String::as_str).collect();
        rows.push(build(&fields));
    }

    if stats.short_rows > 0 {
        tracing::warn!(
            "{} of {} rows had fewer than {} fields",
            stats.short_rows,
            stats.rows,
            expected_fields
        );
    }

    Ok((rows, stats))
}

fn open(path: &Path) -> Result<File, IngestError> {
    File::open(path).map_err(|source| IngestError::Io {
        path: path.display().to_string(),
        source,
    })
}

pub fn read_contributions<R: Read>(
    reader: R,
    normalizer: &Normalizer<'_>,
) -> Result<(Vec<ContributionRecord>, IngestStats), IngestError> {
    read_rows(reader, individual_cols::COUNT, |f| normalizer.contribution(f))
}

pub fn read_committees<R: Read>(
    reader: R,
    normalizer: &Normalizer<'_>,
) -> Result<(Vec<CommitteeRecord>, IngestStats), IngestError> {
    read_rows(reader, committee_cols::COUNT, |f| normalizer.committee(f))
}

pub fn read_candidates<R: Read>(
    reader: R,
    normalizer: &Normalizer<'_>,
) -> Result<(Vec<CandidateRecord>, IngestStats), IngestError> {
    read_rows(reader, candidate_cols::COUNT, |f| normalizer.candidate(f))
}

pub fn read_transfers<R: Read>(
    reader: R,
    normalizer: &Normalizer<'_>,
) -> Result<(Vec<TransferRecord>, IngestStats), IngestError> {
    read_rows(reader, transfer_cols::COUNT, |f| normalizer.transfer(f))
}

pub fn read_expenditures<R: Read>(
    reader: R,
    normalizer: &Normalizer<'_>,
) -> Result<(Vec<ExpenditureRecord>, IngestStats), IngestError> {
    read_rows(reader, expenditure_cols::COUNT, |f| normalizer.expenditure(f))
}

pub fn read_contributions_file(
    path: &Path,
    normalizer: &Normalizer<'_>,
) -> Result<(Vec<ContributionRecord>, IngestStats), IngestError> {
    read_contributions(open(path)?, normalizer)
}

pub fn read_committees_file(
    path: &Path,
    normalizer: &Normalizer<'_>,
) -> Result<(Vec<CommitteeRecord>, IngestStats), IngestError> {
    read_committees(open(path)?, normalizer)
}

pub fn read_candidates_file(
    path: &Path,
    normalizer: &Normalizer<'_>,
) -> Result<(Vec<CandidateRecord>, IngestStats), IngestError> {
    read_candidates(open(path)?, normalizer)
}

pub fn read_transfers_file(
    path: &Path,
    normalizer: &Normalizer<'_>,
) -> Result<(Vec<TransferRecord>, IngestStats), IngestError> {
    read_transfers(open(path)?, normalizer)
}

pub fn read_expenditures_file(
    path: &Path,
    normalizer: &Normalizer<'_>,
) -> Result<(Vec<ExpenditureRecord>, IngestStats), IngestError> {
    read_expenditures(open(path)?, normalizer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::load_default_code_tables;
    use crate::names::NameExceptions;
    use rust_decimal_macros::dec;

    #[test]
    fn test_read_rows_splits_on_pipe() {
        let data = "a|b|c\nd|e|f\n";
        let (rows, stats) =
            read_rows(data.as_bytes(), 3, |f| f.iter().map(|s| s.to_string()).collect::<Vec<_>>())
                .unwrap();
        assert_eq!(rows, vec![vec!["a", "b", "c"], vec!["d", "e", "f"]]);
        assert_eq!(stats.rows, 2);
        assert_eq!(stats.short_rows, 0);
    }

    #[test]
    fn test_quotes_are_literal() {
        let data = "\"ACME\" INC|x\n";
        let (rows, _) = read_rows(data.as_bytes(), 2, |f| f[0].to_string()).unwrap();
        assert_eq!(rows, vec!["\"ACME\" INC"]);
    }

    #[test]
    fn test_short_and_long_rows_counted() {
        let data = "a|b\na|b|c\na|b|c|d\n";
        let (rows, stats) = read_rows(data.as_bytes(), 3, |f| f.len()).unwrap();
        assert_eq!(rows, vec![2, 3, 4]);
        assert_eq!(stats.short_rows, 1);
        assert_eq!(stats.long_rows, 1);
    }

    #[test]
    fn test_invalid_utf8_is_lossy() {
        let data: &[u8] = b"MU\xd1OZ|x\n";
        let (rows, _) = read_rows(data, 2, |f| f[0].to_string()).unwrap();
        assert_eq!(rows, vec!["MU\u{FFFD}OZ"]);
    }

    #[test]
    fn test_read_contributions() {
        let codes = load_default_code_tables().unwrap();
        let exceptions = NameExceptions::new();
        let normalizer = Normalizer::new(&codes, &exceptions);

        let data = "C00401224|N|M3|P2020|1|15|IND|SMITH, JOHN|PHILADELPHIA|PA|19103|ACME|CEO|01152020|100|||||| 1\n\
                    C00401224|N|M3|P2020|1|15|IND|SMITH, JOHN|PHILADELPHIA|PA|19103|ACME|CEO|01162020|-100|||||| 2\n";
        let (rows, stats) = read_contributions(data.as_bytes(), &normalizer).unwrap();
        assert_eq!(stats.rows, 2);
        assert_eq!(rows[0].amount, dec!(100));
        assert_eq!(rows[1].amount, dec!(-100));
        assert_eq!(rows[0].name.first_last, "John Smith");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let codes = load_default_code_tables().unwrap();
        let exceptions = NameExceptions::new();
        let normalizer = Normalizer::new(&codes, &exceptions);
        let result = read_committees_file(Path::new("/nonexistent/cm.txt"), &normalizer);
        assert!(matches!(result, Err(IngestError::Io { .. })));
    }
}
