//! FEC code-to-label mapping.
//!
//! The bulk files encode categorical fields (entity type, election type,
//! committee designation, party, ...) as short codes. [`CodeTables`] maps those
//! codes to readable labels. Tables are built once at startup, either from the
//! embedded YAML seed or from a file produced by the code-description scraper,
//! and then passed by reference into every normalization call.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for code table operations.
#[derive(Error, Debug)]
pub enum CodeTableError {
    #[error("Failed to parse code table YAML: {0}")]
    YamlParse(#[from] serde_yml::Error),
    #[error("Failed to read code table file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid key rule for table {table}: {reason}")]
    InvalidRule { table: String, reason: String },
    #[error("Empty label for code {code:?} in table {table}")]
    EmptyLabel { table: String, code: String },
}

/// The lookup tables known to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeTable {
    Amendment,
    ReportType,
    ElectionType,
    TransactionType,
    EntityType,
    CommitteeDesignation,
    CommitteeType,
    Party,
    FilingFrequency,
    InterestGroup,
    Office,
    IncumbentChallenger,
    CandidateStatus,
    ExpenditureCategory,
    State,
}

impl CodeTable {
    pub const ALL: [CodeTable; 15] = [
        Self::Amendment,
        Self::ReportType,
        Self::ElectionType,
        Self::TransactionType,
        Self::EntityType,
        Self::CommitteeDesignation,
        Self::CommitteeType,
        Self::Party,
        Self::FilingFrequency,
        Self::InterestGroup,
        Self::Office,
        Self::IncumbentChallenger,
        Self::CandidateStatus,
        Self::ExpenditureCategory,
        Self::State,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Amendment => "amendment",
            Self::ReportType => "report_type",
            Self::ElectionType => "election_type",
            Self::TransactionType => "transaction_type",
            Self::EntityType => "entity_type",
            Self::CommitteeDesignation => "committee_designation",
            Self::CommitteeType => "committee_type",
            Self::Party => "party",
            Self::FilingFrequency => "filing_frequency",
            Self::InterestGroup => "interest_group",
            Self::Office => "office",
            Self::IncumbentChallenger => "incumbent_challenger",
            Self::CandidateStatus => "candidate_status",
            Self::ExpenditureCategory => "expenditure_category",
            Self::State => "state",
        }
    }
}

impl std::fmt::Display for CodeTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One code table plus the rule that turns a raw field into a lookup key.
///
/// `prefix_len` keeps only the first N characters of the raw value, for codes
/// that carry extra data after the category (election `P2020` is keyed by `P`).
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct LookupTable {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_len: Option<usize>,
    pub entries: BTreeMap<String, String>,
}

impl LookupTable {
    pub fn new(entries: BTreeMap<String, String>) -> Self {
        Self {
            prefix_len: None,
            entries,
        }
    }

    fn key<'a>(&self, code: &'a str) -> &'a str {
        match self.prefix_len {
            Some(n) => match code.char_indices().nth(n) {
                Some((idx, _)) => &code[..idx],
                None => code,
            },
            None => code,
        }
    }

    pub fn get(&self, code: &str) -> Option<&str> {
        let key = self.key(code.trim());
        if key.is_empty() {
            return None;
        }
        self.entries
            .get(key)
            .or_else(|| self.entries.get(&key.to_uppercase()))
            .map(String::as_str)
    }
}

/// A raw categorical code together with its mapped label.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Coded {
    pub code: Option<String>,
    pub label: Option<String>,
}

impl Coded {
    /// The label, or `"Unknown"` when the code was absent or unmapped.
    pub fn label_or_unknown(&self) -> &str {
        self.label.as_deref().unwrap_or("Unknown")
    }

    /// The label when mapped, else the raw code.
    pub fn display(&self) -> Option<&str> {
        self.label.as_deref().or(self.code.as_deref())
    }
}

/// Immutable set of code tables.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct CodeTables {
    tables: BTreeMap<CodeTable, LookupTable>,
}

impl CodeTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style table insertion, replacing any existing table.
    pub fn with_table(mut self, table: CodeTable, lookup: LookupTable) -> Self {
        self.tables.insert(table, lookup);
        self
    }

    pub fn table(&self, table: CodeTable) -> Option<&LookupTable> {
        self.tables.get(&table)
    }

    /// Map a code to its label. Unknown tables, blank codes and unmapped
    /// codes all return `None`.
    pub fn label(&self, table: CodeTable, code: &str) -> Option<&str> {
        self.tables.get(&table).and_then(|t| t.get(code))
    }

    /// Look up a raw field value, keeping the code alongside its label.
    pub fn coded(&self, table: CodeTable, raw: &str) -> Coded {
        let code = raw.trim();
        if code.is_empty() {
            return Coded::default();
        }
        Coded {
            code: Some(code.to_string()),
            label: self.label(table, code).map(str::to_string),
        }
    }

    /// Serialize tables back to YAML (used when writing scraped tables).
    pub fn to_yaml(&self) -> Result<String, CodeTableError> {
        Ok(serde_yml::to_string(self)?)
    }
}

/// Parse and validate code tables from YAML content.
pub fn parse_code_tables(yaml_content: &str) -> Result<CodeTables, CodeTableError> {
    let tables: CodeTables = serde_yml::from_str(yaml_content)?;

    for (name, table) in &tables.tables {
        if table.prefix_len == Some(0) {
            return Err(CodeTableError::InvalidRule {
                table: name.to_string(),
                reason: "prefix_len must be at least 1".to_string(),
            });
        }
        for (code, label) in &table.entries {
            if label.trim().is_empty() {
                return Err(CodeTableError::EmptyLabel {
                    table: name.to_string(),
                    code: code.clone(),
                });
            }
        }
    }

    Ok(tables)
}

/// Load the code tables embedded at compile time.
pub fn load_default_code_tables() -> Result<CodeTables, CodeTableError> {
    parse_code_tables(include_str!("../../seed_data/fec_codes.yml"))
}

/// Load code tables from a YAML file on disk.
pub fn load_code_tables(path: impl AsRef<Path>) -> Result<CodeTables, CodeTableError> {
    let content = std::fs::read_to_string(path)?;
    parse_code_tables(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_default_tables() {
        let tables = load_default_code_tables().unwrap();
        for table in CodeTable::ALL {
            assert!(tables.table(table).is_some(), "missing table {}", table);
        }
    }

    #[test]
    fn test_entity_type_labels() {
        let tables = load_default_code_tables().unwrap();
        assert_eq!(tables.label(CodeTable::EntityType, "IND"), Some("Individual"));
        assert_eq!(tables.label(CodeTable::EntityType, "PAC"), Some("Political Action Committee"));
    }

    #[test]
    fn test_election_prefix_rule() {
        let tables = load_default_code_tables().unwrap();
        assert_eq!(tables.label(CodeTable::ElectionType, "P2020"), Some("Primary"));
        assert_eq!(tables.label(CodeTable::ElectionType, "G2018"), Some("General"));
        assert_eq!(tables.label(CodeTable::ElectionType, "G"), Some("General"));
    }

    #[test]
    fn test_unknown_code_is_none() {
        let tables = load_default_code_tables().unwrap();
        assert_eq!(tables.label(CodeTable::Party, "XYZ"), None);
        assert_eq!(tables.label(CodeTable::Party, ""), None);
        assert_eq!(tables.label(CodeTable::Party, "   "), None);
    }

    #[test]
    fn test_lowercase_code_falls_back_to_uppercase() {
        let tables = load_default_code_tables().unwrap();
        assert_eq!(tables.label(CodeTable::Party, "dem"), Some("Democratic Party"));
    }

    #[test]
    fn test_numeric_codes_stay_strings() {
        let tables = load_default_code_tables().unwrap();
        assert_eq!(tables.label(CodeTable::TransactionType, "15"), Some(
            "Contribution to political committees (other than Super PACs and Hybrid PACs) from an individual, partnership or limited liability company"
        ));
        assert_eq!(tables.label(CodeTable::ExpenditureCategory, "001"), Some("Administrative/Salary/Overhead Expenses"));
    }

    #[test]
    fn test_single_letter_codes_are_not_booleans() {
        let tables = load_default_code_tables().unwrap();
        assert_eq!(tables.label(CodeTable::Party, "N"), Some("Nonpartisan"));
        assert_eq!(tables.label(CodeTable::CommitteeType, "Y"), Some("Party - Qualified"));
    }

    #[test]
    fn test_coded_keeps_raw_code() {
        let tables = load_default_code_tables().unwrap();
        let coded = tables.coded(CodeTable::CommitteeDesignation, " D ");
        assert_eq!(coded.code.as_deref(), Some("D"));
        assert_eq!(coded.label.as_deref(), Some("Leadership PAC"));

        let unknown = tables.coded(CodeTable::CommitteeDesignation, "Q");
        assert_eq!(unknown.code.as_deref(), Some("Q"));
        assert_eq!(unknown.label_or_unknown(), "Unknown");
        assert_eq!(unknown.display(), Some("Q"));

        assert_eq!(tables.coded(CodeTable::Party, ""), Coded::default());
    }

    #[test]
    fn test_parse_rejects_zero_prefix() {
        let yaml = "tables:\n  election_type:\n    prefix_len: 0\n    entries:\n      P: Primary\n";
        assert!(matches!(
            parse_code_tables(yaml),
            Err(CodeTableError::InvalidRule { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_empty_label() {
        let yaml = "tables:\n  party:\n    entries:\n      DEM: \"\"\n";
        assert!(matches!(
            parse_code_tables(yaml),
            Err(CodeTableError::EmptyLabel { .. })
        ));
    }

    #[test]
    fn test_yaml_roundtrip_preserves_rules() {
        let tables = load_default_code_tables().unwrap();
        let yaml = tables.to_yaml().unwrap();
        let reparsed = parse_code_tables(&yaml).unwrap();
        assert_eq!(reparsed, tables);
    }

    #[test]
    fn test_with_table_builder() {
        let mut entries = BTreeMap::new();
        entries.insert("X".to_string(), "Example".to_string());
        let tables = CodeTables::new().with_table(CodeTable::Office, LookupTable::new(entries));
        assert_eq!(tables.label(CodeTable::Office, "X"), Some("Example"));
        assert_eq!(tables.label(CodeTable::Party, "X"), None);
    }
}
