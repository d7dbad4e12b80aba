//! Code-description scraper for the FEC's published lookup pages.
//!
//! Each FEC code table (party codes, report types, ...) is published as an
//! HTML table. The scraper fetches a page and reads code/label pairs out of
//! its cells according to a [`SchemaHint`].

use std::collections::BTreeMap;
use std::time::Duration;

use regex::Regex;
use reqwest::StatusCode;

use crate::codes::{CodeTable, CodeTables, LookupTable};

const USER_AGENT: &str = concat!("pacmap/", env!("CARGO_PKG_VERSION"));

#[derive(thiserror::Error, Debug)]
pub enum ScrapeError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status} from {url}")]
    HttpStatus { status: StatusCode, url: String },
    #[error("parse error: {0}")]
    Parse(String),
}

/// Where code and label live among a table row's cells.
///
/// Rows are split into groups of `cells_per_entry` cells; pages that print
/// two code/label pairs side by side use `cells_per_entry = 2` with two
/// groups per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaHint {
    pub cells_per_entry: usize,
    pub code_cell: usize,
    pub label_cell: usize,
}

impl Default for SchemaHint {
    fn default() -> Self {
        Self {
            cells_per_entry: 2,
            code_cell: 0,
            label_cell: 1,
        }
    }
}

/// One published code page.
#[derive(Debug, Clone)]
pub struct CodeSource {
    pub table: CodeTable,
    pub path: &'static str,
    pub hint: SchemaHint,
}

/// The FEC pages that back the scraped tables, relative to the site root.
pub fn default_sources() -> Vec<CodeSource> {
    let pair = SchemaHint::default();
    vec![
        CodeSource {
            table: CodeTable::Party,
            path: "/campaign-finance-data/party-code-descriptions/",
            hint: pair,
        },
        CodeSource {
            table: CodeTable::ReportType,
            path: "/campaign-finance-data/report-type-code-descriptions/",
            hint: SchemaHint {
                cells_per_entry: 3,
                code_cell: 0,
                label_cell: 1,
            },
        },
        CodeSource {
            table: CodeTable::TransactionType,
            path: "/campaign-finance-data/transaction-type-code-descriptions/",
            hint: pair,
        },
        CodeSource {
            table: CodeTable::CommitteeType,
            path: "/campaign-finance-data/committee-type-code-descriptions/",
            hint: SchemaHint {
                cells_per_entry: 3,
                code_cell: 0,
                label_cell: 1,
            },
        },
    ]
}

pub struct CodeScraper {
    base_url: String,
    http: reqwest::Client,
}

impl CodeScraper {
    pub fn new() -> Result<Self, ScrapeError> {
        Self::with_base_url("https://www.fec.gov")
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, ScrapeError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Fetch one page and return its code-to-label mapping.
    pub async fn lookup_table(
        &self,
        source_url: &str,
        hint: &SchemaHint,
    ) -> Result<BTreeMap<String, String>, ScrapeError> {
        let html = self.fetch_html(source_url).await?;
        parse_lookup_table(&html, hint)
    }

    /// Scrape every source and layer the results over `base`. Tables that
    /// fail to download keep their existing entries and are logged.
    pub async fn refresh_tables(
        &self,
        base: CodeTables,
        sources: &[CodeSource],
    ) -> (CodeTables, Vec<(CodeTable, ScrapeError)>) {
        let mut tables = base;
        let mut failures = Vec::new();

        for source in sources {
            let url = format!("{}{}", self.base_url, source.path);
            match self.lookup_table(&url, &source.hint).await {
                Ok(entries) => {
                    tracing::info!("Fetched {} {} codes", entries.len(), source.table);
                    let prefix_len = tables.table(source.table).and_then(|t| t.prefix_len);
                    let mut lookup = LookupTable::new(entries);
                    lookup.prefix_len = prefix_len;
                    tables = tables.with_table(source.table, lookup);
                }
                Err(e) => {
                    tracing::warn!("Failed to fetch {} codes: {}", source.table, e);
                    failures.push((source.table, e));
                }
            }
        }

        (tables, failures)
    }

    async fn fetch_html(&self, url: &str) -> Result<String, ScrapeError> {
        let resp = self
            .http
            .get(url)
            .header("accept", "text/html,application/xhtml+xml")
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(ScrapeError::HttpStatus {
                status: resp.status(),
                url: url.to_string(),
            });
        }

        Ok(resp.text().await?)
    }
}

fn compile(pattern: &str) -> Result<Regex, ScrapeError> {
    Regex::new(pattern).map_err(|e| ScrapeError::Parse(format!("regex compile error: {}", e)))
}

/// Extract code/label pairs from the `<table>` rows of an HTML page.
///
/// Header rows (all `<th>` cells) are skipped; cell markup is stripped and
/// common entities decoded. A code appearing twice keeps its first label.
pub fn parse_lookup_table(
    html: &str,
    hint: &SchemaHint,
) -> Result<BTreeMap<String, String>, ScrapeError> {
    if hint.cells_per_entry == 0
        || hint.code_cell >= hint.cells_per_entry
        || hint.label_cell >= hint.cells_per_entry
    {
        return Err(ScrapeError::Parse(format!("invalid schema hint {:?}", hint)));
    }

    let row_re = compile(r"(?is)<tr[^>]*>(.*?)</tr>")?;
    let cell_re = compile(r"(?is)<t([dh])[^>]*>(.*?)</t[dh]>")?;
    let tag_re = compile(r"(?s)<[^>]+>")?;

    let mut entries = BTreeMap::new();
    for row in row_re.captures_iter(html) {
        let mut cells = Vec::new();
        let mut has_data_cell = false;
        for cell in cell_re.captures_iter(&row[1]) {
            if cell[1].eq_ignore_ascii_case("d") {
                has_data_cell = true;
            }
            cells.push(clean_cell(&tag_re, &cell[2]));
        }
        if !has_data_cell {
            continue;
        }

        for group in cells.chunks(hint.cells_per_entry) {
            if group.len() < hint.cells_per_entry {
                continue;
            }
            let code = &group[hint.code_cell];
            let label = &group[hint.label_cell];
            if code.is_empty() || label.is_empty() {
                continue;
            }
            entries
                .entry(code.clone())
                .or_insert_with(|| label.clone());
        }
    }

    if entries.is_empty() {
        return Err(ScrapeError::Parse("no code rows found".into()));
    }
    Ok(entries)
}

fn clean_cell(tag_re: &Regex, raw: &str) -> String {
    let text = tag_re.replace_all(raw, " ");
    let decoded = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&");
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARTY_PAGE: &str = r#"
<html><body>
<table class="simple-table">
  <thead><tr><th>Party code</th><th>Party description</th></tr></thead>
  <tbody>
    <tr><td>DEM</td><td>Democratic Party</td></tr>
    <tr><td><strong>REP</strong></td><td>Republican   Party</td></tr>
    <tr><td>GRE</td><td>Green Party &amp; Allies</td></tr>
    <tr><td></td><td>Orphan label</td></tr>
    <tr><td>DEM</td><td>Duplicate</td></tr>
  </tbody>
</table>
</body></html>
"#;

    #[test]
    fn test_parse_pairs() {
        let entries = parse_lookup_table(PARTY_PAGE, &SchemaHint::default()).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries["DEM"], "Democratic Party");
        assert_eq!(entries["REP"], "Republican Party");
        assert_eq!(entries["GRE"], "Green Party & Allies");
    }

    #[test]
    fn test_three_cell_rows() {
        let html = "<table><tr><th>Code</th><th>Type</th><th>Explanation</th></tr>\
                    <tr><td>Q1</td><td>April Quarterly</td><td>Covers Jan-Mar</td></tr></table>";
        let hint = SchemaHint {
            cells_per_entry: 3,
            code_cell: 0,
            label_cell: 1,
        };
        let entries = parse_lookup_table(html, &hint).unwrap();
        assert_eq!(entries["Q1"], "April Quarterly");
    }

    #[test]
    fn test_side_by_side_pairs() {
        let html = "<table><tr><td>AK</td><td>Alaska</td><td>AL</td><td>Alabama</td></tr></table>";
        let entries = parse_lookup_table(html, &SchemaHint::default()).unwrap();
        assert_eq!(entries["AK"], "Alaska");
        assert_eq!(entries["AL"], "Alabama");
    }

    #[test]
    fn test_no_rows_is_error() {
        let result = parse_lookup_table("<p>nothing</p>", &SchemaHint::default());
        assert!(matches!(result, Err(ScrapeError::Parse(_))));
    }

    #[test]
    fn test_invalid_hint_is_error() {
        let hint = SchemaHint {
            cells_per_entry: 2,
            code_cell: 0,
            label_cell: 2,
        };
        assert!(matches!(
            parse_lookup_table(PARTY_PAGE, &hint),
            Err(ScrapeError::Parse(_))
        ));
    }

    #[test]
    fn test_default_sources_have_paths() {
        let sources = default_sources();
        assert!(sources.iter().any(|s| s.table == CodeTable::Party));
        assert!(sources.iter().all(|s| s.path.starts_with('/')));
    }
}
