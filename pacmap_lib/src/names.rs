//! Contributor and payee name parsing.
//!
//! FEC name fields are free text typed by filers. The dominant convention is
//! `LAST, FIRST MIDDLE`, but the same column also carries couples
//! (`LAST, FIRST & FIRST2`), organizations (`ACME & SONS`), bare single words,
//! and names that never received a comma. [`parse_name`] applies an ordered
//! set of heuristics (first match wins) and always returns a [`ParsedName`],
//! possibly with empty fields; it never fails.
//!
//! Names the heuristic is known to get wrong are listed in a
//! [`NameExceptions`] table that is consulted before any heuristic runs.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::normalize::title_case;

/// Error types for the name exception table.
#[derive(Error, Debug)]
pub enum NameExceptionError {
    #[error("TOML parse error: {0}")]
    TomlParse(String),
    #[error("Failed to read exception file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Duplicate raw name in exception table: {0}")]
    Duplicate(String),
}

/// Structured form of a raw name string.
///
/// `first_last` is empty exactly when the name was classified as an
/// organization, so downstream code can use it to tell people from payees.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedName {
    pub name_full: String,
    pub first_last: String,
    pub first: String,
    pub middle: String,
    pub last: String,
}

impl ParsedName {
    /// Organization-only name.
    pub fn organization(name_full: impl Into<String>) -> Self {
        Self {
            name_full: name_full.into(),
            ..Self::default()
        }
    }

    pub fn is_organization(&self) -> bool {
        self.first_last.is_empty() && !self.name_full.is_empty()
    }

    /// Key used to compare names across rows: lowercase, whitespace collapsed.
    /// Prefers `first_last` and falls back to the full name for organizations.
    pub fn match_key(&self) -> String {
        let source = if self.first_last.is_empty() {
            &self.name_full
        } else {
            &self.first_last
        };
        normalize_key(source)
    }
}

/// Lowercase and collapse whitespace; the comparison form for name strings.
pub fn normalize_key(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// One row of the exception TOML file.
#[derive(Deserialize, Debug, Clone)]
pub struct NameException {
    pub raw: String,
    #[serde(default)]
    pub first: String,
    #[serde(default)]
    pub middle: String,
    #[serde(default)]
    pub last: String,
    #[serde(default)]
    pub full: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ExceptionFile {
    #[serde(default)]
    exception: Vec<NameException>,
}

/// Known data-quality exceptions, keyed by raw name.
#[derive(Debug, Clone, Default)]
pub struct NameExceptions {
    by_raw: HashMap<String, ParsedName>,
}

impl NameExceptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<NameException>) -> Result<Self, NameExceptionError> {
        let mut by_raw = HashMap::new();
        for entry in entries {
            let key = exception_key(&entry.raw);
            let parsed = ParsedName {
                name_full: entry
                    .full
                    .clone()
                    .unwrap_or_else(|| join_nonempty(&[&entry.first, &entry.middle, &entry.last])),
                first_last: join_nonempty(&[&entry.first, &entry.last]),
                first: entry.first,
                middle: entry.middle,
                last: entry.last,
            };
            if by_raw.insert(key, parsed).is_some() {
                return Err(NameExceptionError::Duplicate(entry.raw));
            }
        }
        Ok(Self { by_raw })
    }

    pub fn get(&self, raw: &str) -> Option<&ParsedName> {
        if self.by_raw.is_empty() {
            return None;
        }
        self.by_raw.get(&exception_key(raw))
    }

    pub fn len(&self) -> usize {
        self.by_raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_raw.is_empty()
    }
}

fn exception_key(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Parse exception entries from TOML content.
pub fn parse_name_exceptions(toml_content: &str) -> Result<NameExceptions, NameExceptionError> {
    let file: ExceptionFile =
        toml::from_str(toml_content).map_err(|e| NameExceptionError::TomlParse(e.to_string()))?;
    NameExceptions::from_entries(file.exception)
}

/// Load the exception table embedded at compile time.
pub fn load_default_name_exceptions() -> Result<NameExceptions, NameExceptionError> {
    parse_name_exceptions(include_str!("../../seed_data/name_exceptions.toml"))
}

pub fn load_name_exceptions(path: impl AsRef<Path>) -> Result<NameExceptions, NameExceptionError> {
    let content = std::fs::read_to_string(path)?;
    parse_name_exceptions(&content)
}

/// FEC entity type codes that never describe a person.
const ORGANIZATION_ENTITY_CODES: &[&str] = &["COM", "CCM", "ORG", "PAC", "PTY"];

/// Standalone tokens that mark a comma-less name as a business.
const ORGANIZATION_TOKENS: &[&str] = &["LLC", "LP"];

/// Roman numeral II after title-casing; dropped from name and last fields.
const SUFFIX_II: &str = "Ii";

#[derive(Debug, Clone, Copy, PartialEq)]
enum NameKind {
    Single,
    Organization,
    Joint,
    Person,
}

struct RawParts {
    kind: NameKind,
    full: String,
    first: String,
    middle: String,
    last: String,
}

/// Parse a raw name string.
///
/// Precedence:
/// 1. exception table hit
/// 2. one token: first and full name
/// 3. `&` without a comma (or a standalone `LLC`/`LP` token): organization
/// 4. `&` with a comma: joint filers sharing the leading last name
/// 5. comma present: everything through the first comma-bearing token is the
///    last name, then first, then an optional middle name
/// 6. no comma: first token last name, second token first name
pub fn parse_name(raw: &str, exceptions: &NameExceptions) -> ParsedName {
    if let Some(known) = exceptions.get(raw) {
        return known.clone();
    }

    let spaced = space_separators(raw.trim());
    let tokens: Vec<&str> = spaced.split_whitespace().collect();
    let has_comma = spaced.contains(',');
    let has_ampersand = spaced.contains('&');

    let parts = match tokens.len() {
        0 => return ParsedName::default(),
        1 => RawParts {
            kind: NameKind::Single,
            full: tokens[0].to_string(),
            first: tokens[0].to_string(),
            middle: String::new(),
            last: String::new(),
        },
        _ if !has_comma && (has_ampersand || has_organization_token(&tokens)) => {
            organization_parts(&tokens)
        }
        _ if has_ampersand => joint_parts(&tokens),
        _ => match tokens.iter().position(|t| t.contains(',')) {
            Some(comma_idx) => person_parts(&tokens, comma_idx),
            None => fallback_parts(&tokens),
        },
    };

    finish(parts)
}

/// Parse a name, forcing the organization branch for organizational FEC
/// entity types (`COM`, `CCM`, `ORG`, `PAC`, `PTY`).
pub fn parse_name_for_entity(
    raw: &str,
    entity_code: Option<&str>,
    exceptions: &NameExceptions,
) -> ParsedName {
    if let Some(known) = exceptions.get(raw) {
        return known.clone();
    }

    let is_org_entity = entity_code
        .map(|code| ORGANIZATION_ENTITY_CODES.contains(&code.trim().to_uppercase().as_str()))
        .unwrap_or(false);

    if is_org_entity {
        let spaced = space_separators(raw.trim());
        let tokens: Vec<&str> = spaced.split_whitespace().collect();
        if tokens.is_empty() {
            return ParsedName::default();
        }
        return finish(organization_parts(&tokens));
    }

    parse_name(raw, exceptions)
}

/// Put a space after every comma and around every ampersand so that
/// `SMITH,JOHN` and `JOHN&JANE` tokenize like their spaced forms.
fn space_separators(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 8);
    for c in raw.chars() {
        match c {
            ',' => out.push_str(", "),
            '&' => out.push_str(" & "),
            _ => out.push(c),
        }
    }
    out
}

fn has_organization_token(tokens: &[&str]) -> bool {
    tokens.iter().any(|t| {
        let bare = t.trim_matches(|c: char| !c.is_ascii_alphanumeric());
        ORGANIZATION_TOKENS
            .iter()
            .any(|marker| bare.eq_ignore_ascii_case(marker))
    })
}

fn organization_parts(tokens: &[&str]) -> RawParts {
    RawParts {
        kind: NameKind::Organization,
        full: tokens.join(" "),
        first: String::new(),
        middle: String::new(),
        last: String::new(),
    }
}

fn joint_parts(tokens: &[&str]) -> RawParts {
    let last = tokens[0].trim_end_matches(',').to_string();
    let first = tokens[1..].join(" ");
    RawParts {
        kind: NameKind::Joint,
        full: first.clone(),
        first,
        middle: String::new(),
        last,
    }
}

fn person_parts(tokens: &[&str], comma_idx: usize) -> RawParts {
    let last = tokens[..=comma_idx].join(" ");
    let first = tokens.get(comma_idx + 1).copied().unwrap_or("").to_string();
    let middle = tokens
        .get(comma_idx + 2)
        .copied()
        .filter(|t| !is_title_marker(t))
        .unwrap_or("")
        .to_string();
    RawParts {
        kind: NameKind::Person,
        full: join_nonempty(&[&first, &middle, &last]),
        first,
        middle,
        last,
    }
}

fn fallback_parts(tokens: &[&str]) -> RawParts {
    RawParts {
        kind: NameKind::Person,
        full: tokens.join(" "),
        first: tokens.get(1).copied().unwrap_or("").to_string(),
        middle: String::new(),
        last: tokens[0].to_string(),
    }
}

/// Tokens in the middle-name slot that are titles or suffixes, not names.
fn is_title_marker(token: &str) -> bool {
    let upper = token.to_uppercase();
    upper.contains('.') || upper.contains("MR") || upper == "OTHER"
}

fn finish(parts: RawParts) -> ParsedName {
    let first = clean_field(&parts.first);
    let middle = drop_suffix_ii(&clean_field(&parts.middle));
    let last = drop_suffix_ii(&clean_field(&parts.last));
    let name_full = drop_suffix_ii(&clean_field(&parts.full));

    let first_last = match parts.kind {
        NameKind::Organization => String::new(),
        NameKind::Single => first.clone(),
        NameKind::Joint | NameKind::Person => join_nonempty(&[&first, &last]),
    };

    ParsedName {
        name_full,
        first_last,
        first,
        middle,
        last,
    }
}

fn clean_field(value: &str) -> String {
    let without_commas: String = value.chars().filter(|c| *c != ',').collect();
    let titled = title_case(&without_commas);
    titled.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn drop_suffix_ii(value: &str) -> String {
    value
        .split_whitespace()
        .filter(|t| *t != SUFFIX_II)
        .collect::<Vec<_>>()
        .join(" ")
}

fn join_nonempty(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}
