//! Field normalization and record construction.
//!
//! The free-text helpers at the top of this module (title casing, blank
//! handling, amount coercion) are pure and used throughout the crate.
//! [`Normalizer`] combines them with the ZIP splitter, date parser, name parser
//! and code mapper to turn one positional row into a typed record.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::codes::{CodeTable, CodeTables};
use crate::dates::parse_fec_date;
use crate::names::{parse_name_for_entity, NameExceptions};
use crate::records::{
    Address, CandidateRecord, CommitteeRecord, ContributionRecord, ExpenditureRecord,
    TransferRecord,
};
use crate::zip::split_zip;

/// Values treated as missing in text columns.
const BLANK_SENTINELS: &[&str] = &["nan", "NaN", "None", "null", "NULL"];

/// Title-case a string the way Python's `str.title` does: a letter is
/// uppercased when the preceding character is not a letter, and lowercased
/// otherwise. `O'BRIEN` becomes `O'Brien`, `II` becomes `Ii`.
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut prev_is_letter = false;
    for c in value.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}

/// Trim a raw field; blank values and null sentinels become `None`.
pub fn clean_optional(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || BLANK_SENTINELS.contains(&trimmed) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Free text (city, employer, occupation, memo, purpose): title-cased with
/// whitespace collapsed.
pub fn clean_text(raw: &str) -> Option<String> {
    clean_optional(raw).map(|value| {
        title_case(&value)
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    })
}

/// State and other short codes: trimmed and uppercased.
pub fn clean_code(raw: &str) -> Option<String> {
    clean_optional(raw).map(|value| value.to_uppercase())
}

/// Parse a signed amount. Unparseable values become zero, which the
/// transaction filter never touches.
pub fn parse_amount(raw: &str) -> Decimal {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != '$' && *c != ',')
        .collect();
    if cleaned.is_empty() {
        return Decimal::ZERO;
    }
    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .unwrap_or_else(|_| {
            tracing::warn!("unparseable amount {:?}, using 0", raw);
            Decimal::ZERO
        })
}

/// Parse an integer column such as an election year.
pub fn parse_int(raw: &str) -> Option<i32> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_suffix(".0").unwrap_or(trimmed);
    trimmed.parse().ok()
}

fn field<'a>(fields: &[&'a str], idx: usize) -> &'a str {
    fields.get(idx).copied().unwrap_or("")
}

fn address(fields: &[&str], street1: Option<usize>, street2: Option<usize>, city: usize, state: usize, zip: usize) -> Address {
    let zip = split_zip(field(fields, zip));
    Address {
        street1: street1.and_then(|i| clean_text(field(fields, i))),
        street2: street2.and_then(|i| clean_text(field(fields, i))),
        city: clean_text(field(fields, city)),
        state: clean_code(field(fields, state)),
        zip_primary: zip.primary,
        zip_secondary: zip.secondary,
    }
}

/// Column positions of the individual contributions file (21 fields).
pub mod individual_cols {
    pub const COMMITTEE_ID: usize = 0;
    pub const AMENDMENT: usize = 1;
    pub const REPORT: usize = 2;
    pub const ELECTION: usize = 3;
    pub const IMAGE: usize = 4;
    pub const TRANSACTION_TYPE: usize = 5;
    pub const ENTITY: usize = 6;
    pub const NAME: usize = 7;
    pub const CITY: usize = 8;
    pub const STATE: usize = 9;
    pub const ZIP: usize = 10;
    pub const EMPLOYER: usize = 11;
    pub const OCCUPATION: usize = 12;
    pub const DATE: usize = 13;
    pub const AMOUNT: usize = 14;
    pub const OTHER_ID: usize = 15;
    pub const TRANSACTION_ID: usize = 16;
    pub const REPORT_ID: usize = 17;
    pub const MEMO_CODE: usize = 18;
    pub const MEMO_TEXT: usize = 19;
    pub const COUNT: usize = 21;
}

/// Column positions of the committee master file (15 fields).
pub mod committee_cols {
    pub const ID: usize = 0;
    pub const NAME: usize = 1;
    pub const TREASURER: usize = 2;
    pub const STREET1: usize = 3;
    pub const STREET2: usize = 4;
    pub const CITY: usize = 5;
    pub const STATE: usize = 6;
    pub const ZIP: usize = 7;
    pub const DESIGNATION: usize = 8;
    pub const TYPE: usize = 9;
    pub const PARTY: usize = 10;
    pub const FREQUENCY: usize = 11;
    pub const CATEGORY: usize = 12;
    pub const CONNECTION: usize = 13;
    pub const CANDIDATE_ID: usize = 14;
    pub const COUNT: usize = 15;
}

/// Column positions of the candidate master file (15 fields).
pub mod candidate_cols {
    pub const ID: usize = 0;
    pub const NAME: usize = 1;
    pub const PARTY: usize = 2;
    pub const ELECTION_YEAR: usize = 3;
    pub const ELECTION_STATE: usize = 4;
    pub const RACE: usize = 5;
    pub const DISTRICT: usize = 6;
    pub const INCUMBENT: usize = 7;
    pub const STATUS: usize = 8;
    pub const COMMITTEE_ID: usize = 9;
    pub const STREET1: usize = 10;
    pub const STREET2: usize = 11;
    pub const CITY: usize = 12;
    pub const STATE: usize = 13;
    pub const ZIP: usize = 14;
    pub const COUNT: usize = 15;
}

/// Column positions of the committee-to-committee file (21 fields).
pub mod transfer_cols {
    pub const RECIPIENT_ID: usize = 0;
    pub const AMENDMENT: usize = 1;
    pub const REPORT: usize = 2;
    pub const ELECTION: usize = 3;
    pub const IMAGE: usize = 4;
    pub const TRANSACTION_TYPE: usize = 5;
    pub const ENTITY: usize = 6;
    pub const SENDER_NAME: usize = 7;
    pub const CITY: usize = 8;
    pub const STATE: usize = 9;
    pub const ZIP: usize = 10;
    pub const EMPLOYER: usize = 11;
    pub const OCCUPATION: usize = 12;
    pub const DATE: usize = 13;
    pub const AMOUNT: usize = 14;
    pub const OTHER_ID: usize = 15;
    pub const TRANSACTION_ID: usize = 16;
    pub const FILE: usize = 17;
    pub const MEMO: usize = 18;
    pub const MEMO_TEXT: usize = 19;
    pub const COUNT: usize = 21;
}

/// Column positions of the operating expenditures file (26 fields).
pub mod expenditure_cols {
    pub const COMMITTEE_ID: usize = 0;
    pub const AMENDMENT: usize = 1;
    pub const YEAR: usize = 2;
    pub const REPORT: usize = 3;
    pub const IMAGE: usize = 4;
    pub const LINE: usize = 5;
    pub const FORM: usize = 6;
    pub const SCHEDULE: usize = 7;
    pub const PAYEE: usize = 8;
    pub const CITY: usize = 9;
    pub const STATE: usize = 10;
    pub const ZIP: usize = 11;
    pub const DATE: usize = 12;
    pub const AMOUNT: usize = 13;
    pub const ELECTION: usize = 14;
    pub const PURPOSE: usize = 15;
    pub const CATEGORY: usize = 16;
    pub const CATEGORY_DESCRIPTION: usize = 17;
    pub const MEMO: usize = 18;
    pub const MEMO_TEXT: usize = 19;
    pub const ENTITY: usize = 20;
    pub const RECORD: usize = 21;
    pub const FILE: usize = 22;
    pub const TRANSACTION: usize = 23;
    pub const BACK_REF: usize = 24;
    pub const COUNT: usize = 26;
}

/// Builds typed records from positional fields.
///
/// Holds the code tables and the name exception table by reference; both are
/// built once before the pipeline starts and never mutated. Every method is a
/// pure per-row mapping, so rows can be processed in any order.
#[derive(Clone, Copy)]
pub struct Normalizer<'a> {
    codes: &'a CodeTables,
    exceptions: &'a NameExceptions,
}

impl<'a> Normalizer<'a> {
    pub fn new(codes: &'a CodeTables, exceptions: &'a NameExceptions) -> Self {
        Self { codes, exceptions }
    }

    pub fn contribution(&self, fields: &[&str]) -> ContributionRecord {
        use individual_cols as c;

        let entity_type = self.codes.coded(CodeTable::EntityType, field(fields, c::ENTITY));
        let raw_name = field(fields, c::NAME).trim().to_string();
        let name = parse_name_for_entity(&raw_name, entity_type.code.as_deref(), self.exceptions);

        ContributionRecord {
            recipient_committee_id: field(fields, c::COMMITTEE_ID).trim().to_string(),
            amendment_type: self.codes.coded(CodeTable::Amendment, field(fields, c::AMENDMENT)),
            report_type: self.codes.coded(CodeTable::ReportType, field(fields, c::REPORT)),
            election_type: self.codes.coded(CodeTable::ElectionType, field(fields, c::ELECTION)),
            image_number: clean_optional(field(fields, c::IMAGE)),
            transaction_type: self
                .codes
                .coded(CodeTable::TransactionType, field(fields, c::TRANSACTION_TYPE)),
            entity_type,
            raw_name,
            name,
            address: address(fields, None, None, c::CITY, c::STATE, c::ZIP),
            employer: clean_text(field(fields, c::EMPLOYER)),
            occupation: clean_text(field(fields, c::OCCUPATION)),
            date: parse_fec_date(field(fields, c::DATE)),
            amount: parse_amount(field(fields, c::AMOUNT)),
            other_id: clean_optional(field(fields, c::OTHER_ID)),
            transaction_id: clean_optional(field(fields, c::TRANSACTION_ID)),
            report_id: clean_optional(field(fields, c::REPORT_ID)),
            memo_code: clean_code(field(fields, c::MEMO_CODE)),
            memo_text: clean_text(field(fields, c::MEMO_TEXT)),
            recipient_name: None,
        }
    }

    pub fn committee(&self, fields: &[&str]) -> CommitteeRecord {
        use committee_cols as c;

        CommitteeRecord {
            committee_id: field(fields, c::ID).trim().to_string(),
            committee_name: clean_optional(field(fields, c::NAME)).unwrap_or_default(),
            treasurer: clean_text(field(fields, c::TREASURER)),
            address: address(
                fields,
                Some(c::STREET1),
                Some(c::STREET2),
                c::CITY,
                c::STATE,
                c::ZIP,
            ),
            designation: self
                .codes
                .coded(CodeTable::CommitteeDesignation, field(fields, c::DESIGNATION)),
            committee_type: self.codes.coded(CodeTable::CommitteeType, field(fields, c::TYPE)),
            party: self.codes.coded(CodeTable::Party, field(fields, c::PARTY)),
            frequency: self
                .codes
                .coded(CodeTable::FilingFrequency, field(fields, c::FREQUENCY)),
            category: self
                .codes
                .coded(CodeTable::InterestGroup, field(fields, c::CATEGORY)),
            connection: clean_optional(field(fields, c::CONNECTION)),
            candidate_id: clean_optional(field(fields, c::CANDIDATE_ID)),
        }
    }

    pub fn candidate(&self, fields: &[&str]) -> CandidateRecord {
        use candidate_cols as c;

        let raw_name = field(fields, c::NAME).trim().to_string();
        // Candidates are always people; the entity hint is "CAN".
        let name = parse_name_for_entity(&raw_name, Some("CAN"), self.exceptions);

        CandidateRecord {
            candidate_id: field(fields, c::ID).trim().to_string(),
            raw_name,
            name,
            party: self.codes.coded(CodeTable::Party, field(fields, c::PARTY)),
            election_year: parse_int(field(fields, c::ELECTION_YEAR)),
            election_state: clean_code(field(fields, c::ELECTION_STATE)),
            race: self.codes.coded(CodeTable::Office, field(fields, c::RACE)),
            district: clean_optional(field(fields, c::DISTRICT)),
            incumbent_status: self
                .codes
                .coded(CodeTable::IncumbentChallenger, field(fields, c::INCUMBENT)),
            statutory_status: self
                .codes
                .coded(CodeTable::CandidateStatus, field(fields, c::STATUS)),
            committee_id: clean_optional(field(fields, c::COMMITTEE_ID)),
            address: address(
                fields,
                Some(c::STREET1),
                Some(c::STREET2),
                c::CITY,
                c::STATE,
                c::ZIP,
            ),
            committee_name: None,
        }
    }

    pub fn expenditure(&self, fields: &[&str]) -> ExpenditureRecord {
        use expenditure_cols as c;

        let entity_type = self.codes.coded(CodeTable::EntityType, field(fields, c::ENTITY));
        let raw_payee = field(fields, c::PAYEE).trim().to_string();
        let payee = parse_name_for_entity(&raw_payee, entity_type.code.as_deref(), self.exceptions);

        ExpenditureRecord {
            committee_id: field(fields, c::COMMITTEE_ID).trim().to_string(),
            amendment_type: self.codes.coded(CodeTable::Amendment, field(fields, c::AMENDMENT)),
            report_year: parse_int(field(fields, c::YEAR)),
            report_type: self.codes.coded(CodeTable::ReportType, field(fields, c::REPORT)),
            image_number: clean_optional(field(fields, c::IMAGE)),
            line_number: clean_optional(field(fields, c::LINE)),
            form_type: clean_code(field(fields, c::FORM)),
            schedule_type: clean_code(field(fields, c::SCHEDULE)),
            raw_payee,
            payee,
            address: address(fields, None, None, c::CITY, c::STATE, c::ZIP),
            date: parse_fec_date(field(fields, c::DATE)),
            amount: parse_amount(field(fields, c::AMOUNT)),
            election_type: self.codes.coded(CodeTable::ElectionType, field(fields, c::ELECTION)),
            purpose: clean_text(field(fields, c::PURPOSE)),
            category: self
                .codes
                .coded(CodeTable::ExpenditureCategory, field(fields, c::CATEGORY)),
            category_description: clean_text(field(fields, c::CATEGORY_DESCRIPTION)),
            memo_code: clean_code(field(fields, c::MEMO)),
            memo_text: clean_text(field(fields, c::MEMO_TEXT)),
            entity_type,
            record_number: clean_optional(field(fields, c::RECORD)),
            file_number: clean_optional(field(fields, c::FILE)),
            transaction_id: clean_optional(field(fields, c::TRANSACTION)),
            back_reference: clean_optional(field(fields, c::BACK_REF)),
            committee_name: None,
        }
    }

    pub fn transfer(&self, fields: &[&str]) -> TransferRecord {
        use transfer_cols as c;

        let entity_type = self.codes.coded(CodeTable::EntityType, field(fields, c::ENTITY));
        let raw_sender = field(fields, c::SENDER_NAME).trim().to_string();
        let sender_name =
            parse_name_for_entity(&raw_sender, entity_type.code.as_deref(), self.exceptions);

        TransferRecord {
            recipient_committee_id: field(fields, c::RECIPIENT_ID).trim().to_string(),
            amendment_type: self.codes.coded(CodeTable::Amendment, field(fields, c::AMENDMENT)),
            report_type: self.codes.coded(CodeTable::ReportType, field(fields, c::REPORT)),
            election_type: self.codes.coded(CodeTable::ElectionType, field(fields, c::ELECTION)),
            image_number: clean_optional(field(fields, c::IMAGE)),
            transaction_type: self
                .codes
                .coded(CodeTable::TransactionType, field(fields, c::TRANSACTION_TYPE)),
            entity_type,
            raw_sender,
            sender_name,
            address: address(fields, None, None, c::CITY, c::STATE, c::ZIP),
            employer: clean_text(field(fields, c::EMPLOYER)),
            occupation: clean_text(field(fields, c::OCCUPATION)),
            date: parse_fec_date(field(fields, c::DATE)),
            amount: parse_amount(field(fields, c::AMOUNT)),
            other_id: clean_optional(field(fields, c::OTHER_ID)),
            transaction_id: clean_optional(field(fields, c::TRANSACTION_ID)),
            file_number: clean_optional(field(fields, c::FILE)),
            memo_code: clean_code(field(fields, c::MEMO)),
            memo_text: clean_text(field(fields, c::MEMO_TEXT)),
            committee_name: None,
            candidate_name: None,
            party: None,
        }
    }
}
