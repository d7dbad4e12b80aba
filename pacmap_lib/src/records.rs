//! Normalized row types for the five FEC tables.
//!
//! Every record is built once from a raw pipe-delimited row by the
//! [`Normalizer`](crate::normalize::Normalizer), then mutated in place by later
//! stages: the merger fills the `*_name` display fields and the party resolver
//! fills [`TransferRecord::party`].

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::codes::Coded;
use crate::names::ParsedName;

/// Postal address; every part is optional.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    pub street1: Option<String>,
    pub street2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_primary: Option<String>,
    pub zip_secondary: Option<String>,
}

/// Individual contribution (itcont).
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ContributionRecord {
    pub recipient_committee_id: String,
    pub amendment_type: Coded,
    pub report_type: Coded,
    pub election_type: Coded,
    pub image_number: Option<String>,
    pub transaction_type: Coded,
    pub entity_type: Coded,
    pub raw_name: String,
    pub name: ParsedName,
    pub address: Address,
    pub employer: Option<String>,
    pub occupation: Option<String>,
    pub date: Option<NaiveDate>,
    pub amount: Decimal,
    pub other_id: Option<String>,
    pub transaction_id: Option<String>,
    pub report_id: Option<String>,
    pub memo_code: Option<String>,
    pub memo_text: Option<String>,
    /// Name of the receiving committee, attached by the merger.
    pub recipient_name: Option<String>,
}

/// Registered committee (cm).
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct CommitteeRecord {
    pub committee_id: String,
    pub committee_name: String,
    pub treasurer: Option<String>,
    pub address: Address,
    pub designation: Coded,
    pub committee_type: Coded,
    pub party: Coded,
    pub frequency: Coded,
    pub category: Coded,
    pub connection: Option<String>,
    pub candidate_id: Option<String>,
}

/// Registered candidate (cn).
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct CandidateRecord {
    pub candidate_id: String,
    pub raw_name: String,
    pub name: ParsedName,
    pub party: Coded,
    pub election_year: Option<i32>,
    pub election_state: Option<String>,
    pub race: Coded,
    pub district: Option<String>,
    pub incumbent_status: Coded,
    pub statutory_status: Coded,
    pub committee_id: Option<String>,
    pub address: Address,
    /// Name of the principal campaign committee, attached by the merger.
    pub committee_name: Option<String>,
}

/// Operating expenditure (oppexp).
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ExpenditureRecord {
    pub committee_id: String,
    pub amendment_type: Coded,
    pub report_year: Option<i32>,
    pub report_type: Coded,
    pub image_number: Option<String>,
    pub line_number: Option<String>,
    pub form_type: Option<String>,
    pub schedule_type: Option<String>,
    pub raw_payee: String,
    pub payee: ParsedName,
    pub address: Address,
    pub date: Option<NaiveDate>,
    pub amount: Decimal,
    pub election_type: Coded,
    pub purpose: Option<String>,
    pub category: Coded,
    pub category_description: Option<String>,
    pub memo_code: Option<String>,
    pub memo_text: Option<String>,
    pub entity_type: Coded,
    pub record_number: Option<String>,
    pub file_number: Option<String>,
    pub transaction_id: Option<String>,
    pub back_reference: Option<String>,
    /// Name of the spending committee, attached by the merger.
    pub committee_name: Option<String>,
}

/// Committee-to-committee transaction (itoth).
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TransferRecord {
    pub recipient_committee_id: String,
    pub amendment_type: Coded,
    pub report_type: Coded,
    pub election_type: Coded,
    pub image_number: Option<String>,
    pub transaction_type: Coded,
    pub entity_type: Coded,
    pub raw_sender: String,
    pub sender_name: ParsedName,
    pub address: Address,
    pub employer: Option<String>,
    pub occupation: Option<String>,
    pub date: Option<NaiveDate>,
    pub amount: Decimal,
    pub other_id: Option<String>,
    pub transaction_id: Option<String>,
    pub file_number: Option<String>,
    pub memo_code: Option<String>,
    pub memo_text: Option<String>,
    /// Name of the filing committee, attached by the merger.
    pub committee_name: Option<String>,
    /// Candidate whose first+last name matches the counterparty, if any.
    pub candidate_name: Option<String>,
    /// Resolved party label, `"Unknown"` or `"Unresolved"`.
    pub party: Option<String>,
}

/// Rows with a name and signed amount, as seen by the transaction filter.
pub trait Transaction {
    fn name(&self) -> &ParsedName;
    fn amount(&self) -> Decimal;
    fn date(&self) -> Option<NaiveDate>;
}

impl Transaction for ContributionRecord {
    fn name(&self) -> &ParsedName {
        &self.name
    }
    fn amount(&self) -> Decimal {
        self.amount
    }
    fn date(&self) -> Option<NaiveDate> {
        self.date
    }
}

impl Transaction for ExpenditureRecord {
    fn name(&self) -> &ParsedName {
        &self.payee
    }
    fn amount(&self) -> Decimal {
        self.amount
    }
    fn date(&self) -> Option<NaiveDate> {
        self.date
    }
}

impl Transaction for TransferRecord {
    fn name(&self) -> &ParsedName {
        &self.sender_name
    }
    fn amount(&self) -> Decimal {
        self.amount
    }
    fn date(&self) -> Option<NaiveDate> {
        self.date
    }
}

/// The five finalized tables handed to storage and the map layer.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct CleanTables {
    pub committees: Vec<CommitteeRecord>,
    pub individuals: Vec<ContributionRecord>,
    pub expenditures: Vec<ExpenditureRecord>,
    pub candidates: Vec<CandidateRecord>,
    pub transfers: Vec<TransferRecord>,
}

impl CleanTables {
    pub fn total_rows(&self) -> usize {
        self.committees.len()
            + self.individuals.len()
            + self.expenditures.len()
            + self.candidates.len()
            + self.transfers.len()
    }
}
