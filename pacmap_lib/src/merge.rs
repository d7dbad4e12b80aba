//! Registry joins that attach display names to transaction rows.
//!
//! All joins are left joins. Row counts never change; a key with no registry
//! entry leaves the display field as `None` and is counted in the
//! [`MergeReport`].

use std::collections::HashMap;

use serde::Serialize;

use crate::names::normalize_key;
use crate::records::{CandidateRecord, CleanTables, CommitteeRecord};

/// Join misses per target field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub individuals_unmatched: usize,
    pub expenditures_unmatched: usize,
    pub transfers_committee_unmatched: usize,
    pub transfers_candidate_matched: usize,
    pub candidates_committee_unmatched: usize,
    pub duplicate_committee_ids: usize,
}

/// Committee id to committee name; the first occurrence of an id wins.
pub struct CommitteeIndex<'a> {
    names: HashMap<&'a str, &'a str>,
    duplicates: usize,
}

impl<'a> CommitteeIndex<'a> {
    pub fn build(committees: &'a [CommitteeRecord]) -> Self {
        let mut names = HashMap::with_capacity(committees.len());
        let mut duplicates = 0;
        for committee in committees {
            if names.contains_key(committee.committee_id.as_str()) {
                duplicates += 1;
                tracing::warn!("duplicate committee id {}", committee.committee_id);
                continue;
            }
            names.insert(committee.committee_id.as_str(), committee.committee_name.as_str());
        }
        Self { names, duplicates }
    }

    pub fn name(&self, committee_id: &str) -> Option<&'a str> {
        self.names.get(committee_id.trim()).copied()
    }

    pub fn duplicates(&self) -> usize {
        self.duplicates
    }
}

/// Candidate name keyed by normalized first+last name; first match wins.
fn candidate_index(candidates: &[CandidateRecord]) -> HashMap<String, String> {
    let mut index = HashMap::new();
    for candidate in candidates {
        if candidate.name.first_last.is_empty() {
            continue;
        }
        index
            .entry(normalize_key(&candidate.name.first_last))
            .or_insert_with(|| candidate.name.name_full.clone());
    }
    index
}

/// Attach committee and candidate names across all tables.
pub fn merge_tables(tables: &mut CleanTables) -> MergeReport {
    let mut report = MergeReport::default();
    let CleanTables {
        committees,
        individuals,
        expenditures,
        candidates,
        transfers,
    } = tables;

    let committee_index = CommitteeIndex::build(committees);
    report.duplicate_committee_ids = committee_index.duplicates();

    for row in individuals.iter_mut() {
        row.recipient_name = committee_index
            .name(&row.recipient_committee_id)
            .map(str::to_string);
        if row.recipient_name.is_none() {
            report.individuals_unmatched += 1;
        }
    }

    for row in expenditures.iter_mut() {
        row.committee_name = committee_index.name(&row.committee_id).map(str::to_string);
        if row.committee_name.is_none() {
            report.expenditures_unmatched += 1;
        }
    }

    for row in candidates.iter_mut() {
        row.committee_name = row
            .committee_id
            .as_deref()
            .and_then(|id| committee_index.name(id))
            .map(str::to_string);
        if row.committee_name.is_none() {
            report.candidates_committee_unmatched += 1;
        }
    }

    let by_first_last = candidate_index(candidates);
    for row in transfers.iter_mut() {
        row.committee_name = committee_index
            .name(&row.recipient_committee_id)
            .map(str::to_string);
        if row.committee_name.is_none() {
            report.transfers_committee_unmatched += 1;
        }

        row.candidate_name = if row.sender_name.first_last.is_empty() {
            None
        } else {
            by_first_last
                .get(&normalize_key(&row.sender_name.first_last))
                .cloned()
        };
        if row.candidate_name.is_some() {
            report.transfers_candidate_matched += 1;
        }
    }

    tracing::info!(
        "Merged registries: {} individual, {} expenditure, {} transfer rows without a committee",
        report.individuals_unmatched,
        report.expenditures_unmatched,
        report.transfers_committee_unmatched
    );

    report
}
