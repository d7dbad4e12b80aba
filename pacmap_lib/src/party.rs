//! Party inference for committee-to-committee transfers.
//!
//! Transfer rows name the counterparty committee but not its party. The
//! resolver fuzzy-matches each distinct counterparty name against the
//! candidates' principal committee names first, then against the committee
//! registry, and broadcasts the winning party to every row with that name.

use std::collections::HashMap;

use serde::Serialize;

use crate::codes::Coded;
use crate::fuzzy::{sorted_similarity, sorted_tokens};
use crate::records::{CandidateRecord, CommitteeRecord, TransferRecord};

/// Label for a match whose party code is blank.
pub const UNKNOWN_PARTY: &str = "Unknown";
/// Label for a name that matched nothing above threshold.
pub const UNRESOLVED_PARTY: &str = "Unresolved";

pub const DEFAULT_THRESHOLD: f64 = 95.0;

/// Where a resolved party came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PartySource {
    Candidate,
    Committee,
    Unresolved,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartyResolution {
    pub party: String,
    pub source: PartySource,
    pub matched_name: Option<String>,
    pub score: f64,
}

impl PartyResolution {
    fn unresolved(score: f64) -> Self {
        Self {
            party: UNRESOLVED_PARTY.to_string(),
            source: PartySource::Unresolved,
            matched_name: None,
            score,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PartyStats {
    pub distinct_names: usize,
    pub candidate_matches: usize,
    pub committee_matches: usize,
    pub unresolved: usize,
    pub rows_annotated: usize,
}

struct Entry {
    tokens: String,
    display: String,
    party: String,
}

fn party_label(party: &Coded) -> String {
    party
        .display()
        .filter(|p| !p.trim().is_empty())
        .unwrap_or(UNKNOWN_PARTY)
        .to_string()
}

fn best<'a>(entries: &'a [Entry], query: &str) -> Option<(&'a Entry, f64)> {
    let mut best: Option<(&Entry, f64)> = None;
    for entry in entries {
        let score = sorted_similarity(query, &entry.tokens);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((entry, score));
        }
        if score >= 100.0 {
            break;
        }
    }
    best
}

/// Matches counterparty names to parties.
///
/// Built once from the merged candidate and committee registries; the
/// registries' names are tokenized up front.
pub struct PartyResolver {
    candidate_threshold: f64,
    committee_threshold: f64,
    candidates: Vec<Entry>,
    committees: Vec<Entry>,
}

impl PartyResolver {
    pub fn new(candidates: &[CandidateRecord], committees: &[CommitteeRecord]) -> Self {
        let candidates = candidates
            .iter()
            .filter_map(|c| {
                let name = c.committee_name.as_deref()?;
                let tokens = sorted_tokens(name);
                (!tokens.is_empty()).then(|| Entry {
                    tokens,
                    display: name.to_string(),
                    party: party_label(&c.party),
                })
            })
            .collect();
        let committees = committees
            .iter()
            .filter_map(|c| {
                let tokens = sorted_tokens(&c.committee_name);
                (!tokens.is_empty()).then(|| Entry {
                    tokens,
                    display: c.committee_name.clone(),
                    party: party_label(&c.party),
                })
            })
            .collect();

        Self {
            candidate_threshold: DEFAULT_THRESHOLD,
            committee_threshold: DEFAULT_THRESHOLD,
            candidates,
            committees,
        }
    }

    pub fn with_thresholds(mut self, candidate: f64, committee: f64) -> Self {
        self.candidate_threshold = candidate;
        self.committee_threshold = committee;
        self
    }

    /// Resolve one counterparty name.
    pub fn resolve(&self, name: &str) -> PartyResolution {
        let query = sorted_tokens(name);
        if query.is_empty() {
            return PartyResolution::unresolved(0.0);
        }

        let candidate_best = best(&self.candidates, &query);
        if let Some((entry, score)) = candidate_best {
            if score >= self.candidate_threshold {
                return PartyResolution {
                    party: entry.party.clone(),
                    source: PartySource::Candidate,
                    matched_name: Some(entry.display.clone()),
                    score,
                };
            }
        }

        let committee_best = best(&self.committees, &query);
        if let Some((entry, score)) = committee_best {
            if score >= self.committee_threshold {
                return PartyResolution {
                    party: entry.party.clone(),
                    source: PartySource::Committee,
                    matched_name: Some(entry.display.clone()),
                    score,
                };
            }
        }

        let top = candidate_best
            .map(|(_, s)| s)
            .into_iter()
            .chain(committee_best.map(|(_, s)| s))
            .fold(0.0, f64::max);
        PartyResolution::unresolved(top)
    }

    /// Resolve every distinct counterparty name once and write the party onto
    /// each transfer row.
    pub fn annotate_transfers(&self, transfers: &mut [TransferRecord]) -> PartyStats {
        let mut stats = PartyStats::default();
        let mut resolved: HashMap<String, String> = HashMap::new();

        for row in transfers.iter_mut() {
            let name = row.sender_name.name_full.clone();
            let party = match resolved.get(&name) {
                Some(party) => party.clone(),
                None => {
                    let resolution = self.resolve(&name);
                    stats.distinct_names += 1;
                    match resolution.source {
                        PartySource::Candidate => stats.candidate_matches += 1,
                        PartySource::Committee => stats.committee_matches += 1,
                        PartySource::Unresolved => {
                            stats.unresolved += 1;
                            tracing::debug!(
                                "no party for {:?} (best score {:.1})",
                                name,
                                resolution.score
                            );
                        }
                    }
                    resolved.insert(name, resolution.party.clone());
                    resolution.party
                }
            };
            row.party = Some(party);
            stats.rows_annotated += 1;
        }

        tracing::info!(
            "Resolved party for {} names: {} via candidates, {} via committees, {} unresolved",
            stats.distinct_names,
            stats.candidate_matches,
            stats.committee_matches,
            stats.unresolved
        );
        stats
    }
}
