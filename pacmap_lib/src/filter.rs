//! Refund and reversal cancellation.
//!
//! A negative amount reverses an earlier contribution. Before the tables are
//! aggregated, every negative row is removed together with one positive row
//! of equal magnitude filed under the same normalized name.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::records::Transaction;

/// Counts from one filter pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FilterReport {
    pub input_rows: usize,
    pub negatives_removed: usize,
    pub positives_cancelled: usize,
    /// Negatives with no remaining positive counterpart.
    pub unmatched_negatives: usize,
    /// Distinct names carrying more than one negative row.
    pub names_with_multiple_negatives: usize,
}

impl FilterReport {
    pub fn rows_removed(&self) -> usize {
        self.negatives_removed + self.positives_cancelled
    }
}

/// Remove negative rows and their positive counterparts.
///
/// Each positive row is cancelled at most once. When several positives
/// qualify, the one dated closest to the negative wins; ties and undated rows
/// go to the earliest row. Zero amounts are never touched and survivors keep
/// their input order.
pub fn remove_invalid_transactions<T: Transaction>(rows: Vec<T>) -> (Vec<T>, FilterReport) {
    let mut report = FilterReport {
        input_rows: rows.len(),
        ..FilterReport::default()
    };

    let keys: Vec<String> = rows.iter().map(|r| r.name().match_key()).collect();

    // Positive row indices by name, in input order.
    let mut positives: HashMap<&str, Vec<usize>> = HashMap::new();
    let mut negatives_by_name: HashMap<&str, usize> = HashMap::new();
    for (idx, row) in rows.iter().enumerate() {
        if row.amount().is_sign_positive() && !row.amount().is_zero() {
            positives.entry(keys[idx].as_str()).or_default().push(idx);
        } else if row.amount().is_sign_negative() && !row.amount().is_zero() {
            *negatives_by_name.entry(keys[idx].as_str()).or_default() += 1;
        }
    }

    for (name, count) in &negatives_by_name {
        if *count > 1 {
            report.names_with_multiple_negatives += 1;
            tracing::warn!("{} negative transactions filed under {:?}", count, name);
        }
    }

    let mut removed: HashSet<usize> = HashSet::new();
    for (idx, row) in rows.iter().enumerate() {
        let amount = row.amount();
        if amount.is_zero() || !amount.is_sign_negative() {
            continue;
        }
        removed.insert(idx);
        report.negatives_removed += 1;

        let target = -amount;
        let counterpart = positives.get(keys[idx].as_str()).and_then(|candidates| {
            candidates
                .iter()
                .copied()
                .filter(|&p| !removed.contains(&p) && rows[p].amount() == target)
                .min_by_key(|&p| (date_distance(row.date(), rows[p].date()), p))
        });

        match counterpart {
            Some(p) => {
                removed.insert(p);
                report.positives_cancelled += 1;
            }
            None => {
                report.unmatched_negatives += 1;
                tracing::debug!("no positive counterpart for {} under {:?}", amount, keys[idx]);
            }
        }
    }

    let survivors = rows
        .into_iter()
        .enumerate()
        .filter(|(idx, _)| !removed.contains(idx))
        .map(|(_, row)| row)
        .collect();

    (survivors, report)
}

fn date_distance(a: Option<chrono::NaiveDate>, b: Option<chrono::NaiveDate>) -> i64 {
    match (a, b) {
        (Some(a), Some(b)) => (a - b).num_days().abs(),
        _ => i64::MAX,
    }
}
