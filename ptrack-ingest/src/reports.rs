//! Read-only projections over the resolved attendance log
//!
//! Everything here takes a log snapshot and never writes. Event type and
//! result comparisons ignore case only: `Placement`/`SELECTED` count the same
//! as `placement`/`selected`, but ` Placement` with stray whitespace does not.

use ptrack_common::{Identity, ResolvedEntry};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

const PLACEMENT: &str = "placement";
const INTERNSHIP: &str = "internship";
const TRAINING: &str = "training";
const SELECTED: &str = "selected";

/// Placement statistics for one class
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassSummary {
    pub class_id: String,
    pub total_students: usize,
    pub placed_count: usize,
    pub internship_count: usize,
    pub trained_count: usize,
    pub not_placed_count: usize,
    /// Mean of the numeric `lpa` values over placed rows
    pub avg_lpa_placed: Option<f64>,
    /// Trimmed company name to number of distinct placed students
    pub company_breakdown: BTreeMap<String, usize>,
}

/// Entries still waiting for a roster identity
pub fn unmatched(log: &[ResolvedEntry]) -> Vec<ResolvedEntry> {
    log.iter().filter(|e| !e.matched).cloned().collect()
}

/// Every entry attributed to `student_id`, in log order
pub fn student_events(log: &[ResolvedEntry], student_id: &str) -> Vec<ResolvedEntry> {
    log.iter()
        .filter(|e| e.student_id.as_deref() == Some(student_id))
        .cloned()
        .collect()
}

fn is_kind(entry: &ResolvedEntry, event_type: &str) -> bool {
    entry.event_type.to_lowercase() == event_type
}

fn is_selected(entry: &ResolvedEntry) -> bool {
    entry.result.to_lowercase() == SELECTED
}

fn distinct_students<'a>(rows: impl Iterator<Item = &'a ResolvedEntry>) -> usize {
    rows.filter_map(|e| e.student_id.as_deref())
        .collect::<HashSet<_>>()
        .len()
}

/// Summarize placement outcomes for `class_id`
///
/// Only matched entries whose `class_id` equals the requested class are
/// considered. Counts are distinct students, not rows.
pub fn class_summary(log: &[ResolvedEntry], roster: &[Identity], class_id: &str) -> ClassSummary {
    let total_students = roster
        .iter()
        .filter(|i| i.class_id == class_id)
        .map(|i| i.student_id.as_str())
        .collect::<HashSet<_>>()
        .len();

    let class_rows: Vec<&ResolvedEntry> = log
        .iter()
        .filter(|e| e.matched && e.class_id.as_deref() == Some(class_id))
        .collect();

    let placed_rows: Vec<&ResolvedEntry> = class_rows
        .iter()
        .copied()
        .filter(|e| is_kind(e, PLACEMENT) && is_selected(e))
        .collect();

    let placed_count = distinct_students(placed_rows.iter().copied());
    let internship_count = distinct_students(
        class_rows
            .iter()
            .copied()
            .filter(|e| is_kind(e, INTERNSHIP) && is_selected(e)),
    );
    let trained_count =
        distinct_students(class_rows.iter().copied().filter(|e| is_kind(e, TRAINING)));

    let lpas: Vec<f64> = placed_rows
        .iter()
        .filter_map(|e| e.lpa.as_deref())
        .filter_map(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .collect();
    let avg_lpa_placed = if lpas.is_empty() {
        None
    } else {
        Some(lpas.iter().sum::<f64>() / lpas.len() as f64)
    };

    let mut per_company: BTreeMap<String, HashSet<&str>> = BTreeMap::new();
    for entry in &placed_rows {
        let (Some(company), Some(student_id)) =
            (entry.company.as_deref(), entry.student_id.as_deref())
        else {
            continue;
        };
        let company = company.trim();
        if company.is_empty() {
            continue;
        }
        per_company.entry(company.to_string()).or_default().insert(student_id);
    }
    let company_breakdown = per_company
        .into_iter()
        .map(|(company, students)| (company, students.len()))
        .collect();

    ClassSummary {
        class_id: class_id.to_string(),
        total_students,
        placed_count,
        internship_count,
        trained_count,
        not_placed_count: total_students.saturating_sub(placed_count),
        avg_lpa_placed,
        company_breakdown,
    }
}
