//! Batch ingestion: fingerprint, drop in-batch repeats, match, emit entries
//!
//! Only duplicates inside the same batch are dropped here. Duplicates of
//! history are the log store's job at merge time.

use super::fingerprinter::fingerprint;
use super::matcher::match_event;
use super::roster_index::RosterIndex;
use ptrack_common::{uuid_utils, Identity, RawEvent, ResolvedEntry};
use serde::Serialize;
use std::collections::HashSet;

/// Entries produced from one batch plus counters for run history
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub entries: Vec<ResolvedEntry>,
    pub rows_received: usize,
    pub duplicates_skipped: usize,
}

impl IngestReport {
    pub fn matched_count(&self) -> usize {
        self.entries.iter().filter(|e| e.matched).count()
    }

    pub fn unmatched_count(&self) -> usize {
        self.entries.len() - self.matched_count()
    }
}

/// Ingestion pipeline bound to one roster snapshot
///
/// The roster index is built once at construction and reused for every
/// event of every batch run through this pipeline.
pub struct IngestionPipeline<'r> {
    index: RosterIndex<'r>,
}

impl<'r> IngestionPipeline<'r> {
    pub fn new(roster: &'r [Identity]) -> Self {
        Self {
            index: RosterIndex::build(roster),
        }
    }

    /// Resolve a batch in input order
    ///
    /// Never fails: rows with missing fields simply fall through every match
    /// tier and come out `UNMATCHED`.
    pub fn run(&self, raw_events: &[RawEvent]) -> IngestReport {
        let mut seen = HashSet::with_capacity(raw_events.len());
        let mut entries = Vec::with_capacity(raw_events.len());
        let mut duplicates_skipped = 0;

        for event in raw_events {
            let fp = fingerprint(event);
            if !seen.insert(fp.clone()) {
                duplicates_skipped += 1;
                continue;
            }
            entries.push(self.resolve(event, fp));
        }

        let report = IngestReport {
            entries,
            rows_received: raw_events.len(),
            duplicates_skipped,
        };

        tracing::debug!(
            rows = report.rows_received,
            resolved = report.entries.len(),
            duplicates = report.duplicates_skipped,
            matched = report.matched_count(),
            "Ingested batch"
        );

        report
    }

    fn resolve(&self, event: &RawEvent, fingerprint_hash: String) -> ResolvedEntry {
        let outcome = match_event(event, &self.index);

        ResolvedEntry {
            attendance_id: uuid_utils::generate(),
            fingerprint_hash,
            student_id: outcome.identity.map(|i| i.student_id.clone()),
            class_id: outcome.identity.map(|i| i.class_id.clone()),
            event_type: event.event_type.clone(),
            company: event.company_or_organizer.clone(),
            result: event.result.clone(),
            lpa: event.lpa.clone(),
            matched: outcome.matched(),
            match_status: outcome.status,
            match_score: outcome.score,
        }
    }
}

/// Resolve `raw_events` against `roster` in one shot
pub fn ingest(raw_events: &[RawEvent], roster: &[Identity]) -> Vec<ResolvedEntry> {
    IngestionPipeline::new(roster).run(raw_events).entries
}
