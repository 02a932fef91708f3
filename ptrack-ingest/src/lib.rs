//! ptrack-ingest library interface
//!
//! Resolves placement/training event rows against the student roster and
//! keeps a deduplicated attendance log. The CLI in `main.rs` is a thin
//! wrapper over [`IngestService`]; integration tests drive the same API.

pub mod db;
pub mod reports;
pub mod services;
pub mod sources;
pub mod utils;

use chrono::Utc;
use ptrack_common::{uuid_utils, Error, Identity, RawEvent, ResolvedEntry, Result};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::db::{recent_runs, save_run, IngestRun, LogStore, RosterImport, RosterStore};
use crate::reports::ClassSummary;
use crate::services::IngestionPipeline;

/// Result of pushing one batch through the engine
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub run_id: Uuid,
    pub resolved_entries: Vec<ResolvedEntry>,
    pub matched_count: usize,
    pub unmatched_count: usize,
    /// Rows collapsed because they repeated an earlier row of the same batch
    pub duplicates_skipped: usize,
    /// Entries already present in the log and therefore not appended
    pub already_logged: usize,
    pub persisted_total: usize,
}

/// Shared handles for every operation the CLI exposes
#[derive(Clone)]
pub struct IngestService {
    pub db: SqlitePool,
    pub log_store: LogStore,
    pub roster_store: RosterStore,
}

impl IngestService {
    pub fn new(db: SqlitePool, log_store: LogStore) -> Self {
        Self {
            roster_store: RosterStore::new(db.clone()),
            db,
            log_store,
        }
    }

    /// Resolve a batch against the stored roster and merge it into the log
    ///
    /// The log is loaded first so a never-initialized log bootstraps before
    /// the batch is merged on top of it.
    pub async fn ingest_batch(&self, raw_events: &[RawEvent]) -> Result<BatchOutcome> {
        let started_at = Utc::now();
        let run_id = uuid_utils::generate();

        let roster = self.roster_store.load_roster().await?;
        if roster.is_empty() {
            tracing::warn!("Roster is empty, every row will be unmatched");
        }

        let report = IngestionPipeline::new(&roster).run(raw_events);
        self.log_store.load().await?;
        let merge = self.log_store.merge(&report.entries).await?;

        let run = IngestRun {
            run_id,
            started_at,
            rows_received: report.rows_received,
            entries_resolved: report.entries.len(),
            duplicates_skipped: report.duplicates_skipped,
            matched_count: report.matched_count(),
            unmatched_count: report.unmatched_count(),
            persisted_total: merge.total,
        };
        save_run(&self.db, &run).await?;

        info!(
            run_id = %run_id,
            rows = run.rows_received,
            matched = run.matched_count,
            unmatched = run.unmatched_count,
            appended = merge.appended,
            "Batch ingested"
        );

        Ok(BatchOutcome {
            run_id,
            matched_count: run.matched_count,
            unmatched_count: run.unmatched_count,
            duplicates_skipped: run.duplicates_skipped,
            already_logged: merge.duplicates_dropped,
            persisted_total: merge.total,
            resolved_entries: report.entries,
        })
    }

    /// Replace the stored roster
    pub async fn import_roster(&self, identities: &[Identity]) -> Result<RosterImport> {
        self.roster_store.replace_roster(identities).await
    }

    pub async fn roster(&self) -> Result<Vec<Identity>> {
        self.roster_store.load_roster().await
    }

    /// Full attendance log, bootstrapping it if it was never written
    pub async fn get_log(&self) -> Result<Vec<ResolvedEntry>> {
        self.log_store.load().await
    }

    /// Administrator assignment of one log entry to a roster student
    ///
    /// An id that is not a UUID can never be in the log, so it fails the same
    /// way an unknown id does: `EmptyLog` on an empty log, else `NotFound`.
    pub async fn resolve_manually(
        &self,
        attendance_id: &str,
        new_student_id: &str,
    ) -> Result<ResolvedEntry> {
        let Ok(attendance_id) = uuid_utils::parse(attendance_id) else {
            if self.get_log().await?.is_empty() {
                return Err(Error::EmptyLog);
            }
            return Err(Error::NotFound(format!(
                "No row found with attendance_id={}",
                attendance_id
            )));
        };
        let roster = self.roster_store.load_roster().await?;
        self.log_store
            .resolve_manually(attendance_id, new_student_id, &roster)
            .await
    }

    pub async fn unmatched(&self) -> Result<Vec<ResolvedEntry>> {
        Ok(reports::unmatched(&self.get_log().await?))
    }

    pub async fn student_events(&self, student_id: &str) -> Result<Vec<ResolvedEntry>> {
        Ok(reports::student_events(&self.get_log().await?, student_id))
    }

    pub async fn class_summary(&self, class_id: &str) -> Result<ClassSummary> {
        let log = self.get_log().await?;
        let roster = self.roster_store.load_roster().await?;
        Ok(reports::class_summary(&log, &roster, class_id))
    }

    pub async fn recent_runs(&self, limit: usize) -> Result<Vec<IngestRun>> {
        recent_runs(&self.db, limit).await
    }
}
