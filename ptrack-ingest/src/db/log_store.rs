//! Persistent attendance log
//!
//! The log is read and written as a whole table. Every write replaces the
//! full contents inside one transaction, with an explicit `position` column
//! carrying history order.
//!
//! Invariants maintained here:
//! - `fingerprint_hash` is unique across the persisted log (merge keeps the
//!   first occurrence, so history always beats a re-submission)
//! - `attendance_id` is never reassigned
//! - `MANUAL` entries are only ever changed by another manual resolution

use crate::db::roster::RosterStore;
use crate::services::IngestionPipeline;
use crate::sources::EventSource;
use crate::utils::retry_on_lock;
use ptrack_common::db::{get_setting, has_column};
use ptrack_common::{Error, Identity, MatchStatus, ResolvedEntry, Result};
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Settings key recording that the log has been written at least once
pub const LOG_INITIALIZED_KEY: &str = "attendance_log_initialized";

const LOG_TABLE: &str = "attendance_log";

/// How duplicates are recognised when merging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupMode {
    /// Persisted table carries `fingerprint_hash`
    Fingerprint,
    /// Legacy table without `fingerprint_hash`: compare entire rows
    WholeRow,
}

/// Counters from one merge
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeOutcome {
    pub appended: usize,
    pub duplicates_dropped: usize,
    pub total: usize,
}

/// Keep the first occurrence of every key, preserving order
///
/// In `Fingerprint` mode an entry with an empty fingerprint (a row written
/// before fingerprints existed) is compared as a whole row instead.
pub fn dedup_entries(entries: Vec<ResolvedEntry>, mode: DedupMode) -> Vec<ResolvedEntry> {
    let mut seen_fingerprints: HashSet<String> = HashSet::new();
    let mut seen_rows: HashSet<ResolvedEntry> = HashSet::new();
    let mut kept = Vec::with_capacity(entries.len());

    for entry in entries {
        let first = if mode == DedupMode::Fingerprint && !entry.fingerprint_hash.is_empty() {
            seen_fingerprints.insert(entry.fingerprint_hash.clone())
        } else {
            seen_rows.insert(entry.clone())
        };
        if first {
            kept.push(entry);
        }
    }

    kept
}

/// Attendance log backed by the `attendance_log` table
#[derive(Clone)]
pub struct LogStore {
    db: SqlitePool,
    max_lock_wait_ms: u64,
    bootstrap: Option<Arc<dyn EventSource>>,
}

impl LogStore {
    pub fn new(db: SqlitePool) -> Self {
        Self {
            db,
            max_lock_wait_ms: 5000,
            bootstrap: None,
        }
    }

    pub fn with_max_lock_wait(mut self, max_lock_wait_ms: u64) -> Self {
        self.max_lock_wait_ms = max_lock_wait_ms;
        self
    }

    /// Event source used once to seed a log that has never been written
    pub fn with_bootstrap_source(mut self, source: Arc<dyn EventSource>) -> Self {
        self.bootstrap = Some(source);
        self
    }

    /// Inspect the persisted schema to pick the deduplication key
    pub async fn dedup_mode(&self) -> Result<DedupMode> {
        if has_column(&self.db, LOG_TABLE, "fingerprint_hash").await? {
            Ok(DedupMode::Fingerprint)
        } else {
            let violation = Error::IntegrityAssumptionViolated(
                "attendance_log has no fingerprint_hash column; deduplicating whole rows"
                    .to_string(),
            );
            warn!("{}", violation);
            Ok(DedupMode::WholeRow)
        }
    }

    /// Whether the log exists (written before, or holding legacy rows)
    pub async fn exists(&self) -> Result<bool> {
        if get_setting(&self.db, LOG_INITIALIZED_KEY).await?.is_some() {
            return Ok(true);
        }
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM attendance_log")
            .fetch_one(&self.db)
            .await?;
        Ok(count > 0)
    }

    /// Persisted log as stored, without bootstrapping
    pub async fn read_persisted(&self) -> Result<Vec<ResolvedEntry>> {
        let mode = self.dedup_mode().await?;
        self.read_with_mode(mode).await
    }

    async fn read_with_mode(&self, mode: DedupMode) -> Result<Vec<ResolvedEntry>> {
        let fingerprint_column = match mode {
            DedupMode::Fingerprint => "fingerprint_hash",
            DedupMode::WholeRow => "NULL AS fingerprint_hash",
        };
        let query = format!(
            r#"
            SELECT attendance_id, {}, student_id, class_id, event_type, company,
                   result, lpa, matched, match_status, match_score
            FROM attendance_log
            ORDER BY position
            "#,
            fingerprint_column
        );

        let rows = sqlx::query(&query).fetch_all(&self.db).await?;
        rows.iter().map(entry_from_row).collect()
    }

    /// Persisted log, bootstrapping it on first use
    ///
    /// When the log has never been written, the configured bootstrap source
    /// is run through the pipeline against the stored roster and the result
    /// persisted. An empty bootstrap result is returned but not persisted; a
    /// bootstrap file that does not exist counts as empty.
    pub async fn load(&self) -> Result<Vec<ResolvedEntry>> {
        if self.exists().await? {
            return self.read_persisted().await;
        }

        let Some(source) = &self.bootstrap else {
            debug!("Attendance log not initialized and no bootstrap source configured");
            return Ok(Vec::new());
        };

        info!(source = %source.describe(), "Bootstrapping attendance log");
        let events = match source.load_events() {
            Ok(events) => events,
            Err(Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(
                    source = %source.describe(),
                    "Bootstrap source not found, starting with an empty log"
                );
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };
        let roster = RosterStore::new(self.db.clone()).load_roster().await?;
        let entries = IngestionPipeline::new(&roster).run(&events).entries;

        if !entries.is_empty() {
            let mode = self.dedup_mode().await?;
            self.persist(&entries, mode).await?;
            info!(entries = entries.len(), "Attendance log bootstrapped");
        }

        Ok(entries)
    }

    /// Append `new_entries` to history, dropping anything already logged
    ///
    /// Existing rows come first and win over re-submitted duplicates. A call
    /// with no entries does not touch storage.
    pub async fn merge(&self, new_entries: &[ResolvedEntry]) -> Result<MergeOutcome> {
        if new_entries.is_empty() {
            return Ok(MergeOutcome::default());
        }

        let mode = self.dedup_mode().await?;
        let existing = self.read_with_mode(mode).await?;
        let before = existing.len();

        let mut combined = existing;
        combined.extend_from_slice(new_entries);
        let candidates = combined.len();
        let merged = dedup_entries(combined, mode);

        self.persist(&merged, mode).await?;

        let outcome = MergeOutcome {
            appended: merged.len().saturating_sub(before),
            duplicates_dropped: candidates - merged.len(),
            total: merged.len(),
        };

        info!(
            appended = outcome.appended,
            duplicates_dropped = outcome.duplicates_dropped,
            total = outcome.total,
            "Merged entries into attendance log"
        );

        Ok(outcome)
    }

    /// Assign one entry to a roster identity by administrator decision
    ///
    /// Checks, in order: the log has rows (`EmptyLog`), an entry carries
    /// `attendance_id` (`NotFound`), `new_student_id` is on the roster
    /// (`UnknownStudent`). Nothing is written unless all pass. Only the first
    /// row with that id is changed.
    pub async fn resolve_manually(
        &self,
        attendance_id: Uuid,
        new_student_id: &str,
        roster: &[Identity],
    ) -> Result<ResolvedEntry> {
        let mut log = self.load().await?;
        if log.is_empty() {
            return Err(Error::EmptyLog);
        }

        let idx = log
            .iter()
            .position(|e| e.attendance_id == attendance_id)
            .ok_or_else(|| {
                Error::NotFound(format!("No row found with attendance_id={}", attendance_id))
            })?;

        let identity = roster
            .iter()
            .find(|i| i.student_id == new_student_id)
            .ok_or_else(|| Error::UnknownStudent(new_student_id.to_string()))?;

        let previous = log[idx].match_status;
        log[idx].apply_manual_resolution(identity);
        let updated = log[idx].clone();

        let mode = self.dedup_mode().await?;
        self.persist(&log, mode).await?;

        info!(
            attendance_id = %attendance_id,
            student_id = %identity.student_id,
            previous_status = %previous,
            "Entry resolved manually"
        );

        Ok(updated)
    }

    async fn persist(&self, entries: &[ResolvedEntry], mode: DedupMode) -> Result<()> {
        let db = &self.db;
        retry_on_lock("persist attendance log", self.max_lock_wait_ms, || {
            replace_log(db, entries, mode)
        })
        .await
    }
}

/// Overwrite the whole log in one transaction and mark it initialized
async fn replace_log(db: &SqlitePool, entries: &[ResolvedEntry], mode: DedupMode) -> Result<()> {
    let insert = match mode {
        DedupMode::Fingerprint => {
            r#"
            INSERT INTO attendance_log (
                position, attendance_id, student_id, class_id, event_type, company,
                result, lpa, matched, match_status, match_score, fingerprint_hash
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        }
        DedupMode::WholeRow => {
            r#"
            INSERT INTO attendance_log (
                position, attendance_id, student_id, class_id, event_type, company,
                result, lpa, matched, match_status, match_score
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        }
    };

    let mut tx = db.begin().await?;

    sqlx::query("DELETE FROM attendance_log")
        .execute(&mut *tx)
        .await?;

    for (position, entry) in entries.iter().enumerate() {
        let mut query = sqlx::query(insert)
            .bind(position as i64 + 1)
            .bind(entry.attendance_id.to_string())
            .bind(&entry.student_id)
            .bind(&entry.class_id)
            .bind(&entry.event_type)
            .bind(&entry.company)
            .bind(&entry.result)
            .bind(&entry.lpa)
            .bind(entry.matched)
            .bind(entry.match_status.as_str())
            .bind(entry.match_score as i64);
        if mode == DedupMode::Fingerprint {
            query = query.bind(&entry.fingerprint_hash);
        }
        query.execute(&mut *tx).await?;
    }

    sqlx::query(
        r#"
        INSERT INTO settings (key, value, updated_at) VALUES (?, 'true', CURRENT_TIMESTAMP)
        ON CONFLICT(key) DO UPDATE SET updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(LOG_INITIALIZED_KEY)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    debug!(rows = entries.len(), "Attendance log written");
    Ok(())
}

fn entry_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<ResolvedEntry> {
    let attendance_id: String = row.get("attendance_id");
    let attendance_id = Uuid::parse_str(&attendance_id).map_err(|e| {
        Error::Internal(format!("Invalid attendance_id '{}' in log: {}", attendance_id, e))
    })?;

    let match_status: String = row.get("match_status");
    let match_status: MatchStatus = match_status.parse()?;

    let match_score: i64 = row.get("match_score");
    let match_score = u8::try_from(match_score)
        .ok()
        .filter(|s| *s <= 100)
        .ok_or_else(|| Error::Internal(format!("match_score out of range: {}", match_score)))?;

    let fingerprint_hash: Option<String> = row.get("fingerprint_hash");

    Ok(ResolvedEntry {
        attendance_id,
        fingerprint_hash: fingerprint_hash.unwrap_or_default(),
        student_id: row.get("student_id"),
        class_id: row.get("class_id"),
        event_type: row.get("event_type"),
        company: row.get("company"),
        result: row.get("result"),
        lpa: row.get("lpa"),
        matched: row.get("matched"),
        match_status,
        match_score,
    })
}
