//! Ingest run history
//!
//! One row per batch pushed through the service, for auditing what each
//! upload contributed.

use chrono::{DateTime, SecondsFormat, Utc};
use ptrack_common::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestRun {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub rows_received: usize,
    pub entries_resolved: usize,
    pub duplicates_skipped: usize,
    pub matched_count: usize,
    pub unmatched_count: usize,
    /// Log size after the merge
    pub persisted_total: usize,
}

pub async fn save_run(pool: &SqlitePool, run: &IngestRun) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO ingest_runs (
            run_id, started_at, rows_received, entries_resolved,
            duplicates_skipped, matched_count, unmatched_count, persisted_total
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(run.run_id.to_string())
    .bind(run.started_at.to_rfc3339_opts(SecondsFormat::Micros, true))
    .bind(run.rows_received as i64)
    .bind(run.entries_resolved as i64)
    .bind(run.duplicates_skipped as i64)
    .bind(run.matched_count as i64)
    .bind(run.unmatched_count as i64)
    .bind(run.persisted_total as i64)
    .execute(pool)
    .await?;

    tracing::debug!(run_id = %run.run_id, "Saved ingest run");
    Ok(())
}

/// Most recent runs first
pub async fn recent_runs(pool: &SqlitePool, limit: usize) -> Result<Vec<IngestRun>> {
    let rows = sqlx::query(
        r#"
        SELECT run_id, started_at, rows_received, entries_resolved,
               duplicates_skipped, matched_count, unmatched_count, persisted_total
        FROM ingest_runs
        ORDER BY started_at DESC
        LIMIT ?
        "#,
    )
    .bind(limit as i64)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let run_id: String = row.get("run_id");
            let run_id = Uuid::parse_str(&run_id)
                .map_err(|e| Error::Internal(format!("Invalid run_id in database: {}", e)))?;

            let started_at: String = row.get("started_at");
            let started_at = DateTime::parse_from_rfc3339(&started_at)
                .map_err(|e| Error::Internal(format!("Failed to parse started_at: {}", e)))?
                .with_timezone(&Utc);

            Ok(IngestRun {
                run_id,
                started_at,
                rows_received: row.get::<i64, _>("rows_received") as usize,
                entries_resolved: row.get::<i64, _>("entries_resolved") as usize,
                duplicates_skipped: row.get::<i64, _>("duplicates_skipped") as usize,
                matched_count: row.get::<i64, _>("matched_count") as usize,
                unmatched_count: row.get::<i64, _>("unmatched_count") as usize,
                persisted_total: row.get::<i64, _>("persisted_total") as usize,
            })
        })
        .collect()
}
