//! Database initialization
//!
//! Creates the database file on first run and brings every table into
//! existence. All statements are idempotent, so opening an existing database
//! goes through the same path.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Open (or create) the database and ensure all tables exist
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL lets report readers proceed while the single writer rewrites the log
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA busy_timeout = 250")
        .execute(&pool)
        .await?;

    init_schema(&pool).await?;

    Ok(pool)
}

/// Create all ptrack tables if they do not exist
///
/// An `attendance_log` table created by an older tool is left untouched,
/// even when it lacks columns this version writes.
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    create_settings_table(pool).await?;
    create_students_table(pool).await?;
    create_attendance_log_table(pool).await?;
    create_ingest_runs_table(pool).await?;
    Ok(())
}

/// Key-value settings, also used for one-time markers
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Roster table; `position` keeps the original roster order
async fn create_students_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS students (
            position INTEGER PRIMARY KEY,
            student_id TEXT NOT NULL UNIQUE,
            name TEXT,
            email TEXT,
            phone TEXT,
            class_id TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Resolved event log; `position` keeps history order across rewrites
async fn create_attendance_log_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS attendance_log (
            position INTEGER PRIMARY KEY,
            attendance_id TEXT NOT NULL,
            fingerprint_hash TEXT,
            student_id TEXT,
            class_id TEXT,
            event_type TEXT NOT NULL DEFAULT '',
            company TEXT,
            result TEXT NOT NULL DEFAULT '',
            lpa TEXT,
            matched INTEGER NOT NULL DEFAULT 0,
            match_status TEXT NOT NULL DEFAULT 'UNMATCHED',
            match_score INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_attendance_log_attendance_id
        ON attendance_log(attendance_id)
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// One row per ingested batch
async fn create_ingest_runs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ingest_runs (
            run_id TEXT PRIMARY KEY,
            started_at TEXT NOT NULL,
            rows_received INTEGER NOT NULL,
            entries_resolved INTEGER NOT NULL,
            duplicates_skipped INTEGER NOT NULL,
            matched_count INTEGER NOT NULL,
            unmatched_count INTEGER NOT NULL,
            persisted_total INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
