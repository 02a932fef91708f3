//! Test Helper Utilities
//!
//! Shared fixtures for ptrack-ingest integration tests

#![allow(dead_code)]

use ptrack_common::db::init_database;
use ptrack_common::{Identity, RawEvent};
use sqlx::SqlitePool;
use tempfile::TempDir;

/// Fresh database with the full schema
///
/// Returns (TempDir, SqlitePool) - TempDir must be kept alive for duration of test
pub async fn create_test_db() -> (TempDir, SqlitePool) {
    let temp_dir = TempDir::new().unwrap();
    let pool = init_database(&temp_dir.path().join("ptrack.db")).await.unwrap();
    (temp_dir, pool)
}

/// Database whose `attendance_log` predates the fingerprint column
pub async fn create_legacy_db() -> (TempDir, SqlitePool) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("ptrack.db");

    {
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        let pool = SqlitePool::connect(&url).await.unwrap();
        sqlx::query(
            r#"
            CREATE TABLE attendance_log (
                position INTEGER PRIMARY KEY,
                attendance_id TEXT NOT NULL,
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
        .execute(&pool)
        .await
        .unwrap();
        pool.close().await;
    }

    let pool = init_database(&db_path).await.unwrap();
    (temp_dir, pool)
}

pub fn roster() -> Vec<Identity> {
    vec![
        Identity::new("S1", "C1")
            .with_name("Ann Lee")
            .with_email("ann@x.com")
            .with_phone("9000000001"),
        Identity::new("S2", "C1")
            .with_name("Bob Roy")
            .with_email("bob@x.com"),
        Identity::new("S3", "C2").with_name("Cy Dee"),
    ]
}

pub fn placement(company: &str) -> RawEvent {
    RawEvent {
        student_id: Some("S1".into()),
        company_or_organizer: Some(company.into()),
        event_type: "Placement".into(),
        event_date: "2024-01-01".into(),
        result: "Selected".into(),
        lpa: Some("12".into()),
        ..RawEvent::default()
    }
}

/// Event that matches nobody on [`roster`]
pub fn stray_event() -> RawEvent {
    RawEvent {
        name: Some("Zed Unknown".into()),
        email: Some("zed@y.com".into()),
        company_or_organizer: Some("Initech".into()),
        event_type: "Placement".into(),
        event_date: "2024-03-03".into(),
        result: "Selected".into(),
        ..RawEvent::default()
    }
}
