//! Roster table access
//!
//! The roster is owned by whoever uploads it; the engine only ever reads a
//! whole snapshot. Replacing it is a whole-table write.

use ptrack_common::{Error, Identity, Result};
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use std::collections::HashSet;
use tracing::{info, warn};

/// Counters from one roster replacement
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RosterImport {
    pub imported: usize,
    pub skipped_duplicates: usize,
    pub skipped_invalid: usize,
}

/// Keep the first identity for each `student_id`, drop rows missing keys
///
/// Returns the cleaned roster in input order together with the counters.
pub fn clean_roster(identities: &[Identity]) -> (Vec<Identity>, RosterImport) {
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(identities.len());
    let mut stats = RosterImport::default();

    for identity in identities {
        let student_id = identity.student_id.trim();
        if student_id.is_empty() || identity.class_id.trim().is_empty() {
            warn!(
                student_id = %identity.student_id,
                "Skipping roster row without student_id or class_id"
            );
            stats.skipped_invalid += 1;
            continue;
        }
        if !seen.insert(student_id.to_string()) {
            warn!(student_id, "Duplicate student_id in roster, keeping first occurrence");
            stats.skipped_duplicates += 1;
            continue;
        }
        kept.push(identity.clone());
    }

    stats.imported = kept.len();
    (kept, stats)
}

/// Read/write access to the `students` table
#[derive(Clone)]
pub struct RosterStore {
    db: SqlitePool,
}

impl RosterStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Replace the whole roster, preserving input order
    ///
    /// Fails with `Validation` if no usable row remains; the existing roster
    /// is left in place in that case.
    pub async fn replace_roster(&self, identities: &[Identity]) -> Result<RosterImport> {
        let (roster, stats) = clean_roster(identities);
        if roster.is_empty() {
            return Err(Error::Validation(
                "Roster upload contains no rows with both student_id and class_id".to_string(),
            ));
        }

        let mut tx = self.db.begin().await?;

        sqlx::query("DELETE FROM students").execute(&mut *tx).await?;

        for (position, identity) in roster.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO students (position, student_id, name, email, phone, class_id)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(position as i64 + 1)
            .bind(&identity.student_id)
            .bind(&identity.name)
            .bind(&identity.email)
            .bind(&identity.phone)
            .bind(&identity.class_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            imported = stats.imported,
            skipped_duplicates = stats.skipped_duplicates,
            skipped_invalid = stats.skipped_invalid,
            "Roster replaced"
        );

        Ok(stats)
    }

    /// Whole roster in upload order
    pub async fn load_roster(&self) -> Result<Vec<Identity>> {
        let rows = sqlx::query(
            "SELECT student_id, name, email, phone, class_id FROM students ORDER BY position",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.iter().map(identity_from_row).collect())
    }

    /// Exact lookup by `student_id`
    pub async fn find_student(&self, student_id: &str) -> Result<Option<Identity>> {
        let row = sqlx::query(
            "SELECT student_id, name, email, phone, class_id FROM students WHERE student_id = ?",
        )
        .bind(student_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.as_ref().map(identity_from_row))
    }
}

fn identity_from_row(row: &sqlx::sqlite::SqliteRow) -> Identity {
    Identity {
        student_id: row.get("student_id"),
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
        class_id: row.get("class_id"),
    }
}
