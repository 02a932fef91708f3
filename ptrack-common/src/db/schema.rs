//! Schema introspection via PRAGMA table_info
//!
//! The log store uses this to decide whether the persisted table carries a
//! `fingerprint_hash` column before choosing a deduplication key.

use crate::Result;
use sqlx::{Row, SqlitePool};

/// Column names of `table_name` in declaration order
///
/// Returns an empty list when the table does not exist.
pub async fn table_columns(pool: &SqlitePool, table_name: &str) -> Result<Vec<String>> {
    let query = format!("PRAGMA table_info({})", table_name);
    let rows = sqlx::query(&query).fetch_all(pool).await?;

    let mut columns: Vec<(i64, String)> = rows
        .iter()
        .map(|row| (row.get::<i64, _>("cid"), row.get::<String, _>("name")))
        .collect();
    columns.sort_by_key(|(cid, _)| *cid);

    Ok(columns.into_iter().map(|(_, name)| name).collect())
}

/// Check whether `table_name` has a column called `column_name`
pub async fn has_column(pool: &SqlitePool, table_name: &str, column_name: &str) -> Result<bool> {
    let columns = table_columns(pool, table_name).await?;
    Ok(columns.iter().any(|c| c.eq_ignore_ascii_case(column_name)))
}

/// Check if table exists
pub async fn table_exists(pool: &SqlitePool, table_name: &str) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM sqlite_master
            WHERE type='table' AND name = ?
        )
        "#,
    )
    .bind(table_name)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}
