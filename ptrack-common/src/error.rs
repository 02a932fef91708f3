//! Common error types for ptrack

use thiserror::Error;

/// Common result type for ptrack operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds surfaced by the ingest engine and its stores
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV boundary read error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed or missing required input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation requires at least one persisted log row
    #[error("Attendance log is empty")]
    EmptyLog,

    /// Manual resolution target is not on the roster
    #[error("No student found with student_id={0}")]
    UnknownStudent(String),

    /// Persisted schema lacks a column the engine relies on
    #[error("Integrity assumption violated: {0}")]
    IntegrityAssumptionViolated(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
