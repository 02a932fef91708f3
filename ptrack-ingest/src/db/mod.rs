//! Storage for ptrack-ingest
//!
//! Each store wraps the shared SQLite pool and owns one table:
//! `students` (roster), `attendance_log` (resolved events), `ingest_runs`.

pub mod log_store;
pub mod roster;
pub mod runs;

pub use log_store::{dedup_entries, DedupMode, LogStore, MergeOutcome};
pub use roster::{clean_roster, RosterImport, RosterStore};
pub use runs::{recent_runs, save_run, IngestRun};
