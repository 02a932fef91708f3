//! # ptrack Common Library
//!
//! Shared code for the ptrack workspace including:
//! - Domain models (roster identities, raw events, resolved log entries)
//! - Error types
//! - Configuration loading and root folder resolution
//! - Database initialization and schema introspection
//! - UUID helpers

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod uuid_utils;

pub use error::{Error, Result};
pub use models::{Identity, MatchStatus, RawEvent, ResolvedEntry};
