//! Content fingerprint used as the deduplication key for events
//!
//! SHA-256 over eight normalized fields joined with `|`, hex encoded.
//! `student_id` and `phone` are deliberately not part of the key: the same
//! event reported under different contact details collapses to one entry.

use super::normalizer::normalize;
use ptrack_common::RawEvent;
use sha2::{Digest, Sha256};

pub const FINGERPRINT_SEPARATOR: &str = "|";

/// Deterministic content hash of an event (64 lowercase hex chars)
pub fn fingerprint(event: &RawEvent) -> String {
    let parts = [
        normalize(Some(event.event_type.as_str())),
        normalize(event.company_or_organizer.as_deref()),
        normalize(Some(event.event_date.as_str())),
        normalize(event.email.as_deref()),
        normalize(event.name.as_deref()),
        normalize(Some(event.result.as_str())),
        normalize(event.lpa.as_deref()),
        normalize(event.attendance_status.as_deref()),
    ];
    let raw = parts.join(FINGERPRINT_SEPARATOR);

    format!("{:x}", Sha256::digest(raw.as_bytes()))
}
