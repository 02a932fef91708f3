//! Domain models shared across ptrack crates
//!
//! Field names are the serialization contract: any JSON or CSV shaping done by
//! callers must preserve them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Roster entry representing one student
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub student_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub class_id: String,
}

impl Identity {
    pub fn new(student_id: impl Into<String>, class_id: impl Into<String>) -> Self {
        Self {
            student_id: student_id.into(),
            name: None,
            email: None,
            phone: None,
            class_id: class_id.into(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }
}

/// Incoming placement/internship/training record, as submitted
///
/// Duplicates are expected; every identifying field may be missing or wrong.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company_or_organizer: Option<String>,
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub event_date: String,
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub lpa: Option<String>,
    #[serde(default)]
    pub attendance_status: Option<String>,
}

/// Outcome tag of identity resolution
///
/// Automated matching only ever produces the first five variants.
/// `Manual` is set exclusively by manual resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    MatchedById,
    MatchedByEmail,
    MatchedByPhone,
    MatchedByName,
    Unmatched,
    Manual,
}

impl MatchStatus {
    /// Fixed confidence score for this tier (0-100)
    pub fn score(&self) -> u8 {
        match self {
            MatchStatus::MatchedById => 100,
            MatchStatus::MatchedByEmail => 95,
            MatchStatus::MatchedByPhone => 90,
            MatchStatus::MatchedByName => 80,
            MatchStatus::Unmatched => 0,
            MatchStatus::Manual => 100,
        }
    }

    pub fn is_matched(&self) -> bool {
        !matches!(self, MatchStatus::Unmatched)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::MatchedById => "MATCHED_BY_ID",
            MatchStatus::MatchedByEmail => "MATCHED_BY_EMAIL",
            MatchStatus::MatchedByPhone => "MATCHED_BY_PHONE",
            MatchStatus::MatchedByName => "MATCHED_BY_NAME",
            MatchStatus::Unmatched => "UNMATCHED",
            MatchStatus::Manual => "MANUAL",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MATCHED_BY_ID" => Ok(MatchStatus::MatchedById),
            "MATCHED_BY_EMAIL" => Ok(MatchStatus::MatchedByEmail),
            "MATCHED_BY_PHONE" => Ok(MatchStatus::MatchedByPhone),
            "MATCHED_BY_NAME" => Ok(MatchStatus::MatchedByName),
            "UNMATCHED" => Ok(MatchStatus::Unmatched),
            "MANUAL" => Ok(MatchStatus::Manual),
            other => Err(crate::Error::Validation(format!(
                "Unknown match_status: {}",
                other
            ))),
        }
    }
}

/// Persisted attendance log record
///
/// `attendance_id` and `fingerprint_hash` are fixed at creation. Identity
/// fields change only through manual resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedEntry {
    pub attendance_id: Uuid,
    /// Empty when loaded from a log table that predates fingerprinting
    pub fingerprint_hash: String,
    pub student_id: Option<String>,
    pub class_id: Option<String>,
    pub event_type: String,
    pub company: Option<String>,
    pub result: String,
    pub lpa: Option<String>,
    pub matched: bool,
    pub match_status: MatchStatus,
    pub match_score: u8,
}

impl ResolvedEntry {
    /// Assign this entry to `identity` by administrator decision
    pub fn apply_manual_resolution(&mut self, identity: &Identity) {
        self.student_id = Some(identity.student_id.clone());
        self.class_id = Some(identity.class_id.clone());
        self.matched = true;
        self.match_status = MatchStatus::Manual;
        self.match_score = MatchStatus::Manual.score();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_status_wire_names() {
        let json = serde_json::to_string(&MatchStatus::MatchedByEmail).unwrap();
        assert_eq!(json, "\"MATCHED_BY_EMAIL\"");

        for status in [
            MatchStatus::MatchedById,
            MatchStatus::MatchedByEmail,
            MatchStatus::MatchedByPhone,
            MatchStatus::MatchedByName,
            MatchStatus::Unmatched,
            MatchStatus::Manual,
        ] {
            assert_eq!(status.as_str().parse::<MatchStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_tier_scores() {
        assert_eq!(MatchStatus::MatchedById.score(), 100);
        assert_eq!(MatchStatus::MatchedByEmail.score(), 95);
        assert_eq!(MatchStatus::MatchedByPhone.score(), 90);
        assert_eq!(MatchStatus::MatchedByName.score(), 80);
        assert_eq!(MatchStatus::Unmatched.score(), 0);
        assert!(!MatchStatus::Unmatched.is_matched());
        assert!(MatchStatus::Manual.is_matched());
    }

    #[test]
    fn test_unknown_status_rejected() {
        assert!("matched_by_id".parse::<MatchStatus>().is_err());
    }

    #[test]
    fn test_raw_event_missing_fields_default() {
        let event: RawEvent = serde_json::from_str(r#"{"email": "ann@x.com"}"#).unwrap();
        assert_eq!(event.email.as_deref(), Some("ann@x.com"));
        assert_eq!(event.event_type, "");
        assert!(event.student_id.is_none());
    }
}
