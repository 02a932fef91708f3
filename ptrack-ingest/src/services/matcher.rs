//! Identity resolution for a single event
//!
//! Fixed priority cascade, first hit wins:
//!
//! | Tier  | Status             | Score |
//! |-------|--------------------|-------|
//! | id    | `MATCHED_BY_ID`    | 100   |
//! | email | `MATCHED_BY_EMAIL` | 95    |
//! | phone | `MATCHED_BY_PHONE` | 90    |
//! | name  | `MATCHED_BY_NAME`  | 80    |
//! | none  | `UNMATCHED`        | 0     |
//!
//! Exact normalized equality only. Scores are per tier, not similarity.

use super::normalizer::normalize;
use super::roster_index::{KeyKind, RosterIndex};
use ptrack_common::{Identity, MatchStatus, RawEvent};

/// Result of resolving one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOutcome<'r> {
    pub identity: Option<&'r Identity>,
    pub status: MatchStatus,
    pub score: u8,
}

impl<'r> MatchOutcome<'r> {
    fn hit(identity: &'r Identity, status: MatchStatus) -> Self {
        Self {
            identity: Some(identity),
            status,
            score: status.score(),
        }
    }

    fn miss() -> Self {
        Self {
            identity: None,
            status: MatchStatus::Unmatched,
            score: MatchStatus::Unmatched.score(),
        }
    }

    pub fn matched(&self) -> bool {
        self.status.is_matched()
    }
}

/// Resolve `event` against `index`
///
/// Stateless: the same event and index always give the same outcome.
pub fn match_event<'r>(event: &RawEvent, index: &RosterIndex<'r>) -> MatchOutcome<'r> {
    let tiers = [
        (KeyKind::Id, event.student_id.as_deref(), MatchStatus::MatchedById),
        (KeyKind::Email, event.email.as_deref(), MatchStatus::MatchedByEmail),
        (KeyKind::Phone, event.phone.as_deref(), MatchStatus::MatchedByPhone),
        (KeyKind::Name, event.name.as_deref(), MatchStatus::MatchedByName),
    ];

    for (kind, raw, status) in tiers {
        let key = normalize(raw);
        if key.is_empty() {
            continue;
        }
        if let Some(identity) = index.lookup(kind, &key) {
            return MatchOutcome::hit(identity, status);
        }
    }

    MatchOutcome::miss()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Vec<Identity> {
        vec![
            Identity::new("S1", "C1").with_name("Ann Lee").with_email("ann@x.com"),
            Identity::new("S2", "C1").with_email("bob@x.com").with_phone("98765"),
            Identity::new("S3", "C2").with_name("Cara Diaz"),
            Identity::new("S4", "C2").with_phone("55555"),
        ]
    }

    #[test]
    fn test_match_by_id_case_insensitive() {
        let roster = roster();
        let index = RosterIndex::build(&roster);
        let event = RawEvent {
            student_id: Some("s1".into()),
            ..RawEvent::default()
        };

        let outcome = match_event(&event, &index);
        assert_eq!(outcome.identity.unwrap().student_id, "S1");
        assert_eq!(outcome.status, MatchStatus::MatchedById);
        assert_eq!(outcome.score, 100);
        assert!(outcome.matched());
    }

    #[test]
    fn test_match_by_email() {
        let roster = roster();
        let index = RosterIndex::build(&roster);
        let event = RawEvent {
            email: Some(" Ann@X.com ".into()),
            ..RawEvent::default()
        };

        let outcome = match_event(&event, &index);
        assert_eq!(outcome.identity.unwrap().student_id, "S1");
        assert_eq!(outcome.status, MatchStatus::MatchedByEmail);
        assert_eq!(outcome.score, 95);
    }

    #[test]
    fn test_unknown_id_falls_through_to_phone() {
        let roster = roster();
        let index = RosterIndex::build(&roster);
        let event = RawEvent {
            student_id: Some("S404".into()),
            phone: Some("98765".into()),
            ..RawEvent::default()
        };

        let outcome = match_event(&event, &index);
        assert_eq!(outcome.identity.unwrap().student_id, "S2");
        assert_eq!(outcome.status, MatchStatus::MatchedByPhone);
        assert_eq!(outcome.score, 90);
    }

    #[test]
    fn test_match_by_name() {
        let roster = roster();
        let index = RosterIndex::build(&roster);
        let event = RawEvent {
            name: Some("CARA DIAZ".into()),
            ..RawEvent::default()
        };

        let outcome = match_event(&event, &index);
        assert_eq!(outcome.identity.unwrap().student_id, "S3");
        assert_eq!(outcome.status, MatchStatus::MatchedByName);
        assert_eq!(outcome.score, 80);
    }

    #[test]
    fn test_priority_id_over_email_over_phone_over_name() {
        let roster = roster();
        let index = RosterIndex::build(&roster);

        // Each field points at a different student
        let mut event = RawEvent {
            student_id: Some("S3".into()),
            email: Some("bob@x.com".into()),
            phone: Some("55555".into()),
            name: Some("Ann Lee".into()),
            ..RawEvent::default()
        };
        assert_eq!(match_event(&event, &index).identity.unwrap().student_id, "S3");

        event.student_id = None;
        assert_eq!(match_event(&event, &index).identity.unwrap().student_id, "S2");

        event.email = None;
        assert_eq!(match_event(&event, &index).identity.unwrap().student_id, "S4");

        event.phone = None;
        assert_eq!(match_event(&event, &index).identity.unwrap().student_id, "S1");
    }

    #[test]
    fn test_unmatched() {
        let roster = roster();
        let index = RosterIndex::build(&roster);
        let event = RawEvent {
            student_id: Some("S404".into()),
            email: Some("nobody@x.com".into()),
            name: Some("Nobody".into()),
            ..RawEvent::default()
        };

        let outcome = match_event(&event, &index);
        assert!(outcome.identity.is_none());
        assert_eq!(outcome.status, MatchStatus::Unmatched);
        assert_eq!(outcome.score, 0);
        assert!(!outcome.matched());
    }

    #[test]
    fn test_blank_fields_never_match() {
        let roster = vec![Identity::new("S1", "C1")];
        let index = RosterIndex::build(&roster);
        let event = RawEvent {
            student_id: Some("   ".into()),
            email: Some("".into()),
            ..RawEvent::default()
        };

        assert_eq!(match_event(&event, &index).status, MatchStatus::Unmatched);
    }

    #[test]
    fn test_deterministic() {
        let roster = roster();
        let index = RosterIndex::build(&roster);
        let event = RawEvent {
            name: Some("ann lee".into()),
            ..RawEvent::default()
        };

        let first = match_event(&event, &index);
        for _ in 0..10 {
            assert_eq!(match_event(&event, &index), first);
        }
    }
}
