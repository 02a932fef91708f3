//! Multi-key lookup over the roster
//!
//! Four maps (id, email, phone, name) from normalized key to identity. When
//! two identities share a key the one earlier in roster order wins and the
//! later one is shadowed for that key. Empty keys are never indexed.

use super::normalizer::normalize;
use ptrack_common::Identity;
use std::collections::HashMap;

/// Which roster field a lookup key was derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Id,
    Email,
    Phone,
    Name,
}

/// Immutable lookup structure borrowed from one roster snapshot
#[derive(Debug, Default)]
pub struct RosterIndex<'r> {
    by_id: HashMap<String, &'r Identity>,
    by_email: HashMap<String, &'r Identity>,
    by_phone: HashMap<String, &'r Identity>,
    by_name: HashMap<String, &'r Identity>,
}

impl<'r> RosterIndex<'r> {
    /// Build the index, iterating `roster` in order
    pub fn build(roster: &'r [Identity]) -> Self {
        let mut index = Self::default();

        for identity in roster {
            let student_id = normalize(Some(identity.student_id.as_str()));
            insert_first(&mut index.by_id, student_id, identity);
            insert_first(&mut index.by_email, normalize(identity.email.as_deref()), identity);
            insert_first(&mut index.by_phone, normalize(identity.phone.as_deref()), identity);
            insert_first(&mut index.by_name, normalize(identity.name.as_deref()), identity);
        }

        tracing::debug!(
            roster_size = roster.len(),
            ids = index.by_id.len(),
            emails = index.by_email.len(),
            phones = index.by_phone.len(),
            names = index.by_name.len(),
            "Built roster index"
        );

        index
    }

    /// Lookups take an already-normalized key
    pub fn by_id(&self, key: &str) -> Option<&'r Identity> {
        self.by_id.get(key).copied()
    }

    pub fn by_email(&self, key: &str) -> Option<&'r Identity> {
        self.by_email.get(key).copied()
    }

    pub fn by_phone(&self, key: &str) -> Option<&'r Identity> {
        self.by_phone.get(key).copied()
    }

    pub fn by_name(&self, key: &str) -> Option<&'r Identity> {
        self.by_name.get(key).copied()
    }

    pub fn lookup(&self, kind: KeyKind, key: &str) -> Option<&'r Identity> {
        match kind {
            KeyKind::Id => self.by_id(key),
            KeyKind::Email => self.by_email(key),
            KeyKind::Phone => self.by_phone(key),
            KeyKind::Name => self.by_name(key),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
            && self.by_email.is_empty()
            && self.by_phone.is_empty()
            && self.by_name.is_empty()
    }
}

fn insert_first<'r>(map: &mut HashMap<String, &'r Identity>, key: String, identity: &'r Identity) {
    if key.is_empty() {
        return;
    }
    map.entry(key).or_insert(identity);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Vec<Identity> {
        vec![
            Identity::new("S1", "C1")
                .with_name("Ann Lee")
                .with_email("Ann@X.com")
                .with_phone("111"),
            Identity::new("S2", "C1").with_name("ann lee").with_email("bob@x.com"),
            Identity::new("  ", "C2").with_name("   "),
        ]
    }

    #[test]
    fn test_keys_are_normalized() {
        let roster = roster();
        let index = RosterIndex::build(&roster);

        assert_eq!(index.by_id("s1").unwrap().student_id, "S1");
        assert_eq!(index.by_email("ann@x.com").unwrap().student_id, "S1");
        assert_eq!(index.by_phone("111").unwrap().student_id, "S1");
        assert!(index.by_id("S1").is_none(), "lookups expect normalized keys");
    }

    #[test]
    fn test_first_seen_wins_on_shared_name() {
        let roster = roster();
        let index = RosterIndex::build(&roster);

        assert_eq!(index.by_name("ann lee").unwrap().student_id, "S1");
        assert_eq!(index.by_email("bob@x.com").unwrap().student_id, "S2");
    }

    #[test]
    fn test_blank_keys_not_indexed() {
        let roster = roster();
        let index = RosterIndex::build(&roster);

        assert!(index.by_id("").is_none());
        assert!(index.by_name("").is_none());
        assert!(index.by_phone("").is_none());
    }

    #[test]
    fn test_empty_roster() {
        let index = RosterIndex::build(&[]);
        assert!(index.is_empty());
    }
}
