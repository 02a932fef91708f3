//! Field canonicalization shared by roster keys, matching and fingerprints

/// Canonical comparable form of a raw field value
///
/// Missing values become the empty string. Present values are trimmed and
/// lower-cased; no other folding is applied.
pub fn normalize(value: Option<&str>) -> String {
    value.map(|v| v.trim().to_lowercase()).unwrap_or_default()
}
