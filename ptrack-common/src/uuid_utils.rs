//! UUID utilities

use crate::{Error, Result};
use uuid::Uuid;

/// Generate a fresh attendance id (UUIDv4)
pub fn generate() -> Uuid {
    Uuid::new_v4()
}

/// Parse an attendance id supplied by a caller
///
/// Surrounding whitespace is ignored. Anything that is not a UUID is a
/// validation failure rather than a lookup miss.
pub fn parse(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s.trim())
        .map_err(|e| Error::Validation(format!("Invalid attendance_id '{}': {}", s, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_unique() {
        assert_ne!(generate(), generate());
    }

    #[test]
    fn test_parse_trims_and_rejects_garbage() {
        let id = generate();
        assert_eq!(parse(&format!("  {}\n", id)).unwrap(), id);
        assert!(matches!(parse("not-a-uuid"), Err(Error::Validation(_))));
    }
}
