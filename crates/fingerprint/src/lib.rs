pub mod matcher;
pub mod schema;
pub mod stats;

pub use matcher::{score, MatchRegime, ACCEPT_THRESHOLD, REJECT_THRESHOLD};
pub use schema::{ContentItem, Decision, EntityFingerprint, EntityType, MatchResult, Severity};
pub use stats::{ConfidenceLevel, PrecisionStats};

use sha2::{Digest, Sha256};

/// Generate a stable entity ID from a primary name
pub fn entity_id_for(primary_name: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(primary_name.trim().to_lowercase().as_bytes());
    let result = hasher.finalize();
    hex::encode(&result[..16])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_id_is_stable_and_case_insensitive() {
        assert_eq!(entity_id_for("Acme Corp"), entity_id_for("acme corp"));
        assert_eq!(entity_id_for("Acme Corp"), entity_id_for("  Acme Corp  "));
        assert_ne!(entity_id_for("Acme Corp"), entity_id_for("Acme Inc"));
    }
}
