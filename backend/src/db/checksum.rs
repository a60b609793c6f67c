//! Configuration fingerprints for cache provenance.

use sha2::{Digest, Sha256};

use crate::error::EphemerisResult;
use crate::models::BodyConfig;

/// Calculate the SHA-256 checksum of some content.
///
/// # Returns
/// Hexadecimal string representation of the SHA-256 hash.
pub fn calculate_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Fingerprint of a body configuration.
///
/// Hashes the canonical (name-sorted) JSON of the records, so two configurations
/// that would produce the same events share a fingerprint.
pub fn configuration_fingerprint(config: &BodyConfig) -> EphemerisResult<String> {
    let canonical = serde_json::to_string(&config.to_records())?;
    Ok(calculate_checksum(&canonical))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BodyId, BodyRecord};
    use std::collections::BTreeMap;

    fn config() -> BodyConfig {
        let records: BTreeMap<String, BodyRecord> = BodyId::ALL
            .into_iter()
            .map(|b| (b.key().to_string(), BodyRecord::new(3_600_000, 1.5, 0, 0.0)))
            .collect();
        BodyConfig::from_records(records).unwrap()
    }

    #[test]
    fn test_checksum_consistency() {
        let content = r#"{"test": "data"}"#;
        assert_eq!(calculate_checksum(content), calculate_checksum(content));
        assert_eq!(calculate_checksum(content).len(), 64);
    }

    #[test]
    fn test_fingerprint_tracks_ref_time() {
        let base = config();
        let mut moved = base.clone();
        moved.get_mut(BodyId::Red).ref_time += 1;

        let a = configuration_fingerprint(&base).unwrap();
        assert_eq!(a, configuration_fingerprint(&base.clone()).unwrap());
        assert_ne!(a, configuration_fingerprint(&moved).unwrap());
    }
}
