//! Content hashing for normalized rows
//!
//! Rows are hashed over their business attributes so the store can tell an
//! unchanged re-sync apart from a real update.

use crate::error::Result;
use sha2::{Digest, Sha256};

/// Compute the SHA-256 hex digest of raw bytes
pub fn compute_checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Compute the content hash of a JSON value
///
/// Object keys are written in sorted order, so two values with the same fields
/// hash identically regardless of the order they were built in.
pub fn content_hash(value: &serde_json::Value) -> Result<String> {
    let mut bytes = Vec::new();
    write_canonical(value, &mut bytes)?;
    Ok(compute_checksum(&bytes))
}

fn write_canonical(value: &serde_json::Value, out: &mut Vec<u8>) -> Result<()> {
    match value {
        serde_json::Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();

            out.push(b'{');
            for (idx, key) in keys.into_iter().enumerate() {
                if idx > 0 {
                    out.push(b',');
                }
                serde_json::to_writer(&mut *out, key)?;
                out.push(b':');
                if let Some(inner) = map.get(key) {
                    write_canonical(inner, out)?;
                }
            }
            out.push(b'}');
        },
        serde_json::Value::Array(items) => {
            out.push(b'[');
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    out.push(b',');
                }
                write_canonical(item, out)?;
            }
            out.push(b']');
        },
        scalar => serde_json::to_writer(&mut *out, scalar)?,
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_compute_checksum_sha256() {
        let checksum = compute_checksum(b"hello world");
        assert_eq!(checksum, "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9");
    }

    #[test]
    fn test_content_hash_ignores_key_order() {
        let mut a = serde_json::Map::new();
        a.insert("b".to_string(), json!(2));
        a.insert("a".to_string(), json!(1));

        let mut b = serde_json::Map::new();
        b.insert("a".to_string(), json!(1));
        b.insert("b".to_string(), json!(2));

        assert_eq!(
            content_hash(&serde_json::Value::Object(a)).unwrap(),
            content_hash(&serde_json::Value::Object(b)).unwrap()
        );
    }

    #[test]
    fn test_content_hash_changes_with_value() {
        let before = content_hash(&json!({ "status": "answered" })).unwrap();
        let after = content_hash(&json!({ "status": "missed" })).unwrap();
        assert_ne!(before, after);
    }
}
