//! Session id generation using SHA-256 hashes

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// Hex characters kept from the hash
pub const SESSION_ID_LEN: usize = 12;

/// Deterministic session id for a validation run.
///
/// Hashes the source, target and run timestamp, keeping the first
/// [`SESSION_ID_LEN`] hex characters.
pub fn session_id(source: &str, target: &str, generated_at: &DateTime<Utc>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update(b"|");
    hasher.update(target.as_bytes());
    hasher.update(b"|");
    hasher.update(generated_at.to_rfc3339().as_bytes());

    let mut id = format!("{:x}", hasher.finalize());
    id.truncate(SESSION_ID_LEN);
    id
}
