//! Document Identifiers
//!
//! 12-byte ObjectId-style identifiers rendered as 24 lowercase hex chars:
//! 4 bytes of seconds since the epoch, 5 random bytes fixed per process,
//! and a 3-byte wrapping counter.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;

use super::entity::DomainError;

static PROCESS_BYTES: OnceLock<[u8; 5]> = OnceLock::new();
static COUNTER: OnceLock<AtomicU32> = OnceLock::new();

/// Server-assigned document identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Generate a fresh identifier
    pub fn generate() -> Self {
        let process = PROCESS_BYTES.get_or_init(|| rand::thread_rng().gen());
        let counter = COUNTER
            .get_or_init(|| AtomicU32::new(rand::thread_rng().gen_range(0..0x00ff_ffff)))
            .fetch_add(1, Ordering::Relaxed)
            & 0x00ff_ffff;
        let secs = chrono::Utc::now().timestamp() as u32;

        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..9].copy_from_slice(process);
        bytes[9..].copy_from_slice(&counter.to_be_bytes()[1..]);

        Self(bytes.iter().map(|b| format!("{:02x}", b)).collect())
    }

    /// Parse an identifier received from a caller
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let valid = raw.len() == 24
            && raw.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(DomainError::InvalidInput(format!("Malformed document id '{}'", raw)))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
