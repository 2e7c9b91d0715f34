//! Document ID generation.
//!
//! Generated IDs are the first [`ID_BYTES`] bytes of a SHA-256 digest, hex encoded.
//! The digest covers the document payload, the creation time rendered with
//! nanosecond precision, and a per-generator sequence number. The sequence number
//! keeps two identical payloads created within the same clock tick apart; across
//! processes the IDs are effectively random.
//!
//! Uniqueness is not guaranteed. A collision inside one collection is rejected by the
//! backend as `DocumentAlreadyExists` and surfaces to the caller as a hard failure.

use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};

/// Number of digest bytes kept in a generated ID (rendered as twice as many hex characters).
pub const ID_BYTES: usize = 8;

/// Produces document IDs for documents created without a client-supplied ID.
#[derive(Debug, Default)]
pub struct IdGenerator {
    sequence: AtomicU64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self { sequence: AtomicU64::new(0) }
    }

    /// Derives an ID for `data` created at `at`.
    pub fn generate(&self, data: &[u8], at: &DateTime<Utc>) -> String {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);

        let mut hasher = Sha256::new();
        hasher.update(data);
        hasher.update(at.to_rfc3339_opts(SecondsFormat::Nanos, true).as_bytes());
        hasher.update(sequence.to_be_bytes());

        hex::encode(&hasher.finalize()[..ID_BYTES])
    }
}
