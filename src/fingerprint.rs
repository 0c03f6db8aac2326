//! Message fingerprints for exact-repeat detection.
//!
//! A [`Fingerprint`] is the first 128 bits of the BLAKE3 digest of a
//! message's normalised text. Two lines with the same normalised body always
//! share a fingerprint, across processes and restarts.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::text::normalize;

/// 128-bit digest of normalised message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint([u8; 16]);

impl Fingerprint {
    /// Raw digest bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Fingerprint already-normalised text.
#[must_use]
pub fn fingerprint(normalized: &str) -> Fingerprint {
    let digest = blake3::hash(normalized.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest.as_bytes()[..16]);
    Fingerprint(bytes)
}

/// Normalise a raw chat line and fingerprint it.
#[must_use]
pub fn fingerprint_message(raw: &str) -> Fingerprint {
    fingerprint(&normalize(raw))
}

/// Set of fingerprints seen during one conversation.
#[derive(Debug, Clone, Default)]
pub struct FingerprintIndex {
    seen: HashSet<Fingerprint>,
}

impl FingerprintIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `raw` and report whether it had been seen before.
    ///
    /// The first call for a given normalised text inserts it and returns
    /// `false`; later calls return `true` without reinserting. Because this
    /// mutates, call it at most once per incoming message.
    pub fn is_repeat(&mut self, raw: &str) -> bool {
        !self.seen.insert(fingerprint_message(raw))
    }

    /// Check membership without recording.
    #[must_use]
    pub fn contains(&self, fp: &Fingerprint) -> bool {
        self.seen.contains(fp)
    }

    /// Number of distinct fingerprints recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether nothing has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Forget every recorded fingerprint.
    pub fn clear(&mut self) {
        self.seen.clear();
    }
}
