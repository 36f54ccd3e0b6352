//! Dataset Record Module
//!
//! One synthetic cache record and the payload synthesizer shared by the
//! generator and the replayer.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Characters payloads are drawn from. Printable so the dataset file stays
/// plain JSON text.
const PAYLOAD_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

// == Record ==
/// A synthetic cache record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Unique cache id
    pub id: String,
    /// Payload whose length is the record size
    pub data: String,
    /// Subset of the tag catalog, in catalog order
    pub tags: Vec<String>,
    /// Lifetime in seconds, None = never expires
    pub expires: Option<u64>,
}

impl Record {
    /// Size of the payload in bytes.
    pub fn payload_size(&self) -> usize {
        self.data.len()
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.expires.map(Duration::from_secs)
    }
}

/// On-disk shape of a record; the id is the key of the enclosing object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub data: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub expires: Option<u64>,
}

impl From<&Record> for StoredRecord {
    fn from(record: &Record) -> Self {
        Self {
            data: record.data.clone(),
            tags: record.tags.clone(),
            expires: record.expires,
        }
    }
}

impl StoredRecord {
    pub fn into_record(self, id: String) -> Record {
        Record {
            id,
            data: self.data,
            tags: self.tags,
            expires: self.expires,
        }
    }
}

// == Payload Synthesis ==
/// Builds a payload of exactly `len` bytes. Content is irrelevant to the
/// measurement; only the length is.
pub fn synthesize_payload<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| PAYLOAD_ALPHABET[rng.gen_range(0..PAYLOAD_ALPHABET.len())] as char)
        .collect()
}
