//! Versioned key encoding.

use std::fmt;

use crate::id::{Id, ID_SIZE};

/// Size of version timestamp in bytes.
pub const VERSION_TS_SIZE: usize = 8;

/// Total key size.
pub const KEY_SIZE: usize = ID_SIZE + VERSION_TS_SIZE;

/// A versioned key combining a document identity and a version timestamp.
///
/// Key format: `[id (16 bytes)][version_ts (8 bytes, big-endian)]`
///
/// Big-endian encoding keeps lexicographic order equal to numeric order, so
/// range scans return versions oldest first.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct VersionedKey {
    /// Document identity.
    pub id: Id,

    /// Version timestamp in microseconds since Unix epoch.
    pub version_ts: u64,
}

impl VersionedKey {
    /// Create a new versioned key.
    pub fn new(id: Id, version_ts: u64) -> Self {
        Self { id, version_ts }
    }

    /// Create a key with the current timestamp.
    pub fn now(id: Id) -> Self {
        Self::new(id, current_timestamp())
    }

    /// Encode the key to bytes.
    pub fn encode(&self) -> [u8; KEY_SIZE] {
        let mut buf = [0u8; KEY_SIZE];
        buf[..ID_SIZE].copy_from_slice(self.id.as_bytes());
        buf[ID_SIZE..].copy_from_slice(&self.version_ts.to_be_bytes());
        buf
    }

    /// Decode a key from bytes.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != KEY_SIZE {
            return None;
        }

        let mut id = [0u8; ID_SIZE];
        id.copy_from_slice(&bytes[..ID_SIZE]);

        let mut ts_bytes = [0u8; VERSION_TS_SIZE];
        ts_bytes.copy_from_slice(&bytes[ID_SIZE..]);

        Some(Self::new(Id::from_bytes(id), u64::from_be_bytes(ts_bytes)))
    }

    /// Create the minimum key for a document (version 0).
    pub fn min_for(id: Id) -> Self {
        Self::new(id, 0)
    }

    /// Create the maximum key for a document (max version).
    pub fn max_for(id: Id) -> Self {
        Self::new(id, u64::MAX)
    }
}

impl fmt::Debug for VersionedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionedKey")
            .field("id", &self.id.to_string())
            .field("version_ts", &self.version_ts)
            .finish()
    }
}

/// Get current timestamp in microseconds since Unix epoch.
pub fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}
