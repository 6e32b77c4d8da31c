//! 12-byte object ids rendered as 24 lowercase hex characters.
//!
//! Layout: 4 bytes big-endian UNIX seconds, 5 bytes of per-process randomness,
//! 3 bytes of a per-process big-endian counter. Ids from one process therefore
//! sort in creation order.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId([u8; 12]);

#[derive(thiserror::Error, Debug, PartialEq)]
#[error("invalid id")]
pub struct InvalidId;

impl ObjectId {
    pub fn bytes(&self) -> [u8; 12] {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for ObjectId {
    type Err = InvalidId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 12];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| InvalidId)?;
        Ok(ObjectId(bytes))
    }
}

pub struct ObjectIdGenerator {
    process_unique: [u8; 5],
    counter: AtomicU32,
}

impl ObjectIdGenerator {
    pub fn new() -> Self {
        let random = uuid::Uuid::new_v4().into_bytes();
        let mut process_unique = [0u8; 5];
        process_unique.copy_from_slice(&random[..5]);
        let start = u32::from_be_bytes([0, random[5], random[6], random[7]]);

        ObjectIdGenerator {
            process_unique,
            counter: AtomicU32::new(start),
        }
    }

    pub fn generate(&self) -> ObjectId {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs() as u32)
            .unwrap_or(0);
        let count = self.counter.fetch_add(1, Ordering::Relaxed) & 0x00ff_ffff;

        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..9].copy_from_slice(&self.process_unique);
        bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);
        ObjectId(bytes)
    }
}

impl Default for ObjectIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
