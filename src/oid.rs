//! Module containing functionality related to BSON ObjectIds.

use std::{
    convert::TryInto,
    fmt,
    str::FromStr,
    sync::atomic::{AtomicU32, Ordering},
    time::SystemTime,
};

use once_cell::sync::Lazy;
use rand::{thread_rng, Rng, RngCore};

use crate::{error::Error, DateTime};

const TIMESTAMP_SIZE: usize = 4;
const PROCESS_UNIQUE_SIZE: usize = 5;
const COUNTER_SIZE: usize = 3;

const TIMESTAMP_OFFSET: usize = 0;
const PROCESS_UNIQUE_OFFSET: usize = TIMESTAMP_OFFSET + TIMESTAMP_SIZE;
const COUNTER_OFFSET: usize = PROCESS_UNIQUE_OFFSET + PROCESS_UNIQUE_SIZE;

const MAX_U24: u32 = 0xFF_FFFF;

// Seeded to a random value so concurrently started processes do not collide
// even when their process-unique bytes happen to match.
pub(crate) static OID_COUNTER: Lazy<AtomicU32> =
    Lazy::new(|| AtomicU32::new(thread_rng().gen_range(0..=MAX_U24)));

static PROCESS_UNIQUE: Lazy<[u8; PROCESS_UNIQUE_SIZE]> = Lazy::new(|| {
    let mut bytes = [0u8; PROCESS_UNIQUE_SIZE];
    thread_rng().fill_bytes(&mut bytes);
    bytes
});

/// A wrapper around a raw 12-byte ObjectId.
///
/// The layout is a 4-byte big-endian timestamp in seconds since the Unix
/// epoch, a 5-byte process-unique value randomized once per process, and a
/// 3-byte big-endian counter initialized to a random value.
///
/// While the BSON format itself is little-endian, the timestamp and counter
/// are big-endian, with the most significant bytes appearing first.
#[derive(Clone, Copy, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub struct ObjectId {
    id: [u8; 12],
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectId {
    /// Generates a new [`ObjectId`] from the current time, the process-unique
    /// value, and the next counter value.
    pub fn new() -> ObjectId {
        let timestamp = ObjectId::gen_timestamp();
        let process_unique = *PROCESS_UNIQUE;
        let counter = ObjectId::gen_count();

        let mut buf: [u8; 12] = [0; 12];
        buf[TIMESTAMP_OFFSET..PROCESS_UNIQUE_OFFSET].copy_from_slice(&timestamp);
        buf[PROCESS_UNIQUE_OFFSET..COUNTER_OFFSET].copy_from_slice(&process_unique);
        buf[COUNTER_OFFSET..].copy_from_slice(&counter);

        ObjectId::from_bytes(buf)
    }

    /// Constructs a new [`ObjectId`] wrapper around the raw byte
    /// representation.
    pub const fn from_bytes(bytes: [u8; 12]) -> ObjectId {
        ObjectId { id: bytes }
    }

    /// Creates an [`ObjectId`] from a 24-character hexadecimal string.
    ///
    /// The string must consist of exactly 24 characters in `[0-9A-Fa-f]`;
    /// anything else fails with an `InvalidArgument` error.
    pub fn parse_str(s: impl AsRef<str>) -> crate::error::Result<ObjectId> {
        let s = s.as_ref();

        if s.len() != 24 {
            return Err(Error::invalid_argument(format!(
                "ObjectId hex string must be 24 characters long, got {} character(s)",
                s.len()
            )));
        }

        let bytes: Vec<u8> = hex::decode(s.as_bytes()).map_err(|e| {
            Error::invalid_argument(format!("invalid ObjectId hex string \"{}\": {}", s, e))
        })?;

        // length 24 hex decodes to exactly 12 bytes
        Ok(ObjectId::from_bytes(bytes.try_into().map_err(|_| {
            Error::internal("hex decode of a 24-character string was not 12 bytes")
        })?))
    }

    /// Retrieves the timestamp from the first four bytes of an [`ObjectId`],
    /// read as a big-endian `u32` count of seconds.
    pub fn timestamp(&self) -> DateTime {
        let mut buf = [0; 4];
        buf.copy_from_slice(&self.id[TIMESTAMP_OFFSET..PROCESS_UNIQUE_OFFSET]);
        let seconds_since_epoch = u32::from_be_bytes(buf);

        DateTime::from_millis(seconds_since_epoch as i64 * 1000)
    }

    /// Returns the raw byte representation of an [`ObjectId`].
    pub const fn bytes(&self) -> [u8; 12] {
        self.id
    }

    /// Converts the [`ObjectId`] to its hex string representation.
    pub fn to_hex(self) -> String {
        hex::encode(self.id)
    }

    // Generates a new timestamp representing the current seconds since epoch,
    // represented in big-endian.
    fn gen_timestamp() -> [u8; 4] {
        let timestamp: u32 = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .expect("system clock is before 1970")
            .as_secs()
            .try_into()
            .expect("system clock is past 2106");
        timestamp.to_be_bytes()
    }

    // Gets an incremental 3-byte count, represented in big-endian.
    //
    // The counter advances modulo 2^24: the read after 0xFF_FFFF yields 0.
    // 2^32 is a multiple of 2^24, so the atomic's own wraparound preserves
    // the sequence.
    fn gen_count() -> [u8; COUNTER_SIZE] {
        let u = OID_COUNTER.fetch_add(1, Ordering::SeqCst) % (MAX_U24 + 1);

        let buf = u.to_be_bytes();
        [buf[1], buf[2], buf[3]]
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("ObjectId").field(&self.to_hex()).finish()
    }
}

impl From<[u8; 12]> for ObjectId {
    fn from(bytes: [u8; 12]) -> Self {
        Self { id: bytes }
    }
}

impl FromStr for ObjectId {
    type Err = Error;

    fn from_str(s: &str) -> crate::error::Result<Self> {
        Self::parse_str(s)
    }
}
