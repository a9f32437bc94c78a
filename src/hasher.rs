use std::fmt;

use crc::{Crc, Digest, CRC_64_ECMA_182};

static CRC64: Crc<u64> = Crc::<u64>::new(&CRC_64_ECMA_182);

/// Incremental CRC-64/ECMA-182 over the fields of one log record.
pub struct Hasher {
    digest: Digest<'static, u64>,
}

impl fmt::Debug for Hasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hasher")
    }
}

impl Hasher {
    pub fn new() -> Self {
        Self {
            digest: CRC64.digest(),
        }
    }

    pub fn write(&mut self, data: &[u8]) {
        self.digest.update(data);
    }

    pub fn checksum(self) -> u64 {
        self.digest.finalize()
    }

    /// Checksum of a single record: op tag, key, then value.
    pub fn record(op: u8, key: &[u8], value: &[u8]) -> u64 {
        let mut hasher = Self::new();
        hasher.write(&[op]);
        hasher.write(key);
        hasher.write(value);
        hasher.checksum()
    }

    /// Checksum of a record frame: op tag and the big-endian key and value lengths.
    pub fn frame(op: u8, key_len: u32, value_len: u32) -> u64 {
        let mut hasher = Self::new();
        hasher.write(&[op]);
        hasher.write(&key_len.to_be_bytes());
        hasher.write(&value_len.to_be_bytes());
        hasher.checksum()
    }
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}
