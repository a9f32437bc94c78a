use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

use crate::error::StoreError;
use crate::store::Result;

// 4 bytes magic + 2 bytes version
pub const HEADER_SIZE: usize = 6;

pub const MAGIC_NUMBER: u32 = 0x42_4C_4B_4C; // ASCII "BLKL"
pub const LOG_VERSION: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Header {
    pub magic_number: u32,
    pub version: u16,
}

impl Header {
    pub fn new() -> Self {
        Header {
            magic_number: MAGIC_NUMBER,
            version: LOG_VERSION,
        }
    }

    pub fn encode<W: Write>(&self, mut writer: W) -> Result<()> {
        writer
            .write_u32::<BigEndian>(self.magic_number)
            .map_err(|e| StoreError::Encode("magic_number", e))?;
        writer
            .write_u16::<BigEndian>(self.version)
            .map_err(|e| StoreError::Encode("version", e))?;
        Ok(())
    }

    pub fn decode<R: Read>(mut reader: R) -> Result<Self> {
        let magic_number = reader
            .read_u32::<BigEndian>()
            .map_err(|e| StoreError::Decode("magic_number", e))?;
        if magic_number != MAGIC_NUMBER {
            return Err(StoreError::InvalidHeader);
        }

        let version = reader
            .read_u16::<BigEndian>()
            .map_err(|e| StoreError::Decode("version", e))?;
        if version != LOG_VERSION {
            return Err(StoreError::UnsupportedVersion(version));
        }

        Ok(Header {
            magic_number,
            version,
        })
    }
}

impl Default for Header {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<&[u8]> for Header {
    type Error = StoreError;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(StoreError::InvalidHeader);
        }
        Header::decode(bytes)
    }
}

impl TryFrom<Header> for Vec<u8> {
    type Error = StoreError;

    fn try_from(header: Header) -> Result<Self> {
        let mut buf = Vec::with_capacity(HEADER_SIZE);
        header.encode(&mut buf)?;
        Ok(buf)
    }
}
