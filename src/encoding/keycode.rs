//! Current, order-preserving block key scheme.
//!
//! A key is the prefix byte `a` followed by the x, y and z axes, each written as a
//! big-endian `u16` with the sign bit flipped so that negative values sort before
//! positive ones:
//!
//! ```text
//! [0x61][x: 2 bytes][y: 2 bytes][z: 2 bytes]
//! ```
//!
//! The prefix never collides with the legacy scheme, whose keys are decimal ASCII
//! (`-` or a digit first).

use super::Key;
use crate::error::{Error, Result};
use crate::pos::BlockPos;

/// Prefix byte shared by every current-scheme key.
pub const KEY_PREFIX: u8 = b'a';

/// Length in bytes of an encoded block key.
pub const KEY_LEN: usize = 7;

const SIGN_BIT: u16 = 1 << 15;

/// Encode an axis with order preservation
fn encode_axis(v: i16) -> [u8; 2] {
    ((v as u16) ^ SIGN_BIT).to_be_bytes()
}

fn decode_axis(bytes: [u8; 2]) -> i16 {
    (u16::from_be_bytes(bytes) ^ SIGN_BIT) as i16
}

/// Encode a block position into its current-scheme key.
pub fn encode_pos(pos: BlockPos) -> Vec<u8> {
    let mut result = Vec::with_capacity(KEY_LEN);
    result.push(KEY_PREFIX);
    result.extend_from_slice(&encode_axis(pos.x));
    result.extend_from_slice(&encode_axis(pos.y));
    result.extend_from_slice(&encode_axis(pos.z));
    result
}

/// Decode a current-scheme key back into a block position.
pub fn decode_pos(bytes: &[u8]) -> Result<BlockPos> {
    if bytes.first() != Some(&KEY_PREFIX) {
        return Err(Error::MalformedKey(format!(
            "block key must start with {:?}",
            KEY_PREFIX as char
        )));
    }

    if bytes.len() != KEY_LEN {
        return Err(Error::MalformedKey(format!(
            "block key must be {} bytes total, got {}",
            KEY_LEN,
            bytes.len()
        )));
    }

    Ok(BlockPos {
        x: decode_axis([bytes[1], bytes[2]]),
        y: decode_axis([bytes[3], bytes[4]]),
        z: decode_axis([bytes[5], bytes[6]]),
    })
}

/// Whether `bytes` looks like a current-scheme key.
pub fn is_block_key(bytes: &[u8]) -> bool {
    bytes.len() == KEY_LEN && bytes[0] == KEY_PREFIX
}

impl Key for BlockPos {
    fn encode(&self) -> Vec<u8> {
        encode_pos(*self)
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        decode_pos(bytes)
    }
}
