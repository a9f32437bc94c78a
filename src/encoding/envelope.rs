//! Version-tagged block envelope.
//!
//! ```text
//! [0] u8 serialization version
//! [1] field-serialized block data
//! ```
//!
//! The envelope itself never changes shape. Whether a version is understood is decided
//! by the field-level deserializer, which receives the parsed tag.

use std::io::{Cursor, Write};

use crate::error::{Error, Result};

/// Writes `version` followed by whatever `serialize` writes for that version.
pub fn encode<F>(version: u8, serialize: F) -> Result<Vec<u8>>
where
    F: FnOnce(&mut dyn Write, u8) -> Result<()>,
{
    let mut buf = vec![version];
    serialize(&mut buf, version)?;
    Ok(buf)
}

/// Splits an envelope into its version tag and payload.
pub fn split(bytes: &[u8]) -> Result<(u8, &[u8])> {
    match bytes.split_first() {
        Some((version, payload)) => Ok((*version, payload)),
        None => Err(Error::TruncatedEnvelope),
    }
}

/// Reads the version tag and hands the payload to `deserialize`.
pub fn decode<F>(bytes: &[u8], deserialize: F) -> Result<()>
where
    F: FnOnce(&mut Cursor<&[u8]>, u8) -> Result<()>,
{
    let (version, payload) = split(bytes)?;
    deserialize(&mut Cursor::new(payload), version)
}
