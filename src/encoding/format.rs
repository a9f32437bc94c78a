//! Formats raw keys and values for diagnostics. Block keys of either scheme are
//! rendered as positions; anything else falls back to escaped bytes.

use itertools::Itertools as _;

use super::{envelope, keycode, legacy};

/// Formats encoded keys and values.
pub trait Formatter {
    /// Formats a key.
    fn key(key: &[u8]) -> String;

    /// Formats a value. Also takes the key to determine the kind of value.
    fn value(key: &[u8], value: &[u8]) -> String;

    /// Formats a key/value pair.
    fn key_value(key: &[u8], value: &[u8]) -> String {
        Self::key_maybe_value(key, Some(value))
    }

    /// Formats a key/value pair, where the value may not exist.
    fn key_maybe_value(key: &[u8], value: Option<&[u8]>) -> String {
        let fmtkey = Self::key(key);
        let fmtvalue = value.map_or("None".to_string(), |v| Self::value(key, v));
        format!("{fmtkey} → {fmtvalue}")
    }
}

/// Formats raw byte slices without any decoding.
pub struct Raw;

impl Raw {
    /// Formats raw bytes as escaped ASCII strings.
    pub fn bytes(bytes: &[u8]) -> String {
        let escaped = bytes
            .iter()
            .copied()
            .flat_map(std::ascii::escape_default)
            .collect_vec();
        format!("\"{}\"", String::from_utf8_lossy(&escaped))
    }
}

impl Formatter for Raw {
    fn key(key: &[u8]) -> String {
        Self::bytes(key)
    }

    fn value(_key: &[u8], value: &[u8]) -> String {
        Self::bytes(value)
    }
}

/// Formats map block keys and envelopes.
pub struct BlockKeys;

impl Formatter for BlockKeys {
    fn key(key: &[u8]) -> String {
        if keycode::is_block_key(key) {
            if let Ok(pos) = keycode::decode_pos(key) {
                return format!("a{pos}");
            }
        }
        match legacy::decode_pos(key) {
            Ok(pos) => format!("legacy{pos}"),
            Err(_) => Raw::key(key),
        }
    }

    fn value(_key: &[u8], value: &[u8]) -> String {
        match envelope::split(value) {
            Ok((version, payload)) => format!("v{} [{} bytes]", version, payload.len()),
            Err(_) => "<blank>".to_string(),
        }
    }
}
