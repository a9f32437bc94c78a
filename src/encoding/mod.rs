pub mod envelope;
pub mod format;
pub mod keycode;
pub mod legacy;

use crate::error::Result;

/// Trait for encoding keys with order preservation.
///
/// Keys must maintain lexicographic ordering after encoding so the backing store can
/// range-scan them.
pub trait Key {
    /// Encode the key to bytes while preserving sort order
    fn encode(&self) -> Vec<u8>;

    /// Decode bytes back to the original key type
    fn decode(bytes: &[u8]) -> Result<Self>
    where
        Self: Sized;
}
