//! Deprecated integer block key scheme.
//!
//! The three axes are packed into one signed 64-bit index,
//! `z * 0x1000000 + y * 0x1000 + x`, stored as its decimal ASCII text. Each axis
//! occupies 12 bits, so the scheme can only address positions in
//! [`LEGACY_MIN`]..=[`LEGACY_MAX`] on every axis. Keys are not order-preserving.
//!
//! New records are never written under this scheme; it is only read as a fallback
//! and deleted when the block is saved again.

use crate::error::{Error, Result};
use crate::pos::BlockPos;

const AXIS_SPAN: i64 = 0x1000;
const AXIS_HALF: i64 = AXIS_SPAN / 2;

/// Smallest axis value the legacy scheme can address.
pub const LEGACY_MIN: i16 = -(AXIS_HALF as i16);
/// Largest axis value the legacy scheme can address.
pub const LEGACY_MAX: i16 = (AXIS_HALF - 1) as i16;

/// Whether every axis of `pos` lies in the addressable legacy range.
pub fn in_range(pos: BlockPos) -> bool {
    let axis = LEGACY_MIN..=LEGACY_MAX;
    axis.contains(&pos.x) && axis.contains(&pos.y) && axis.contains(&pos.z)
}

/// Packs a position into the legacy index. Only injective for [`in_range`] positions.
pub fn pos_to_index(pos: BlockPos) -> i64 {
    pos.z as i64 * AXIS_SPAN * AXIS_SPAN + pos.y as i64 * AXIS_SPAN + pos.x as i64
}

fn unsigned_to_signed(i: i64) -> i64 {
    if i < AXIS_HALF {
        i
    } else {
        i - AXIS_SPAN
    }
}

/// Unpacks a legacy index. Fails if the index cannot have been produced from an
/// in-range position.
pub fn index_to_pos(index: i64) -> Result<BlockPos> {
    let mut i = index;
    let x = unsigned_to_signed(i.rem_euclid(AXIS_SPAN));
    i = (i - x) / AXIS_SPAN;
    let y = unsigned_to_signed(i.rem_euclid(AXIS_SPAN));
    i = (i - y) / AXIS_SPAN;
    let z = unsigned_to_signed(i.rem_euclid(AXIS_SPAN));
    i = (i - z) / AXIS_SPAN;

    if i != 0 {
        return Err(Error::MalformedKey(format!(
            "legacy index {} is outside the addressable range",
            index
        )));
    }

    Ok(BlockPos::new(x as i16, y as i16, z as i16))
}

/// Encode a position as a legacy key (decimal text of the packed index).
pub fn encode_pos(pos: BlockPos) -> Vec<u8> {
    pos_to_index(pos).to_string().into_bytes()
}

/// Decode a legacy key. Only the canonical decimal form is accepted.
pub fn decode_pos(bytes: &[u8]) -> Result<BlockPos> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| Error::MalformedKey("legacy key is not valid UTF-8".to_string()))?;
    let index = text
        .parse::<i64>()
        .map_err(|e| Error::MalformedKey(format!("legacy key {:?}: {}", text, e)))?;
    let pos = index_to_pos(index)?;

    if encode_pos(pos) != bytes {
        return Err(Error::MalformedKey(format!(
            "legacy key {:?} is not in canonical form",
            text
        )));
    }

    Ok(pos)
}

/// The legacy key for `pos`, if the legacy scheme could ever have stored it.
pub fn key_for(pos: BlockPos) -> Option<Vec<u8>> {
    in_range(pos).then(|| encode_pos(pos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_legacy_pos() -> impl Strategy<Value = BlockPos> {
        let axis = LEGACY_MIN..=LEGACY_MAX;
        (axis.clone(), axis.clone(), axis).prop_map(BlockPos::from)
    }

    #[test]
    fn test_known_keys() {
        assert_eq!(encode_pos(BlockPos::new(0, 0, 0)), b"0");
        assert_eq!(encode_pos(BlockPos::new(1, 0, 0)), b"1");
        assert_eq!(encode_pos(BlockPos::new(0, 1, 0)), b"4096");
        assert_eq!(encode_pos(BlockPos::new(0, 0, 1)), b"16777216");
        assert_eq!(encode_pos(BlockPos::new(-1, -1, -1)), b"-16781313");
    }

    #[test]
    fn test_decode_negative_axes() {
        assert_eq!(
            decode_pos(b"-16781313").unwrap(),
            BlockPos::new(-1, -1, -1)
        );
        assert_eq!(
            decode_pos(b"-4096").unwrap(),
            BlockPos::new(0, -1, 0)
        );
    }

    #[test]
    fn test_range_edges() {
        for pos in [
            BlockPos::new(LEGACY_MIN, LEGACY_MIN, LEGACY_MIN),
            BlockPos::new(LEGACY_MAX, LEGACY_MAX, LEGACY_MAX),
            BlockPos::new(LEGACY_MIN, LEGACY_MAX, 0),
        ] {
            assert!(in_range(pos));
            assert_eq!(decode_pos(&encode_pos(pos)).unwrap(), pos);
        }
        assert!(!in_range(BlockPos::new(LEGACY_MAX + 1, 0, 0)));
        assert!(!in_range(BlockPos::new(0, 0, LEGACY_MIN - 1)));
    }

    #[test]
    fn test_key_for_out_of_range() {
        // (4096, 0, 0) would alias (0, 1, 0) under the packed index.
        assert_eq!(key_for(BlockPos::new(4096, 0, 0)), None);
        assert_eq!(key_for(BlockPos::new(0, 1, 0)), Some(b"4096".to_vec()));
    }

    #[test]
    fn test_malformed_keys() {
        let bad_keys: [&[u8]; 8] = [
            b"",
            b"abc",
            b"1.5",
            b"+5",
            b"007",
            b"-0",
            b"99999999999999999999",
            b"\xff\xfe",
        ];
        for bad in bad_keys {
            assert!(
                matches!(decode_pos(bad), Err(Error::MalformedKey(_))),
                "expected {:?} to be rejected",
                bad
            );
        }
        // Index past the z axis.
        let beyond = (LEGACY_MAX as i64 + 1) * AXIS_SPAN * AXIS_SPAN;
        assert!(matches!(
            decode_pos(beyond.to_string().as_bytes()),
            Err(Error::MalformedKey(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_roundtrip(pos in arb_legacy_pos()) {
            prop_assert_eq!(decode_pos(&encode_pos(pos)).unwrap(), pos);
        }

        #[test]
        fn prop_injective(a in arb_legacy_pos(), b in arb_legacy_pos()) {
            prop_assume!(a != b);
            prop_assert_ne!(encode_pos(a), encode_pos(b));
        }
    }
}
