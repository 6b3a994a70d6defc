//! Currency locator for the decompressed payload
//!
//! Player treasuries are not reachable through the record model. Each one
//! sits behind a fixed three-part signature; the Nth match in the payload
//! belongs to the Nth player. The stored value is fixed-point with 8
//! fractional bits.
//!
//! ```text
//! +0   21 C9 AF 2F
//! +8   57 73 4A 5A
//! +16  B7 EA A0 F1
//! +44  u32 LE money * 256
//! ```

use crate::error::{SaveError, SaveResult};

/// Signature parts and their offsets from the match start
const SIGNATURE: [(usize, [u8; 4]); 3] = [
    (0, [0x21, 0xC9, 0xAF, 0x2F]),
    (8, [0x57, 0x73, 0x4A, 0x5A]),
    (16, [0xB7, 0xEA, 0xA0, 0xF1]),
];

/// Offset of the value field from the match start
pub const VALUE_OFFSET: usize = 44;

/// Fixed-point scale of the stored value
pub const MONEY_SCALE: u32 = 256;

fn matches_at(payload: &[u8], pos: usize) -> bool {
    SIGNATURE.iter().all(|(offset, part)| {
        payload
            .get(pos + offset..pos + offset + part.len())
            .is_some_and(|bytes| bytes == part)
    })
}

/// Offsets of every player's value field, in payload order
pub fn money_offsets(payload: &[u8]) -> Vec<usize> {
    let (_, first) = SIGNATURE[0];
    payload
        .windows(first.len())
        .enumerate()
        .filter(|(pos, window)| *window == first && matches_at(payload, *pos))
        .map(|(pos, _)| pos + VALUE_OFFSET)
        .filter(|value| value + 4 <= payload.len())
        .collect()
}

/// Offset of the value field for player `index` (0-based)
pub fn find_money_offset(payload: &[u8], index: usize) -> Option<usize> {
    money_offsets(payload).get(index).copied()
}

/// Raw stored value for player `index`
pub fn read_stored(payload: &[u8], index: usize) -> Option<u32> {
    let offset = find_money_offset(payload, index)?;
    let bytes = payload.get(offset..offset + 4)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Logical money for player `index`, fractional part dropped
pub fn read_money(payload: &[u8], index: usize) -> Option<u32> {
    read_stored(payload, index).map(|stored| stored / MONEY_SCALE)
}

/// Store `amount` for player `index`.
///
/// Only the four value bytes change. Returns `Ok(false)` when the payload
/// has no entry for that player.
pub fn write_money(payload: &mut [u8], index: usize, amount: u32) -> SaveResult<bool> {
    let stored = amount
        .checked_mul(MONEY_SCALE)
        .ok_or(SaveError::MoneyOverflow { amount })?;
    let Some(offset) = find_money_offset(payload, index) else {
        return Ok(false);
    };
    payload[offset..offset + 4].copy_from_slice(&stored.to_le_bytes());
    Ok(true)
}
