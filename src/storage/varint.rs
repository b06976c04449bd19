use std::io::{Read, Seek};

use crate::{
    storage::cursor::ByteCursor,
    types::{MAX_VARINT_LEN, error::Result},
};

const CONTINUATION_BIT: u8 = 0x80;
const LOW_SEVEN_BITS: u8 = 0x7F;

/// Decode one SQLite varint at the cursor. The first eight bytes contribute
/// seven bits each while their high bit is set; a ninth byte contributes all
/// eight bits and always terminates.
pub fn read_varint<R: Read + Seek>(cursor: &mut ByteCursor<R>) -> Result<u64> {
    let mut value = 0u64;
    for i in 0..MAX_VARINT_LEN {
        let byte = cursor.read_u8()?;
        if i == MAX_VARINT_LEN - 1 {
            return Ok((value << 8) | byte as u64);
        }
        value = (value << 7) | (byte & LOW_SEVEN_BITS) as u64;
        if byte & CONTINUATION_BIT == 0 {
            break;
        }
    }
    Ok(value)
}

/// Number of bytes `encode_varint` produces for `value`.
pub fn varint_len(value: u64) -> usize {
    if value > 0x00FF_FFFF_FFFF_FFFF {
        return MAX_VARINT_LEN;
    }
    let mut len = 1;
    let mut rest = value >> 7;
    while rest != 0 {
        len += 1;
        rest >>= 7;
    }
    len
}

pub fn encode_varint(value: u64) -> Vec<u8> {
    if value > 0x00FF_FFFF_FFFF_FFFF {
        // Nine-byte form: 8 groups of 7 bits, then a full final byte.
        let mut buffer = vec![0u8; MAX_VARINT_LEN];
        buffer[8] = value as u8;
        let mut rest = value >> 8;
        for slot in buffer[..8].iter_mut().rev() {
            *slot = (rest as u8 & LOW_SEVEN_BITS) | CONTINUATION_BIT;
            rest >>= 7;
        }
        return buffer;
    }

    let len = varint_len(value);
    let mut buffer = vec![0u8; len];
    let mut rest = value;
    for (i, slot) in buffer.iter_mut().rev().enumerate() {
        *slot = rest as u8 & LOW_SEVEN_BITS;
        if i > 0 {
            *slot |= CONTINUATION_BIT;
        }
        rest >>= 7;
    }
    buffer
}
