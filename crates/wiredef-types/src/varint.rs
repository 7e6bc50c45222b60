use serde_json::Value;
use wiredef_codec::{CodecError, Context, DataType, Decoded, Outcome, Result, TypeRegistry};

use crate::wire::{attempt, take_mut};

const MAX_BYTES: usize = 5;
const CONTINUE: u8 = 0x80;
const PAYLOAD: u8 = 0x7f;
// Payload bits of the fifth byte that fall outside 32 bits.
const OVERFLOW: u8 = 0x70;

/// Variable-length 32-bit integer: 7-bit groups, least significant first,
/// high bit set on every byte but the last. Negative values use their
/// two's-complement bit pattern and always take five bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct VarInt;

impl VarInt {
    fn encoded_len(value: i32) -> usize {
        let mut bits = value as u32;
        let mut len = 1;
        while bits & !u32::from(PAYLOAD) != 0 {
            bits >>= 7;
            len += 1;
        }
        len
    }

    fn value(value: &Value) -> Outcome<i32> {
        value
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .ok_or_else(|| CodecError::invalid("varint (32-bit signed)", value))
    }
}

impl DataType for VarInt {
    fn read(
        &self,
        _registry: &TypeRegistry,
        buf: &[u8],
        offset: usize,
        _args: &Value,
        _ctx: &mut Context,
    ) -> Result<Outcome<Decoded>> {
        let mut bits: u32 = 0;
        for index in 0..MAX_BYTES {
            let Some(&byte) = buf.get(offset + index) else {
                return Ok(Err(CodecError::eof(offset + index, 1, buf.len())));
            };
            if index == MAX_BYTES - 1 && byte & OVERFLOW != 0 {
                return Ok(Err(CodecError::InvalidValue {
                    expected: "varint within 32 bits".to_string(),
                    found: format!("final byte {byte:#04x} at offset {}", offset + index),
                }));
            }
            bits |= u32::from(byte & PAYLOAD) << (7 * index);
            if byte & CONTINUE == 0 {
                return Ok(Ok(Decoded::new(bits as i32, index + 1)));
            }
        }
        Ok(Err(CodecError::InvalidValue {
            expected: format!("varint of at most {MAX_BYTES} bytes"),
            found: format!("continuation bit set at offset {}", offset + MAX_BYTES - 1),
        }))
    }

    fn write(
        &self,
        _registry: &TypeRegistry,
        value: &Value,
        buf: &mut [u8],
        offset: usize,
        _args: &Value,
        _ctx: &mut Context,
    ) -> Result<Outcome<usize>> {
        let number = attempt!(Self::value(value));
        let len = Self::encoded_len(number);
        let dst = attempt!(take_mut(buf, offset, len));

        let mut bits = number as u32;
        for (index, slot) in dst.iter_mut().enumerate() {
            let group = (bits & u32::from(PAYLOAD)) as u8;
            bits >>= 7;
            *slot = if index + 1 < len { group | CONTINUE } else { group };
        }
        Ok(Ok(len))
    }

    fn size_of(
        &self,
        _registry: &TypeRegistry,
        value: &Value,
        _args: &Value,
        _ctx: &mut Context,
    ) -> Result<usize> {
        Ok(Self::encoded_len(Self::value(value)?))
    }
}
