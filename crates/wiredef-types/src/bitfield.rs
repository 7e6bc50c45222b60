use serde_json::{Map, Value};
use wiredef_codec::{CodecError, Context, DataType, Decoded, Outcome, Result, TypeRegistry};

use crate::wire::{attempt, take, take_mut, NULL};

const MAX_FIELD_BITS: u32 = 32;

/// Named integer fields packed most-significant bit first.
///
/// `[{"name": "x", "size": 26, "signed": true}, {"name": "flag", "size": 1}]`;
/// the total is rounded up to whole bytes and unused low bits are zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bitfield;

struct Field<'a> {
    name: &'a str,
    size: u32,
    signed: bool,
}

impl<'a> Field<'a> {
    fn decode(&self, bits: u64) -> Value {
        let mask = (1u64 << self.size) - 1;
        let raw = bits & mask;
        if self.signed && raw >> (self.size - 1) == 1 {
            Value::from(raw as i64 - (1i64 << self.size))
        } else {
            Value::from(raw)
        }
    }

    fn encode(&self, value: &Value) -> Outcome<u64> {
        let (min, max) = if self.signed {
            (-(1i64 << (self.size - 1)), (1i64 << (self.size - 1)) - 1)
        } else {
            (0, (1i64 << self.size) - 1)
        };
        match value.as_i64() {
            Some(n) if (min..=max).contains(&n) => Ok((n as u64) & ((1u64 << self.size) - 1)),
            _ => Err(CodecError::invalid(
                format!(
                    "{}-bit {} integer",
                    self.size,
                    if self.signed { "signed" } else { "unsigned" }
                ),
                value,
            )
            .in_field(self.name)),
        }
    }
}

fn fields(args: &Value) -> Outcome<Vec<Field<'_>>> {
    let items = args
        .as_array()
        .ok_or_else(|| CodecError::invalid("bitfield arguments as an array of fields", args))?;
    items
        .iter()
        .map(|item| {
            let name = item.get("name").and_then(Value::as_str);
            let size = item
                .get("size")
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok())
                .filter(|n| (1..=MAX_FIELD_BITS).contains(n));
            match (name, size) {
                (Some(name), Some(size)) => Ok(Field {
                    name,
                    size,
                    signed: item.get("signed").and_then(Value::as_bool).unwrap_or(false),
                }),
                _ => Err(CodecError::invalid(
                    format!("bitfield entry with name and size 1..={MAX_FIELD_BITS}"),
                    item,
                )),
            }
        })
        .collect()
}

fn byte_len(fields: &[Field<'_>]) -> usize {
    let bits: u32 = fields.iter().map(|field| field.size).sum();
    bits.div_ceil(8) as usize
}

impl DataType for Bitfield {
    fn read(
        &self,
        _registry: &TypeRegistry,
        buf: &[u8],
        offset: usize,
        args: &Value,
        _ctx: &mut Context,
    ) -> Result<Outcome<Decoded>> {
        let fields = attempt!(fields(args));
        let len = byte_len(&fields);
        let src = attempt!(take(buf, offset, len));

        let mut object = Map::new();
        let mut cursor = 0usize;
        for field in &fields {
            let bits = read_bits(src, cursor, field.size);
            object.insert(field.name.to_string(), field.decode(bits));
            cursor += field.size as usize;
        }
        Ok(Ok(Decoded::new(object, len)))
    }

    fn write(
        &self,
        _registry: &TypeRegistry,
        value: &Value,
        buf: &mut [u8],
        offset: usize,
        args: &Value,
        _ctx: &mut Context,
    ) -> Result<Outcome<usize>> {
        let fields = attempt!(fields(args));
        let len = byte_len(&fields);
        let dst = attempt!(take_mut(buf, offset, len));
        dst.fill(0);

        let mut cursor = 0usize;
        for field in &fields {
            let member = value.get(field.name).unwrap_or(&NULL);
            let bits = attempt!(field.encode(member));
            write_bits(dst, cursor, field.size, bits);
            cursor += field.size as usize;
        }
        Ok(Ok(len))
    }

    fn size_of(
        &self,
        _registry: &TypeRegistry,
        _value: &Value,
        args: &Value,
        _ctx: &mut Context,
    ) -> Result<usize> {
        Ok(byte_len(&fields(args)?))
    }
}

fn read_bits(src: &[u8], start: usize, size: u32) -> u64 {
    (0..size as usize).fold(0u64, |acc, i| {
        let bit = start + i;
        let set = src[bit / 8] >> (7 - bit % 8) & 1;
        (acc << 1) | u64::from(set)
    })
}

fn write_bits(dst: &mut [u8], start: usize, size: u32, bits: u64) {
    for i in 0..size as usize {
        let bit = start + i;
        if bits >> (size as usize - 1 - i) & 1 == 1 {
            dst[bit / 8] |= 1 << (7 - bit % 8);
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn args() -> Value {
        json!([
            {"name": "x", "size": 4, "signed": true},
            {"name": "y", "size": 6},
            {"name": "flag", "size": 1}
        ])
    }

    #[test]
    fn packs_msb_first_into_whole_bytes() {
        let registry = TypeRegistry::new();
        let mut ctx = Context::new();
        let value = json!({"x": -2, "y": 33, "flag": 1});

        assert_eq!(Bitfield.size_of(&registry, &value, &args(), &mut ctx).unwrap(), 2);
        let mut buf = [0u8; 2];
        let written = Bitfield
            .write(&registry, &value, &mut buf, 0, &args(), &mut ctx)
            .unwrap()
            .unwrap();
        assert_eq!(written, 2);
        // 1110 100001 1 00000
        assert_eq!(buf, [0b1110_1000, 0b0110_0000]);

        let decoded = Bitfield
            .read(&registry, &buf, 0, &args(), &mut ctx)
            .unwrap()
            .unwrap();
        assert_eq!(decoded, Decoded::new(value, 2));
    }

    #[test]
    fn out_of_range_member_names_the_field() {
        let mut buf = [0u8; 2];
        let err = Bitfield
            .write(
                &TypeRegistry::new(),
                &json!({"x": 9, "y": 0, "flag": 0}),
                &mut buf,
                0,
                &args(),
                &mut Context::new(),
            )
            .unwrap()
            .unwrap_err();
        assert_eq!(err.field_path(), Some("x"));
    }

    #[test]
    fn rejects_oversized_fields() {
        let result = Bitfield.size_of(
            &TypeRegistry::new(),
            &Value::Null,
            &json!([{"name": "wide", "size": 33}]),
            &mut Context::new(),
        );
        assert!(result.is_err());
    }
}
