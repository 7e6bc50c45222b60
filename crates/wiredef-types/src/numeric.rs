//! Fixed-width integers and floats.
//!
//! Unprefixed names are big-endian (`u16`, `i32`, `f64`), `l`-prefixed names
//! little-endian (`lu16`, `li32`, `lf64`).

use bytes::{Buf, BufMut};
use serde_json::Value;
use wiredef_codec::{CodecError, Context, DataType, Decoded, Outcome, Result, TypeRegistry};

use crate::wire::{take, take_mut};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Big,
    Little,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repr {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

impl Repr {
    pub fn width(self) -> usize {
        match self {
            Repr::I8 | Repr::U8 => 1,
            Repr::I16 | Repr::U16 => 2,
            Repr::I32 | Repr::U32 | Repr::F32 => 4,
            Repr::I64 | Repr::U64 | Repr::F64 => 8,
        }
    }
}

/// A fixed-width number.
#[derive(Debug, Clone, Copy)]
pub struct Numeric {
    name: &'static str,
    repr: Repr,
    endian: Endian,
}

const REPRS: [(&str, Repr); 10] = [
    ("i8", Repr::I8),
    ("u8", Repr::U8),
    ("i16", Repr::I16),
    ("u16", Repr::U16),
    ("i32", Repr::I32),
    ("u32", Repr::U32),
    ("i64", Repr::I64),
    ("u64", Repr::U64),
    ("f32", Repr::F32),
    ("f64", Repr::F64),
];

const LITTLE_NAMES: [&str; 10] = [
    "li8", "lu8", "li16", "lu16", "li32", "lu32", "li64", "lu64", "lf32", "lf64",
];

impl Numeric {
    pub fn new(name: &'static str, repr: Repr, endian: Endian) -> Self {
        Self { name, repr, endian }
    }

    /// Every big- and little-endian variant with its registered name.
    pub fn all() -> impl Iterator<Item = (&'static str, Numeric)> {
        let big = REPRS
            .into_iter()
            .map(|(name, repr)| (name, Numeric::new(name, repr, Endian::Big)));
        let little = REPRS
            .into_iter()
            .zip(LITTLE_NAMES)
            .map(|((_, repr), name)| (name, Numeric::new(name, repr, Endian::Little)));
        big.chain(little)
    }

    fn decode(&self, mut src: &[u8]) -> Value {
        let big = self.endian == Endian::Big;
        match self.repr {
            Repr::I8 => Value::from(src.get_i8()),
            Repr::U8 => Value::from(src.get_u8()),
            Repr::I16 => Value::from(if big { src.get_i16() } else { src.get_i16_le() }),
            Repr::U16 => Value::from(if big { src.get_u16() } else { src.get_u16_le() }),
            Repr::I32 => Value::from(if big { src.get_i32() } else { src.get_i32_le() }),
            Repr::U32 => Value::from(if big { src.get_u32() } else { src.get_u32_le() }),
            Repr::I64 => Value::from(if big { src.get_i64() } else { src.get_i64_le() }),
            Repr::U64 => Value::from(if big { src.get_u64() } else { src.get_u64_le() }),
            Repr::F32 => Value::from(f64::from(if big { src.get_f32() } else { src.get_f32_le() })),
            Repr::F64 => Value::from(if big { src.get_f64() } else { src.get_f64_le() }),
        }
    }

    fn encode(&self, value: &Value, mut dst: &mut [u8]) -> Outcome<()> {
        let big = self.endian == Endian::Big;
        match self.repr {
            Repr::I8 => dst.put_i8(self.integer(value)?),
            Repr::U8 => dst.put_u8(self.integer(value)?),
            Repr::I16 => {
                let v = self.integer(value)?;
                if big { dst.put_i16(v) } else { dst.put_i16_le(v) }
            }
            Repr::U16 => {
                let v = self.integer(value)?;
                if big { dst.put_u16(v) } else { dst.put_u16_le(v) }
            }
            Repr::I32 => {
                let v = self.integer(value)?;
                if big { dst.put_i32(v) } else { dst.put_i32_le(v) }
            }
            Repr::U32 => {
                let v = self.integer(value)?;
                if big { dst.put_u32(v) } else { dst.put_u32_le(v) }
            }
            Repr::I64 => {
                let v = self.integer(value)?;
                if big { dst.put_i64(v) } else { dst.put_i64_le(v) }
            }
            Repr::U64 => {
                let v = self.integer(value)?;
                if big { dst.put_u64(v) } else { dst.put_u64_le(v) }
            }
            Repr::F32 => {
                let v = self.float(value)? as f32;
                if big { dst.put_f32(v) } else { dst.put_f32_le(v) }
            }
            Repr::F64 => {
                let v = self.float(value)?;
                if big { dst.put_f64(v) } else { dst.put_f64_le(v) }
            }
        }
        Ok(())
    }

    fn integer<T>(&self, value: &Value) -> Outcome<T>
    where
        T: TryFrom<u64> + TryFrom<i64>,
    {
        if let Some(n) = value.as_u64() {
            if let Ok(v) = <T as TryFrom<u64>>::try_from(n) {
                return Ok(v);
            }
        } else if let Some(n) = value.as_i64() {
            if let Ok(v) = <T as TryFrom<i64>>::try_from(n) {
                return Ok(v);
            }
        }
        Err(CodecError::invalid(self.name, value))
    }

    fn float(&self, value: &Value) -> Outcome<f64> {
        value.as_f64().ok_or_else(|| CodecError::invalid(self.name, value))
    }
}

impl DataType for Numeric {
    fn read(
        &self,
        _registry: &TypeRegistry,
        buf: &[u8],
        offset: usize,
        _args: &Value,
        _ctx: &mut Context,
    ) -> Result<Outcome<Decoded>> {
        let width = self.repr.width();
        Ok(take(buf, offset, width).map(|src| Decoded::new(self.decode(src), width)))
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
        let width = self.repr.width();
        Ok(take_mut(buf, offset, width).and_then(|dst| self.encode(value, dst).map(|()| width)))
    }

    fn size_of(
        &self,
        _registry: &TypeRegistry,
        _value: &Value,
        _args: &Value,
        _ctx: &mut Context,
    ) -> Result<usize> {
        Ok(self.repr.width())
    }

    fn fixed_size(&self) -> Option<usize> {
        Some(self.repr.width())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn lookup(name: &str) -> Numeric {
        Numeric::all()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, numeric)| numeric)
            .unwrap()
    }

    fn read(name: &str, buf: &[u8]) -> Outcome<Decoded> {
        lookup(name)
            .read(&TypeRegistry::new(), buf, 0, &Value::Null, &mut Context::new())
            .unwrap()
    }

    fn write(name: &str, value: Value) -> Outcome<Vec<u8>> {
        let numeric = lookup(name);
        let mut buf = vec![0u8; numeric.repr.width()];
        numeric
            .write(&TypeRegistry::new(), &value, &mut buf, 0, &Value::Null, &mut Context::new())
            .unwrap()
            .map(|_| buf)
    }

    #[test]
    fn registers_twenty_variants() {
        assert_eq!(Numeric::all().count(), 20);
        assert_eq!(lookup("lu16").endian, Endian::Little);
        assert_eq!(lookup("u16").endian, Endian::Big);
    }

    #[test]
    fn u8_reads_single_byte() {
        assert_eq!(read("u8", &[0x05]).unwrap(), Decoded::new(5, 1));
    }

    #[test]
    fn endianness_is_respected() {
        assert_eq!(read("u16", &[0x01, 0x02]).unwrap().value, json!(0x0102));
        assert_eq!(read("lu16", &[0x01, 0x02]).unwrap().value, json!(0x0201));
        assert_eq!(write("i32", json!(-2)).unwrap(), vec![0xff, 0xff, 0xff, 0xfe]);
        assert_eq!(write("li32", json!(-2)).unwrap(), vec![0xfe, 0xff, 0xff, 0xff]);
    }

    #[test]
    fn wide_integers_keep_precision() {
        let bytes = write("u64", json!(u64::MAX)).unwrap();
        assert_eq!(read("u64", &bytes).unwrap().value, json!(u64::MAX));

        let bytes = write("li64", json!(i64::MIN)).unwrap();
        assert_eq!(read("li64", &bytes).unwrap().value, json!(i64::MIN));
    }

    #[test]
    fn floats_round_trip() {
        let bytes = write("f32", json!(1.5)).unwrap();
        assert_eq!(read("f32", &bytes).unwrap(), Decoded::new(1.5, 4));

        let bytes = write("lf64", json!(-0.25)).unwrap();
        assert_eq!(read("lf64", &bytes).unwrap().value, json!(-0.25));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert!(matches!(write("u8", json!(256)), Err(CodecError::InvalidValue { .. })));
        assert!(matches!(write("u16", json!(-1)), Err(CodecError::InvalidValue { .. })));
        assert!(matches!(write("i8", json!("7")), Err(CodecError::InvalidValue { .. })));
        assert!(matches!(write("f64", json!(null)), Err(CodecError::InvalidValue { .. })));
    }

    #[test]
    fn short_buffer_is_an_error_value() {
        assert_eq!(read("u32", &[1, 2]), Err(CodecError::eof(0, 4, 2)));
    }
}
