//! Leaf types that are not plain numbers.

use serde_json::{Map, Value};
use wiredef_codec::{CodecError, Context, DataType, Decoded, Outcome, Result, TypeRegistry};

use crate::length::Length;
use crate::wire::{attempt, take, take_mut};

/// One byte; any non-zero value reads as `true`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bool;

impl DataType for Bool {
    fn read(
        &self,
        _registry: &TypeRegistry,
        buf: &[u8],
        offset: usize,
        _args: &Value,
        _ctx: &mut Context,
    ) -> Result<Outcome<Decoded>> {
        Ok(take(buf, offset, 1).map(|src| Decoded::new(src[0] != 0, 1)))
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
        let flag = attempt!(value.as_bool().ok_or_else(|| CodecError::invalid("bool", value)));
        let dst = attempt!(take_mut(buf, offset, 1));
        dst[0] = u8::from(flag);
        Ok(Ok(1))
    }

    fn size_of(
        &self,
        _registry: &TypeRegistry,
        _value: &Value,
        _args: &Value,
        _ctx: &mut Context,
    ) -> Result<usize> {
        Ok(1)
    }

    fn fixed_size(&self) -> Option<usize> {
        Some(1)
    }
}

/// Zero bytes on the wire; reads as `null` and writes whatever it is given.
#[derive(Debug, Clone, Copy, Default)]
pub struct Void;

impl DataType for Void {
    fn read(
        &self,
        _registry: &TypeRegistry,
        _buf: &[u8],
        _offset: usize,
        _args: &Value,
        _ctx: &mut Context,
    ) -> Result<Outcome<Decoded>> {
        Ok(Ok(Decoded::new(Value::Null, 0)))
    }

    fn write(
        &self,
        _registry: &TypeRegistry,
        _value: &Value,
        _buf: &mut [u8],
        _offset: usize,
        _args: &Value,
        _ctx: &mut Context,
    ) -> Result<Outcome<usize>> {
        Ok(Ok(0))
    }

    fn size_of(
        &self,
        _registry: &TypeRegistry,
        _value: &Value,
        _args: &Value,
        _ctx: &mut Context,
    ) -> Result<usize> {
        Ok(0)
    }

    fn fixed_size(&self) -> Option<usize> {
        Some(0)
    }
}

/// UTF-8 text terminated by a zero byte.
#[derive(Debug, Clone, Copy, Default)]
pub struct CString;

impl CString {
    fn text(value: &Value) -> Outcome<&str> {
        match value.as_str() {
            Some(text) if !text.contains('\0') => Ok(text),
            _ => Err(CodecError::invalid("cstring without NUL bytes", value)),
        }
    }
}

impl DataType for CString {
    fn read(
        &self,
        _registry: &TypeRegistry,
        buf: &[u8],
        offset: usize,
        _args: &Value,
        _ctx: &mut Context,
    ) -> Result<Outcome<Decoded>> {
        let rest = attempt!(take(buf, offset, buf.len().saturating_sub(offset)));
        let Some(end) = rest.iter().position(|byte| *byte == 0) else {
            return Ok(Err(CodecError::eof(buf.len(), 1, buf.len())));
        };
        let text = attempt!(utf8(&rest[..end]));
        Ok(Ok(Decoded::new(text, end + 1)))
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
        let text = attempt!(Self::text(value));
        let dst = attempt!(take_mut(buf, offset, text.len() + 1));
        dst[..text.len()].copy_from_slice(text.as_bytes());
        dst[text.len()] = 0;
        Ok(Ok(text.len() + 1))
    }

    fn size_of(
        &self,
        _registry: &TypeRegistry,
        value: &Value,
        _args: &Value,
        _ctx: &mut Context,
    ) -> Result<usize> {
        Ok(Self::text(value)?.len() + 1)
    }
}

/// UTF-8 text whose byte length comes from a [`Length`] argument.
#[derive(Debug, Clone, Copy, Default)]
pub struct PString;

impl DataType for PString {
    fn read(
        &self,
        registry: &TypeRegistry,
        buf: &[u8],
        offset: usize,
        args: &Value,
        ctx: &mut Context,
    ) -> Result<Outcome<Decoded>> {
        let length = attempt!(Length::from_args(args, "pstring"));
        let (len, prefix) = attempt!(length.read_count(registry, buf, offset, ctx)?);
        let bytes = attempt!(take(buf, offset + prefix, len));
        let text = attempt!(utf8(bytes));
        Ok(Ok(Decoded::new(text, prefix + len)))
    }

    fn write(
        &self,
        registry: &TypeRegistry,
        value: &Value,
        buf: &mut [u8],
        offset: usize,
        args: &Value,
        ctx: &mut Context,
    ) -> Result<Outcome<usize>> {
        let length = attempt!(Length::from_args(args, "pstring"));
        let text = attempt!(value.as_str().ok_or_else(|| CodecError::invalid("string", value)));
        let prefix = attempt!(length.write_count(registry, text.len(), buf, offset, ctx)?);
        let dst = attempt!(take_mut(buf, offset + prefix, text.len()));
        dst.copy_from_slice(text.as_bytes());
        Ok(Ok(prefix + text.len()))
    }

    fn size_of(
        &self,
        registry: &TypeRegistry,
        value: &Value,
        args: &Value,
        ctx: &mut Context,
    ) -> Result<usize> {
        let length = Length::from_args(args, "pstring")?;
        let text = value.as_str().ok_or_else(|| CodecError::invalid("string", value))?;
        Ok(length.prefix_size(registry, text.len(), ctx)? + text.len())
    }
}

/// Raw bytes, represented as an array of numbers `0..=255`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Buffer;

impl Buffer {
    fn bytes(value: &Value) -> Outcome<Vec<u8>> {
        let items = value
            .as_array()
            .ok_or_else(|| CodecError::invalid("array of bytes", value))?;
        items
            .iter()
            .map(|item| {
                item.as_u64()
                    .and_then(|n| u8::try_from(n).ok())
                    .ok_or_else(|| CodecError::invalid("byte (0..=255)", item))
            })
            .collect()
    }
}

impl DataType for Buffer {
    fn read(
        &self,
        registry: &TypeRegistry,
        buf: &[u8],
        offset: usize,
        args: &Value,
        ctx: &mut Context,
    ) -> Result<Outcome<Decoded>> {
        let length = attempt!(Length::from_args(args, "buffer"));
        let (len, prefix) = attempt!(length.read_count(registry, buf, offset, ctx)?);
        let bytes = attempt!(take(buf, offset + prefix, len));
        let value: Vec<Value> = bytes.iter().map(|byte| Value::from(*byte)).collect();
        Ok(Ok(Decoded::new(value, prefix + len)))
    }

    fn write(
        &self,
        registry: &TypeRegistry,
        value: &Value,
        buf: &mut [u8],
        offset: usize,
        args: &Value,
        ctx: &mut Context,
    ) -> Result<Outcome<usize>> {
        let length = attempt!(Length::from_args(args, "buffer"));
        let bytes = attempt!(Self::bytes(value));
        let prefix = attempt!(length.write_count(registry, bytes.len(), buf, offset, ctx)?);
        let dst = attempt!(take_mut(buf, offset + prefix, bytes.len()));
        dst.copy_from_slice(&bytes);
        Ok(Ok(prefix + bytes.len()))
    }

    fn size_of(
        &self,
        registry: &TypeRegistry,
        value: &Value,
        args: &Value,
        ctx: &mut Context,
    ) -> Result<usize> {
        let length = Length::from_args(args, "buffer")?;
        let len = Self::bytes(value)?.len();
        Ok(length.prefix_size(registry, len, ctx)? + len)
    }
}

/// Translates between a numeric wire value and a symbolic one.
///
/// `{"type": "varint", "mappings": {"0x00": "handshake", "1": "status"}}`;
/// keys are decimal or `0x`-prefixed hex.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mapper;

struct Mappings<'a> {
    inner: &'a Value,
    table: &'a Map<String, Value>,
}

impl<'a> Mappings<'a> {
    fn from_args(args: &'a Value) -> Outcome<Self> {
        match (args.get("type"), args.get("mappings").and_then(Value::as_object)) {
            (Some(inner), Some(table)) => Ok(Self { inner, table }),
            _ => Err(CodecError::invalid("mapper arguments with type and mappings", args)),
        }
    }

    fn symbol(&self, raw: &Value) -> Outcome<Value> {
        let wanted = raw.as_i64();
        self.table
            .iter()
            .find(|(key, _)| wanted.is_some() && parse_key(key) == wanted)
            .map(|(_, symbol)| symbol.clone())
            .ok_or_else(|| CodecError::invalid("a mapped value", raw))
    }

    fn raw(&self, symbol: &Value) -> Outcome<Value> {
        self.table
            .iter()
            .find(|(_, candidate)| *candidate == symbol)
            .and_then(|(key, _)| parse_key(key))
            .map(Value::from)
            .ok_or_else(|| CodecError::invalid("a mapped symbol", symbol))
    }
}

fn parse_key(key: &str) -> Option<i64> {
    let key = key.trim();
    match key.strip_prefix("0x").or_else(|| key.strip_prefix("0X")) {
        Some(hex) => i64::from_str_radix(hex, 16).ok(),
        None => key.parse().ok(),
    }
}

impl DataType for Mapper {
    fn read(
        &self,
        registry: &TypeRegistry,
        buf: &[u8],
        offset: usize,
        args: &Value,
        ctx: &mut Context,
    ) -> Result<Outcome<Decoded>> {
        let mappings = attempt!(Mappings::from_args(args));
        let raw = attempt!(registry.read(buf, offset, mappings.inner, ctx)?);
        let symbol = attempt!(mappings.symbol(&raw.value));
        Ok(Ok(Decoded::new(symbol, raw.size)))
    }

    fn write(
        &self,
        registry: &TypeRegistry,
        value: &Value,
        buf: &mut [u8],
        offset: usize,
        args: &Value,
        ctx: &mut Context,
    ) -> Result<Outcome<usize>> {
        let mappings = attempt!(Mappings::from_args(args));
        let raw = attempt!(mappings.raw(value));
        registry.write(&raw, buf, offset, mappings.inner, ctx)
    }

    fn size_of(
        &self,
        registry: &TypeRegistry,
        value: &Value,
        args: &Value,
        ctx: &mut Context,
    ) -> Result<usize> {
        let mappings = Mappings::from_args(args)?;
        let raw = mappings.raw(value)?;
        registry.size_of(&raw, mappings.inner, ctx)
    }
}

fn utf8(bytes: &[u8]) -> Outcome<&str> {
    std::str::from_utf8(bytes).map_err(|err| CodecError::InvalidValue {
        expected: "UTF-8 text".to_string(),
        found: err.to_string(),
    })
}
