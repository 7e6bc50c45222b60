use serde_json::{json, Value};
use wiredef_codec::{CodecError, Context, Outcome, Result, TypeRegistry};

use crate::wire::as_count;

/// Where a string, buffer or array finds its element count.
///
/// ```text
/// {"countType": "varint"}   count prefix read/written with that type
/// {"count": 4}              fixed count, no prefix
/// {"count": "len"}          sibling field resolved through the context
/// {"rest": true}            everything up to the end of the buffer
/// ```
#[derive(Debug, Clone, Copy)]
pub(crate) enum Length<'a> {
    Prefixed(&'a Value),
    Fixed(usize),
    Reference(&'a str),
    Rest,
}

impl<'a> Length<'a> {
    pub(crate) fn from_args(args: &'a Value, owner: &str) -> Outcome<Self> {
        if let Some(count_type) = args.get("countType").filter(|v| !v.is_null()) {
            return Ok(Self::Prefixed(count_type));
        }
        match args.get("count") {
            Some(Value::String(reference)) => return Ok(Self::Reference(reference)),
            Some(count @ Value::Number(_)) => {
                return as_count(count, "a fixed count").map(Self::Fixed)
            }
            _ => {}
        }
        if args.get("rest").and_then(Value::as_bool) == Some(true) {
            return Ok(Self::Rest);
        }
        Err(CodecError::invalid(
            format!("{owner} arguments with countType, count or rest"),
            args,
        ))
    }

    /// Read the element count at `offset`; returns `(count, prefix bytes)`.
    ///
    /// `Rest` reports the number of bytes left in the buffer.
    pub(crate) fn read_count(
        &self,
        registry: &TypeRegistry,
        buf: &[u8],
        offset: usize,
        ctx: &mut Context,
    ) -> Result<Outcome<(usize, usize)>> {
        Ok(match *self {
            Self::Prefixed(count_type) => match registry.read(buf, offset, count_type, ctx)? {
                Ok(prefix) => as_count(&prefix.value, "a count prefix").map(|n| (n, prefix.size)),
                Err(err) => Err(err),
            },
            Self::Fixed(count) => Ok((count, 0)),
            Self::Reference(reference) => resolve(ctx, reference).map(|n| (n, 0)),
            Self::Rest => Ok((buf.len().saturating_sub(offset), 0)),
        })
    }

    /// Write the prefix for `count` elements; returns prefix bytes.
    pub(crate) fn write_count(
        &self,
        registry: &TypeRegistry,
        count: usize,
        buf: &mut [u8],
        offset: usize,
        ctx: &mut Context,
    ) -> Result<Outcome<usize>> {
        match *self {
            Self::Prefixed(count_type) => {
                registry.write(&json!(count), buf, offset, count_type, ctx)
            }
            Self::Fixed(expected) if expected != count => Ok(Err(CodecError::invalid(
                format!("exactly {expected} elements"),
                &json!(count),
            ))),
            _ => Ok(Ok(0)),
        }
    }

    /// Size of the prefix for `count` elements.
    pub(crate) fn prefix_size(
        &self,
        registry: &TypeRegistry,
        count: usize,
        ctx: &mut Context,
    ) -> Result<usize> {
        match *self {
            Self::Prefixed(count_type) => registry.size_of(&json!(count), count_type, ctx),
            _ => Ok(0),
        }
    }
}

fn resolve(ctx: &Context, reference: &str) -> Outcome<usize> {
    let value = ctx
        .lookup(reference)
        .ok_or_else(|| CodecError::MissingField(reference.to_string()))?;
    as_count(value, "a count field")
}
