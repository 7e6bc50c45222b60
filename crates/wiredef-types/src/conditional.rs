use serde_json::Value;
use wiredef_codec::{CodecError, Context, DataType, Decoded, Outcome, Result, TypeRegistry};

use crate::wire::{attempt, take, take_mut};

/// Chooses a type from the value of another field.
///
/// ```json
/// ["switch", {
///   "compareTo": "kind",
///   "fields": {"0": "varint", "1": "string"},
///   "default": "void"
/// }]
/// ```
///
/// `compareToValue` supplies the selector directly instead of a field
/// reference; derived types use it to pass the selector as a parameter.
#[derive(Debug, Clone, Copy, Default)]
pub struct Switch;

impl Switch {
    fn case<'a>(args: &'a Value, ctx: &Context) -> Outcome<&'a Value> {
        let direct = args.get("compareToValue");
        let reference = args.get("compareTo").and_then(Value::as_str);
        let selector = match (direct, reference) {
            (Some(value), _) if !value.is_null() => value.clone(),
            (_, Some(reference)) => ctx
                .lookup(reference)
                .cloned()
                .ok_or_else(|| CodecError::MissingField(reference.to_string()))?,
            _ => {
                return Err(CodecError::invalid(
                    "switch arguments with compareTo or compareToValue",
                    args,
                ))
            }
        };

        let key = match &selector {
            Value::String(text) => text.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(flag) => flag.to_string(),
            other => return Err(CodecError::invalid("a string, number or bool selector", other)),
        };
        args.get("fields")
            .and_then(|fields| fields.get(&key))
            .or_else(|| args.get("default"))
            .filter(|case| !case.is_null())
            .ok_or_else(|| CodecError::invalid("a switch case or default", &selector))
    }
}

impl DataType for Switch {
    fn read(
        &self,
        registry: &TypeRegistry,
        buf: &[u8],
        offset: usize,
        args: &Value,
        ctx: &mut Context,
    ) -> Result<Outcome<Decoded>> {
        let case = attempt!(Self::case(args, ctx));
        registry.read(buf, offset, case, ctx)
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
        let case = attempt!(Self::case(args, ctx));
        registry.write(value, buf, offset, case, ctx)
    }

    fn size_of(
        &self,
        registry: &TypeRegistry,
        value: &Value,
        args: &Value,
        ctx: &mut Context,
    ) -> Result<usize> {
        let case = Self::case(args, ctx)?;
        registry.size_of(value, case, ctx)
    }
}

/// A presence byte followed by the value when it is non-zero.
///
/// The argument is the wrapped type's descriptor; `null` means absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptionType;

impl DataType for OptionType {
    fn read(
        &self,
        registry: &TypeRegistry,
        buf: &[u8],
        offset: usize,
        args: &Value,
        ctx: &mut Context,
    ) -> Result<Outcome<Decoded>> {
        let present = attempt!(take(buf, offset, 1))[0] != 0;
        if !present {
            return Ok(Ok(Decoded::new(Value::Null, 1)));
        }
        let inner = attempt!(registry.read(buf, offset + 1, args, ctx)?);
        Ok(Ok(Decoded::new(inner.value, inner.size + 1)))
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
        let flag = attempt!(take_mut(buf, offset, 1));
        if value.is_null() {
            flag[0] = 0;
            return Ok(Ok(1));
        }
        flag[0] = 1;
        let written = attempt!(registry.write(value, buf, offset + 1, args, ctx)?);
        Ok(Ok(written + 1))
    }

    fn size_of(
        &self,
        registry: &TypeRegistry,
        value: &Value,
        args: &Value,
        ctx: &mut Context,
    ) -> Result<usize> {
        if value.is_null() {
            return Ok(1);
        }
        Ok(registry.size_of(value, args, ctx)? + 1)
    }
}
