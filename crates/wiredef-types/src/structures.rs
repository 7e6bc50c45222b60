//! Composite types: arrays, counts and containers.
//!
//! Composites dispatch their members back through the registry and prefix
//! member failures with a breadcrumb (`container` the field name, `array`
//! the element index), so the packet envelope can report `body.items.2`.

use serde_json::{Map, Value};
use wiredef_codec::{CodecError, Context, DataType, Decoded, Outcome, Result, TypeRegistry};

use crate::length::Length;
use crate::wire::{attempt, length_of, NULL};

/// `{"type": <descriptor>, "countType" | "count": ...}`
#[derive(Debug, Clone, Copy, Default)]
pub struct Array;

fn element_type<'a>(args: &'a Value, owner: &str) -> Outcome<&'a Value> {
    args.get("type")
        .filter(|v| !v.is_null())
        .ok_or_else(|| CodecError::invalid(format!("{owner} arguments with a type"), args))
}

/// Arrays count elements, so the byte-oriented `rest` form does not apply.
fn array_length(args: &Value) -> Outcome<Length<'_>> {
    match Length::from_args(args, "array")? {
        Length::Rest => Err(CodecError::invalid(
            "array arguments with countType or count",
            args,
        )),
        length => Ok(length),
    }
}

impl DataType for Array {
    fn read(
        &self,
        registry: &TypeRegistry,
        buf: &[u8],
        offset: usize,
        args: &Value,
        ctx: &mut Context,
    ) -> Result<Outcome<Decoded>> {
        let element = attempt!(element_type(args, "array"));
        let length = attempt!(array_length(args));
        let (count, mut cursor) = attempt!(length.read_count(registry, buf, offset, ctx)?);

        let mut items = Vec::with_capacity(count.min(buf.len()));
        for index in 0..count {
            let decoded = registry
                .read(buf, offset + cursor, element, ctx)
                .map_err(|fault| fault.in_field(index))?;
            let decoded = attempt!(decoded.map_err(|err| err.in_field(index)));
            cursor += decoded.size;
            items.push(decoded.value);
        }
        Ok(Ok(Decoded::new(items, cursor)))
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
        let element = attempt!(element_type(args, "array"));
        let length = attempt!(array_length(args));
        let items = attempt!(value.as_array().ok_or_else(|| CodecError::invalid("array", value)));

        let mut cursor = attempt!(length.write_count(registry, items.len(), buf, offset, ctx)?);
        for (index, item) in items.iter().enumerate() {
            let written = registry
                .write(item, buf, offset + cursor, element, ctx)
                .map_err(|fault| fault.in_field(index))?;
            cursor += attempt!(written.map_err(|err| err.in_field(index)));
        }
        Ok(Ok(cursor))
    }

    fn size_of(
        &self,
        registry: &TypeRegistry,
        value: &Value,
        args: &Value,
        ctx: &mut Context,
    ) -> Result<usize> {
        let element = element_type(args, "array")?;
        let length = array_length(args)?;
        let items = value
            .as_array()
            .ok_or_else(|| CodecError::invalid("array", value))?;

        let mut size = length.prefix_size(registry, items.len(), ctx)?;
        for (index, item) in items.iter().enumerate() {
            size += registry
                .size_of(item, element, ctx)
                .map_err(|fault| fault.in_field(index))?;
        }
        Ok(size)
    }
}

/// A number holding the length of a sibling field.
///
/// `{"type": "varint", "countFor": "items"}`. When writing, the length is
/// taken from the sibling when it is present; otherwise the given value is
/// written as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct Count;

impl Count {
    fn wire_value(value: &Value, args: &Value, ctx: &Context) -> Outcome<Value> {
        let sibling = args
            .get("countFor")
            .and_then(Value::as_str)
            .and_then(|reference| ctx.lookup(reference));
        match sibling {
            Some(sibling) => length_of(sibling).map(Value::from),
            None => Ok(value.clone()),
        }
    }
}

impl DataType for Count {
    fn read(
        &self,
        registry: &TypeRegistry,
        buf: &[u8],
        offset: usize,
        args: &Value,
        ctx: &mut Context,
    ) -> Result<Outcome<Decoded>> {
        let inner = attempt!(element_type(args, "count"));
        registry.read(buf, offset, inner, ctx)
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
        let inner = attempt!(element_type(args, "count"));
        let count = attempt!(Self::wire_value(value, args, ctx));
        registry.write(&count, buf, offset, inner, ctx)
    }

    fn size_of(
        &self,
        registry: &TypeRegistry,
        value: &Value,
        args: &Value,
        ctx: &mut Context,
    ) -> Result<usize> {
        let inner = element_type(args, "count")?;
        let count = Self::wire_value(value, args, ctx)?;
        registry.size_of(&count, inner, ctx)
    }
}

/// Ordered named fields: `[{"name": "id", "type": "varint"}, ...]`.
///
/// Each container opens a context scope holding its fields, so members can
/// reference siblings (`"len"`) or fields of an enclosing container
/// (`"../len"`). A field marked `"anon": true` has no name of its own; its
/// object members are merged into the container.
#[derive(Debug, Clone, Copy, Default)]
pub struct Container;

struct Member<'a> {
    name: Option<&'a str>,
    descriptor: &'a Value,
}

impl Member<'_> {
    fn label(&self, index: usize) -> String {
        self.name.map_or_else(|| index.to_string(), str::to_string)
    }
}

fn members(args: &Value) -> Outcome<Vec<Member<'_>>> {
    let items = args
        .as_array()
        .ok_or_else(|| CodecError::invalid("container arguments as an array of fields", args))?;
    items
        .iter()
        .map(|item| {
            let anon = item.get("anon").and_then(Value::as_bool).unwrap_or(false);
            let name = item.get("name").and_then(Value::as_str);
            match (item.get("type"), name, anon) {
                (Some(descriptor), Some(name), false) => Ok(Member {
                    name: Some(name),
                    descriptor,
                }),
                (Some(descriptor), _, true) => Ok(Member { name: None, descriptor }),
                _ => Err(CodecError::invalid("container field with name and type", item)),
            }
        })
        .collect()
}

impl Container {
    fn member_value<'v>(member: &Member<'_>, object: &'v Value) -> &'v Value {
        match member.name {
            Some(name) => object.get(name).unwrap_or(&NULL),
            None => object,
        }
    }
}

impl DataType for Container {
    fn read(
        &self,
        registry: &TypeRegistry,
        buf: &[u8],
        offset: usize,
        args: &Value,
        ctx: &mut Context,
    ) -> Result<Outcome<Decoded>> {
        let members = attempt!(members(args));
        ctx.scoped(Map::new(), |ctx| -> Result<Outcome<Decoded>> {
            let mut object = Map::new();
            let mut cursor = 0usize;
            for (index, member) in members.iter().enumerate() {
                let decoded = registry
                    .read(buf, offset + cursor, member.descriptor, ctx)
                    .map_err(|fault| fault.in_field(member.label(index)))?;
                let decoded = attempt!(decoded.map_err(|err| err.in_field(member.label(index))));
                cursor += decoded.size;

                match (member.name, decoded.value) {
                    (Some(name), value) => {
                        ctx.insert(name, value.clone());
                        object.insert(name.to_string(), value);
                    }
                    (None, Value::Object(merged)) => {
                        for (name, value) in merged {
                            ctx.insert(name.clone(), value.clone());
                            object.insert(name, value);
                        }
                    }
                    (None, _) => {}
                }
            }
            Ok(Ok(Decoded::new(object, cursor)))
        })
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
        let members = attempt!(members(args));
        let fields = attempt!(value
            .as_object()
            .ok_or_else(|| CodecError::invalid("object", value)));

        ctx.scoped(fields.clone(), |ctx| -> Result<Outcome<usize>> {
            let mut cursor = 0usize;
            for (index, member) in members.iter().enumerate() {
                let item = Self::member_value(member, value);
                let written = registry
                    .write(item, buf, offset + cursor, member.descriptor, ctx)
                    .map_err(|fault| fault.in_field(member.label(index)))?;
                cursor += attempt!(written.map_err(|err| err.in_field(member.label(index))));
            }
            Ok(Ok(cursor))
        })
    }

    fn size_of(
        &self,
        registry: &TypeRegistry,
        value: &Value,
        args: &Value,
        ctx: &mut Context,
    ) -> Result<usize> {
        let members = members(args)?;
        let fields = value
            .as_object()
            .ok_or_else(|| CodecError::invalid("object", value))?;

        ctx.scoped(fields.clone(), |ctx| -> Result<usize> {
            let mut size = 0usize;
            for (index, member) in members.iter().enumerate() {
                size += registry
                    .size_of(Self::member_value(member, value), member.descriptor, ctx)
                    .map_err(|fault| fault.in_field(member.label(index)))?;
            }
            Ok(size)
        })
    }
}
