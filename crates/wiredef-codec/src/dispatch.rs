//! Descriptor-driven read / write / sizeOf entry points.
//!
//! Failure styles differ on purpose: an unregistered type is an error value
//! from `read` and `write` (composites inspect it), but a fault from
//! `size_of` (its callers sum results and have no use for a partial number).

use serde_json::Value;
use tracing::trace;
use wiredef_template::FieldRef;

use crate::context::Context;
use crate::datatype::Decoded;
use crate::error::{CodecError, Fault, Outcome, Result};
use crate::registry::TypeRegistry;

impl TypeRegistry {
    /// Read the value described by `descriptor` at `offset`.
    ///
    /// A reader that claims more bytes than remain in `buf` is an
    /// implementation bug and fails with [`Fault::MalformedRead`].
    pub fn read(
        &self,
        buf: &[u8],
        offset: usize,
        descriptor: &Value,
        ctx: &mut Context,
    ) -> Result<Outcome<Decoded>> {
        let field = FieldRef::normalize(descriptor);
        let Some(entry) = self.get(&field.type_name) else {
            return Ok(Err(CodecError::MissingType(field.type_name.into_owned())));
        };

        let outcome = entry.read(self, buf, offset, field.type_args, ctx)?;
        if let Ok(decoded) = &outcome {
            let remaining = buf.len().saturating_sub(offset);
            if decoded.size > remaining {
                return Err(Fault::MalformedRead {
                    descriptor: descriptor.to_string(),
                    offset,
                    size: decoded.size,
                    remaining,
                });
            }
            trace!(type_name = %field.type_name, offset, size = decoded.size, "read field");
        }
        Ok(outcome)
    }

    /// Write `value` as described by `descriptor` at `offset`.
    ///
    /// Returns the number of bytes written.
    pub fn write(
        &self,
        value: &Value,
        buf: &mut [u8],
        offset: usize,
        descriptor: &Value,
        ctx: &mut Context,
    ) -> Result<Outcome<usize>> {
        let field = FieldRef::normalize(descriptor);
        let Some(entry) = self.get(&field.type_name) else {
            return Ok(Err(CodecError::MissingType(field.type_name.into_owned())));
        };
        entry.write(self, value, buf, offset, field.type_args, ctx)
    }

    /// Number of bytes `write` would produce for `value`.
    pub fn size_of(&self, value: &Value, descriptor: &Value, ctx: &mut Context) -> Result<usize> {
        let field = FieldRef::normalize(descriptor);
        let Some(entry) = self.get(&field.type_name) else {
            return Err(Fault::MissingType(field.type_name.into_owned()));
        };
        entry.size_of(self, value, field.type_args, ctx)
    }
}
