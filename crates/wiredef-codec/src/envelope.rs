use bytes::{Bytes, BytesMut};
use serde_json::Value;
use tracing::{trace, warn};
use wiredef_template::FieldRef;

use crate::context::Context;
use crate::error::{Fault, Outcome, Result, Stage};
use crate::registry::TypeRegistry;

/// Size information about a parsed packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketMetadata {
    /// Bytes consumed by the decode.
    pub size: usize,
}

/// A decoded packet alongside the bytes it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPacket {
    pub data: Value,
    pub metadata: PacketMetadata,
    /// The original buffer, e.g. for checksumming.
    pub buffer: Bytes,
}

impl TypeRegistry {
    /// Encode `packet` into a buffer of exactly its computed size.
    ///
    /// Failures are reported as [`Fault::Packet`] naming the stage (size
    /// computation or write) and the dotted path of the failing field.
    pub fn create_packet_buffer(&self, descriptor: &Value, packet: &Value) -> Result<Bytes> {
        let root = root_name(descriptor);

        let size = self
            .size_of(packet, descriptor, &mut Context::new())
            .map_err(|fault| fault.annotate(Stage::SizeOf, &root))?;
        if size > self.config().max_packet_size {
            return Err(Fault::PacketTooLarge {
                size,
                max: self.config().max_packet_size,
            });
        }

        let mut buffer = BytesMut::zeroed(size);
        let written = escalate(self.write(packet, &mut buffer, 0, descriptor, &mut Context::new()))
            .map_err(|fault| fault.annotate(Stage::Write, &root))?;

        if written != size {
            warn!(type_name = %root, expected = size, written, "write size differs from size_of");
            if self.config().verify_write_size {
                return Err(Fault::SizeMismatch {
                    expected: size,
                    written,
                });
            }
        }

        trace!(type_name = %root, size, "encoded packet");
        Ok(buffer.freeze())
    }

    /// Decode one packet from the start of `buffer`.
    ///
    /// Trailing bytes are allowed; `metadata.size` reports what was consumed.
    pub fn parse_packet_buffer(
        &self,
        descriptor: &Value,
        buffer: impl Into<Bytes>,
    ) -> Result<ParsedPacket> {
        let buffer = buffer.into();
        let root = root_name(descriptor);

        let decoded = escalate(self.read(&buffer, 0, descriptor, &mut Context::new()))
            .map_err(|fault| fault.annotate(Stage::Read, &root))?;

        trace!(type_name = %root, size = decoded.size, "decoded packet");
        Ok(ParsedPacket {
            data: decoded.value,
            metadata: PacketMetadata { size: decoded.size },
            buffer,
        })
    }
}

/// Turn a returned error value into a fault.
fn escalate<T>(result: Result<Outcome<T>>) -> Result<T> {
    Ok(result??)
}

fn root_name(descriptor: &Value) -> String {
    FieldRef::normalize(descriptor).type_name.into_owned()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::RegistryConfig;
    use crate::datatype::{Decoded, FnType, SizeOf};
    use crate::error::CodecError;
    use crate::registry::TypeSpec;

    fn byte_type() -> FnType {
        FnType::new(
            |_, buf, offset, _, _| match buf.get(offset) {
                Some(byte) => Ok(Ok(Decoded::new(*byte, 1))),
                None => Ok(Err(CodecError::eof(offset, 1, buf.len()))),
            },
            |_, value, buf, offset, _, _| match value.as_u64().and_then(|v| u8::try_from(v).ok()) {
                Some(byte) => {
                    buf[offset] = byte;
                    Ok(Ok(1))
                }
                None => Ok(Err(CodecError::invalid("byte", value))),
            },
            SizeOf::Fixed(1),
        )
    }

    /// Claims two bytes but writes one.
    fn lying_type() -> FnType {
        FnType::new(
            |_, _, _, _, _| Ok(Ok(Decoded::new(0, 0))),
            |_, _, _, _, _, _| Ok(Ok(1)),
            SizeOf::Fixed(2),
        )
    }

    fn registry(config: RegistryConfig) -> TypeRegistry {
        let mut registry = TypeRegistry::with_config(config);
        registry.add_type("byte", TypeSpec::raw(byte_type())).unwrap();
        registry.add_type("liar", TypeSpec::raw(lying_type())).unwrap();
        registry
    }

    #[test]
    fn create_then_parse() {
        let registry = registry(RegistryConfig::default());
        let buffer = registry.create_packet_buffer(&json!("byte"), &json!(5)).unwrap();
        assert_eq!(buffer.as_ref(), &[0x05]);

        let parsed = registry.parse_packet_buffer(&json!("byte"), buffer.clone()).unwrap();
        assert_eq!(parsed.data, json!(5));
        assert_eq!(parsed.metadata, PacketMetadata { size: 1 });
        assert_eq!(parsed.buffer, buffer);
    }

    #[test]
    fn parse_reports_consumed_size_with_trailing_bytes() {
        let registry = registry(RegistryConfig::default());
        let parsed = registry
            .parse_packet_buffer(&json!("byte"), Bytes::from_static(&[9, 1, 2]))
            .unwrap();
        assert_eq!(parsed.metadata.size, 1);
        assert_eq!(parsed.buffer.len(), 3);
    }

    #[test]
    fn size_stage_fault_is_annotated() {
        let registry = registry(RegistryConfig::default());
        let err = registry.create_packet_buffer(&json!("nope"), &json!(1)).unwrap_err();
        assert_eq!(err.to_string(), "SizeOf error for nope : missing data type: nope");
    }

    #[test]
    fn write_stage_error_value_is_annotated() {
        let registry = registry(RegistryConfig::default());
        let err = registry.create_packet_buffer(&json!("byte"), &json!(300)).unwrap_err();
        assert!(matches!(err, Fault::Packet { stage: Stage::Write, .. }));
        assert_eq!(
            err.to_string(),
            "Write error for byte : invalid value: expected byte, found 300"
        );
    }

    #[test]
    fn read_stage_error_value_is_annotated() {
        let registry = registry(RegistryConfig::default());
        let err = registry.parse_packet_buffer(&json!("byte"), Bytes::new()).unwrap_err();
        assert!(matches!(err, Fault::Packet { stage: Stage::Read, .. }));
    }

    #[test]
    fn size_mismatch_is_rejected() {
        let registry = registry(RegistryConfig::default());
        let err = registry.create_packet_buffer(&json!("liar"), &Value::Null).unwrap_err();
        assert!(matches!(err, Fault::SizeMismatch { expected: 2, written: 1 }));
    }

    #[test]
    fn size_mismatch_tolerated_when_unverified() {
        let registry = registry(RegistryConfig {
            verify_write_size: false,
            ..RegistryConfig::default()
        });
        let buffer = registry.create_packet_buffer(&json!("liar"), &Value::Null).unwrap();
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn oversized_packet_is_rejected() {
        let registry = registry(RegistryConfig {
            max_packet_size: 1,
            ..RegistryConfig::default()
        });
        let err = registry.create_packet_buffer(&json!("liar"), &Value::Null).unwrap_err();
        assert!(matches!(err, Fault::PacketTooLarge { size: 2, max: 1 }));
    }
}
