//! Type registry, dispatch and packet envelope for declarative binary protocols.
//!
//! A protocol is a set of named types, each implementing [`DataType`]:
//! - Raw types are hand-written (integers, strings, containers, ...)
//! - Derived types bind arguments into another type's template, e.g.
//!   `"string": ["pstring", {"countType": "varint"}]`
//!
//! [`TypeRegistry::read`], [`TypeRegistry::write`] and
//! [`TypeRegistry::size_of`] resolve a field descriptor and dispatch to the
//! registered type. [`TypeRegistry::create_packet_buffer`] and
//! [`TypeRegistry::parse_packet_buffer`] wrap a whole packet, allocating
//! exactly the computed size and annotating failures with the field path.

pub mod config;
pub mod context;
pub mod datatype;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod loader;
pub mod registry;
pub mod specialize;

pub use config::{RegistryConfig, DEFAULT_MAX_PACKET_SIZE, DEFAULT_MAX_PROTOCOL_FILE_SIZE};
pub use context::Context;
pub use datatype::{DataType, Decoded, FnType, SizeOf};
pub use envelope::{PacketMetadata, ParsedPacket};
pub use error::{CodecError, Fault, Outcome, Result, Stage};
pub use registry::{TypeEntry, TypeKind, TypeRegistry, TypeSpec, NATIVE};
pub use specialize::DerivedType;
