//! Declarative binary protocol codecs.
//!
//! wiredef reads and writes binary packets described by JSON type
//! descriptors. Types are registered by name; a protocol derives new types
//! from existing ones by binding `$`-placeholders in argument templates.
//!
//! # Crate Structure
//!
//! - [`template`] — Descriptor normalization, placeholder paths, argument templates
//! - [`codec`] — Type registry, dispatch, packet envelope, protocol loading
//! - [`types`] — Default type catalog (behind `types` feature, on by default)

/// Re-export template types.
pub mod template {
    pub use wiredef_template::*;
}

/// Re-export codec types.
pub mod codec {
    pub use wiredef_codec::*;
}

/// Re-export the default type catalog (requires `types` feature).
#[cfg(feature = "types")]
pub mod types {
    pub use wiredef_types::*;
}

pub use wiredef_codec::{CodecError, Fault, ParsedPacket, TypeRegistry, TypeSpec};
pub use wiredef_template::Value;

#[cfg(feature = "types")]
pub use wiredef_types::default_registry;
