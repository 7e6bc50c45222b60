//! Default type catalog for wiredef registries.
//!
//! The codec core has no built-in types; [`install`] registers this catalog
//! into a registry and [`default_registry`] returns a registry holding only
//! it. Protocol documents then derive their own types on top:
//!
//! ```
//! use wiredef_codec::TypeSpec;
//!
//! let mut registry = wiredef_types::default_registry();
//! let string = serde_json::json!(["pstring", {"countType": "varint"}]);
//! registry
//!     .add_type("string", TypeSpec::derived(string))
//!     .unwrap();
//! let packet = registry
//!     .create_packet_buffer(&"string".into(), &"hi".into())
//!     .unwrap();
//! assert_eq!(&packet[..], &[2, b'h', b'i']);
//! ```

mod bitfield;
mod conditional;
mod length;
mod numeric;
mod structures;
mod utils;
mod varint;
mod wire;

use std::sync::Arc;

use tracing::debug;
use wiredef_codec::{DataType, TypeEntry, TypeRegistry};

pub use bitfield::Bitfield;
pub use conditional::{OptionType, Switch};
pub use numeric::{Endian, Numeric, Repr};
pub use structures::{Array, Container, Count};
pub use utils::{Bool, Buffer, CString, Mapper, PString, Void};
pub use varint::VarInt;

/// Every catalog type with its registered name.
pub fn builtin_types() -> Vec<(&'static str, TypeEntry)> {
    let mut types: Vec<(&'static str, TypeEntry)> = Numeric::all()
        .map(|(name, numeric)| (name, entry(numeric)))
        .collect();
    types.extend([
        ("varint", entry(VarInt)),
        ("bool", entry(Bool)),
        ("void", entry(Void)),
        ("cstring", entry(CString)),
        ("pstring", entry(PString)),
        ("buffer", entry(Buffer)),
        ("bitfield", entry(Bitfield)),
        ("mapper", entry(Mapper)),
        ("array", entry(Array)),
        ("count", entry(Count)),
        ("container", entry(Container)),
        ("switch", entry(Switch)),
        ("option", entry(OptionType)),
    ]);
    types
}

fn entry(data_type: impl DataType + 'static) -> TypeEntry {
    Arc::new(data_type)
}

/// Register the catalog into `registry`, shadowing same-named types.
pub fn install(registry: &mut TypeRegistry) {
    let types = builtin_types();
    let count = types.len();
    for (name, entry) in types {
        registry.add_raw(name, entry);
    }
    debug!(types = count, "installed default type catalog");
}

/// A registry with the default catalog and default configuration.
pub fn default_registry() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    install(&mut registry);
    registry
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiredef_codec::{Context, RegistryConfig, TypeKind};

    use super::*;

    #[test]
    fn catalog_names_are_registered() {
        let registry = default_registry();
        assert_eq!(registry.len(), builtin_types().len());
        for name in ["u8", "lf64", "varint", "container", "switch", "option"] {
            assert_eq!(registry.kind_of(name), Some(TypeKind::Raw), "{name}");
        }
    }

    #[test]
    fn install_keeps_registry_config() {
        let config = RegistryConfig {
            max_packet_size: 8,
            ..RegistryConfig::default()
        };
        let mut registry = TypeRegistry::with_config(config);
        install(&mut registry);
        assert_eq!(registry.config().max_packet_size, 8);
        assert!(registry.contains("pstring"));
    }

    #[test]
    fn protocol_types_derive_from_catalog() {
        let mut registry = default_registry();
        registry
            .load_protocol_str(
                r#"{
                    "varint": "native",
                    "string": ["pstring", {"countType": "varint"}],
                    "list": ["array", {"countType": "$countType", "type": "$type"}]
                }"#,
            )
            .unwrap();

        let descriptor = json!(["list", {"countType": "u8", "type": "string"}]);
        let value = json!(["a", "bc"]);
        let mut ctx = Context::new();
        assert_eq!(registry.size_of(&value, &descriptor, &mut ctx).unwrap(), 6);

        let packet = registry.create_packet_buffer(&descriptor, &value).unwrap();
        assert_eq!(&packet[..], &[2, 1, b'a', 2, b'b', b'c']);
    }
}
