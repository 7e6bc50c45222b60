use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;
use wiredef_template::{is_field_descriptor, FieldDescriptor, FieldRef};

use crate::config::RegistryConfig;
use crate::datatype::DataType;
use crate::error::{Fault, Result};
use crate::specialize::DerivedType;

/// A registered read / write / sizeOf implementation.
pub type TypeEntry = Arc<dyn DataType>;

/// Marker protocol documents use for types provided outside the registry.
pub const NATIVE: &str = "native";

/// What to register under a type name.
pub enum TypeSpec {
    /// Implemented elsewhere; registering it does nothing.
    Native,
    /// An existing type with a (partially) fixed argument template.
    Derived(Value),
    /// A hand-written implementation, stored verbatim.
    Raw(TypeEntry),
}

impl TypeSpec {
    pub fn raw(data_type: impl DataType + 'static) -> Self {
        Self::Raw(Arc::new(data_type))
    }

    pub fn derived(descriptor: impl Into<Value>) -> Self {
        Self::Derived(descriptor.into())
    }

    /// Interpret one entry of a protocol document.
    pub fn from_json(name: &str, spec: &Value) -> Result<Self> {
        if spec.as_str() == Some(NATIVE) {
            return Ok(Self::Native);
        }
        if is_field_descriptor(spec) {
            return Ok(Self::Derived(spec.clone()));
        }
        Err(Fault::InvalidTypeSpec {
            name: name.to_string(),
            reason: format!("expected a type descriptor or \"{NATIVE}\", found {spec}"),
        })
    }
}

impl From<FieldDescriptor> for TypeSpec {
    fn from(descriptor: FieldDescriptor) -> Self {
        Self::Derived(descriptor.to_value())
    }
}

impl fmt::Debug for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => f.write_str("Native"),
            Self::Derived(descriptor) => f.debug_tuple("Derived").field(descriptor).finish(),
            Self::Raw(_) => f.write_str("Raw(..)"),
        }
    }
}

/// How a registered type was defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Raw,
    Derived,
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TypeKind::Raw => "raw",
            TypeKind::Derived => "derived",
        })
    }
}

#[derive(Clone)]
struct Registered {
    entry: TypeEntry,
    kind: TypeKind,
}

/// Name-keyed registry of type implementations.
///
/// Populate it during setup, then share it read-only for encode/decode
/// traffic. Later registrations shadow earlier ones. Independent registries
/// (e.g. one per protocol version) coexist freely; cloning is cheap.
#[derive(Clone)]
pub struct TypeRegistry {
    types: HashMap<String, Registered>,
    config: RegistryConfig,
}

impl TypeRegistry {
    /// Create an empty registry with default config.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry with explicit config.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            types: HashMap::new(),
            config,
        }
    }

    /// Register one type.
    ///
    /// A derived spec is bound to the base type registered *now*; deriving
    /// from an unknown base fails with [`Fault::MissingType`].
    pub fn add_type(&mut self, name: impl Into<String>, spec: TypeSpec) -> Result<()> {
        let name = name.into();
        let registered = match spec {
            TypeSpec::Native => {
                debug!(%name, "skipping native type");
                return Ok(());
            }
            TypeSpec::Raw(entry) => {
                self.add_raw(name, entry);
                return Ok(());
            }
            TypeSpec::Derived(descriptor) => {
                let field = FieldRef::normalize(&descriptor);
                let base = self
                    .get(&field.type_name)
                    .cloned()
                    .ok_or_else(|| Fault::MissingType(field.type_name.to_string()))?;
                let derived = DerivedType::new(base, field.type_args.clone());
                debug!(
                    %name,
                    base = %field.type_name,
                    params = derived.template().bindings().len(),
                    "registered derived type"
                );
                Registered {
                    entry: derived.into_entry(),
                    kind: TypeKind::Derived,
                }
            }
        };

        self.insert(name, registered);
        Ok(())
    }

    /// Register a raw entry; unlike a derived spec this cannot fail.
    pub fn add_raw(&mut self, name: impl Into<String>, entry: TypeEntry) {
        let registered = Registered {
            entry,
            kind: TypeKind::Raw,
        };
        self.insert(name.into(), registered);
    }

    fn insert(&mut self, name: String, registered: Registered) {
        if self.types.insert(name.clone(), registered).is_some() {
            debug!(%name, "type shadowed by later registration");
        }
    }

    /// Register several types in iteration order.
    ///
    /// Later entries may derive from earlier ones in the same batch.
    pub fn add_types<N, I>(&mut self, types: I) -> Result<()>
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, TypeSpec)>,
    {
        for (name, spec) in types {
            self.add_type(name, spec)?;
        }
        Ok(())
    }

    /// Look up a type by name.
    pub fn get(&self, name: &str) -> Option<&TypeEntry> {
        self.types.get(name).map(|registered| &registered.entry)
    }

    /// Check if a type is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// How a registered type was defined.
    pub fn kind_of(&self, name: &str) -> Option<TypeKind> {
        self.types.get(name).map(|registered| registered.kind)
    }

    /// Registered type names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Get registry configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.names())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::context::Context;
    use crate::datatype::{Decoded, FnType, SizeOf};

    fn byte_type() -> FnType {
        FnType::new(
            |_, buf, offset, _, _| Ok(Ok(Decoded::new(buf[offset], 1))),
            |_, value, buf, offset, _, _| {
                buf[offset] = value.as_u64().unwrap_or(0) as u8;
                Ok(Ok(1))
            },
            SizeOf::Fixed(1),
        )
    }

    #[test]
    fn native_is_a_no_op() {
        let mut registry = TypeRegistry::new();
        registry.add_type("varint", TypeSpec::Native).unwrap();
        assert!(!registry.contains("varint"));
        assert!(registry.is_empty());
    }

    #[test]
    fn raw_and_derived_kinds() {
        let mut registry = TypeRegistry::new();
        registry.add_type("byte", TypeSpec::raw(byte_type())).unwrap();
        registry
            .add_type("alias", TypeSpec::derived(json!("byte")))
            .unwrap();

        assert_eq!(registry.kind_of("byte"), Some(TypeKind::Raw));
        assert_eq!(registry.kind_of("alias"), Some(TypeKind::Derived));
        assert_eq!(registry.get("alias").and_then(|t| t.fixed_size()), Some(1));
        assert_eq!(registry.names(), vec!["alias", "byte"]);
    }

    #[test]
    fn deriving_from_unknown_base_fails() {
        let mut registry = TypeRegistry::new();
        let result = registry.add_type("list", TypeSpec::derived(json!(["array", {"type": "u8"}])));
        assert!(matches!(result, Err(Fault::MissingType(name)) if name == "array"));
        assert!(!registry.contains("list"));
    }

    #[test]
    fn batch_entries_may_reference_earlier_ones() {
        let mut registry = TypeRegistry::new();
        registry
            .add_types([
                ("byte", TypeSpec::raw(byte_type())),
                ("first", TypeSpec::derived(json!("byte"))),
                ("second", TypeSpec::derived(json!("first"))),
            ])
            .unwrap();
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn later_registration_shadows_earlier() {
        let mut registry = TypeRegistry::new();
        registry.add_type("t", TypeSpec::raw(byte_type())).unwrap();
        registry
            .add_type(
                "t",
                TypeSpec::raw(FnType::new(
                    |_, _, _, _, _| Ok(Ok(Decoded::new(Value::Null, 0))),
                    |_, _, _, _, _, _| Ok(Ok(0)),
                    SizeOf::Fixed(0),
                )),
            )
            .unwrap();
        assert_eq!(registry.get("t").and_then(|t| t.fixed_size()), Some(0));
    }

    #[test]
    fn derived_type_keeps_its_definition_time_base() {
        let mut registry = TypeRegistry::new();
        registry.add_type("byte", TypeSpec::raw(byte_type())).unwrap();
        registry
            .add_type("alias", TypeSpec::derived(json!("byte")))
            .unwrap();
        registry
            .add_type(
                "byte",
                TypeSpec::raw(FnType::new(
                    |_, _, _, _, _| Ok(Ok(Decoded::new(Value::Null, 0))),
                    |_, _, _, _, _, _| Ok(Ok(0)),
                    SizeOf::Fixed(0),
                )),
            )
            .unwrap();

        assert_eq!(registry.get("byte").and_then(|t| t.fixed_size()), Some(0));
        assert_eq!(registry.get("alias").and_then(|t| t.fixed_size()), Some(1));
        let decoded = registry
            .read(&[0x2a], 0, &json!("alias"), &mut Context::new())
            .unwrap()
            .unwrap();
        assert_eq!(decoded, Decoded::new(0x2a, 1));
    }

    #[test]
    fn spec_from_json_shapes() {
        assert!(matches!(TypeSpec::from_json("a", &json!("native")), Ok(TypeSpec::Native)));
        assert!(matches!(TypeSpec::from_json("a", &json!("u8")), Ok(TypeSpec::Derived(_))));
        assert!(matches!(
            TypeSpec::from_json("a", &json!({"type": "u8", "typeArgs": null})),
            Ok(TypeSpec::Derived(_))
        ));
        assert!(matches!(
            TypeSpec::from_json("a", &json!(12)),
            Err(Fault::InvalidTypeSpec { .. })
        ));
    }

    #[test]
    fn registries_are_independent() {
        let mut v1 = TypeRegistry::new();
        v1.add_type("byte", TypeSpec::raw(byte_type())).unwrap();
        let mut v2 = v1.clone();
        v2.add_type("extra", TypeSpec::derived(json!("byte"))).unwrap();

        assert!(!v1.contains("extra"));
        assert!(v2.contains("extra"));
    }
}
