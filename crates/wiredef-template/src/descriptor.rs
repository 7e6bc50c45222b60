use std::borrow::Cow;
use std::fmt;

use serde_json::Value;

static NO_ARGS: Value = Value::Null;

/// Owned reference to a registered type with its arguments.
///
/// Accepted source shapes:
/// ```text
/// "u8"                                   bare name, no arguments
/// ["array", {"countType": "u8", ...}]    [name, args]
/// {"type": "array", "typeArgs": {...}}   object form
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Registered type name.
    pub type_name: String,
    /// Argument tree handed to the type; `Null` when absent.
    pub type_args: Value,
}

impl FieldDescriptor {
    /// Create a descriptor with explicit arguments.
    pub fn new(type_name: impl Into<String>, type_args: Value) -> Self {
        Self {
            type_name: type_name.into(),
            type_args,
        }
    }

    /// Create a descriptor without arguments.
    pub fn named(type_name: impl Into<String>) -> Self {
        Self::new(type_name, Value::Null)
    }

    /// Canonicalize any accepted descriptor shape.
    pub fn normalize(raw: &Value) -> Self {
        FieldRef::normalize(raw).to_descriptor()
    }

    /// Render the descriptor back into its most compact value shape.
    pub fn to_value(&self) -> Value {
        if self.type_args.is_null() {
            Value::String(self.type_name.clone())
        } else {
            Value::Array(vec![
                Value::String(self.type_name.clone()),
                self.type_args.clone(),
            ])
        }
    }
}

impl fmt::Display for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}

impl From<&str> for FieldDescriptor {
    fn from(name: &str) -> Self {
        Self::named(name)
    }
}

impl From<String> for FieldDescriptor {
    fn from(name: String) -> Self {
        Self::named(name)
    }
}

impl From<&Value> for FieldDescriptor {
    fn from(raw: &Value) -> Self {
        Self::normalize(raw)
    }
}

impl From<FieldDescriptor> for Value {
    fn from(descriptor: FieldDescriptor) -> Self {
        descriptor.to_value()
    }
}

/// Borrowed, normalized view of a descriptor value.
///
/// The dispatcher normalizes on every call, so this avoids cloning the
/// argument tree.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRef<'a> {
    /// Registered type name.
    pub type_name: Cow<'a, str>,
    /// Argument tree handed to the type; `Null` when absent.
    pub type_args: &'a Value,
}

impl<'a> FieldRef<'a> {
    /// Canonicalize any accepted descriptor shape.
    ///
    /// Never fails. Input that is not a descriptor normalizes to a name made
    /// of its JSON rendering, which then fails registry lookup downstream.
    pub fn normalize(raw: &'a Value) -> Self {
        match raw {
            Value::String(name) => Self::bare(name),
            Value::Array(items) => match items.first() {
                Some(Value::String(name)) => Self {
                    type_name: Cow::Borrowed(name),
                    type_args: items.get(1).unwrap_or(&NO_ARGS),
                },
                _ => Self::unresolvable(raw),
            },
            Value::Object(map) => match map.get("type") {
                Some(Value::String(name)) => Self {
                    type_name: Cow::Borrowed(name),
                    type_args: map.get("typeArgs").unwrap_or(&NO_ARGS),
                },
                _ => Self::unresolvable(raw),
            },
            _ => Self::unresolvable(raw),
        }
    }

    fn bare(name: &'a str) -> Self {
        Self {
            type_name: Cow::Borrowed(name),
            type_args: &NO_ARGS,
        }
    }

    fn unresolvable(raw: &Value) -> Self {
        Self {
            type_name: Cow::Owned(raw.to_string()),
            type_args: &NO_ARGS,
        }
    }

    /// Clone into an owned descriptor.
    pub fn to_descriptor(&self) -> FieldDescriptor {
        FieldDescriptor::new(self.type_name.as_ref(), self.type_args.clone())
    }
}

/// Returns true when `value` already references a type with bound arguments:
/// a bare name, a sequence whose first element is a name, or an object
/// carrying a `type` member.
pub fn is_field_descriptor(value: &Value) -> bool {
    match value {
        Value::String(_) => true,
        Value::Array(items) => matches!(items.first(), Some(Value::String(_))),
        Value::Object(map) => map.get("type").is_some_and(|kind| !kind.is_null()),
        _ => false,
    }
}
