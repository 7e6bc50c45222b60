//! Value trees, field descriptors and argument templates.
//!
//! This is the lowest layer of wiredef. A protocol is described as a tree of
//! JSON-shaped values:
//! - A field descriptor names a registered type and carries its arguments
//! - An argument template is a descriptor argument tree containing `$name`
//!   placeholders, bound to caller-supplied parameters at every use
//!
//! Nothing here touches bytes. The codec layer builds on these types.

pub mod descriptor;
pub mod path;
pub mod template;

pub use descriptor::{is_field_descriptor, FieldDescriptor, FieldRef};
pub use path::{find_placeholders, placeholder_name, ArgumentBinding, PathSegment, SENTINEL};
pub use template::ArgumentTemplate;

/// Recursive value tree used for decoded packets and type arguments.
pub use serde_json::{Map, Value};
