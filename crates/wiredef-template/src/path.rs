//! Placeholder discovery in argument trees.

use std::fmt;

use serde_json::Value;

/// First character of a placeholder string.
pub const SENTINEL: char = '$';

/// One step into a value tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Member of a mapping.
    Key(String),
    /// Element of a sequence.
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "{index}"),
        }
    }
}

/// Location of a named placeholder inside an argument template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentBinding {
    /// Segments from the template root to the placeholder leaf.
    pub path: Vec<PathSegment>,
    /// Parameter name (placeholder text without the sentinel).
    pub name: String,
    pointer: String,
}

impl ArgumentBinding {
    /// Create a binding for `name` at `path`.
    pub fn new(path: Vec<PathSegment>, name: impl Into<String>) -> Self {
        let pointer = json_pointer(&path);
        Self {
            path,
            name: name.into(),
            pointer,
        }
    }

    /// Dotted rendering of the path, e.g. `fields.1.type`.
    pub fn dotted_path(&self) -> String {
        self.path
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }

    /// RFC 6901 pointer to the placeholder leaf; empty for the root.
    pub fn pointer(&self) -> &str {
        &self.pointer
    }
}

/// Returns the parameter name when `value` is a placeholder string.
pub fn placeholder_name(value: &Value) -> Option<&str> {
    value.as_str()?.strip_prefix(SENTINEL)
}

/// Collect every placeholder leaf in `tree`, depth-first in document order.
///
/// Only sequences and mappings are descended into. A tree that is itself a
/// placeholder yields a single binding with an empty path.
pub fn find_placeholders(tree: &Value) -> Vec<ArgumentBinding> {
    let mut bindings = Vec::new();
    let mut path = Vec::new();
    collect(tree, &mut path, &mut bindings);
    bindings
}

fn collect(node: &Value, path: &mut Vec<PathSegment>, out: &mut Vec<ArgumentBinding>) {
    match node {
        Value::String(_) => {
            if let Some(name) = placeholder_name(node) {
                out.push(ArgumentBinding::new(path.clone(), name));
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                path.push(PathSegment::Index(index));
                collect(item, path, out);
                path.pop();
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                path.push(PathSegment::Key(key.clone()));
                collect(item, path, out);
                path.pop();
            }
        }
        _ => {}
    }
}

fn json_pointer(path: &[PathSegment]) -> String {
    let mut pointer = String::new();
    for segment in path {
        pointer.push('/');
        match segment {
            PathSegment::Key(key) => pointer.push_str(&key.replace('~', "~0").replace('/', "~1")),
            PathSegment::Index(index) => pointer.push_str(&index.to_string()),
        }
    }
    pointer
}
