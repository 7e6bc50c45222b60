use serde_json::{Map, Value};

/// Shared mutable state for one packet operation.
///
/// Composite types open a scope per nesting level and record field values in
/// it, so later fields can consult earlier ones (a length read before the
/// array it sizes, a tag that selects a switch case). References are resolved
/// relative to the innermost scope:
///
/// ```text
/// "len"          sibling field
/// "../len"       field of the enclosing scope
/// "header/len"   member of a sibling mapping
/// ```
///
/// Create one per encode or decode; never share it between operations.
#[derive(Debug, Default)]
pub struct Context {
    scopes: Vec<Map<String, Value>>,
}

impl Context {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of open scopes.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Run `f` inside a new innermost scope seeded with `fields`.
    ///
    /// The scope is closed when `f` returns, whatever it returns.
    pub fn scoped<T>(&mut self, fields: Map<String, Value>, f: impl FnOnce(&mut Self) -> T) -> T {
        self.scopes.push(fields);
        let out = f(self);
        self.scopes.pop();
        out
    }

    /// Record a field value in the innermost scope, opening one if needed.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        if self.scopes.is_empty() {
            self.scopes.push(Map::new());
        }
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.into(), value);
        }
    }

    /// Resolve a field reference against the open scopes.
    pub fn lookup(&self, reference: &str) -> Option<&Value> {
        let mut rest = reference;
        let mut up = 0usize;
        while let Some(stripped) = rest.strip_prefix("../") {
            up += 1;
            rest = stripped;
        }

        let index = self.scopes.len().checked_sub(up + 1)?;
        let mut segments = rest.split('/');
        let mut node = self.scopes[index].get(segments.next()?)?;
        for segment in segments {
            node = match node {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(node)
    }
}
