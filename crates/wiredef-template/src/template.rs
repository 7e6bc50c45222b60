use serde_json::Value;

use crate::path::{find_placeholders, ArgumentBinding};

/// A frozen argument tree plus the precomputed locations of its placeholders.
///
/// Bindings are computed once, when the template is built. Each
/// [`instantiate`](Self::instantiate) clones the frozen tree and writes the
/// caller's parameters directly at those locations, so instantiations never
/// observe each other.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentTemplate {
    template: Value,
    bindings: Vec<ArgumentBinding>,
}

impl ArgumentTemplate {
    /// Freeze `template` and resolve its placeholder bindings.
    pub fn new(template: Value) -> Self {
        let bindings = find_placeholders(&template);
        Self { template, bindings }
    }

    /// The frozen argument tree, placeholders included.
    pub fn template(&self) -> &Value {
        &self.template
    }

    /// Placeholder locations in document order.
    pub fn bindings(&self) -> &[ArgumentBinding] {
        &self.bindings
    }

    /// Build concrete arguments from the caller's `type_args` mapping.
    ///
    /// A parameter absent from `type_args` (or a `type_args` that is not a
    /// mapping) binds as `null`.
    pub fn instantiate(&self, type_args: &Value) -> Value {
        let mut args = self.template.clone();
        for binding in &self.bindings {
            let value = type_args
                .get(binding.name.as_str())
                .cloned()
                .unwrap_or(Value::Null);
            if let Some(slot) = args.pointer_mut(binding.pointer()) {
                *slot = value;
            }
        }
        args
    }
}

impl From<Value> for ArgumentTemplate {
    fn from(template: Value) -> Self {
        Self::new(template)
    }
}
