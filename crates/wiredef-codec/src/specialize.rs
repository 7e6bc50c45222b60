use std::sync::Arc;

use serde_json::Value;
use wiredef_template::ArgumentTemplate;

use crate::context::Context;
use crate::datatype::{DataType, Decoded};
use crate::error::{Outcome, Result};
use crate::registry::{TypeEntry, TypeRegistry};

/// A type defined as another type with a (partially) fixed argument tree.
///
/// Every call rebuilds concrete arguments from the template and the caller's
/// `type_args`, then delegates to the base entry captured at definition time.
/// Bases may themselves be derived.
pub struct DerivedType {
    base: TypeEntry,
    template: ArgumentTemplate,
}

impl DerivedType {
    pub fn new(base: TypeEntry, template: impl Into<ArgumentTemplate>) -> Self {
        Self {
            base,
            template: template.into(),
        }
    }

    pub fn template(&self) -> &ArgumentTemplate {
        &self.template
    }

    /// Concrete arguments for one call.
    pub fn resolve_args(&self, type_args: &Value) -> Value {
        self.template.instantiate(type_args)
    }

    pub fn into_entry(self) -> TypeEntry {
        Arc::new(self)
    }
}

impl DataType for DerivedType {
    fn read(
        &self,
        registry: &TypeRegistry,
        buf: &[u8],
        offset: usize,
        args: &Value,
        ctx: &mut Context,
    ) -> Result<Outcome<Decoded>> {
        let args = self.resolve_args(args);
        self.base.read(registry, buf, offset, &args, ctx)
    }

    fn write(
        &self,
        registry: &TypeRegistry,
        value: &Value,
        buf: &mut [u8],
        offset: usize,
        args: &Value,
        ctx: &mut Context,
    ) -> Result<Outcome<usize>> {
        let args = self.resolve_args(args);
        self.base.write(registry, value, buf, offset, &args, ctx)
    }

    fn size_of(
        &self,
        registry: &TypeRegistry,
        value: &Value,
        args: &Value,
        ctx: &mut Context,
    ) -> Result<usize> {
        if let Some(size) = self.base.fixed_size() {
            return Ok(size);
        }
        let args = self.resolve_args(args);
        self.base.size_of(registry, value, &args, ctx)
    }

    fn fixed_size(&self) -> Option<usize> {
        self.base.fixed_size()
    }
}
