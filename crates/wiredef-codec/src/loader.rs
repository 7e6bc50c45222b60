//! Protocol documents: JSON mappings of type names to descriptors.
//!
//! ```json
//! {
//!   "varint": "native",
//!   "string": ["pstring", {"countType": "varint"}],
//!   "list": ["array", {"countType": "$count", "type": "$type"}]
//! }
//! ```
//!
//! The mapping may also be wrapped as `{"types": {...}}`. Entries register
//! in document order, so later entries may derive from earlier ones.

use std::io::Read;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, info};

use crate::error::{Fault, Result};
use crate::registry::{TypeRegistry, TypeSpec};

impl TypeRegistry {
    /// Register every type of a protocol document given as JSON text.
    ///
    /// Returns the number of entries processed.
    pub fn load_protocol_str(&mut self, json: &str) -> Result<usize> {
        let document: Value = serde_json::from_str(json)?;
        self.load_protocol_value(&document)
    }

    /// Register every type of a parsed protocol document.
    pub fn load_protocol_value(&mut self, document: &Value) -> Result<usize> {
        let types = match document.get("types") {
            Some(Value::Object(types)) => types,
            _ => document.as_object().ok_or_else(|| {
                Fault::LoadFailed("protocol document must be a JSON object".to_string())
            })?,
        };

        for (name, spec) in types {
            let spec = TypeSpec::from_json(name, spec)?;
            self.add_type(name.as_str(), spec)?;
        }
        debug!(entries = types.len(), "loaded protocol types");
        Ok(types.len())
    }

    /// Register every type of a protocol file.
    ///
    /// Files larger than `RegistryConfig::max_protocol_file_size` are refused.
    pub fn load_protocol_file(&mut self, path: &Path) -> Result<usize> {
        let file = std::fs::File::open(path)
            .map_err(|err| Fault::LoadFailed(format!("failed opening {}: {err}", path.display())))?;
        let metadata = file
            .metadata()
            .map_err(|err| Fault::LoadFailed(err.to_string()))?;

        let max_bytes = self.config().max_protocol_file_size;
        if metadata.len() > max_bytes as u64 {
            return Err(Fault::LoadFailed(format!(
                "protocol file too large ({} bytes, max {max_bytes}): {}",
                metadata.len(),
                path.display()
            )));
        }

        let read_limit = u64::try_from(max_bytes.saturating_add(1)).unwrap_or(u64::MAX);
        let mut content = String::new();
        file.take(read_limit)
            .read_to_string(&mut content)
            .map_err(|err| Fault::LoadFailed(format!("failed reading {}: {err}", path.display())))?;
        if content.len() > max_bytes {
            return Err(Fault::LoadFailed(format!(
                "protocol file too large while reading: {}",
                path.display()
            )));
        }

        let count = self.load_protocol_str(&content)?;
        info!(path = %path.display(), types = count, "loaded protocol file");
        Ok(count)
    }
}
