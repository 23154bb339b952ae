//! Resource kind registry
//!
//! Maps a resource kind (e.g. `google_storage_bucket`) to its schema and the
//! converters producing its assets. Kinds can be registered in code or loaded
//! from a JSON registry file:
//!
//! ```json
//! {
//!   "kinds": {
//!     "google_storage_bucket": {
//!       "schema": {"type": "object", "fields": {"name": {"type": "string"}}},
//!       "assets": [{
//!         "asset_type": "storage.googleapis.com/Bucket",
//!         "name": "//storage.googleapis.com/{{name}}"
//!       }]
//!     }
//!   }
//! }
//! ```

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use cai_schema::SchemaNode;
use serde::{Deserialize, Serialize};

use crate::declarative::{AssetDefinition, DeclarativeConverter};
use crate::resource::ResourceConverter;
use crate::{Error, Result};

/// Schema and converters of one resource kind.
pub struct KindEntry {
    schema: SchemaNode,
    converters: Vec<Box<dyn ResourceConverter>>,
}

impl KindEntry {
    pub fn schema(&self) -> &SchemaNode {
        &self.schema
    }

    pub fn converters(&self) -> &[Box<dyn ResourceConverter>] {
        &self.converters
    }
}

impl std::fmt::Debug for KindEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let asset_types: Vec<&str> = self.converters.iter().map(|c| c.asset_type()).collect();
        f.debug_struct("KindEntry")
            .field("schema", &self.schema.kind.name())
            .field("asset_types", &asset_types)
            .finish()
    }
}

/// On-disk form of one kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KindDefinition {
    pub schema: SchemaNode,
    #[serde(default)]
    pub assets: Vec<AssetDefinition>,
}

/// On-disk form of a registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryFile {
    #[serde(default)]
    pub kinds: BTreeMap<String, KindDefinition>,
}

/// Registry of convertible resource kinds.
#[derive(Debug, Default)]
pub struct ConverterRegistry {
    kinds: HashMap<String, KindEntry>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self {
            kinds: HashMap::new(),
        }
    }

    /// Parse a JSON registry file's content.
    pub fn parse(content: &str) -> Result<Self> {
        let file: RegistryFile = serde_json::from_str(content)?;
        Self::from_definitions(file)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let registry = Self::parse(&content)?;
        tracing::debug!(?path, kinds = registry.len(), "Loaded converter registry");
        Ok(registry)
    }

    /// Build a registry of declarative converters.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfig`] when a kind's schema is not an object.
    pub fn from_definitions(file: RegistryFile) -> Result<Self> {
        let mut registry = Self::new();
        for (kind, definition) in file.kinds {
            if !definition.schema.is_object() {
                return Err(Error::invalid_config(format!(
                    "schema of {kind} must be an object, found {}",
                    definition.schema.kind.name()
                )));
            }
            registry.register_schema(&kind, definition.schema);
            for asset in definition.assets {
                registry.register(&kind, DeclarativeConverter::new(asset));
            }
        }
        Ok(registry)
    }

    /// Register or replace the schema of `kind`, keeping its converters.
    pub fn register_schema(&mut self, kind: impl Into<String>, schema: SchemaNode) {
        match self.kinds.entry(kind.into()) {
            Entry::Occupied(mut occupied) => occupied.get_mut().schema = schema,
            Entry::Vacant(vacant) => {
                vacant.insert(KindEntry {
                    schema,
                    converters: Vec::new(),
                });
            }
        }
    }

    /// Add a converter for `kind`. The kind must have a schema.
    pub fn register(&mut self, kind: &str, converter: impl ResourceConverter + 'static) {
        match self.kinds.get_mut(kind) {
            Some(entry) => entry.converters.push(Box::new(converter)),
            None => tracing::warn!(kind, "Ignoring converter for kind without schema"),
        }
    }

    pub fn get(&self, kind: &str) -> Option<&KindEntry> {
        self.kinds.get(kind)
    }

    /// Entry for `kind`, failing with [`Error::UnknownKind`].
    pub fn entry(&self, kind: &str) -> Result<&KindEntry> {
        self.get(kind).ok_or_else(|| Error::UnknownKind {
            kind: kind.to_string(),
        })
    }

    pub fn has_kind(&self, kind: &str) -> bool {
        self.kinds.contains_key(kind)
    }

    /// Registered kinds, sorted.
    pub fn list_kinds(&self) -> Vec<String> {
        let mut kinds: Vec<String> = self.kinds.keys().cloned().collect();
        kinds.sort();
        kinds
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}
