//! Plan resource changes
//!
//! The converter consumes the `resource_changes` of a JSON plan. Only the
//! parts needed for conversion are modelled; everything else is ignored.

use std::path::Path;

use cai_schema::{
    COUNT_SEGMENT, FlatAddressMap, SchemaKind, SchemaNode, UNKNOWN_VALUE, Value, child_address,
    flatten, resolve_leaf,
};
use serde::{Deserialize, Serialize};

use crate::Result;

/// A JSON plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub format_version: String,

    #[serde(default)]
    pub resource_changes: Vec<ResourceChange>,
}

impl Plan {
    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }
}

/// Planned action on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    NoOp,
    Create,
    Read,
    Update,
    Delete,
}

/// One resource instance and its planned change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceChange {
    /// Full resource address, e.g. `google_storage_bucket.logs`.
    pub address: String,

    #[serde(default)]
    pub mode: String,

    /// Resource kind, e.g. `google_storage_bucket`.
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub provider_name: String,

    pub change: Change,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Change {
    #[serde(default)]
    pub actions: Vec<Action>,

    #[serde(default)]
    pub before: Option<serde_json::Value>,

    #[serde(default)]
    pub after: Option<serde_json::Value>,

    /// Mirrors `after`, with `true` for values known only after apply.
    #[serde(default)]
    pub after_unknown: Option<serde_json::Value>,
}

impl ResourceChange {
    fn actions_are(&self, expected: &[Action]) -> bool {
        self.change.actions == expected
    }

    pub fn is_create(&self) -> bool {
        self.actions_are(&[Action::Create])
    }

    pub fn is_update(&self) -> bool {
        self.actions_are(&[Action::Update])
    }

    /// Replacement, in either order.
    pub fn is_delete_create(&self) -> bool {
        self.actions_are(&[Action::Delete, Action::Create])
            || self.actions_are(&[Action::Create, Action::Delete])
    }

    pub fn is_delete(&self) -> bool {
        self.actions_are(&[Action::Delete])
    }

    pub fn is_no_op(&self) -> bool {
        self.actions_are(&[Action::NoOp])
    }

    /// Whether the resource is managed rather than a data source.
    pub fn is_managed(&self) -> bool {
        self.mode.is_empty() || self.mode == "managed"
    }

    /// Flattened state before the change.
    pub fn before_state(&self, schema: &SchemaNode) -> Result<FlatAddressMap> {
        Ok(flatten(schema, &json_values(self.change.before.as_ref()))?)
    }

    /// Flattened state after the change, with unknown values marked computed.
    pub fn after_state(&self, schema: &SchemaNode) -> Result<FlatAddressMap> {
        let mut state = flatten(schema, &json_values(self.change.after.as_ref()))?;
        if let Some(unknown) = &self.change.after_unknown {
            mark_unknown(schema, unknown, "", &mut state);
        }
        Ok(state)
    }
}

fn json_values(json: Option<&serde_json::Value>) -> Value {
    json.cloned().map(Value::from).unwrap_or_default()
}

/// Write the unknown sentinel for every `true` leaf of `unknown`.
///
/// Scalars get the sentinel at their own address and lists and sets at their
/// count address. Addresses the schema does not declare are ignored.
fn mark_unknown(schema: &SchemaNode, unknown: &serde_json::Value, address: &str, state: &mut FlatAddressMap) {
    match unknown {
        serde_json::Value::Bool(true) if !address.is_empty() => {
            let Ok(node) = resolve_leaf(schema, address) else {
                tracing::debug!(address, "Ignoring unknown marker for undeclared address");
                return;
            };
            match &node.kind {
                SchemaKind::List { .. } | SchemaKind::Set { .. } => {
                    state.insert(child_address(address, COUNT_SEGMENT), UNKNOWN_VALUE);
                }
                SchemaKind::Map { .. } | SchemaKind::Object { .. } => {}
                _ => state.insert(address, UNKNOWN_VALUE),
            }
        }
        serde_json::Value::Object(entries) => {
            for (key, value) in entries {
                mark_unknown(schema, value, &child_address(address, key), state);
            }
        }
        serde_json::Value::Array(items) => {
            for (index, value) in items.iter().enumerate() {
                mark_unknown(schema, value, &child_address(address, &index.to_string()), state);
            }
            // Marked elements of a list absent from `after` still need a count.
            let count_address = child_address(address, COUNT_SEGMENT);
            let prefix = child_address(address, "");
            if !state.contains(&count_address) && state.with_prefix(&prefix).next().is_some() {
                state.insert(count_address, items.len().to_string());
            }
        }
        _ => {}
    }
}
