//! Schema-aware reads over a flat address map
//!
//! [`FieldReader`] answers `get`-style questions about a single resource
//! instance. It is built fresh for every conversion and never mutated.
//!
//! # Presence semantics
//!
//! - [`FieldReader::get`] returns the value or the zero value of its type.
//! - [`FieldReader::get_ok`] reports `exists = false` when the value equals
//!   the zero value of its type, so a field explicitly set to `0`, `""` or
//!   `false` reads as unset.
//! - [`FieldReader::get_ok_exists`] reports literal presence in the map.
//!
//! ```
//! use cai_schema::{FieldReader, SchemaNode, Value};
//! use serde_json::json;
//!
//! let schema = SchemaNode::object([
//!     ("name", SchemaNode::string()),
//!     ("size", SchemaNode::int()),
//! ]);
//! let values = Value::from(json!({"name": "disk", "size": 0}));
//! let reader = FieldReader::from_values("google_compute_disk", &schema, &values).unwrap();
//!
//! assert_eq!(reader.get_ok("name").unwrap(), (Value::from("disk"), true));
//! assert_eq!(reader.get_ok("size").unwrap(), (Value::Int(0), false));
//! assert_eq!(reader.get_ok_exists("size").unwrap(), (Value::Int(0), true));
//! ```

use std::borrow::Cow;
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::flatten::{FlatAddressMap, flatten};
use crate::node::{SchemaKind, SchemaNode};
use crate::resolve::{COUNT_SEGMENT, child_address, descend, resolve_leaf};
use crate::value::Value;

/// Element count marker some state writers emit for maps.
const MAP_COUNT_SEGMENT: &str = "%";

/// Placeholder stored for values that are only known after apply.
pub const UNKNOWN_VALUE: &str = "74D93920-ED26-11E3-AC10-0800200C9A66";

/// Outcome of a single read.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldReadResult {
    /// The value, or the zero value of its type when absent.
    pub value: Value,
    /// Whether the address was present in the flat map.
    pub exists: bool,
    /// Whether the stored value is the unknown placeholder.
    pub computed: bool,
}

impl FieldReadResult {
    fn absent(value: Value) -> Self {
        Self {
            value,
            exists: false,
            computed: false,
        }
    }

    fn present(value: Value) -> Self {
        Self {
            value,
            exists: true,
            computed: false,
        }
    }

    fn computed(value: Value) -> Self {
        Self {
            value,
            exists: true,
            computed: true,
        }
    }
}

/// Read-only view of one resource instance's fields.
#[derive(Debug, Clone)]
pub struct FieldReader<'s> {
    kind: String,
    schema: &'s SchemaNode,
    state: FlatAddressMap,
}

impl<'s> FieldReader<'s> {
    /// Wrap an already flattened map.
    pub fn new(kind: impl Into<String>, schema: &'s SchemaNode, state: FlatAddressMap) -> Self {
        Self {
            kind: kind.into(),
            schema,
            state,
        }
    }

    /// Flatten `values` against `schema` and wrap the result.
    pub fn from_values(kind: impl Into<String>, schema: &'s SchemaNode, values: &Value) -> Result<Self> {
        let state = flatten(schema, values)?;
        Ok(Self::new(kind, schema, state))
    }

    /// The resource kind, e.g. `google_storage_bucket`.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Resources read from a plan have no id yet.
    pub fn id(&self) -> &str {
        ""
    }

    pub fn schema(&self) -> &'s SchemaNode {
        self.schema
    }

    pub fn state(&self) -> &FlatAddressMap {
        &self.state
    }

    /// Read `address` with full presence information.
    pub fn read(&self, address: &str) -> Result<FieldReadResult> {
        let node = resolve_leaf(self.schema, address)?;
        self.read_node(address, &node)
    }

    /// Value at `address`, or the zero value of its type.
    pub fn get(&self, address: &str) -> Result<Value> {
        Ok(self.read(address)?.value)
    }

    /// Value at `address` and whether it is set to something other than the
    /// zero value of its type.
    pub fn get_ok(&self, address: &str) -> Result<(Value, bool)> {
        let node = resolve_leaf(self.schema, address)?;
        let result = self.read_node(address, &node)?;
        let exists = result.exists && !result.computed && result.value != node.zero_value();
        Ok((result.value, exists))
    }

    /// Value at `address` and whether it is present at all, zero or not.
    pub fn get_ok_exists(&self, address: &str) -> Result<(Value, bool)> {
        let result = self.read(address)?;
        let exists = result.exists && !result.computed;
        Ok((result.value, exists))
    }

    /// String at `address`; non-string scalars are rendered.
    pub fn get_string(&self, address: &str) -> Result<String> {
        Ok(self.get(address)?.to_scalar_string())
    }

    pub fn get_bool(&self, address: &str) -> Result<bool> {
        Ok(self.get(address)?.as_bool().unwrap_or_default())
    }

    pub fn get_int(&self, address: &str) -> Result<i64> {
        Ok(self.get(address)?.as_i64().unwrap_or_default())
    }

    pub fn get_float(&self, address: &str) -> Result<f64> {
        Ok(self.get(address)?.as_f64().unwrap_or_default())
    }

    /// Elements of a list or set of scalars, rendered as strings.
    pub fn get_string_list(&self, address: &str) -> Result<Vec<String>> {
        let value = self.get(address)?;
        Ok(value
            .as_list()
            .unwrap_or_default()
            .iter()
            .map(Value::to_scalar_string)
            .collect())
    }

    fn read_node(&self, address: &str, node: &SchemaNode) -> Result<FieldReadResult> {
        match &node.kind {
            SchemaKind::Bool | SchemaKind::Int | SchemaKind::Float | SchemaKind::String => {
                self.read_primitive(address, node)
            }
            SchemaKind::List { .. } | SchemaKind::Set { .. } => self.read_list(address, node),
            SchemaKind::Map { .. } => self.read_map(address, node),
            SchemaKind::Object { fields } => self.read_object(address, fields),
        }
    }

    fn read_primitive(&self, address: &str, node: &SchemaNode) -> Result<FieldReadResult> {
        match self.state.get(address) {
            None => Ok(FieldReadResult::absent(node.zero_value())),
            Some(UNKNOWN_VALUE) => Ok(FieldReadResult::computed(node.zero_value())),
            Some(raw) => coerce(address, raw, &node.kind).map(FieldReadResult::present),
        }
    }

    fn read_list(&self, address: &str, node: &SchemaNode) -> Result<FieldReadResult> {
        let count_address = child_address(address, COUNT_SEGMENT);
        let count = match self.state.get(&count_address) {
            None => return Ok(FieldReadResult::absent(node.zero_value())),
            Some(UNKNOWN_VALUE) => return Ok(FieldReadResult::computed(node.zero_value())),
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|_| Error::InvalidStoredValue {
                    address: count_address.clone(),
                    value: raw.to_string(),
                    expected: "count",
                })?,
        };

        let parent = Cow::Borrowed(node);
        let prefix = child_address(address, "");
        let stored = self.state.with_prefix(&prefix).count();
        let mut items = Vec::with_capacity(count.min(stored));
        for index in 0..count {
            let segment = index.to_string();
            let item_address = child_address(address, &segment);
            let item_node = descend(&parent, &segment, 0).ok_or_else(|| Error::Unresolvable {
                address: item_address.clone(),
            })?;
            items.push(self.read_node(&item_address, &item_node)?.value);
        }

        let value = match node.kind {
            SchemaKind::Set { .. } => Value::Set(items),
            _ => Value::List(items),
        };
        Ok(FieldReadResult::present(value))
    }

    fn read_map(&self, address: &str, node: &SchemaNode) -> Result<FieldReadResult> {
        let prefix = child_address(address, "");
        let parent = Cow::Borrowed(node);
        let mut entries = BTreeMap::new();
        for (key, raw) in self.state.with_prefix(&prefix) {
            // Keys may contain dots; everything after the prefix is the key.
            let name = &key[prefix.len()..];
            if name.is_empty() || name == COUNT_SEGMENT || name == MAP_COUNT_SEGMENT {
                continue;
            }
            let value_node = descend(&parent, name, 0).ok_or_else(|| Error::Unresolvable {
                address: key.to_string(),
            })?;
            let value = if raw == UNKNOWN_VALUE {
                value_node.zero_value()
            } else {
                coerce(key, raw, &value_node.kind)?
            };
            entries.insert(name.to_string(), value);
        }

        if entries.is_empty() {
            return Ok(FieldReadResult::absent(node.zero_value()));
        }
        Ok(FieldReadResult::present(Value::Map(entries)))
    }

    fn read_object(
        &self,
        address: &str,
        fields: &BTreeMap<String, SchemaNode>,
    ) -> Result<FieldReadResult> {
        let mut entries = BTreeMap::new();
        let mut exists = false;
        for (name, field) in fields {
            let result = self.read_node(&child_address(address, name), field)?;
            exists |= result.exists;
            entries.insert(name.clone(), result.value);
        }
        Ok(FieldReadResult {
            value: Value::Map(entries),
            exists,
            computed: false,
        })
    }
}

fn coerce(address: &str, raw: &str, kind: &SchemaKind) -> Result<Value> {
    let invalid = || Error::InvalidStoredValue {
        address: address.to_string(),
        value: raw.to_string(),
        expected: kind.name(),
    };
    match kind {
        SchemaKind::Bool => parse_bool(raw).map(Value::Bool).ok_or_else(invalid),
        SchemaKind::Int => raw
            .parse::<i64>()
            .or_else(|_| raw.parse::<f64>().map(|f| f.trunc() as i64))
            .map(Value::Int)
            .map_err(|_| invalid()),
        SchemaKind::Float => raw.parse::<f64>().map(Value::Float).map_err(|_| invalid()),
        SchemaKind::String => Ok(Value::String(raw.to_string())),
        _ => Err(invalid()),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}
