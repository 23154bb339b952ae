//! Flattening of nested value trees into dotted-address maps
//!
//! A value tree such as
//!
//! ```json
//! { "foo": { "name": "value" }, "list": ["item1", "item2"] }
//! ```
//!
//! is written, against a schema declaring `foo` as a map and `list` as a list
//! of strings, as:
//!
//! ```text
//! foo.name => "value"
//! list.#   => "2"
//! list.0   => "item1"
//! list.1   => "item2"
//! ```
//!
//! Every leaf ends up in the map: nil leaves are replaced by the declared
//! default or the zero value of their type before being written.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::ops::Bound;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::node::{SchemaKind, SchemaNode};
use crate::resolve::{COUNT_SEGMENT, child_address, descend};
use crate::value::Value;

/// Flat map of dotted address to string-encoded scalar.
///
/// Lists and sets carry an extra `<address>.#` entry holding their length.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatAddressMap(BTreeMap<String, String>);

impl FlatAddressMap {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn get(&self, address: &str) -> Option<&str> {
        self.0.get(address).map(String::as_str)
    }

    pub fn contains(&self, address: &str) -> bool {
        self.0.contains_key(address)
    }

    pub fn insert(&mut self, address: impl Into<String>, value: impl Into<String>) {
        self.0.insert(address.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Entries whose address starts with `prefix`, in address order.
    pub fn with_prefix<'m>(&'m self, prefix: &'m str) -> impl Iterator<Item = (&'m str, &'m str)> {
        self.0
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(move |(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }
}

impl From<BTreeMap<String, String>> for FlatAddressMap {
    fn from(entries: BTreeMap<String, String>) -> Self {
        Self(entries)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FlatAddressMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Flatten `values` (the top-level fields of a resource) against `root`.
///
/// `values` must be a map or nil. Fields absent from the map are absent from
/// the result; fields present with a nil value are written with their default
/// or zero value.
///
/// # Errors
///
/// - [`Error::Unresolvable`] when a key has no declared field
/// - [`Error::Unrepresentable`] when a value's shape does not fit its node
/// - [`Error::InvalidDefault`] when a declared default does not fit its node
pub fn flatten(root: &SchemaNode, values: &Value) -> Result<FlatAddressMap> {
    let mut state = FlatAddressMap::new();
    let root = Cow::Borrowed(root);
    match values {
        Value::Nil => {}
        Value::Map(_) => write_value(values, "", &root, &mut state)?,
        other => {
            return Err(Error::Unrepresentable {
                address: String::new(),
                found: other.kind(),
                expected: root.kind.name(),
            });
        }
    }
    Ok(state)
}

fn write_value(
    value: &Value,
    address: &str,
    node: &Cow<'_, SchemaNode>,
    state: &mut FlatAddressMap,
) -> Result<()> {
    match (value, &node.kind) {
        (Value::Nil, _) => {
            let substitute = nil_substitute(node, address)?;
            write_value(&substitute, address, node, state)
        }

        // Generic trees carry every number as a float; the schema decides.
        (Value::Int(i), SchemaKind::Int) => {
            state.insert(address, i.to_string());
            Ok(())
        }
        (Value::Float(f), SchemaKind::Int) => {
            state.insert(address, (f.trunc() as i64).to_string());
            Ok(())
        }
        (Value::Int(i), kind) if kind.is_scalar() => {
            state.insert(address, format!("{:.6}", *i as f64));
            Ok(())
        }
        (Value::Float(f), kind) if kind.is_scalar() => {
            state.insert(address, format!("{f:.6}"));
            Ok(())
        }
        (Value::Bool(b), kind) if kind.is_scalar() => {
            state.insert(address, b.to_string());
            Ok(())
        }
        (Value::String(s), kind) if kind.is_scalar() => {
            state.insert(address, s.clone());
            Ok(())
        }

        (Value::List(items) | Value::Set(items), kind) if kind.is_list_like() => {
            state.insert(
                child_address(address, COUNT_SEGMENT),
                items.len().to_string(),
            );
            for (index, item) in items.iter().enumerate() {
                let segment = index.to_string();
                let item_address = child_address(address, &segment);
                let item_node = descend(node, &segment, 0).ok_or_else(|| Error::Unresolvable {
                    address: item_address.clone(),
                })?;
                write_value(item, &item_address, &item_node, state)?;
            }
            Ok(())
        }

        (Value::Map(entries), SchemaKind::Map { .. } | SchemaKind::Object { .. }) => {
            for (key, item) in entries {
                let item_address = child_address(address, key);
                let item_node = descend(node, key, 0).ok_or_else(|| Error::Unresolvable {
                    address: item_address.clone(),
                })?;
                write_value(item, &item_address, &item_node, state)?;
            }
            Ok(())
        }

        (other, kind) => Err(Error::Unrepresentable {
            address: address.to_string(),
            found: other.kind(),
            expected: kind.name(),
        }),
    }
}

/// The value written in place of nil: the declared default, else zero.
fn nil_substitute(node: &SchemaNode, address: &str) -> Result<Value> {
    match &node.default {
        Some(default) if !default.is_nil() => {
            if !node.accepts(default) {
                return Err(Error::InvalidDefault {
                    address: address.to_string(),
                    found: default.kind(),
                    expected: node.kind.name(),
                });
            }
            tracing::debug!(address, "Substituting declared default for nil value");
            Ok(default.clone())
        }
        _ => Ok(node.zero_value()),
    }
}
