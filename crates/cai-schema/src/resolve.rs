//! Dotted address resolution against a schema tree
//!
//! An address such as `network_interface.0.access_config.#` is split on `.`
//! and walked segment by segment from the root object:
//!
//! - an object consumes a segment as a field name;
//! - a list or set consumes `#` as its element count (an `int`) and any other
//!   segment as an element selector;
//! - a map consumes every remaining segment as one key, since keys such as
//!   `k8s.io/name` may contain dots, and yields its value type (`string`
//!   when undeclared);
//! - a scalar consumes nothing, so any remaining segment fails resolution.
//!
//! The result is the chain of nodes visited, one per segment. The root object
//! itself is only part of the chain for the empty address.
//!
//! ```
//! use cai_schema::{SchemaKind, SchemaNode, resolve};
//!
//! let root = SchemaNode::object([(
//!     "disks",
//!     SchemaNode::list(SchemaNode::object([("size", SchemaNode::int())])),
//! )]);
//!
//! let chain = resolve(&root, &["disks", "0", "size"]).unwrap();
//! assert_eq!(chain.len(), 3);
//! assert_eq!(chain[2].kind, SchemaKind::Int);
//!
//! assert!(resolve(&root, &["disks", "0", "missing"]).is_none());
//! ```

use std::borrow::Cow;

use crate::error::{Error, Result};
use crate::node::{SchemaKind, SchemaNode};

/// Segment addressing the element count of a list or set.
pub const COUNT_SEGMENT: &str = "#";

/// Nodes visited while resolving an address, root side first.
///
/// Nodes synthesized during resolution (count markers, undeclared map values,
/// untyped list elements) are owned; everything else borrows the tree.
pub type SchemaPath<'a> = Vec<Cow<'a, SchemaNode>>;

/// Split a dotted address into segments. The empty address has no segments.
pub fn split_address(address: &str) -> Vec<&str> {
    if address.is_empty() {
        Vec::new()
    } else {
        address.split('.').collect()
    }
}

/// Join an address and a child segment.
pub fn child_address(address: &str, segment: &str) -> String {
    if address.is_empty() {
        segment.to_string()
    } else {
        format!("{address}.{segment}")
    }
}

/// Resolve `address` against `root`, returning `None` when it is not
/// declared.
pub fn resolve<'a>(root: &'a SchemaNode, address: &[&str]) -> Option<SchemaPath<'a>> {
    if address.is_empty() {
        return Some(vec![Cow::Borrowed(root)]);
    }

    let mut chain: SchemaPath<'a> = Vec::with_capacity(address.len());
    let mut current = Cow::Borrowed(root);
    for (position, segment) in address.iter().enumerate() {
        let remaining = address.len() - position - 1;
        let next = descend(&current, segment, remaining)?;
        let key_ends_address = current.kind.is_map();
        chain.push(next.clone());
        if key_ends_address {
            break;
        }
        current = next;
    }
    Some(chain)
}

/// Resolve a dotted address, failing with [`Error::Unresolvable`].
pub fn resolve_address<'a>(root: &'a SchemaNode, address: &str) -> Result<SchemaPath<'a>> {
    resolve(root, &split_address(address)).ok_or_else(|| {
        tracing::debug!(address, "Address does not resolve against schema");
        Error::Unresolvable {
            address: address.to_string(),
        }
    })
}

/// Resolve a dotted address and return only the addressed node.
pub fn resolve_leaf<'a>(root: &'a SchemaNode, address: &str) -> Result<Cow<'a, SchemaNode>> {
    let mut chain = resolve_address(root, address)?;
    chain.pop().ok_or_else(|| Error::Unresolvable {
        address: address.to_string(),
    })
}

/// Step from `current` into the child selected by `segment`.
///
/// `remaining` is the number of segments that follow `segment`; it only
/// matters for lists whose element type is undeclared, which resolve a final
/// numeric selector to a `string` leaf.
pub(crate) fn descend<'a>(
    current: &Cow<'a, SchemaNode>,
    segment: &str,
    remaining: usize,
) -> Option<Cow<'a, SchemaNode>> {
    match current {
        Cow::Borrowed(node) => child(*node, segment, remaining),
        Cow::Owned(node) => child(node, segment, remaining).map(|c| Cow::Owned(c.into_owned())),
    }
}

fn child<'n>(node: &'n SchemaNode, segment: &str, remaining: usize) -> Option<Cow<'n, SchemaNode>> {
    match &node.kind {
        SchemaKind::Bool | SchemaKind::Int | SchemaKind::Float | SchemaKind::String => None,
        SchemaKind::List { elem } | SchemaKind::Set { elem } => {
            if segment == COUNT_SEGMENT {
                return Some(Cow::Owned(SchemaNode::int()));
            }
            match elem {
                Some(elem) => Some(Cow::Borrowed(elem.as_ref())),
                // Nested collections lose their element type; read the
                // selected element as a string like undeclared map values.
                None if remaining == 0 && segment.parse::<usize>().is_ok() => {
                    Some(Cow::Owned(SchemaNode::string()))
                }
                None => None,
            }
        }
        SchemaKind::Map { value } => Some(Cow::Owned(
            value.map_or_else(SchemaNode::string, SchemaNode::from),
        )),
        SchemaKind::Object { fields } => fields.get(segment).map(Cow::Borrowed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::ScalarType;

    fn kinds(chain: &SchemaPath<'_>) -> Vec<&'static str> {
        chain.iter().map(|node| node.kind.name()).collect()
    }

    fn root() -> SchemaNode {
        SchemaNode::object([
            ("name", SchemaNode::string()),
            (
                "disks",
                SchemaNode::list(SchemaNode::object([
                    ("size", SchemaNode::int()),
                    ("labels", SchemaNode::map(Some(ScalarType::Int))),
                ])),
            ),
            ("anything", SchemaNode::untyped_list()),
            ("labels", SchemaNode::map(None)),
        ])
    }

    #[test]
    fn empty_address_yields_root() {
        let root = root();
        let chain = resolve(&root, &[]).unwrap();
        assert_eq!(kinds(&chain), vec!["object"]);
    }

    #[test]
    fn element_selector_is_consumed_once() {
        let root = root();
        let chain = resolve(&root, &["disks", "3", "size"]).unwrap();
        assert_eq!(kinds(&chain), vec!["list", "object", "int"]);
    }

    #[test]
    fn count_segment_resolves_to_int() {
        let root = root();
        let chain = resolve(&root, &["disks", "#"]).unwrap();
        assert_eq!(kinds(&chain), vec!["list", "int"]);
    }

    #[test]
    fn map_values_use_declared_type_or_string() {
        let root = root();
        let typed = resolve(&root, &["disks", "0", "labels", "k"]).unwrap();
        assert_eq!(typed.last().unwrap().kind, SchemaKind::Int);
        let untyped = resolve(&root, &["labels", "k"]).unwrap();
        assert_eq!(untyped.last().unwrap().kind, SchemaKind::String);
    }

    #[test]
    fn map_key_takes_the_rest_of_the_address() {
        let root = root();
        let chain = resolve_address(&root, "labels.k8s.io/name").unwrap();
        assert_eq!(kinds(&chain), vec!["map", "string"]);

        let typed = resolve_address(&root, "disks.0.labels.a.b.c").unwrap();
        assert_eq!(kinds(&typed), vec!["list", "object", "map", "int"]);
    }

    #[test]
    fn untyped_list_only_resolves_final_numeric_selector() {
        let root = root();
        assert_eq!(
            kinds(&resolve(&root, &["anything", "2"]).unwrap()),
            vec!["list", "string"]
        );
        assert_eq!(kinds(&resolve(&root, &["anything"]).unwrap()), vec!["list"]);
        assert!(resolve(&root, &["anything", "x"]).is_none());
        assert!(resolve(&root, &["anything", "0", "deeper"]).is_none());
    }

    #[test]
    fn scalar_with_remaining_segments_is_unresolvable() {
        let root = root();
        assert!(resolve(&root, &["name", "extra"]).is_none());
        assert!(matches!(
            resolve_address(&root, "name.extra"),
            Err(Error::Unresolvable { address }) if address == "name.extra"
        ));
    }
}
