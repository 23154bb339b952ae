//! Schema tree describing the field types of a resource kind
//!
//! A resource's schema is an [`SchemaNode`] of kind `Object` whose fields are
//! themselves schema nodes. Trees are built once per resource kind and only
//! ever read afterwards.
//!
//! Schemas can be written in code with the constructor helpers or loaded from
//! JSON:
//!
//! ```
//! use cai_schema::{SchemaKind, SchemaNode};
//!
//! let schema: SchemaNode = serde_json::from_str(r#"{
//!     "type": "object",
//!     "fields": {
//!         "name": { "type": "string" },
//!         "size": { "type": "int", "default": 10 },
//!         "tags": { "type": "list", "elem": { "type": "string" } }
//!     }
//! }"#).unwrap();
//!
//! assert!(schema.is_object());
//! assert_eq!(schema.field("size").unwrap().kind, SchemaKind::Int);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Scalar types allowed as map values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarType {
    Bool,
    Int,
    Float,
    String,
}

/// The shape of a schema node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SchemaKind {
    Bool,
    Int,
    Float,
    String,
    /// Ordered list. `elem` is `None` when the element type is not declared.
    List {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        elem: Option<Box<SchemaNode>>,
    },
    /// Unordered set. `elem` is `None` when the element type is not declared.
    Set {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        elem: Option<Box<SchemaNode>>,
    },
    /// String-keyed map; values default to strings when undeclared.
    Map {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<ScalarType>,
    },
    /// Nested object (a resource or a block) with named fields.
    Object {
        #[serde(default)]
        fields: BTreeMap<String, SchemaNode>,
    },
}

impl SchemaKind {
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            SchemaKind::Bool | SchemaKind::Int | SchemaKind::Float | SchemaKind::String
        )
    }

    pub fn is_list_like(&self) -> bool {
        matches!(self, SchemaKind::List { .. } | SchemaKind::Set { .. })
    }

    pub fn is_map(&self) -> bool {
        matches!(self, SchemaKind::Map { .. })
    }

    /// Short name of the kind, used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            SchemaKind::Bool => "bool",
            SchemaKind::Int => "int",
            SchemaKind::Float => "float",
            SchemaKind::String => "string",
            SchemaKind::List { .. } => "list",
            SchemaKind::Set { .. } => "set",
            SchemaKind::Map { .. } => "map",
            SchemaKind::Object { .. } => "object",
        }
    }
}

/// One typed node of a schema tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaNode {
    #[serde(flatten)]
    pub kind: SchemaKind,

    /// Value substituted for nil when flattening.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl SchemaNode {
    pub fn new(kind: SchemaKind) -> Self {
        Self {
            kind,
            default: None,
        }
    }

    pub fn bool() -> Self {
        Self::new(SchemaKind::Bool)
    }

    pub fn int() -> Self {
        Self::new(SchemaKind::Int)
    }

    pub fn float() -> Self {
        Self::new(SchemaKind::Float)
    }

    pub fn string() -> Self {
        Self::new(SchemaKind::String)
    }

    pub fn list(elem: SchemaNode) -> Self {
        Self::new(SchemaKind::List {
            elem: Some(Box::new(elem)),
        })
    }

    /// A list whose element type is not declared.
    pub fn untyped_list() -> Self {
        Self::new(SchemaKind::List { elem: None })
    }

    pub fn set(elem: SchemaNode) -> Self {
        Self::new(SchemaKind::Set {
            elem: Some(Box::new(elem)),
        })
    }

    pub fn map(value: Option<ScalarType>) -> Self {
        Self::new(SchemaKind::Map { value })
    }

    pub fn object<K: Into<String>>(fields: impl IntoIterator<Item = (K, SchemaNode)>) -> Self {
        Self::new(SchemaKind::Object {
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        })
    }

    /// Attach a declared default.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn is_object(&self) -> bool {
        matches!(self.kind, SchemaKind::Object { .. })
    }

    /// Look up a direct field of an object node.
    pub fn field(&self, name: &str) -> Option<&SchemaNode> {
        match &self.kind {
            SchemaKind::Object { fields } => fields.get(name),
            _ => None,
        }
    }

    /// The zero value of the node's type.
    pub fn zero_value(&self) -> Value {
        match &self.kind {
            SchemaKind::Bool => Value::Bool(false),
            SchemaKind::Int => Value::Int(0),
            SchemaKind::Float => Value::Float(0.0),
            SchemaKind::String => Value::String(String::new()),
            SchemaKind::List { .. } => Value::List(Vec::new()),
            SchemaKind::Set { .. } => Value::Set(Vec::new()),
            SchemaKind::Map { .. } | SchemaKind::Object { .. } => Value::Map(BTreeMap::new()),
        }
    }

    /// Whether `value` has a shape this node can hold at its top level.
    pub fn accepts(&self, value: &Value) -> bool {
        match (&self.kind, value) {
            (_, Value::Nil) => true,
            (kind, value) if kind.is_scalar() => value.is_scalar(),
            (SchemaKind::List { .. } | SchemaKind::Set { .. }, Value::List(_) | Value::Set(_)) => {
                true
            }
            (SchemaKind::Map { .. } | SchemaKind::Object { .. }, Value::Map(_)) => true,
            _ => false,
        }
    }
}

impl From<ScalarType> for SchemaNode {
    fn from(ty: ScalarType) -> Self {
        match ty {
            ScalarType::Bool => SchemaNode::bool(),
            ScalarType::Int => SchemaNode::int(),
            ScalarType::Float => SchemaNode::float(),
            ScalarType::String => SchemaNode::string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_nested_schema_with_defaults() {
        let schema: SchemaNode = serde_json::from_str(
            r#"{
                "type": "object",
                "fields": {
                    "disks": {
                        "type": "list",
                        "elem": {
                            "type": "object",
                            "fields": { "mode": { "type": "string", "default": "READ_WRITE" } }
                        }
                    },
                    "labels": { "type": "map" },
                    "anything": { "type": "list" }
                }
            }"#,
        )
        .unwrap();

        let disks = schema.field("disks").unwrap();
        let SchemaKind::List { elem: Some(elem) } = &disks.kind else {
            panic!("disks should be a typed list, got {:?}", disks.kind);
        };
        assert_eq!(
            elem.field("mode").unwrap().default,
            Some(Value::from("READ_WRITE"))
        );
        assert_eq!(schema.field("labels").unwrap().kind, SchemaKind::Map { value: None });
        assert_eq!(schema.field("anything").unwrap().kind, SchemaKind::List { elem: None });
    }

    #[test]
    fn zero_values_match_kinds() {
        assert_eq!(SchemaNode::int().zero_value(), Value::Int(0));
        assert_eq!(SchemaNode::string().zero_value(), Value::from(""));
        assert_eq!(
            SchemaNode::set(SchemaNode::string()).zero_value(),
            Value::Set(vec![])
        );
        assert_eq!(
            SchemaNode::object([("a", SchemaNode::bool())]).zero_value(),
            Value::Map(BTreeMap::new())
        );
    }

    #[test]
    fn accepts_checks_top_level_shape_only() {
        let list = SchemaNode::list(SchemaNode::int());
        assert!(list.accepts(&Value::List(vec![Value::from("not an int")])));
        assert!(!list.accepts(&Value::from("x")));
        assert!(SchemaNode::string().accepts(&Value::Int(3)));
        assert!(!SchemaNode::string().accepts(&Value::Map(BTreeMap::new())));
    }
}
