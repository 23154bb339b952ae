//! Static field schemas and schema-aware field access.
//!
//! This crate turns an arbitrary nested configuration value into something
//! resource converters can read generically:
//!
//! - [`SchemaNode`]: the static, recursively typed description of a resource
//! - [`resolve`]: dotted address to chain of schema nodes
//! - [`flatten`]: nested [`Value`] tree to a [`FlatAddressMap`]
//! - [`FieldReader`]: `get` / `get_ok` / `get_ok_exists` over a flat map
//!
//! Everything here is pure: schema trees are never mutated, and readers are
//! created per conversion and discarded afterwards.

pub mod error;
pub mod flatten;
pub mod node;
pub mod reader;
pub mod resolve;
pub mod value;

pub use error::{Error, Result};
pub use flatten::{FlatAddressMap, flatten};
pub use node::{ScalarType, SchemaKind, SchemaNode};
pub use reader::{FieldReadResult, FieldReader, UNKNOWN_VALUE};
pub use resolve::{
    COUNT_SEGMENT, SchemaPath, child_address, resolve, resolve_address, resolve_leaf,
    split_address,
};
pub use value::Value;
