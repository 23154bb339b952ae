//! Error types for cai-schema

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The address has no corresponding declared field.
    #[error("Address does not resolve against the schema: {address}")]
    Unresolvable { address: String },

    /// The value tree holds a shape the schema node cannot represent.
    #[error("Unrepresentable value at '{address}': found {found}, schema expects {expected}")]
    Unrepresentable {
        address: String,
        found: &'static str,
        expected: &'static str,
    },

    /// The declared default of a nil leaf does not fit its schema node.
    #[error("Default for '{address}' cannot be used: schema expects {expected}, default is {found}")]
    InvalidDefault {
        address: String,
        found: &'static str,
        expected: &'static str,
    },

    /// A flat entry cannot be coerced to the type of its schema node.
    #[error("Stored value {value:?} at '{address}' is not a valid {expected}")]
    InvalidStoredValue {
        address: String,
        value: String,
        expected: &'static str,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
