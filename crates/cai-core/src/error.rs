//! Error types for cai-core

/// Result type for cai-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while converting plan resources to assets
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No converter is registered for the resource kind
    #[error("No converter registered for resource kind: {kind}")]
    UnknownKind { kind: String },

    /// Two resources produced the same asset and the converter cannot merge
    #[error("duplicate asset: type {asset_type}: name {name}")]
    DuplicateAsset { asset_type: String, name: String },

    /// The remote asset does not exist or cannot be read
    #[error("Remote asset {key} does not exist or is not accessible")]
    ResourceInaccessible { key: String },

    /// A field identifying the remote asset is unset or known only after apply
    #[error("Identity field '{field}' is unset or known only after apply")]
    EmptyIdentityField { field: String },

    /// The resource intentionally produces no asset
    #[error("Resource does not convert to an asset")]
    NoConversion,

    /// Configuration or registry content is invalid
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Fetching the remote asset failed for another reason
    #[error("Fetching remote asset {key} failed: {message}")]
    Fetch { key: String, message: String },

    // Transparent wrappers for underlying crate errors
    #[error(transparent)]
    Schema(#[from] cai_schema::Error),

    #[error(transparent)]
    Asset(#[from] cai_asset::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),
}

impl Error {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
