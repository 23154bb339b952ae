//! Error types for cai-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from cai-core
    #[error(transparent)]
    Core(#[from] cai_core::Error),

    /// Error from cai-schema
    #[error(transparent)]
    Schema(#[from] cai_schema::Error),

    /// Error from cai-asset
    #[error(transparent)]
    Asset(#[from] cai_asset::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Malformed JSON input
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }
}
