//! Error types for cai-asset

pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error returned by field lookups during naming.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The field lookup used while naming an asset failed.
    #[error("Lookup of template field '{field}' failed: {source}")]
    TemplateSubstitution {
        field: String,
        #[source]
        source: BoxError,
    },

    /// Substituted values kept introducing new placeholders.
    #[error("Template substitution did not settle after {depth} passes: {template}")]
    RecursiveSubstitution { template: String, depth: usize },

    /// The `policy_data` of an IAM policy resource is not a valid policy.
    #[error("Invalid IAM policy data: {0}")]
    InvalidPolicyData(#[source] serde_json::Error),

    #[error(transparent)]
    Schema(#[from] cai_schema::Error),
}
