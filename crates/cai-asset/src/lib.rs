//! Asset model for Cloud Asset Inventory conversion
//!
//! - [`model`]: the [`Asset`] shape and its IAM and organization policy parts
//! - [`naming`]: asset names from `{{field}}` templates, with placeholders for
//!   values not yet known
//! - [`iam`]: the four IAM binding merge operators and binding expansion

pub mod error;
pub mod iam;
pub mod model;
pub mod naming;

pub use error::{BoxError, Error, Result};
pub use iam::{
    BindingMerge, MergeStrategy, expand_iam_member_bindings, expand_iam_policy_bindings,
    expand_iam_role_bindings, merge_additive_bindings, merge_authoritative_bindings,
    merge_delete_additive_bindings, merge_delete_authoritative_bindings, merge_delete_iam_assets,
    merge_iam_assets,
};
pub use model::{
    Asset, AssetResource, BooleanPolicy, Expr, IamBinding, IamPolicy, ListPolicy, OrgPolicy,
    PolicyRule, PolicySpec, RestoreDefault, StringValues, Timestamp, V2OrgPolicies,
};
pub use naming::{
    AssetNamer, MAX_SUBSTITUTION_DEPTH, NamingScope, PLACEHOLDER_PREFIX, PLACEHOLDER_TOKEN_LEN,
    RandomTokens, TokenProvider, is_placeholder, resource_lookup, template_fields,
};
