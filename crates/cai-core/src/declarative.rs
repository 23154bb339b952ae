//! Converters described by data
//!
//! Most resource kinds map onto an asset in the same way: a name template,
//! discovery metadata and the resource's fields copied into `resource.data`
//! under their API (camelCase) names. IAM resources instead expand their
//! fields into policy bindings. [`AssetDefinition`] captures both shapes so
//! kinds can be registered without code.
//!
//! ```json
//! {
//!   "asset_type": "storage.googleapis.com/Bucket",
//!   "name": "//storage.googleapis.com/{{name}}",
//!   "resource": {
//!     "version": "v1",
//!     "discovery_document_uri": "https://www.googleapis.com/discovery/v1/apis/storage/v1/rest",
//!     "discovery_name": "Bucket"
//!   },
//!   "exclude": ["force_destroy"]
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};

use cai_asset::{
    Asset, AssetResource, IamBinding, IamPolicy, MergeStrategy, expand_iam_member_bindings,
    expand_iam_policy_bindings, expand_iam_role_bindings, merge_delete_iam_assets, merge_iam_assets,
};
use cai_schema::{FieldReader, SchemaKind, SchemaNode, Value};
use convert_case::{Case, Casing};
use serde::{Deserialize, Serialize};

use crate::resource::{ConvertContext, MergeOps, ResourceConverter};
use crate::{Error, Result};

/// How an IAM resource contributes to its policy asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IamMode {
    /// The resource owns the whole policy (`policy_data`).
    Policy,
    /// The resource owns all members of one role (`role`, `members`).
    Binding,
    /// The resource grants one role to one member (`role`, `member`).
    Member,
}

impl IamMode {
    pub fn expand(self, reader: &FieldReader<'_>) -> Result<Vec<IamBinding>> {
        let bindings = match self {
            IamMode::Policy => expand_iam_policy_bindings(reader)?,
            IamMode::Binding => expand_iam_role_bindings(reader)?,
            IamMode::Member => expand_iam_member_bindings(reader)?,
        };
        Ok(bindings)
    }

    pub fn merge_ops(self) -> MergeOps {
        match self {
            IamMode::Policy => MergeOps {
                create_update: replace_policy,
                delete: None,
            },
            IamMode::Binding => MergeOps {
                create_update: merge_authoritative,
                delete: Some(merge_delete_authoritative),
            },
            IamMode::Member => MergeOps {
                create_update: merge_additive,
                delete: Some(merge_delete_additive),
            },
        }
    }
}

fn replace_policy(existing: &Asset, incoming: &Asset) -> Asset {
    let mut merged = existing.clone();
    merged.iam_policy = incoming.iam_policy.clone();
    merged
}

fn merge_authoritative(existing: &Asset, incoming: &Asset) -> Asset {
    merge_iam_assets(existing, incoming, MergeStrategy::Authoritative.create_or_update())
}

fn merge_delete_authoritative(existing: &Asset, incoming: &Asset) -> Asset {
    merge_delete_iam_assets(existing, incoming, MergeStrategy::Authoritative.delete())
}

fn merge_additive(existing: &Asset, incoming: &Asset) -> Asset {
    merge_iam_assets(existing, incoming, MergeStrategy::Additive.create_or_update())
}

fn merge_delete_additive(existing: &Asset, incoming: &Asset) -> Asset {
    merge_delete_iam_assets(existing, incoming, MergeStrategy::Additive.delete())
}

/// Discovery metadata of the emitted `resource` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDefinition {
    pub version: String,
    pub discovery_document_uri: String,
    pub discovery_name: String,
}

/// Data description of one asset produced by a resource kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDefinition {
    pub asset_type: String,

    /// Name template, e.g. `//storage.googleapis.com/{{name}}`.
    pub name: String,

    /// Emit a `resource` section with the resource's fields as data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<ResourceDefinition>,

    /// Emit an IAM policy expanded from the resource's fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iam: Option<IamMode>,

    /// Fetch the remote asset before merging.
    #[serde(default)]
    pub fetch: bool,

    /// Top-level fields left out of `resource.data`.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub exclude: BTreeSet<String>,
}

/// A [`ResourceConverter`] driven by an [`AssetDefinition`].
#[derive(Debug, Clone)]
pub struct DeclarativeConverter {
    definition: AssetDefinition,
}

impl DeclarativeConverter {
    pub fn new(definition: AssetDefinition) -> Self {
        Self { definition }
    }

    pub fn definition(&self) -> &AssetDefinition {
        &self.definition
    }

    fn resource_data(&self, reader: &FieldReader<'_>) -> Result<serde_json::Map<String, serde_json::Value>> {
        let SchemaKind::Object { fields } = &reader.schema().kind else {
            return Err(Error::invalid_config(format!(
                "schema of {} is not an object",
                reader.kind()
            )));
        };

        let mut data = serde_json::Map::new();
        for (field, node) in fields {
            if self.definition.exclude.contains(field) {
                continue;
            }
            let (value, exists) = reader.get_ok_exists(field)?;
            if exists {
                data.insert(field.to_case(Case::Camel), api_value(&value, node));
            }
        }
        Ok(data)
    }
}

impl ResourceConverter for DeclarativeConverter {
    fn asset_type(&self) -> &str {
        &self.definition.asset_type
    }

    fn convert(&self, reader: &FieldReader<'_>, ctx: &mut ConvertContext<'_>) -> Result<Vec<Asset>> {
        let name = ctx.asset_name(&self.definition.name, reader)?;
        let mut asset = Asset::new(name, &self.definition.asset_type);

        if let Some(mode) = self.definition.iam {
            let bindings = mode.expand(reader)?;
            if mode != IamMode::Policy && bindings.iter().all(|b| b.role.is_empty()) {
                return Err(Error::NoConversion);
            }
            asset.iam_policy = Some(IamPolicy { bindings });
        }

        if let Some(resource) = &self.definition.resource {
            asset.resource = Some(AssetResource {
                version: resource.version.clone(),
                discovery_document_uri: resource.discovery_document_uri.clone(),
                discovery_name: resource.discovery_name.clone(),
                data: self.resource_data(reader)?,
            });
        }

        Ok(vec![asset])
    }

    fn fetches_full_resource(&self) -> bool {
        self.definition.fetch
    }

    fn merge_ops(&self) -> Option<MergeOps> {
        self.definition.iam.map(IamMode::merge_ops)
    }
}

/// JSON for `value` with object field names in camelCase. Map keys are user
/// data and stay as they are.
fn api_value(value: &Value, node: &SchemaNode) -> serde_json::Value {
    match (value, &node.kind) {
        (Value::Map(entries), SchemaKind::Object { fields }) => {
            let object: BTreeMap<String, serde_json::Value> = entries
                .iter()
                .map(|(key, item)| {
                    let json = match fields.get(key) {
                        Some(field) => api_value(item, field),
                        None => item.to_json(),
                    };
                    (key.to_case(Case::Camel), json)
                })
                .collect();
            serde_json::Value::Object(object.into_iter().collect())
        }
        (Value::List(items) | Value::Set(items), SchemaKind::List { elem: Some(elem) })
        | (Value::List(items) | Value::Set(items), SchemaKind::Set { elem: Some(elem) }) => {
            serde_json::Value::Array(items.iter().map(|item| api_value(item, elem)).collect())
        }
        _ => value.to_json(),
    }
}
