//! Asset data shapes
//!
//! An [`Asset`] is the canonical, configuration-independent representation of
//! a cloud resource. Field names follow the Cloud Asset Inventory export
//! format so the JSON can be consumed by existing policy tooling.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

fn is_false(b: &bool) -> bool {
    !*b
}

/// The asset representation of a resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// Full resource name, e.g. `//storage.googleapis.com/my-bucket`.
    pub name: String,

    /// Type name in `<service>.googleapis.com/<Kind>` format.
    pub asset_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<AssetResource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iam_policy: Option<IamPolicy>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub org_policy: Vec<OrgPolicy>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub v2_org_policies: Vec<V2OrgPolicies>,
}

impl Asset {
    pub fn new(name: impl Into<String>, asset_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            asset_type: asset_type.into(),
            ..Self::default()
        }
    }

    /// Key identifying the asset within a conversion run.
    pub fn key(&self) -> String {
        format!("{}{}", self.asset_type, self.name)
    }

    /// Bindings of the IAM policy, empty when there is no policy.
    pub fn bindings(&self) -> &[IamBinding] {
        self.iam_policy
            .as_ref()
            .map(|policy| policy.bindings.as_slice())
            .unwrap_or_default()
    }
}

/// The `resource` section of an asset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetResource {
    /// API version.
    pub version: String,

    /// URI of the discovery document, including scheme.
    pub discovery_document_uri: String,

    /// Resource name in the discovery document.
    pub discovery_name: String,

    /// The cloud-side object shape.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub data: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IamPolicy {
    pub bindings: Vec<IamBinding>,
}

/// One role and the members granted it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IamBinding {
    pub role: String,
    #[serde(default)]
    pub members: Vec<String>,
}

impl IamBinding {
    pub fn new<M: Into<String>>(role: impl Into<String>, members: impl IntoIterator<Item = M>) -> Self {
        Self {
            role: role.into(),
            members: members.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrgPolicy {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub constraint: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_policy: Option<ListPolicy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boolean_policy: Option<BooleanPolicy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restore_default: Option<RestoreDefault>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<Timestamp>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListPolicy {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub denied_values: Vec<String>,

    /// `0` unspecified, `1` allow all, `2` deny all.
    #[serde(default, skip_serializing_if = "is_zero_i32")]
    pub all_values: i32,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub suggested_value: String,

    #[serde(default, skip_serializing_if = "is_false")]
    pub inherit_from_parent: bool,
}

fn is_zero_i32(n: &i32) -> bool {
    *n == 0
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BooleanPolicy {
    #[serde(default, skip_serializing_if = "is_false")]
    pub enforced: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreDefault {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct V2OrgPolicies {
    pub name: String,

    #[serde(rename = "spec", default, skip_serializing_if = "Option::is_none")]
    pub policy_spec: Option<PolicySpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicySpec {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub etag: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<Timestamp>,

    #[serde(rename = "rules", default, skip_serializing_if = "Vec::is_empty")]
    pub policy_rules: Vec<PolicyRule>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub inherit_from_parent: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub reset: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<StringValues>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub allow_all: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub deny_all: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub enforce: bool,

    #[serde(rename = "expression", default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Expr>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringValues {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub denied_values: Vec<String>,
}

/// A CEL condition attached to a policy rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expr {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub expression: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub location: String,
}

/// A point in time, serialized as an RFC 3339 string.
///
/// `nanos` holds the full epoch nanoseconds and is what gets serialized;
/// `seconds` is kept alongside for consumers reading the struct directly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanos: i64,
}

impl Timestamp {
    pub fn from_datetime(time: DateTime<Utc>) -> Self {
        Self {
            seconds: time.timestamp(),
            nanos: time.timestamp_nanos_opt().unwrap_or_default(),
        }
    }

    pub fn to_datetime(self) -> DateTime<Utc> {
        DateTime::from_timestamp_nanos(self.nanos)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(
            &self
                .to_datetime()
                .to_rfc3339_opts(SecondsFormat::AutoSi, true),
        )
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let time = DateTime::parse_from_rfc3339(&raw)
            .map_err(|err| serde::de::Error::custom(format!("bad Timestamp: {err}")))?;
        Ok(Self::from_datetime(time.with_timezone(&Utc)))
    }
}
