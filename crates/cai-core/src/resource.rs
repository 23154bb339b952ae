//! Per-kind resource conversion
//!
//! A [`ResourceConverter`] turns one resource instance, seen through a
//! [`FieldReader`], into zero or more assets. Converters that describe part
//! of a shared asset (IAM bindings and members) also provide [`MergeOps`] so
//! the driver can combine them with assets converted earlier in the batch or
//! fetched from the cloud.

use std::collections::HashMap;
use std::path::Path;

use cai_asset::{Asset, AssetNamer, NamingScope, TokenProvider, resource_lookup};
use cai_schema::FieldReader;

use crate::config::ConverterConfig;
use crate::{Error, Result};

/// Combines an existing asset with an incoming one.
pub type AssetMerge = fn(&Asset, &Asset) -> Asset;

/// Merge functions of a converter.
#[derive(Debug, Clone, Copy)]
pub struct MergeOps {
    /// Used when the incoming resource is created, updated or unchanged.
    pub create_update: AssetMerge,
    /// Used when the incoming resource is deleted. Converters without one
    /// are not consulted for deletions.
    pub delete: Option<AssetMerge>,
}

/// Everything a converter may need besides the resource itself.
pub struct ConvertContext<'a> {
    config: &'a ConverterConfig,
    scope: NamingScope,
    namer: AssetNamer<&'a mut dyn TokenProvider>,
}

impl<'a> ConvertContext<'a> {
    pub fn new(config: &'a ConverterConfig, tokens: &'a mut dyn TokenProvider) -> Self {
        Self {
            config,
            scope: config.naming_scope(),
            namer: AssetNamer::with_tokens(tokens),
        }
    }

    pub fn config(&self) -> &ConverterConfig {
        self.config
    }

    pub fn scope(&self) -> &NamingScope {
        &self.scope
    }

    /// Name an asset from `template` using the resource's fields.
    pub fn asset_name(&mut self, template: &str, reader: &FieldReader<'_>) -> Result<String> {
        Ok(self.namer.name(template, &self.scope, resource_lookup(reader))?)
    }
}

/// Converts resources of one kind into assets of one type.
pub trait ResourceConverter: Send + Sync {
    /// The asset type produced, e.g. `storage.googleapis.com/Bucket`.
    fn asset_type(&self) -> &str;

    /// Convert one resource instance.
    ///
    /// Returns [`Error::NoConversion`] when the instance intentionally maps to
    /// no asset.
    fn convert(&self, reader: &FieldReader<'_>, ctx: &mut ConvertContext<'_>) -> Result<Vec<Asset>>;

    /// Whether the full remote asset should be fetched before merging.
    fn fetches_full_resource(&self) -> bool {
        false
    }

    fn merge_ops(&self) -> Option<MergeOps> {
        None
    }
}

/// Source of the current remote state of an asset.
pub trait AssetFetcher: Send + Sync {
    /// Fetch the remote counterpart of `asset`.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyIdentityField`] when the asset cannot be identified yet
    /// - [`Error::ResourceInaccessible`] when it does not exist or cannot be read
    fn fetch_full_resource(
        &self,
        reader: &FieldReader<'_>,
        asset: &Asset,
        config: &ConverterConfig,
    ) -> Result<Asset>;
}

/// Fetcher backed by a previously exported list of assets.
#[derive(Debug, Clone, Default)]
pub struct StaticFetcher {
    assets: HashMap<String, Asset>,
}

impl StaticFetcher {
    pub fn new(assets: impl IntoIterator<Item = Asset>) -> Self {
        Self {
            assets: assets.into_iter().map(|a| (a.key(), a)).collect(),
        }
    }

    /// Load a JSON array of assets.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let assets: Vec<Asset> = serde_json::from_str(&content)?;
        tracing::debug!(?path, count = assets.len(), "Loaded existing assets");
        Ok(Self::new(assets))
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl AssetFetcher for StaticFetcher {
    fn fetch_full_resource(
        &self,
        _reader: &FieldReader<'_>,
        asset: &Asset,
        _config: &ConverterConfig,
    ) -> Result<Asset> {
        if asset.name.contains(cai_asset::PLACEHOLDER_PREFIX) {
            return Err(Error::EmptyIdentityField {
                field: "name".to_string(),
            });
        }
        let key = asset.key();
        self.assets
            .get(&key)
            .cloned()
            .ok_or(Error::ResourceInaccessible { key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cai_asset::RandomTokens;
    use cai_schema::{SchemaNode, Value};
    use serde_json::json;

    #[test]
    fn context_names_from_resource_then_scope() {
        let schema = SchemaNode::object([
            ("name", SchemaNode::string()),
            ("project", SchemaNode::string()),
        ]);
        let values = Value::from(json!({"name": "logs"}));
        let reader = FieldReader::from_values("google_storage_bucket", &schema, &values).unwrap();

        let config = ConverterConfig {
            project: "scope-project".into(),
            ..ConverterConfig::default()
        };
        let mut tokens = RandomTokens::seeded(1);
        let mut ctx = ConvertContext::new(&config, &mut tokens);

        let name = ctx
            .asset_name("//storage.googleapis.com/projects/{{project}}/buckets/{{name}}", &reader)
            .unwrap();
        assert_eq!(name, "//storage.googleapis.com/projects/scope-project/buckets/logs");
    }

    #[test]
    fn static_fetcher_reports_missing_and_unidentified_assets() {
        let schema = SchemaNode::object([("name", SchemaNode::string())]);
        let reader = FieldReader::from_values("k", &schema, &Value::Nil).unwrap();
        let config = ConverterConfig::default();
        let known = Asset::new("//x/known", "t");
        let fetcher = StaticFetcher::new([known.clone()]);

        assert_eq!(fetcher.fetch_full_resource(&reader, &known, &config).unwrap(), known);
        assert!(matches!(
            fetcher.fetch_full_resource(&reader, &Asset::new("//x/other", "t"), &config),
            Err(Error::ResourceInaccessible { .. })
        ));
        assert!(matches!(
            fetcher.fetch_full_resource(&reader, &Asset::new("//x/placeholder-abcd1234", "t"), &config),
            Err(Error::EmptyIdentityField { .. })
        ));
    }
}
