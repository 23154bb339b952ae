//! Batch conversion of plan resource changes
//!
//! Resource changes are processed in two stages so the result does not
//! depend on their order in the plan:
//!
//! 1. deletions, merged into existing assets with each converter's delete
//!    operator;
//! 2. creates, updates, replacements and (optionally) no-ops.
//!
//! A failure converting one resource is recorded in the [`ConversionReport`]
//! and never stops the rest of the batch.

use std::collections::HashMap;

use cai_asset::{Asset, RandomTokens, Timestamp, TokenProvider};
use cai_schema::FieldReader;

use crate::config::ConverterConfig;
use crate::plan::ResourceChange;
use crate::registry::{ConverterRegistry, KindEntry};
use crate::resource::{AssetFetcher, ConvertContext, ResourceConverter};
use crate::{Error, Result};

/// Provider name of resources that may not be convertible.
pub const BETA_PROVIDER: &str = "registry.terraform.io/hashicorp/google-beta";

/// Update time stamped on organization policies; plans carry no time.
pub const ORG_POLICY_UPDATE_SECONDS: i64 = 1_618_413_377;

/// Why a resource change was not converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Not a `google_` resource.
    NotGoogle,
    /// A data source rather than a managed resource.
    DataSource,
    /// The kind has no schema in the registry.
    UnknownKind,
    /// The kind has a schema but no converter.
    Unsupported,
    /// The action is not converted (reads, or no-ops when disabled).
    Action,
}

#[derive(Debug)]
pub struct SkippedResource {
    pub address: String,
    pub reason: SkipReason,
}

#[derive(Debug)]
pub struct ConversionFailure {
    pub address: String,
    pub error: Error,
}

/// Outcome of a batch beyond the converted assets.
#[derive(Debug, Default)]
pub struct ConversionReport {
    /// Addresses that produced or modified at least one asset.
    pub converted: Vec<String>,
    pub skipped: Vec<SkippedResource>,
    pub failures: Vec<ConversionFailure>,
}

impl ConversionReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Converts plan resource changes into assets.
pub struct Converter<'r> {
    registry: &'r ConverterRegistry,
    config: ConverterConfig,
    tokens: Box<dyn TokenProvider + Send>,
    fetcher: Option<Box<dyn AssetFetcher + 'r>>,
    assets: HashMap<String, Asset>,
    report: ConversionReport,
}

impl<'r> Converter<'r> {
    pub fn new(registry: &'r ConverterRegistry, config: ConverterConfig) -> Self {
        Self {
            registry,
            config,
            tokens: Box::new(RandomTokens::new()),
            fetcher: None,
            assets: HashMap::new(),
            report: ConversionReport::default(),
        }
    }

    /// Use `tokens` for placeholder values.
    pub fn with_tokens(mut self, tokens: impl TokenProvider + Send + 'static) -> Self {
        self.tokens = Box::new(tokens);
        self
    }

    /// Fetch remote assets through `fetcher` unless configured offline.
    pub fn with_fetcher(mut self, fetcher: impl AssetFetcher + 'r) -> Self {
        self.fetcher = Some(Box::new(fetcher));
        self
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Convert a batch of resource changes.
    pub fn add_resource_changes(&mut self, changes: &[ResourceChange]) {
        let mut create_or_update = Vec::new();
        for change in changes {
            let Some(entry) = self.accept(change) else {
                continue;
            };

            if change.is_create()
                || change.is_update()
                || change.is_delete_create()
                || (self.config.converts_unchanged() && change.is_no_op())
            {
                create_or_update.push((change, entry));
            } else if change.is_delete() {
                let result = self.add_delete(change, entry);
                self.record(change, result);
            } else {
                self.skip(change, SkipReason::Action);
            }
        }

        for (change, entry) in create_or_update {
            let result = self.add_create_or_update(change, entry);
            self.record(change, result);
        }
    }

    /// Converted assets, sorted by name.
    pub fn assets(&self) -> Vec<Asset> {
        let mut assets: Vec<Asset> = self.assets.values().cloned().collect();
        assets.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.asset_type.cmp(&b.asset_type)));
        assets
    }

    pub fn report(&self) -> &ConversionReport {
        &self.report
    }

    /// Sorted assets and the report.
    pub fn finish(self) -> (Vec<Asset>, ConversionReport) {
        let assets = self.assets();
        (assets, self.report)
    }

    fn accept(&mut self, change: &ResourceChange) -> Option<&'r KindEntry> {
        if !change.kind.starts_with("google_") {
            self.skip(change, SkipReason::NotGoogle);
            return None;
        }
        if !change.is_managed() {
            self.skip(change, SkipReason::DataSource);
            return None;
        }
        if change.provider_name == BETA_PROVIDER {
            tracing::debug!(
                address = %change.address,
                "Resource uses the google-beta provider and may not be convertible"
            );
        }

        let registry = self.registry;
        let Some(entry) = registry.get(&change.kind) else {
            tracing::debug!(address = %change.address, kind = %change.kind, "Resource kind not found in registry");
            self.skip(change, SkipReason::UnknownKind);
            return None;
        };
        if entry.converters().is_empty() {
            tracing::debug!(address = %change.address, kind = %change.kind, "Resource kind cannot be converted");
            self.skip(change, SkipReason::Unsupported);
            return None;
        }
        Some(entry)
    }

    fn skip(&mut self, change: &ResourceChange, reason: SkipReason) {
        self.report.skipped.push(SkippedResource {
            address: change.address.clone(),
            reason,
        });
    }

    fn record(&mut self, change: &ResourceChange, result: Result<bool>) {
        match result {
            Ok(true) => self.report.converted.push(change.address.clone()),
            Ok(false) => {}
            Err(error) => {
                match &error {
                    Error::DuplicateAsset { .. } => {
                        tracing::warn!(address = %change.address, %error, "Converting resource to asset")
                    }
                    _ => {
                        tracing::error!(address = %change.address, %error, "Converting resource to asset")
                    }
                }
                self.report.failures.push(ConversionFailure {
                    address: change.address.clone(),
                    error,
                });
            }
        }
    }

    /// Only converters that can both fetch and merge deletions take part:
    /// anything else is simply absent from the result.
    fn add_delete(&mut self, change: &ResourceChange, entry: &KindEntry) -> Result<bool> {
        let state = change.before_state(entry.schema())?;
        let reader = FieldReader::new(&change.kind, entry.schema(), state);

        let mut touched = false;
        for converter in entry.converters() {
            let Some(delete) = converter.merge_ops().and_then(|ops| ops.delete) else {
                continue;
            };
            if !converter.fetches_full_resource() {
                continue;
            }
            let Some(converted) = self.convert(converter.as_ref(), &reader)? else {
                continue;
            };

            for asset in converted {
                let key = asset.key();
                let existing = match self.assets.get(&key) {
                    Some(existing) => Some(existing.clone()),
                    None => self.fetch(change, &reader, &asset)?,
                };
                if let Some(existing) = existing {
                    let merged = delete(&existing, &asset);
                    self.assets.insert(key, stamp_org_policies(merged));
                    touched = true;
                }
            }
        }
        Ok(touched)
    }

    fn add_create_or_update(&mut self, change: &ResourceChange, entry: &KindEntry) -> Result<bool> {
        let state = change.after_state(entry.schema())?;
        let reader = FieldReader::new(&change.kind, entry.schema(), state);

        let mut touched = false;
        for converter in entry.converters() {
            let Some(converted) = self.convert(converter.as_ref(), &reader)? else {
                continue;
            };

            for asset in converted {
                let key = asset.key();
                let existing = match self.assets.get(&key) {
                    Some(existing) => Some(existing.clone()),
                    None if converter.fetches_full_resource() => self.fetch(change, &reader, &asset)?,
                    None => None,
                };

                let asset = match existing {
                    Some(existing) => {
                        let Some(ops) = converter.merge_ops() else {
                            return Err(Error::DuplicateAsset {
                                asset_type: asset.asset_type,
                                name: asset.name,
                            });
                        };
                        (ops.create_update)(&existing, &asset)
                    }
                    None => asset,
                };
                self.assets.insert(key, stamp_org_policies(asset));
                touched = true;
            }
        }
        Ok(touched)
    }

    /// Run one converter. `None` when the resource maps to no asset.
    fn convert(
        &mut self,
        converter: &dyn ResourceConverter,
        reader: &FieldReader<'_>,
    ) -> Result<Option<Vec<Asset>>> {
        let mut ctx = ConvertContext::new(&self.config, &mut *self.tokens);
        match converter.convert(reader, &mut ctx) {
            Ok(assets) => Ok(Some(assets)),
            Err(Error::NoConversion) => {
                tracing::debug!(kind = reader.kind(), asset_type = converter.asset_type(), "No conversion");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// The remote counterpart of `asset`, if it can be fetched.
    fn fetch(&self, change: &ResourceChange, reader: &FieldReader<'_>, asset: &Asset) -> Result<Option<Asset>> {
        if self.config.is_offline() {
            return Ok(None);
        }
        let Some(fetcher) = &self.fetcher else {
            return Ok(None);
        };

        let key = asset.key();
        match fetcher.fetch_full_resource(reader, asset, &self.config) {
            Ok(existing) => Ok(Some(existing)),
            Err(Error::EmptyIdentityField { field }) => {
                tracing::debug!(
                    address = %change.address,
                    asset_type = %asset.asset_type,
                    field = %field,
                    "Unable to fetch remote asset: identity field unset or known after apply"
                );
                Ok(None)
            }
            Err(Error::ResourceInaccessible { .. }) => {
                tracing::warn!(
                    address = %change.address,
                    key = %key,
                    "Fetching asset for merge failed: not found or insufficient permission"
                );
                Ok(None)
            }
            Err(err) => Err(Error::Fetch {
                key,
                message: err.to_string(),
            }),
        }
    }
}

/// Stamp organization policies with the fixed update time.
fn stamp_org_policies(mut asset: Asset) -> Asset {
    let stamp = Timestamp {
        seconds: ORG_POLICY_UPDATE_SECONDS,
        nanos: ORG_POLICY_UPDATE_SECONDS * 1_000_000_000,
    };
    for policy in &mut asset.org_policy {
        policy.update_time = Some(stamp);
    }
    for policy in &mut asset.v2_org_policies {
        if let Some(spec) = &mut policy.policy_spec {
            spec.update_time = Some(stamp);
        }
    }
    asset
}
