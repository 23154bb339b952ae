//! Conversion of plan resource changes into Cloud Asset Inventory assets.
//!
//! - [`ConverterConfig`]: layered TOML configuration plus environment overrides
//! - [`ConverterRegistry`]: resource kind to schema and [`ResourceConverter`]s
//! - [`DeclarativeConverter`]: converters described by a JSON registry file
//! - [`Converter`]: batch driver with per-resource failure isolation
//! - [`logging`]: tracing subscriber setup for binaries

pub mod config;
pub mod converter;
pub mod declarative;
pub mod error;
pub mod logging;
pub mod plan;
pub mod registry;
pub mod resource;

pub use config::{CONFIG_FILE, ConverterConfig, LOCAL_CONFIG_FILE};
pub use converter::{
    ConversionFailure, ConversionReport, Converter, ORG_POLICY_UPDATE_SECONDS, SkipReason,
    SkippedResource,
};
pub use declarative::{AssetDefinition, DeclarativeConverter, IamMode, ResourceDefinition};
pub use error::{Error, Result};
pub use plan::{Action, Change, Plan, ResourceChange};
pub use registry::{ConverterRegistry, KindDefinition, KindEntry, RegistryFile};
pub use resource::{AssetFetcher, AssetMerge, ConvertContext, MergeOps, ResourceConverter, StaticFetcher};
