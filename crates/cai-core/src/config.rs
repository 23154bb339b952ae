//! Converter configuration
//!
//! Configuration is read from TOML files in a directory, in order:
//!
//! 1. `cai.toml` - shared, usually committed
//! 2. `cai.local.toml` - per-user overrides, usually ignored
//!
//! Later layers override earlier ones field by field. Environment variables
//! are applied last with [`ConverterConfig::with_env_overrides`].
//!
//! ```
//! use cai_core::ConverterConfig;
//!
//! let mut config = ConverterConfig::parse(r#"
//! project = "my-project"
//! region = "us-central1"
//! "#).unwrap();
//!
//! config.merge(&ConverterConfig::parse("zone = \"us-central1-a\"").unwrap());
//! assert_eq!(config.project, "my-project");
//! assert_eq!(config.zone, "us-central1-a");
//! assert!(!config.is_offline());
//! ```

use std::path::Path;

use cai_asset::NamingScope;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Shared configuration file name.
pub const CONFIG_FILE: &str = "cai.toml";

/// Local override file name.
pub const LOCAL_CONFIG_FILE: &str = "cai.local.toml";

const PROJECT_ENV: &[&str] = &[
    "GOOGLE_PROJECT",
    "GOOGLE_CLOUD_PROJECT",
    "GCLOUD_PROJECT",
    "CLOUDSDK_CORE_PROJECT",
];
const REGION_ENV: &[&str] = &["GOOGLE_REGION", "GCLOUD_REGION", "CLOUDSDK_COMPUTE_REGION"];
const ZONE_ENV: &[&str] = &["GOOGLE_ZONE", "GCLOUD_ZONE", "CLOUDSDK_COMPUTE_ZONE"];

/// Provider-level settings used while converting a plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Default project for resources that do not set one.
    pub project: String,

    /// Default region.
    pub region: String,

    /// Default zone.
    pub zone: String,

    /// Never fetch remote assets for merging.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offline: Option<bool>,

    /// Also convert resources whose plan action is no-op.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub convert_unchanged: Option<bool>,
}

impl ConverterConfig {
    pub fn parse(content: &str) -> Result<Self> {
        let config: ConverterConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Load a single configuration file. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(?path, "Configuration file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config = Self::parse(&content)?;
        tracing::debug!(?path, "Loaded configuration");
        Ok(config)
    }

    /// Load `cai.toml` and then `cai.local.toml` from `dir`.
    pub fn load_layered(dir: &Path) -> Result<Self> {
        let mut config = Self::load(&dir.join(CONFIG_FILE))?;
        config.merge(&Self::load(&dir.join(LOCAL_CONFIG_FILE))?);
        Ok(config)
    }

    /// Overlay `other`: its non-empty strings and set flags win.
    pub fn merge(&mut self, other: &ConverterConfig) {
        if !other.project.is_empty() {
            self.project = other.project.clone();
        }
        if !other.region.is_empty() {
            self.region = other.region.clone();
        }
        if !other.zone.is_empty() {
            self.zone = other.zone.clone();
        }
        if other.offline.is_some() {
            self.offline = other.offline;
        }
        if other.convert_unchanged.is_some() {
            self.convert_unchanged = other.convert_unchanged;
        }
    }

    /// Apply `GOOGLE_PROJECT`, `GOOGLE_REGION`, `GOOGLE_ZONE` and their
    /// gcloud aliases from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable source. The first
    /// non-empty variable of each group wins.
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let first = |names: &[&str]| {
            names
                .iter()
                .filter_map(|name| lookup(name))
                .find(|value| !value.is_empty())
        };
        if let Some(project) = first(PROJECT_ENV) {
            self.project = project;
        }
        if let Some(region) = first(REGION_ENV) {
            self.region = region;
        }
        if let Some(zone) = first(ZONE_ENV) {
            self.zone = zone;
        }
        self
    }

    pub fn is_offline(&self) -> bool {
        self.offline.unwrap_or(false)
    }

    pub fn converts_unchanged(&self) -> bool {
        self.convert_unchanged.unwrap_or(false)
    }

    /// Scope values templates fall back to.
    pub fn naming_scope(&self) -> NamingScope {
        NamingScope {
            project: self.project.clone(),
            region: self.region.clone(),
            zone: self.zone.clone(),
        }
    }
}
