//! [`TestWorkspace`] with registry, plan and configuration files.

use std::fs;
use std::path::{Path, PathBuf};

use cai_schema::SchemaNode;
use serde_json::json;
use tempfile::TempDir;

use crate::schemas::{
    bucket_iam_binding_schema, bucket_iam_member_schema, bucket_iam_policy_schema,
    compute_instance_schema, storage_bucket_schema,
};

pub const BUCKET_ASSET_TYPE: &str = "storage.googleapis.com/Bucket";
pub const INSTANCE_ASSET_TYPE: &str = "compute.googleapis.com/Instance";

fn schema_json(schema: SchemaNode) -> serde_json::Value {
    serde_json::to_value(schema).unwrap()
}

fn bucket_resource() -> serde_json::Value {
    json!({
        "version": "v1",
        "discovery_document_uri": "https://www.googleapis.com/discovery/v1/apis/storage/v1/rest",
        "discovery_name": "Bucket"
    })
}

/// A registry covering buckets, bucket IAM and compute instances.
///
/// Bucket IAM kinds fetch remote policies so deletions take part in merges.
pub fn registry_json() -> serde_json::Value {
    json!({
        "kinds": {
            "google_storage_bucket": {
                "schema": schema_json(storage_bucket_schema()),
                "assets": [{
                    "asset_type": BUCKET_ASSET_TYPE,
                    "name": "//storage.googleapis.com/{{name}}",
                    "resource": bucket_resource(),
                    "exclude": ["force_destroy"]
                }]
            },
            "google_storage_bucket_iam_member": {
                "schema": schema_json(bucket_iam_member_schema()),
                "assets": [{
                    "asset_type": BUCKET_ASSET_TYPE,
                    "name": "//storage.googleapis.com/{{bucket}}",
                    "iam": "member",
                    "fetch": true
                }]
            },
            "google_storage_bucket_iam_binding": {
                "schema": schema_json(bucket_iam_binding_schema()),
                "assets": [{
                    "asset_type": BUCKET_ASSET_TYPE,
                    "name": "//storage.googleapis.com/{{bucket}}",
                    "iam": "binding",
                    "fetch": true
                }]
            },
            "google_storage_bucket_iam_policy": {
                "schema": schema_json(bucket_iam_policy_schema()),
                "assets": [{
                    "asset_type": BUCKET_ASSET_TYPE,
                    "name": "//storage.googleapis.com/{{bucket}}",
                    "iam": "policy"
                }]
            },
            "google_compute_instance": {
                "schema": schema_json(compute_instance_schema()),
                "assets": [{
                    "asset_type": INSTANCE_ASSET_TYPE,
                    "name": "//compute.googleapis.com/projects/{{project}}/zones/{{zone}}/instances/{{name}}",
                    "resource": {
                        "version": "v1",
                        "discovery_document_uri": "https://www.googleapis.com/discovery/v1/apis/compute/v1/rest",
                        "discovery_name": "Instance"
                    }
                }]
            },
            "google_compute_disk": {
                "schema": {"type": "object", "fields": {"name": {"type": "string"}}}
            }
        }
    })
}

/// One plan resource change.
pub fn resource_change(
    kind: &str,
    name: &str,
    actions: &[&str],
    before: serde_json::Value,
    after: serde_json::Value,
) -> serde_json::Value {
    json!({
        "address": format!("{kind}.{name}"),
        "mode": "managed",
        "type": kind,
        "name": name,
        "provider_name": "registry.terraform.io/hashicorp/google",
        "change": {
            "actions": actions,
            "before": before,
            "after": after
        }
    })
}

/// A plan holding `changes`.
pub fn plan_json(changes: Vec<serde_json::Value>) -> serde_json::Value {
    json!({
        "format_version": "1.2",
        "resource_changes": changes
    })
}

/// A temporary directory for file-based tests.
///
/// # Example
///
/// ```rust,no_run
/// use cai_test_utils::TestWorkspace;
///
/// let ws = TestWorkspace::new();
/// let registry = ws.write_registry();
/// ws.write("cai.toml", "project = \"p\"\n");
/// assert!(registry.exists());
/// ```
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    /// Write `content` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    pub fn write_json(&self, relative: &str, value: &serde_json::Value) -> PathBuf {
        self.write(relative, &serde_json::to_string_pretty(value).unwrap())
    }

    /// Write [`registry_json`] to `registry.json`.
    pub fn write_registry(&self) -> PathBuf {
        self.write_json("registry.json", &registry_json())
    }

    /// Write a plan of `changes` to `plan.json`.
    pub fn write_plan(&self, changes: Vec<serde_json::Value>) -> PathBuf {
        self.write_json("plan.json", &plan_json(changes))
    }

    pub fn read(&self, relative: &str) -> String {
        let path = self.path(relative);
        fs::read_to_string(&path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", path.display()))
    }
}
