//! Sample resource schemas and value trees.
//!
//! The schemas are trimmed versions of real provider resources, large enough
//! to cover nested blocks, sets, maps and defaults.

use cai_schema::{ScalarType, SchemaNode, Value};
use serde_json::json;

/// A `google_compute_instance`-like schema.
pub fn compute_instance_schema() -> SchemaNode {
    SchemaNode::object([
        ("name", SchemaNode::string()),
        ("project", SchemaNode::string()),
        ("zone", SchemaNode::string()),
        ("machine_type", SchemaNode::string()),
        ("can_ip_forward", SchemaNode::bool()),
        ("deletion_protection", SchemaNode::bool().with_default(false)),
        ("labels", SchemaNode::map(None)),
        ("metadata", SchemaNode::map(Some(ScalarType::String))),
        ("tags", SchemaNode::set(SchemaNode::string())),
        ("resource_policies", SchemaNode::untyped_list()),
        (
            "boot_disk",
            SchemaNode::list(SchemaNode::object([
                ("auto_delete", SchemaNode::bool().with_default(true)),
                ("device_name", SchemaNode::string()),
                (
                    "initialize_params",
                    SchemaNode::list(SchemaNode::object([
                        ("size", SchemaNode::int()),
                        ("image", SchemaNode::string()),
                    ])),
                ),
            ])),
        ),
        (
            "network_interface",
            SchemaNode::list(SchemaNode::object([
                ("network", SchemaNode::string()),
                ("network_ip", SchemaNode::string()),
                (
                    "access_config",
                    SchemaNode::list(SchemaNode::object([
                        ("nat_ip", SchemaNode::string()),
                        ("network_tier", SchemaNode::string()),
                    ])),
                ),
            ])),
        ),
        (
            "scheduling",
            SchemaNode::list(SchemaNode::object([
                ("preemptible", SchemaNode::bool()),
                ("automatic_restart", SchemaNode::bool().with_default(true)),
                ("min_node_cpus", SchemaNode::int()),
            ])),
        ),
        (
            "service_account",
            SchemaNode::list(SchemaNode::object([
                ("email", SchemaNode::string()),
                ("scopes", SchemaNode::set(SchemaNode::string())),
            ])),
        ),
    ])
}

/// Planned values for [`compute_instance_schema`], as they appear in a plan.
pub fn compute_instance_json() -> serde_json::Value {
    json!({
        "name": "web-1",
        "project": "my-project",
        "zone": "us-central1-a",
        "machine_type": "e2-medium",
        "can_ip_forward": false,
        "deletion_protection": null,
        "labels": {"env": "prod", "team": "web"},
        "metadata": {"startup-script": "echo hi"},
        "tags": ["http-server", "https-server"],
        "boot_disk": [{
            "auto_delete": null,
            "device_name": "boot",
            "initialize_params": [{"size": 20.0, "image": "debian-cloud/debian-12"}]
        }],
        "network_interface": [{
            "network": "default",
            "network_ip": "",
            "access_config": [{"nat_ip": "", "network_tier": "PREMIUM"}]
        }],
        "scheduling": [{"preemptible": false, "automatic_restart": true, "min_node_cpus": 0}],
        "service_account": []
    })
}

pub fn compute_instance_values() -> Value {
    Value::from(compute_instance_json())
}

/// A `google_storage_bucket`-like schema.
pub fn storage_bucket_schema() -> SchemaNode {
    SchemaNode::object([
        ("name", SchemaNode::string()),
        ("project", SchemaNode::string()),
        ("location", SchemaNode::string()),
        ("storage_class", SchemaNode::string().with_default("STANDARD")),
        ("force_destroy", SchemaNode::bool()),
        ("labels", SchemaNode::map(None)),
        (
            "versioning",
            SchemaNode::list(SchemaNode::object([("enabled", SchemaNode::bool())])),
        ),
        (
            "lifecycle_rule",
            SchemaNode::list(SchemaNode::object([
                (
                    "action",
                    SchemaNode::set(SchemaNode::object([
                        ("type", SchemaNode::string()),
                        ("storage_class", SchemaNode::string()),
                    ])),
                ),
                (
                    "condition",
                    SchemaNode::set(SchemaNode::object([
                        ("age", SchemaNode::int()),
                        ("with_state", SchemaNode::string()),
                    ])),
                ),
            ])),
        ),
    ])
}

pub fn storage_bucket_json() -> serde_json::Value {
    json!({
        "name": "logs",
        "project": "my-project",
        "location": "EU",
        "storage_class": null,
        "force_destroy": true,
        "labels": {"cost_center": "ops"},
        "versioning": [{"enabled": true}],
        "lifecycle_rule": [{
            "action": [{"type": "Delete", "storage_class": ""}],
            "condition": [{"age": 30, "with_state": "ANY"}]
        }]
    })
}

/// Schema of a bucket IAM member resource.
pub fn bucket_iam_member_schema() -> SchemaNode {
    SchemaNode::object([
        ("bucket", SchemaNode::string()),
        ("role", SchemaNode::string()),
        ("member", SchemaNode::string()),
    ])
}

/// Schema of a bucket IAM binding resource.
pub fn bucket_iam_binding_schema() -> SchemaNode {
    SchemaNode::object([
        ("bucket", SchemaNode::string()),
        ("role", SchemaNode::string()),
        ("members", SchemaNode::set(SchemaNode::string())),
    ])
}

/// Schema of a bucket IAM policy resource.
pub fn bucket_iam_policy_schema() -> SchemaNode {
    SchemaNode::object([
        ("bucket", SchemaNode::string()),
        ("policy_data", SchemaNode::string()),
        ("etag", SchemaNode::string()),
    ])
}
