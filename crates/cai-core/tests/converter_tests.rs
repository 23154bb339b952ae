//! Batch conversion of plans against the sample registry.

use cai_asset::{Asset, IamPolicy};
use cai_core::{
    Converter, ConverterConfig, ConverterRegistry, Error, Plan, ResourceChange, SkipReason,
    StaticFetcher,
};
use cai_test_utils::workspace::{BUCKET_ASSET_TYPE, plan_json, registry_json, resource_change};
use cai_test_utils::{SequentialTokens, bindings};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

const BUCKET: &str = "//storage.googleapis.com/logs";

fn registry() -> ConverterRegistry {
    ConverterRegistry::parse(&registry_json().to_string()).unwrap()
}

fn changes(changes: Vec<Value>) -> Vec<ResourceChange> {
    Plan::parse(&plan_json(changes).to_string())
        .unwrap()
        .resource_changes
}

fn config() -> ConverterConfig {
    ConverterConfig {
        project: "my-project".into(),
        ..ConverterConfig::default()
    }
}

fn bucket(name: &str) -> Value {
    json!({
        "name": name,
        "project": "my-project",
        "location": "EU",
        "storage_class": null,
        "force_destroy": true
    })
}

fn member(role: &str, member: &str) -> Value {
    json!({"bucket": "logs", "role": role, "member": member})
}

fn run(
    registry: &ConverterRegistry,
    config: ConverterConfig,
    fetcher: Option<StaticFetcher>,
    plan: Vec<Value>,
) -> (Vec<Asset>, cai_core::ConversionReport) {
    let mut converter = Converter::new(registry, config).with_tokens(SequentialTokens::new());
    if let Some(fetcher) = fetcher {
        converter = converter.with_fetcher(fetcher);
    }
    converter.add_resource_changes(&changes(plan));
    converter.finish()
}

fn remote_bucket(policy: &[(&str, &[&str])]) -> Asset {
    let mut asset = Asset::new(BUCKET, BUCKET_ASSET_TYPE);
    asset.iam_policy = Some(IamPolicy {
        bindings: bindings(policy),
    });
    asset
}

#[test]
fn test_bucket_and_iam_resources_merge_into_one_asset() {
    let registry = registry();
    let (assets, report) = run(
        &registry,
        config(),
        None,
        vec![
            resource_change("google_storage_bucket", "logs", &["create"], Value::Null, bucket("logs")),
            resource_change(
                "google_storage_bucket_iam_binding",
                "admins",
                &["create"],
                Value::Null,
                json!({"bucket": "logs", "role": "roles/storage.admin", "members": ["user:b@x.com", "user:a@x.com"]}),
            ),
            resource_change(
                "google_storage_bucket_iam_member",
                "viewer",
                &["create"],
                Value::Null,
                member("roles/storage.objectViewer", "user:c@x.com"),
            ),
        ],
    );

    assert!(report.is_clean(), "{:?}", report.failures);
    assert_eq!(report.converted.len(), 3);
    assert_eq!(assets.len(), 1);

    let asset = &assets[0];
    assert_eq!(asset.name, BUCKET);
    assert_eq!(
        asset.bindings(),
        bindings(&[
            ("roles/storage.admin", &["user:a@x.com", "user:b@x.com"]),
            ("roles/storage.objectViewer", &["user:c@x.com"]),
        ])
        .as_slice()
    );

    let resource = asset.resource.as_ref().unwrap();
    assert_eq!(resource.discovery_name, "Bucket");
    assert_eq!(resource.data["name"], "logs");
    assert_eq!(resource.data["storageClass"], "STANDARD");
    assert!(!resource.data.contains_key("forceDestroy"));
}

#[test]
fn test_deletions_apply_before_creates_regardless_of_plan_order() {
    let registry = registry();
    let fetcher = StaticFetcher::new([remote_bucket(&[(
        "roles/viewer",
        &["user:a@x.com", "user:b@x.com"],
    )])]);

    let (assets, report) = run(
        &registry,
        config(),
        Some(fetcher),
        vec![
            resource_change(
                "google_storage_bucket_iam_member",
                "new",
                &["create"],
                Value::Null,
                member("roles/viewer", "user:c@x.com"),
            ),
            resource_change(
                "google_storage_bucket_iam_member",
                "old",
                &["delete"],
                member("roles/viewer", "user:a@x.com"),
                Value::Null,
            ),
        ],
    );

    assert!(report.is_clean());
    assert_eq!(
        assets[0].bindings(),
        bindings(&[("roles/viewer", &["user:b@x.com", "user:c@x.com"])]).as_slice()
    );
}

#[test]
fn test_binding_delete_removes_role_from_fetched_policy() {
    let registry = registry();
    let fetcher = StaticFetcher::new([remote_bucket(&[
        ("roles/viewer", &["user:a@x.com"]),
        ("roles/editor", &["user:b@x.com"]),
    ])]);

    let (assets, _) = run(
        &registry,
        config(),
        Some(fetcher),
        vec![resource_change(
            "google_storage_bucket_iam_binding",
            "editors",
            &["delete"],
            json!({"bucket": "logs", "role": "roles/editor", "members": ["user:z@x.com"]}),
            Value::Null,
        )],
    );

    assert_eq!(
        assets[0].bindings(),
        bindings(&[("roles/viewer", &["user:a@x.com"])]).as_slice()
    );
}

#[test]
fn test_create_merges_into_fetched_policy() {
    let registry = registry();
    let fetcher = StaticFetcher::new([remote_bucket(&[("roles/viewer", &["user:a@x.com"])])]);

    let (assets, _) = run(
        &registry,
        config(),
        Some(fetcher),
        vec![resource_change(
            "google_storage_bucket_iam_member",
            "new",
            &["create"],
            Value::Null,
            member("roles/viewer", "user:b@x.com"),
        )],
    );

    assert_eq!(
        assets[0].bindings(),
        bindings(&[("roles/viewer", &["user:a@x.com", "user:b@x.com"])]).as_slice()
    );
}

#[test]
fn test_offline_mode_never_fetches() {
    let registry = registry();
    let fetcher = StaticFetcher::new([remote_bucket(&[("roles/viewer", &["user:a@x.com"])])]);
    let offline = ConverterConfig {
        offline: Some(true),
        ..config()
    };

    let (assets, report) = run(
        &registry,
        offline,
        Some(fetcher),
        vec![
            resource_change(
                "google_storage_bucket_iam_member",
                "new",
                &["create"],
                Value::Null,
                member("roles/viewer", "user:b@x.com"),
            ),
            resource_change(
                "google_compute_instance",
                "gone",
                &["delete"],
                json!({"name": "gone", "zone": "us-central1-a"}),
                Value::Null,
            ),
        ],
    );

    assert!(report.is_clean());
    assert_eq!(assets.len(), 1);
    assert_eq!(
        assets[0].bindings(),
        bindings(&[("roles/viewer", &["user:b@x.com"])]).as_slice()
    );
}

#[test]
fn test_inaccessible_remote_asset_is_not_a_failure() {
    let registry = registry();
    let (assets, report) = run(
        &registry,
        config(),
        Some(StaticFetcher::default()),
        vec![resource_change(
            "google_storage_bucket_iam_member",
            "new",
            &["create"],
            Value::Null,
            member("roles/viewer", "user:b@x.com"),
        )],
    );

    assert!(report.is_clean());
    assert_eq!(assets.len(), 1);
}

#[test]
fn test_duplicate_asset_is_reported_and_batch_continues() {
    let registry = registry();
    let (assets, report) = run(
        &registry,
        config(),
        None,
        vec![
            resource_change("google_storage_bucket", "first", &["create"], Value::Null, bucket("logs")),
            resource_change("google_storage_bucket", "second", &["create"], Value::Null, bucket("logs")),
            resource_change("google_storage_bucket", "other", &["create"], Value::Null, bucket("other")),
        ],
    );

    assert_eq!(assets.len(), 2);
    assert_eq!(report.failures.len(), 1);
    let failure = &report.failures[0];
    assert_eq!(failure.address, "google_storage_bucket.second");
    assert!(matches!(failure.error, Error::DuplicateAsset { .. }));
    assert_eq!(
        failure.error.to_string(),
        format!("duplicate asset: type {BUCKET_ASSET_TYPE}: name {BUCKET}")
    );
}

#[test]
fn test_invalid_resource_values_fail_only_that_resource() {
    let registry = registry();
    let (assets, report) = run(
        &registry,
        config(),
        None,
        vec![
            resource_change(
                "google_storage_bucket",
                "broken",
                &["create"],
                Value::Null,
                json!({"name": "broken", "no_such_field": 1}),
            ),
            resource_change("google_storage_bucket", "logs", &["create"], Value::Null, bucket("logs")),
        ],
    );

    assert_eq!(assets.len(), 1);
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(report.failures[0].error, Error::Schema(_)));
}

#[test]
fn test_skip_reasons() {
    let registry = registry();
    let mut data_source =
        resource_change("google_storage_bucket", "lookup", &["read"], Value::Null, bucket("x"));
    data_source["mode"] = json!("data");

    let (assets, report) = run(
        &registry,
        config(),
        None,
        vec![
            resource_change("aws_s3_bucket", "b", &["create"], Value::Null, json!({})),
            data_source,
            resource_change("google_sql_database", "db", &["create"], Value::Null, json!({})),
            resource_change("google_compute_disk", "disk", &["create"], Value::Null, json!({"name": "d"})),
            resource_change("google_storage_bucket", "same", &["no-op"], bucket("same"), bucket("same")),
        ],
    );

    assert!(assets.is_empty());
    let reasons: Vec<(&str, SkipReason)> = report
        .skipped
        .iter()
        .map(|s| (s.address.as_str(), s.reason))
        .collect();
    assert_eq!(
        reasons,
        vec![
            ("aws_s3_bucket.b", SkipReason::NotGoogle),
            ("google_storage_bucket.lookup", SkipReason::DataSource),
            ("google_sql_database.db", SkipReason::UnknownKind),
            ("google_compute_disk.disk", SkipReason::Unsupported),
            ("google_storage_bucket.same", SkipReason::Action),
        ]
    );
}

#[test]
fn test_unchanged_resources_convert_when_enabled() {
    let registry = registry();
    let with_unchanged = ConverterConfig {
        convert_unchanged: Some(true),
        ..config()
    };
    let (assets, report) = run(
        &registry,
        with_unchanged,
        None,
        vec![resource_change("google_storage_bucket", "same", &["no-op"], bucket("same"), bucket("same"))],
    );

    assert_eq!(assets.len(), 1);
    assert!(report.skipped.is_empty());
}

#[test]
fn test_replacement_converts_after_values() {
    let registry = registry();
    let (assets, _) = run(
        &registry,
        config(),
        None,
        vec![resource_change(
            "google_storage_bucket",
            "logs",
            &["delete", "create"],
            bucket("old"),
            bucket("logs"),
        )],
    );

    assert_eq!(assets.len(), 1);
    assert_eq!(assets[0].name, BUCKET);
}

#[test]
fn test_unknown_identity_gets_placeholder_name() {
    let registry = registry();
    let mut change =
        resource_change("google_storage_bucket", "later", &["create"], Value::Null, json!({"location": "EU"}));
    change["change"]["after_unknown"] = json!({"name": true});

    let (assets, _) = run(&registry, config(), None, vec![change]);
    assert_eq!(assets[0].name, "//storage.googleapis.com/placeholder-00000001");
    assert!(!assets[0].resource.as_ref().unwrap().data.contains_key("name"));
}

#[test]
fn test_compute_instance_data_uses_api_field_names() {
    let registry = registry();
    let (assets, report) = run(
        &registry,
        config(),
        None,
        vec![resource_change(
            "google_compute_instance",
            "web",
            &["create"],
            Value::Null,
            cai_test_utils::schemas::compute_instance_json(),
        )],
    );

    assert!(report.is_clean(), "{:?}", report.failures);
    let asset = &assets[0];
    assert_eq!(
        asset.name,
        "//compute.googleapis.com/projects/my-project/zones/us-central1-a/instances/web-1"
    );
    let data = &asset.resource.as_ref().unwrap().data;
    assert_eq!(data["machineType"], "e2-medium");
    assert_eq!(data["canIpForward"], false);
    assert_eq!(data["metadata"], json!({"startup-script": "echo hi"}));
    assert_eq!(
        data["bootDisk"],
        json!([{
            "autoDelete": true,
            "deviceName": "boot",
            "initializeParams": [{"image": "debian-cloud/debian-12", "size": 20}]
        }])
    );
    assert!(!data.contains_key("resourcePolicies"));
}

#[test]
fn test_assets_are_sorted_by_name() {
    let registry = registry();
    let (assets, _) = run(
        &registry,
        config(),
        None,
        vec![
            resource_change("google_storage_bucket", "z", &["create"], Value::Null, bucket("zeta")),
            resource_change("google_storage_bucket", "a", &["create"], Value::Null, bucket("alpha")),
            resource_change("google_storage_bucket", "m", &["create"], Value::Null, bucket("mid")),
        ],
    );

    let names: Vec<&str> = assets.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "//storage.googleapis.com/alpha",
            "//storage.googleapis.com/mid",
            "//storage.googleapis.com/zeta",
        ]
    );
}

#[test]
fn test_policy_resource_replaces_existing_bindings() {
    let registry = registry();
    let policy_data = json!({"bindings": [{"role": "roles/owner", "members": ["user:o@x.com"]}]});
    let (assets, report) = run(
        &registry,
        config(),
        None,
        vec![
            resource_change(
                "google_storage_bucket_iam_member",
                "viewer",
                &["create"],
                Value::Null,
                member("roles/viewer", "user:a@x.com"),
            ),
            resource_change(
                "google_storage_bucket_iam_policy",
                "policy",
                &["create"],
                Value::Null,
                json!({"bucket": "logs", "policy_data": policy_data.to_string()}),
            ),
        ],
    );

    assert!(report.is_clean());
    assert_eq!(
        assets[0].bindings(),
        bindings(&[("roles/owner", &["user:o@x.com"])]).as_slice()
    );
}
