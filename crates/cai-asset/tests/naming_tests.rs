//! Asset naming from templates and resource fields.

use std::collections::HashSet;
use std::convert::Infallible;

use cai_asset::{
    AssetNamer, NamingScope, PLACEHOLDER_PREFIX, RandomTokens, is_placeholder, resource_lookup,
};
use cai_schema::{FieldReader, Value};
use cai_test_utils::SequentialTokens;
use cai_test_utils::schemas::{compute_instance_schema, compute_instance_values};
use regex::Regex;
use rstest::rstest;
use serde_json::json;

fn lookup_from(
    values: &'static [(&'static str, &'static str)],
) -> impl FnMut(&str, &NamingScope) -> Result<String, Infallible> {
    move |field, _| {
        Ok(values
            .iter()
            .find(|(k, _)| *k == field)
            .map(|(_, v)| v.to_string())
            .unwrap_or_default())
    }
}

#[test]
fn test_all_fields_known() {
    let mut namer = AssetNamer::new();
    let name = namer
        .name("//{{a}}/{{b}}", &NamingScope::new("p"), lookup_from(&[("a", "x"), ("b", "y")]))
        .unwrap();
    assert_eq!(name, "//x/y");
}

#[test]
fn test_missing_field_gets_random_placeholder() {
    let mut namer = AssetNamer::new();
    let name = namer
        .name("//{{a}}/{{b}}", &NamingScope::new("p"), lookup_from(&[("a", "x")]))
        .unwrap();
    let pattern = Regex::new(r"^//x/placeholder-[A-Za-z0-9]{8}$").unwrap();
    assert!(pattern.is_match(&name), "unexpected name {name}");
}

#[test]
fn test_placeholders_are_distinct_within_a_run() {
    let mut namer = AssetNamer::with_tokens(RandomTokens::seeded(42));
    let names: HashSet<String> = (0..50)
        .map(|_| {
            namer
                .name("//x/{{name}}", &NamingScope::new("p"), lookup_from(&[]))
                .unwrap()
        })
        .collect();
    assert_eq!(names.len(), 50);
}

#[test]
fn test_placeholder_project_is_scoped_to_one_call() {
    let mut namer = AssetNamer::with_tokens(SequentialTokens::new());
    let scope = NamingScope::default();
    let project_of = |field: &str, scope: &NamingScope| -> Result<String, Infallible> {
        Ok(if field == "project" { scope.project.clone() } else { String::new() })
    };

    let first = namer.name("projects/{{project}}", &scope, project_of).unwrap();
    let second = namer.name("projects/{{project}}", &scope, project_of).unwrap();

    assert_eq!(first, "projects/placeholder-00000001");
    assert_eq!(second, "projects/placeholder-00000002");
    assert!(scope.project.is_empty());
}

#[rstest]
#[case(
    "//compute.googleapis.com/projects/{{project}}/zones/{{zone}}/instances/{{name}}",
    "//compute.googleapis.com/projects/my-project/zones/us-central1-a/instances/web-1"
)]
#[case("{{machine_type}}/{{name}}", "e2-medium/web-1")]
#[case("types/{{%machine_type}}", "types/e2-medium")]
fn test_resource_lookup_reads_fields(#[case] template: &str, #[case] expected: &str) {
    let schema = compute_instance_schema();
    let values = compute_instance_values();
    let reader = FieldReader::from_values("google_compute_instance", &schema, &values).unwrap();

    let mut namer = AssetNamer::with_tokens(SequentialTokens::new());
    let name = namer
        .name(template, &NamingScope::new("fallback"), resource_lookup(&reader))
        .unwrap();
    assert_eq!(name, expected);
}

#[test]
fn test_resource_lookup_falls_back_to_scope() {
    let schema = compute_instance_schema();
    let values = Value::from(json!({"name": "web-1"}));
    let reader = FieldReader::from_values("google_compute_instance", &schema, &values).unwrap();
    let scope = NamingScope {
        project: "provider-project".into(),
        region: "europe-west1".into(),
        zone: "projects/p/zones/europe-west1-b".into(),
    };

    let mut namer = AssetNamer::with_tokens(SequentialTokens::new());
    let name = namer
        .name("{{project}}/{{zone}}/{{region}}/{{name}}", &scope, resource_lookup(&reader))
        .unwrap();
    assert_eq!(name, "provider-project/europe-west1-b/europe-west1/web-1");
}

#[test]
fn test_resource_lookup_placeholders_unset_and_unknown_fields() {
    let schema = compute_instance_schema();
    let values = Value::from(json!({"name": "", "can_ip_forward": false}));
    let reader = FieldReader::from_values("google_compute_instance", &schema, &values).unwrap();

    let mut namer = AssetNamer::with_tokens(SequentialTokens::new());
    let name = namer
        .name(
            "{{name}}/{{can_ip_forward}}/{{not_in_schema}}",
            &NamingScope::new("p"),
            resource_lookup(&reader),
        )
        .unwrap();
    assert_eq!(
        name,
        "placeholder-00000001/placeholder-00000002/placeholder-00000003"
    );
    assert!(name.split('/').all(is_placeholder));
    assert!(name.starts_with(PLACEHOLDER_PREFIX));
}

#[rstest]
#[case("projects/p:x", "projects%2Fp:x")]
#[case("user@example.com", "user@example.com")]
#[case("a+b,c;d=e$f&g", "a+b,c;d=e$f&g")]
#[case("a b?c#d", "a%20b%3Fc%23d")]
#[case("v1.2_x-y~z", "v1.2_x-y~z")]
#[case("café", "caf%C3%A9")]
fn test_percent_field_encodes_as_path_segment(#[case] value: &'static str, #[case] expected: &str) {
    let lookup = move |_: &str, _: &NamingScope| Ok::<_, Infallible>(value.to_string());
    let mut namer = AssetNamer::with_tokens(SequentialTokens::new());
    let name = namer
        .name("keys/{{%key}}", &NamingScope::new("p"), lookup)
        .unwrap();
    assert_eq!(name, format!("keys/{expected}"));
}
