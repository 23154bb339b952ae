//! Field reads over flattened resource values.

use cai_schema::{Error, FieldReader, FlatAddressMap, SchemaNode, UNKNOWN_VALUE, Value};
use cai_test_utils::schemas::{compute_instance_schema, compute_instance_values};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;

fn instance_reader(schema: &SchemaNode) -> FieldReader<'_> {
    FieldReader::from_values("google_compute_instance", schema, &compute_instance_values()).unwrap()
}

#[test]
fn test_reads_scalars_by_type() {
    let schema = compute_instance_schema();
    let reader = instance_reader(&schema);

    assert_eq!(reader.get("name").unwrap(), Value::from("web-1"));
    assert_eq!(
        reader.get("boot_disk.0.initialize_params.0.size").unwrap(),
        Value::Int(20)
    );
    assert_eq!(reader.get("boot_disk.0.auto_delete").unwrap(), Value::Bool(true));
    assert_eq!(reader.get_int("boot_disk.0.initialize_params.0.size").unwrap(), 20);
    assert!(reader.get_bool("scheduling.0.automatic_restart").unwrap());
}

#[test]
fn test_reads_nested_blocks_as_maps() {
    let schema = compute_instance_schema();
    let reader = instance_reader(&schema);

    let access_config = reader.get("network_interface.0.access_config").unwrap();
    assert_eq!(
        access_config,
        Value::List(vec![Value::map([
            ("nat_ip", Value::from("")),
            ("network_tier", Value::from("PREMIUM")),
        ])])
    );
}

#[test]
fn test_reads_maps_and_sets() {
    let schema = compute_instance_schema();
    let reader = instance_reader(&schema);

    assert_eq!(
        reader.get("labels").unwrap(),
        Value::map([("env", Value::from("prod")), ("team", Value::from("web"))])
    );
    assert_eq!(
        reader.get_string_list("tags").unwrap(),
        vec!["http-server", "https-server"]
    );
    assert_eq!(reader.get("tags.#").unwrap(), Value::Int(2));
}

#[rstest]
#[case("can_ip_forward", Value::Bool(false))]
#[case("scheduling.0.min_node_cpus", Value::Int(0))]
#[case("network_interface.0.network_ip", Value::from(""))]
#[case("service_account", Value::List(vec![]))]
fn test_zero_values_exist_only_for_get_ok_exists(#[case] address: &str, #[case] zero: Value) {
    let schema = compute_instance_schema();
    let reader = instance_reader(&schema);

    assert_eq!(reader.get_ok(address).unwrap(), (zero.clone(), false));
    assert_eq!(reader.get_ok_exists(address).unwrap(), (zero, true));
}

#[rstest]
#[case("machine_type")]
#[case("deletion_protection")]
#[case("scheduling")]
fn test_present_fields_exist_for_both_reads(#[case] address: &str) {
    let schema = compute_instance_schema();
    let reader = instance_reader(&schema);

    let (_, exists) = reader.get_ok_exists(address).unwrap();
    assert!(exists);
    if address != "deletion_protection" {
        let (_, set) = reader.get_ok(address).unwrap();
        assert!(set);
    }
}

#[test]
fn test_absent_fields_read_as_zero() {
    let schema = compute_instance_schema();
    let reader = instance_reader(&schema);

    assert_eq!(reader.get_ok("resource_policies").unwrap(), (Value::List(vec![]), false));
    assert_eq!(
        reader.get_ok_exists("service_account.0.email").unwrap(),
        (Value::from(""), false)
    );
    assert_eq!(reader.get_string("service_account.0.email").unwrap(), "");
}

#[test]
fn test_unknown_list_reads_as_not_set() {
    let schema = compute_instance_schema();
    let state: FlatAddressMap = [("name", "web-1"), ("tags.#", UNKNOWN_VALUE)]
        .into_iter()
        .collect();
    let reader = FieldReader::new("google_compute_instance", &schema, state);

    let result = reader.read("tags").unwrap();
    assert!(result.computed);
    assert_eq!(reader.get_ok("tags").unwrap(), (Value::Set(vec![]), false));
    assert_eq!(reader.get_ok_exists("tags").unwrap(), (Value::Set(vec![]), false));
}

#[test]
fn test_invalid_address_is_an_error() {
    let schema = compute_instance_schema();
    let reader = instance_reader(&schema);

    assert!(matches!(reader.get_ok("no_such_field"), Err(Error::Unresolvable { .. })));
    assert!(matches!(reader.get("name.nested"), Err(Error::Unresolvable { .. })));
}

#[test]
fn test_corrupt_count_is_invalid_stored_value() {
    let schema = compute_instance_schema();
    let state: FlatAddressMap = [("tags.#", "two")].into_iter().collect();
    let reader = FieldReader::new("google_compute_instance", &schema, state);

    assert!(matches!(
        reader.get("tags"),
        Err(Error::InvalidStoredValue { expected: "count", .. })
    ));
}

#[test]
fn test_root_read_matches_zero_filled_json() {
    let schema = SchemaNode::object([
        ("name", SchemaNode::string()),
        ("sizes", SchemaNode::list(SchemaNode::int())),
    ]);
    let values = Value::from(json!({"sizes": [1, 2]}));
    let reader = FieldReader::from_values("test", &schema, &values).unwrap();

    assert_eq!(reader.get("").unwrap().to_json(), json!({"name": "", "sizes": [1, 2]}));
    assert_eq!(reader.id(), "");
    assert_eq!(reader.kind(), "test");
}

#[test]
fn test_dotted_map_keys_round_trip() {
    let schema = compute_instance_schema();
    let values = Value::from(json!({
        "name": "web-1",
        "labels": {"app.kubernetes.io/name": "web", "env": "prod"}
    }));

    let state = cai_schema::flatten(&schema, &values).unwrap();
    assert_eq!(state.get("labels.app.kubernetes.io/name"), Some("web"));
    let chain = cai_schema::resolve_address(&schema, "labels.app.kubernetes.io/name").unwrap();
    assert_eq!(chain.last().unwrap().kind, cai_schema::SchemaKind::String);

    let reader = FieldReader::new("google_compute_instance", &schema, state);
    assert_eq!(
        reader.get("labels").unwrap(),
        Value::map([
            ("app.kubernetes.io/name", Value::from("web")),
            ("env", Value::from("prod")),
        ])
    );
    assert_eq!(
        reader.get_ok_exists("labels.app.kubernetes.io/name").unwrap(),
        (Value::from("web"), true)
    );
    assert!(reader.get_ok_exists("labels").unwrap().1);
}
