//! Commands inspecting a single resource: kinds, flatten, get, name

use std::path::Path;

use cai_asset::{AssetNamer, RandomTokens, resource_lookup};
use cai_core::{ConverterConfig, ConverterRegistry};
use cai_schema::{FieldReader, Value, flatten};
use serde_json::json;

use super::{print_json, read_json};
use crate::cli::ResourceArgs;
use crate::error::Result;

/// Run the kinds command
pub fn run_kinds(registry: &Path) -> Result<()> {
    let registry = ConverterRegistry::load(registry)?;
    for kind in registry.list_kinds() {
        println!("{kind}");
    }
    Ok(())
}

fn load_values(resource: &ResourceArgs) -> Result<Value> {
    let json: serde_json::Value = read_json(&resource.values)?;
    Ok(Value::from(json))
}

/// Run the flatten command
pub fn run_flatten(resource: &ResourceArgs) -> Result<()> {
    let registry = ConverterRegistry::load(&resource.registry)?;
    let entry = registry.entry(&resource.kind)?;
    let state = flatten(entry.schema(), &load_values(resource)?)?;
    print_json(&state)
}

/// Run the get command
pub fn run_get(resource: &ResourceArgs, address: &str, literal: bool) -> Result<()> {
    let registry = ConverterRegistry::load(&resource.registry)?;
    let entry = registry.entry(&resource.kind)?;
    let reader = FieldReader::from_values(&resource.kind, entry.schema(), &load_values(resource)?)?;

    let (value, exists) = if literal {
        reader.get_ok_exists(address)?
    } else {
        reader.get_ok(address)?
    };
    print_json(&json!({
        "address": address,
        "value": value.to_json(),
        "exists": exists,
    }))
}

/// Run the name command
pub fn run_name(
    resource: &ResourceArgs,
    template: &str,
    config_dir: &Path,
    seed: Option<u64>,
) -> Result<()> {
    let registry = ConverterRegistry::load(&resource.registry)?;
    let entry = registry.entry(&resource.kind)?;
    let reader = FieldReader::from_values(&resource.kind, entry.schema(), &load_values(resource)?)?;

    let config = ConverterConfig::load_layered(config_dir)?.with_env_overrides();
    let tokens = seed.map(RandomTokens::seeded).unwrap_or_default();
    let name = AssetNamer::with_tokens(tokens).name(
        template,
        &config.naming_scope(),
        resource_lookup(&reader),
    )?;
    println!("{name}");
    Ok(())
}
