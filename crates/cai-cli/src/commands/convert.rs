//! Convert command implementation

use std::path::PathBuf;

use cai_asset::RandomTokens;
use cai_core::{Converter, ConverterConfig, ConverterRegistry, Plan, StaticFetcher};
use colored::Colorize;

use super::print_json;
use crate::error::{CliError, Result};

/// Inputs of the convert command.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub registry: PathBuf,
    pub plan: PathBuf,
    pub config_dir: PathBuf,
    pub existing: Option<PathBuf>,
    pub offline: bool,
    pub convert_unchanged: bool,
    pub seed: Option<u64>,
    pub strict: bool,
}

/// Run the convert command
///
/// Assets go to stdout as a JSON array; the summary and per-resource
/// failures go to stderr.
pub fn run_convert(options: &ConvertOptions) -> Result<()> {
    let registry = ConverterRegistry::load(&options.registry)?;
    let plan = Plan::load(&options.plan)?;

    let mut config = ConverterConfig::load_layered(&options.config_dir)?.with_env_overrides();
    if options.offline {
        config.offline = Some(true);
    }
    if options.convert_unchanged {
        config.convert_unchanged = Some(true);
    }
    tracing::debug!(?config, "Resolved converter configuration");

    let mut converter = Converter::new(&registry, config);
    if let Some(seed) = options.seed {
        converter = converter.with_tokens(RandomTokens::seeded(seed));
    }
    if let Some(existing) = &options.existing {
        converter = converter.with_fetcher(StaticFetcher::load(existing)?);
    }

    converter.add_resource_changes(&plan.resource_changes);
    let (assets, report) = converter.finish();

    print_json(&assets)?;

    for skipped in &report.skipped {
        tracing::debug!(address = %skipped.address, reason = ?skipped.reason, "Skipped resource");
    }
    for failure in &report.failures {
        eprintln!(
            "{} {}: {}",
            "failed".red().bold(),
            failure.address.cyan(),
            failure.error
        );
    }
    eprintln!(
        "{} {} assets, {} skipped, {} failed",
        "converted".green().bold(),
        assets.len(),
        report.skipped.len(),
        report.failures.len()
    );

    if options.strict && !report.is_clean() {
        return Err(CliError::user(format!(
            "{} resources failed to convert",
            report.failures.len()
        )));
    }
    Ok(())
}
