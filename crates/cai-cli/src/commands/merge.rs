//! Merge command implementation

use std::path::Path;

use cai_asset::{IamBinding, MergeStrategy};

use super::{print_json, read_json};
use crate::cli::Strategy;
use crate::error::Result;

/// Run the merge command
pub fn run_merge(strategy: Strategy, delete: bool, existing: &Path, incoming: &Path) -> Result<()> {
    let existing: Vec<IamBinding> = read_json(existing)?;
    let incoming: Vec<IamBinding> = read_json(incoming)?;

    let strategy = match strategy {
        Strategy::Additive => MergeStrategy::Additive,
        Strategy::Authoritative => MergeStrategy::Authoritative,
    };
    let merge = if delete {
        strategy.delete()
    } else {
        strategy.create_or_update()
    };
    tracing::debug!(?strategy, delete, "Merging bindings");

    print_json(&merge(&existing, &incoming))
}
