//! cai CLI
//!
//! Converts JSON plans into Cloud Asset Inventory assets and exposes the
//! schema, naming and IAM merge building blocks for inspection.

mod cli;
mod commands;
mod error;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use error::{CliError, Result};

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    cai_core::logging::init(level)
        .map_err(|e| CliError::user(format!("Failed to set up logging: {e}")))?;
    tracing::debug!("Verbose mode enabled");

    match cli.command {
        Some(cmd) => execute_command(cmd),
        None => {
            println!("{} plan to asset converter", "cai".green().bold());
            println!();
            println!("Run {} for available commands.", "cai --help".cyan());
            Ok(())
        }
    }
}

fn execute_command(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Kinds { registry } => commands::run_kinds(&registry),
        Commands::Flatten { resource } => commands::run_flatten(&resource),
        Commands::Get {
            resource,
            address,
            exists,
        } => commands::run_get(&resource, &address, exists),
        Commands::Name {
            resource,
            template,
            config_dir,
            seed,
        } => commands::run_name(&resource, &template, &config_dir, seed),
        Commands::Merge {
            strategy,
            delete,
            existing,
            incoming,
        } => commands::run_merge(strategy, delete, &existing, &incoming),
        Commands::Convert {
            registry,
            plan,
            config_dir,
            existing,
            offline,
            convert_unchanged,
            seed,
            strict,
        } => commands::run_convert(&commands::ConvertOptions {
            registry,
            plan,
            config_dir,
            existing,
            offline,
            convert_unchanged,
            seed,
            strict,
        }),
    }
}
