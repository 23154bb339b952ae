//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Convert plan resource changes into Cloud Asset Inventory assets
#[derive(Parser, Debug)]
#[command(name = "cai")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// A single resource instance read from a values file.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ResourceArgs {
    /// Converter registry (JSON)
    #[arg(long)]
    pub registry: PathBuf,

    /// Resource kind, e.g. google_storage_bucket
    #[arg(long)]
    pub kind: String,

    /// Resource values (JSON object)
    #[arg(long)]
    pub values: PathBuf,
}

/// Binding merge strategy
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Union members; deletions remove single members
    Additive,
    /// Replace members per role; deletions remove whole roles
    Authoritative,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// List the resource kinds of a registry
    Kinds {
        /// Converter registry (JSON)
        #[arg(long)]
        registry: PathBuf,
    },

    /// Print the flattened address map of a resource
    Flatten {
        #[command(flatten)]
        resource: ResourceArgs,
    },

    /// Read one field of a resource
    ///
    /// Examples:
    ///   cai get --registry r.json --kind google_compute_instance --values v.json --address boot_disk.0.device_name
    ///   cai get ... --address can_ip_forward --exists
    Get {
        #[command(flatten)]
        resource: ResourceArgs,

        /// Dotted field address
        #[arg(long)]
        address: String,

        /// Report literal presence, so zero values count as set
        #[arg(long)]
        exists: bool,
    },

    /// Build an asset name from a template and a resource's fields
    Name {
        #[command(flatten)]
        resource: ResourceArgs,

        /// Name template, e.g. //storage.googleapis.com/{{name}}
        #[arg(long)]
        template: String,

        /// Directory holding cai.toml and cai.local.toml
        #[arg(long, default_value = ".")]
        config_dir: PathBuf,

        /// Seed for placeholder tokens
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Merge two IAM binding lists (JSON arrays of {role, members})
    Merge {
        /// Merge strategy
        #[arg(long, value_enum, default_value = "additive")]
        strategy: Strategy,

        /// Remove the incoming bindings instead of adding them
        #[arg(long)]
        delete: bool,

        /// Existing bindings
        existing: PathBuf,

        /// Incoming bindings
        incoming: PathBuf,
    },

    /// Convert a JSON plan into assets
    Convert {
        /// Converter registry (JSON)
        #[arg(long)]
        registry: PathBuf,

        /// JSON plan
        #[arg(long)]
        plan: PathBuf,

        /// Directory holding cai.toml and cai.local.toml
        #[arg(long, default_value = ".")]
        config_dir: PathBuf,

        /// Previously exported assets to merge IAM changes into (JSON array)
        #[arg(long)]
        existing: Option<PathBuf>,

        /// Never consult existing assets
        #[arg(long)]
        offline: bool,

        /// Also convert resources whose action is no-op
        #[arg(long)]
        convert_unchanged: bool,

        /// Seed for placeholder tokens
        #[arg(long)]
        seed: Option<u64>,

        /// Fail when any resource fails to convert
        #[arg(long)]
        strict: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_no_args() {
        let cli = Cli::parse_from(["cai"]);
        assert!(!cli.verbose);
        assert!(cli.command.is_none());
    }

    #[test]
    fn parse_get_with_exists() {
        let cli = Cli::parse_from([
            "cai",
            "get",
            "--registry",
            "r.json",
            "--kind",
            "google_compute_instance",
            "--values",
            "v.json",
            "--address",
            "can_ip_forward",
            "--exists",
        ]);
        assert_eq!(
            cli.command,
            Some(Commands::Get {
                resource: ResourceArgs {
                    registry: PathBuf::from("r.json"),
                    kind: "google_compute_instance".to_string(),
                    values: PathBuf::from("v.json"),
                },
                address: "can_ip_forward".to_string(),
                exists: true,
            })
        );
    }

    #[test]
    fn parse_merge_defaults_to_additive() {
        let cli = Cli::parse_from(["cai", "merge", "a.json", "b.json"]);
        match cli.command {
            Some(Commands::Merge {
                strategy, delete, ..
            }) => {
                assert_eq!(strategy, Strategy::Additive);
                assert!(!delete);
            }
            _ => panic!("Expected Merge command"),
        }
    }

    #[test]
    fn parse_convert_flags() {
        let cli = Cli::parse_from([
            "cai",
            "-v",
            "convert",
            "--registry",
            "r.json",
            "--plan",
            "plan.json",
            "--offline",
            "--seed",
            "7",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Some(Commands::Convert {
                config_dir,
                existing,
                offline,
                convert_unchanged,
                seed,
                strict,
                ..
            }) => {
                assert_eq!(config_dir, PathBuf::from("."));
                assert_eq!(existing, None);
                assert!(offline);
                assert!(!convert_unchanged);
                assert_eq!(seed, Some(7));
                assert!(!strict);
            }
            _ => panic!("Expected Convert command"),
        }
    }
}
