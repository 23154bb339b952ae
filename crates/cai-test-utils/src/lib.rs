//! Shared test fixtures for the cai-convert workspace.
//!
//! This crate is a dev-dependency only and is never published.
//!
//! # Modules
//!
//! - [`schemas`] - sample resource schemas and matching value trees
//! - [`iam`] - binding constructors and deterministic placeholder tokens
//! - [`workspace`] - [`TestWorkspace`] with registry, plan and config files

pub mod iam;
pub mod schemas;
pub mod workspace;

pub use iam::{SequentialTokens, binding, bindings};
pub use workspace::TestWorkspace;
