//! IAM binding helpers and deterministic tokens.

use cai_asset::{IamBinding, TokenProvider};

/// A binding of `role` to `members`, in the given order.
pub fn binding(role: &str, members: &[&str]) -> IamBinding {
    IamBinding::new(role, members.iter().copied())
}

/// Bindings from `(role, members)` pairs.
pub fn bindings(entries: &[(&str, &[&str])]) -> Vec<IamBinding> {
    entries
        .iter()
        .map(|(role, members)| binding(role, members))
        .collect()
}

/// Tokens `00000001`, `00000002`, ... padded to the requested length.
#[derive(Debug, Clone, Default)]
pub struct SequentialTokens {
    next: usize,
}

impl SequentialTokens {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenProvider for SequentialTokens {
    fn next_token(&mut self, len: usize) -> String {
        self.next += 1;
        format!("{:0>len$}", self.next)
    }
}
