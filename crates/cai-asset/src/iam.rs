//! IAM binding merges and expansion
//!
//! A conversion run may see the same IAM policy asset several times: once for
//! a whole-policy resource and once per binding or member resource. The merge
//! operators combine these into one policy.
//!
//! | Operator                   | Existing role            | New role  |
//! |----------------------------|--------------------------|-----------|
//! | additive                   | union of members         | appended  |
//! | authoritative              | members replaced         | appended  |
//! | delete additive            | listed members removed   | ignored   |
//! | delete authoritative       | role removed             | ignored   |
//!
//! All operators are pure: inputs are borrowed, a new list is returned, and
//! existing roles keep their relative order. Incoming bindings are expected to
//! carry each role at most once.

use std::collections::{HashMap, HashSet};

use cai_schema::FieldReader;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{Asset, IamBinding, IamPolicy};

/// Signature shared by the four binding merge operators.
pub type BindingMerge = fn(&[IamBinding], &[IamBinding]) -> Vec<IamBinding>;

/// How a resource's bindings relate to the bindings already on the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// The resource grants members without revoking others.
    Additive,
    /// The resource owns the full member list of its roles.
    Authoritative,
}

impl MergeStrategy {
    pub fn create_or_update(self) -> BindingMerge {
        match self {
            MergeStrategy::Additive => merge_additive_bindings,
            MergeStrategy::Authoritative => merge_authoritative_bindings,
        }
    }

    pub fn delete(self) -> BindingMerge {
        match self {
            MergeStrategy::Additive => merge_delete_additive_bindings,
            MergeStrategy::Authoritative => merge_delete_authoritative_bindings,
        }
    }
}

/// Union incoming members into existing roles; append new roles.
pub fn merge_additive_bindings(existing: &[IamBinding], incoming: &[IamBinding]) -> Vec<IamBinding> {
    upsert(existing, incoming, |members, added| {
        members.extend(added.iter().cloned());
    })
}

/// Replace the members of existing roles; append new roles.
pub fn merge_authoritative_bindings(existing: &[IamBinding], incoming: &[IamBinding]) -> Vec<IamBinding> {
    upsert(existing, incoming, |members, replacement| {
        *members = replacement.to_vec();
    })
}

/// Remove the incoming (role, member) pairs; drop roles left empty.
pub fn merge_delete_additive_bindings(existing: &[IamBinding], incoming: &[IamBinding]) -> Vec<IamBinding> {
    let removed: HashSet<(&str, &str)> = incoming
        .iter()
        .flat_map(|b| b.members.iter().map(move |m| (b.role.as_str(), m.as_str())))
        .collect();

    existing
        .iter()
        .filter_map(|binding| {
            let members: Vec<String> = binding
                .members
                .iter()
                .filter(|m| !removed.contains(&(binding.role.as_str(), m.as_str())))
                .cloned()
                .collect();
            (!members.is_empty()).then(|| IamBinding {
                role: binding.role.clone(),
                members,
            })
        })
        .collect()
}

/// Remove every existing role named by an incoming binding.
pub fn merge_delete_authoritative_bindings(existing: &[IamBinding], incoming: &[IamBinding]) -> Vec<IamBinding> {
    let removed: HashSet<&str> = incoming.iter().map(|b| b.role.as_str()).collect();
    existing
        .iter()
        .filter(|b| !removed.contains(b.role.as_str()))
        .cloned()
        .collect()
}

fn upsert(
    existing: &[IamBinding],
    incoming: &[IamBinding],
    mut apply: impl FnMut(&mut Vec<String>, &[String]),
) -> Vec<IamBinding> {
    let mut merged = existing.to_vec();
    let mut positions: HashMap<String, usize> = merged
        .iter()
        .enumerate()
        .map(|(index, b)| (b.role.clone(), index))
        .collect();

    for binding in incoming {
        match positions.get(&binding.role) {
            Some(&index) => apply(&mut merged[index].members, &binding.members),
            None => {
                positions.insert(binding.role.clone(), merged.len());
                merged.push(binding.clone());
            }
        }
    }

    for binding in &mut merged {
        binding.members.sort_unstable();
        binding.members.dedup();
    }
    merged
}

/// Combine the IAM policy of `incoming` into `existing`.
///
/// When `existing` has no policy the incoming policy is adopted as is.
pub fn merge_iam_assets(existing: &Asset, incoming: &Asset, merge: BindingMerge) -> Asset {
    let mut merged = existing.clone();
    merged.iam_policy = match &existing.iam_policy {
        Some(policy) => Some(IamPolicy {
            bindings: merge(&policy.bindings, incoming.bindings()),
        }),
        None => incoming.iam_policy.clone(),
    };
    merged
}

/// Remove the IAM policy of `incoming` from `existing`.
///
/// When `existing` has no policy there is nothing to remove.
pub fn merge_delete_iam_assets(existing: &Asset, incoming: &Asset, merge: BindingMerge) -> Asset {
    let mut merged = existing.clone();
    if let Some(policy) = &existing.iam_policy {
        merged.iam_policy = Some(IamPolicy {
            bindings: merge(&policy.bindings, incoming.bindings()),
        });
    }
    merged
}

#[derive(Debug, Deserialize)]
struct PolicyData {
    #[serde(default)]
    bindings: Vec<IamBinding>,
}

/// Bindings of a whole-policy resource, parsed from its `policy_data` JSON.
///
/// An empty `policy_data` yields no bindings.
pub fn expand_iam_policy_bindings(reader: &FieldReader<'_>) -> Result<Vec<IamBinding>> {
    let raw = reader.get_string("policy_data")?;
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    let policy: PolicyData = serde_json::from_str(&raw).map_err(Error::InvalidPolicyData)?;
    Ok(policy.bindings)
}

/// The single binding of a role resource: `role` plus the `members` set.
pub fn expand_iam_role_bindings(reader: &FieldReader<'_>) -> Result<Vec<IamBinding>> {
    let role = reader.get_string("role")?;
    let mut members = reader.get_string_list("members")?;
    members.sort_unstable();
    members.dedup();
    Ok(vec![IamBinding { role, members }])
}

/// The single binding of a member resource: `role` plus one `member`.
pub fn expand_iam_member_bindings(reader: &FieldReader<'_>) -> Result<Vec<IamBinding>> {
    let role = reader.get_string("role")?;
    let member = reader.get_string("member")?;
    Ok(vec![IamBinding::new(role, [member])])
}
