//! Asset name templating
//!
//! Asset names are built from templates such as
//! `//storage.googleapis.com/{{name}}` or
//! `//compute.googleapis.com/projects/{{project}}/zones/{{zone}}/disks/{{name}}`.
//!
//! Each `{{field}}` is replaced through a caller-supplied lookup. A field
//! that cannot be determined from configuration alone yields an empty string
//! and is replaced by a placeholder token (`placeholder-` followed by eight
//! alphanumerics), so the asset stays nameable before its dependencies exist.
//! `{{%field}}` percent-encodes the looked-up value as a URL path segment.

use std::sync::LazyLock;

use cai_schema::{Error as SchemaError, FieldReader};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use rand::distr::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;

use crate::error::{BoxError, Error, Result};

/// Prefix of generated placeholder values.
pub const PLACEHOLDER_PREFIX: &str = "placeholder-";

/// Length of the random part of a placeholder.
pub const PLACEHOLDER_TOKEN_LEN: usize = 8;

/// Substitution passes before giving up on a self-referencing value.
pub const MAX_SUBSTITUTION_DEPTH: usize = 10;

static PLACEHOLDER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([%0-9A-Za-z_]+)\}\}").unwrap());

/// Bytes escaped in a path segment: everything but unreserved characters
/// and the sub-delimiters allowed in segments.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b',')
    .remove(b':')
    .remove(b';')
    .remove(b'=')
    .remove(b'@');

/// Source of the random part of placeholder values.
pub trait TokenProvider {
    fn next_token(&mut self, len: usize) -> String;
}

impl<T: TokenProvider + ?Sized> TokenProvider for &mut T {
    fn next_token(&mut self, len: usize) -> String {
        (**self).next_token(len)
    }
}

impl<T: TokenProvider + ?Sized> TokenProvider for Box<T> {
    fn next_token(&mut self, len: usize) -> String {
        (**self).next_token(len)
    }
}

/// Alphanumeric tokens from a standard RNG.
#[derive(Debug, Clone)]
pub struct RandomTokens {
    rng: StdRng,
}

impl RandomTokens {
    /// Tokens seeded from the operating system.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Reproducible tokens for a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomTokens {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenProvider for RandomTokens {
    fn next_token(&mut self, len: usize) -> String {
        (&mut self.rng)
            .sample_iter(Alphanumeric)
            .take(len)
            .map(char::from)
            .collect()
    }
}

/// Provider-level values a template falls back to when the resource does
/// not set them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamingScope {
    pub project: String,
    pub region: String,
    pub zone: String,
}

impl NamingScope {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            ..Self::default()
        }
    }
}

/// Whether `value` is a generated placeholder.
pub fn is_placeholder(value: &str) -> bool {
    value.starts_with(PLACEHOLDER_PREFIX)
}

/// Template fields referenced by `template`, without the `%` marker.
pub fn template_fields(template: &str) -> Vec<&str> {
    PLACEHOLDER_PATTERN
        .captures_iter(template)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim_start_matches('%'))
        .collect()
}

/// Builds asset names from templates.
#[derive(Debug, Clone, Default)]
pub struct AssetNamer<T = RandomTokens> {
    tokens: T,
}

impl AssetNamer<RandomTokens> {
    pub fn new() -> Self {
        Self::with_tokens(RandomTokens::new())
    }
}

impl<T: TokenProvider> AssetNamer<T> {
    pub fn with_tokens(tokens: T) -> Self {
        Self { tokens }
    }

    /// A fresh placeholder value.
    pub fn placeholder(&mut self) -> String {
        format!(
            "{PLACEHOLDER_PREFIX}{}",
            self.tokens.next_token(PLACEHOLDER_TOKEN_LEN)
        )
    }

    /// Substitute every `{{field}}` in `template`.
    ///
    /// When `scope` has no project, the lookup sees a copy whose project is a
    /// placeholder. The caller's scope is never modified.
    ///
    /// # Errors
    ///
    /// - [`Error::TemplateSubstitution`] when the lookup fails
    /// - [`Error::RecursiveSubstitution`] when substituted values keep
    ///   introducing placeholders
    pub fn name<F, E>(&mut self, template: &str, scope: &NamingScope, mut lookup: F) -> Result<String>
    where
        F: FnMut(&str, &NamingScope) -> std::result::Result<String, E>,
        E: Into<BoxError>,
    {
        let substituted;
        let scope = if scope.project.is_empty() {
            substituted = NamingScope {
                project: self.placeholder(),
                ..scope.clone()
            };
            tracing::debug!(project = %substituted.project, "Using placeholder project for naming");
            &substituted
        } else {
            scope
        };

        let mut current = template.to_string();
        for _ in 0..MAX_SUBSTITUTION_DEPTH {
            if !PLACEHOLDER_PATTERN.is_match(&current) {
                return Ok(current);
            }
            current = self.substitute_once(&current, scope, &mut lookup)?;
        }
        if PLACEHOLDER_PATTERN.is_match(&current) {
            return Err(Error::RecursiveSubstitution {
                template: template.to_string(),
                depth: MAX_SUBSTITUTION_DEPTH,
            });
        }
        Ok(current)
    }

    fn substitute_once<F, E>(&mut self, template: &str, scope: &NamingScope, lookup: &mut F) -> Result<String>
    where
        F: FnMut(&str, &NamingScope) -> std::result::Result<String, E>,
        E: Into<BoxError>,
    {
        let mut out = String::with_capacity(template.len());
        let mut last = 0;
        for caps in PLACEHOLDER_PATTERN.captures_iter(template) {
            let (Some(whole), Some(field)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            out.push_str(&template[last..whole.start()]);

            let (field, encode) = match field.as_str().strip_prefix('%') {
                Some(stripped) => (stripped, true),
                None => (field.as_str(), false),
            };
            let value = lookup(field, scope).map_err(|source| Error::TemplateSubstitution {
                field: field.to_string(),
                source: source.into(),
            })?;

            if value.is_empty() {
                let placeholder = self.placeholder();
                tracing::debug!(field, %placeholder, "Field has no value, using placeholder");
                out.push_str(&placeholder);
            } else if encode {
                out.extend(utf8_percent_encode(&value, PATH_SEGMENT));
            } else {
                out.push_str(&value);
            }
            last = whole.end();
        }
        out.push_str(&template[last..]);
        Ok(out)
    }
}

/// Standard lookup over a resource's fields.
///
/// - `project` reads the resource's `project` field, else the scope's
/// - `project_id_or_project` prefers a set `project_id` field
/// - `region` and `zone` read the field, else the scope, keeping only the
///   last path segment of a self link
/// - any other field reads the resource value; unset or undeclared fields
///   yield an empty string
pub fn resource_lookup<'r>(
    reader: &'r FieldReader<'_>,
) -> impl FnMut(&str, &NamingScope) -> cai_schema::Result<String> + 'r {
    move |field: &str, scope: &NamingScope| match field {
        "project" => project(reader, scope),
        "project_id_or_project" => {
            let id = field_value(reader, "project_id")?;
            if id.is_empty() {
                project(reader, scope)
            } else {
                Ok(id)
            }
        }
        "region" => Ok(last_segment(or_scope(field_value(reader, "region")?, &scope.region))),
        "zone" => Ok(last_segment(or_scope(field_value(reader, "zone")?, &scope.zone))),
        other => field_value(reader, other),
    }
}

fn project(reader: &FieldReader<'_>, scope: &NamingScope) -> cai_schema::Result<String> {
    Ok(or_scope(field_value(reader, "project")?, &scope.project))
}

fn or_scope(value: String, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value
    }
}

fn last_segment(value: String) -> String {
    match value.rsplit_once('/') {
        Some((_, last)) => last.to_string(),
        None => value,
    }
}

fn field_value(reader: &FieldReader<'_>, field: &str) -> cai_schema::Result<String> {
    match reader.get_ok(field) {
        Ok((value, true)) => Ok(value.to_scalar_string()),
        Ok((_, false)) | Err(SchemaError::Unresolvable { .. }) => Ok(String::new()),
        Err(err) => Err(err),
    }
}
