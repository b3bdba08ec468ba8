//! Strongly typed domain primitives for directives.
//!
//! Identifiers, timestamps, positions and the text validation rules shared
//! by every directive operation.

use crate::domain::errors::DirectiveError;
use crate::domain::services::IdGenerator;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static KEBAB_CASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("kebab-case pattern is valid")
});

/// Identifier of a directive (Rule, Skill or Workflow).
///
/// Always lowercase kebab-case: alphanumeric segments joined by single
/// hyphens. A UUID suffix keeps the shape, since a hyphenated UUID is itself
/// a run of lowercase hex segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DirectiveId(String);

impl DirectiveId {
    /// Parses an identifier, rejecting anything that is not kebab-case.
    pub fn parse(s: &str) -> Result<Self, DirectiveError> {
        if KEBAB_CASE.is_match(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(DirectiveError::validation(
                "id",
                format!("'{}' is not lowercase kebab-case", s),
            ))
        }
    }

    /// Derives an identifier from a display name ("Code Review!" -> "code-review").
    pub fn from_name(name: &str) -> Result<Self, DirectiveError> {
        let mut slug = String::with_capacity(name.len());
        for c in name.chars().flat_map(char::to_lowercase) {
            if c.is_ascii_alphanumeric() {
                slug.push(c);
            } else if !slug.is_empty() && !slug.ends_with('-') {
                slug.push('-');
            }
        }
        while slug.ends_with('-') {
            slug.pop();
        }
        if slug.is_empty() {
            return Err(DirectiveError::validation(
                "name",
                format!("'{}' has no characters usable in an id", name),
            ));
        }
        Self::parse(&slug)
    }

    /// Derives an identifier from a name and appends a generated segment for
    /// disambiguation.
    pub fn unique_from_name(name: &str, ids: &dyn IdGenerator) -> Result<Self, DirectiveError> {
        let base = Self::from_name(name)?;
        Self::parse(&format!("{}-{}", base.0, ids.next_id().to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DirectiveId {
    type Error = DirectiveError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DirectiveId> for String {
    fn from(id: DirectiveId) -> Self {
        id.0
    }
}

impl std::fmt::Display for DirectiveId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque identifier of a workflow step.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepId(pub String);

impl StepId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StepId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for StepId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque identifier of a workflow example.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExampleId(pub String);

impl ExampleId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ExampleId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ExampleId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for ExampleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// 1-based position of a step within its workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StepPosition(pub u32);

impl StepPosition {
    pub fn first() -> Self {
        Self(1)
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Never goes below 1.
    pub fn prev(&self) -> Self {
        Self(self.0.saturating_sub(1).max(1))
    }
}

impl std::fmt::Display for StepPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// UTC timestamp wrapper used for every directive, step and example stamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimestampUtc(pub DateTime<Utc>);

impl TimestampUtc {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }
}

impl Default for TimestampUtc {
    fn default() -> Self {
        Self::now()
    }
}

impl std::fmt::Display for TimestampUtc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%dT%H:%M:%SZ"))
    }
}

/// Maximum lengths (in characters) for the text fields of a directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContentLimits {
    pub name_max: usize,
    pub description_max: usize,
    pub content_max: usize,
    pub step_max: usize,
    pub example_field_max: usize,
}

impl ContentLimits {
    /// Limits that accept anything; used when replaying already-validated events.
    pub fn unbounded() -> Self {
        Self {
            name_max: usize::MAX,
            description_max: usize::MAX,
            content_max: usize::MAX,
            step_max: usize::MAX,
            example_field_max: usize::MAX,
        }
    }
}

impl Default for ContentLimits {
    fn default() -> Self {
        Self {
            name_max: 120,
            description_max: 1000,
            content_max: 100_000,
            step_max: 10_000,
            example_field_max: 10_000,
        }
    }
}

/// Trims `value` and checks it is non-empty and at most `max` characters.
pub(crate) fn required_text(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<String, DirectiveError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DirectiveError::validation(field, "must not be empty"));
    }
    check_length(field, trimmed, max)?;
    Ok(trimmed.to_string())
}

/// Like [`required_text`] but blank input yields `None`.
pub(crate) fn optional_text(
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> Result<Option<String>, DirectiveError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(trimmed) => {
            check_length(field, trimmed, max)?;
            Ok(Some(trimmed.to_string()))
        }
    }
}

fn check_length(field: &'static str, value: &str, max: usize) -> Result<(), DirectiveError> {
    let len = value.chars().count();
    if len > max {
        return Err(DirectiveError::validation(
            field,
            format!("is {} characters long (max {})", len, max),
        ));
    }
    Ok(())
}
