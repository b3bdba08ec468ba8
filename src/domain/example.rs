//! Worked examples attached to a workflow.

use crate::domain::errors::DirectiveError;
use crate::domain::types::{optional_text, required_text, ContentLimits, ExampleId, TimestampUtc};
use serde::{Deserialize, Serialize};

/// Caller-supplied fields of an example, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleFields {
    pub scenario: String,
    pub input: String,
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl ExampleFields {
    pub fn new(
        scenario: impl Into<String>,
        input: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self {
            scenario: scenario.into(),
            input: input.into(),
            output: output.into(),
            explanation: None,
        }
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    /// Trimmed copy; scenario/input/output must be non-empty.
    pub(crate) fn normalized(&self, limits: &ContentLimits) -> Result<Self, DirectiveError> {
        let max = limits.example_field_max;
        Ok(Self {
            scenario: required_text("scenario", &self.scenario, max)?,
            input: required_text("input", &self.input, max)?,
            output: required_text("output", &self.output, max)?,
            explanation: optional_text("explanation", self.explanation.as_deref(), max)?,
        })
    }
}

/// Example owned by exactly one workflow. Unordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    id: ExampleId,
    #[serde(flatten)]
    fields: ExampleFields,
    created_at: TimestampUtc,
    updated_at: TimestampUtc,
}

impl Example {
    pub(crate) fn new(id: ExampleId, fields: ExampleFields, at: TimestampUtc) -> Self {
        Self {
            id,
            fields,
            created_at: at,
            updated_at: at,
        }
    }

    pub fn id(&self) -> &ExampleId {
        &self.id
    }

    pub fn fields(&self) -> &ExampleFields {
        &self.fields
    }

    pub fn scenario(&self) -> &str {
        &self.fields.scenario
    }

    pub fn input(&self) -> &str {
        &self.fields.input
    }

    pub fn output(&self) -> &str {
        &self.fields.output
    }

    pub fn explanation(&self) -> Option<&str> {
        self.fields.explanation.as_deref()
    }

    pub fn created_at(&self) -> TimestampUtc {
        self.created_at
    }

    pub fn updated_at(&self) -> TimestampUtc {
        self.updated_at
    }

    pub(crate) fn replace_fields(&mut self, fields: ExampleFields, at: TimestampUtc) {
        self.fields = fields;
        self.updated_at = at;
    }
}
