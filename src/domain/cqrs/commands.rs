//! Workflow commands for the CQRS aggregate.
//!
//! Commands represent intent to change state. The aggregate validates them
//! against the domain model and produces events for the event log.

use crate::domain::example::ExampleFields;
use crate::domain::types::{DirectiveId, ExampleId, StepId};
use serde::{Deserialize, Serialize};

/// Commands that can be executed against the workflow aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowCommand {
    /// Create the workflow in Draft state.
    DraftWorkflow {
        id: DirectiveId,
        name: String,
        description: String,
    },

    UpdateDetails { name: String, description: String },

    /// Replace (or clear, with `None`) the free-text body.
    UpdateContent { content: Option<String> },

    /// Insert a step after `after`, or at the front.
    AddStep {
        content: String,
        after: Option<StepId>,
    },

    UpdateStep { step_id: StepId, content: String },

    RemoveStep { step_id: StepId },

    /// Reposition a step after `after`, or at the front.
    MoveStepAfter {
        step_id: StepId,
        after: Option<StepId>,
    },

    AddExample { fields: ExampleFields },

    UpdateExample {
        example_id: ExampleId,
        fields: ExampleFields,
    },

    RemoveExample { example_id: ExampleId },

    Publish,

    Archive,
}

impl WorkflowCommand {
    /// Human-readable command name for logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::DraftWorkflow { .. } => "DraftWorkflow",
            Self::UpdateDetails { .. } => "UpdateDetails",
            Self::UpdateContent { .. } => "UpdateContent",
            Self::AddStep { .. } => "AddStep",
            Self::UpdateStep { .. } => "UpdateStep",
            Self::RemoveStep { .. } => "RemoveStep",
            Self::MoveStepAfter { .. } => "MoveStepAfter",
            Self::AddExample { .. } => "AddExample",
            Self::UpdateExample { .. } => "UpdateExample",
            Self::RemoveExample { .. } => "RemoveExample",
            Self::Publish => "Publish",
            Self::Archive => "Archive",
        }
    }
}
