//! Workflow summary projection for listings and queries.
//!
//! The WorkflowView is derived from WorkflowEvent only (no direct mutation)
//! and holds what a listing needs without replaying the step sequence.

use crate::domain::lifecycle::DirectiveState;
use crate::domain::types::{DirectiveId, TimestampUtc};
use crate::domain::WorkflowEvent;
use serde::{Deserialize, Serialize};

/// Read-only summary of a workflow derived from events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowView {
    directive_id: Option<DirectiveId>,
    name: Option<String>,
    description: Option<String>,
    state: Option<DirectiveState>,
    has_content: bool,
    step_count: usize,
    example_count: usize,
    created_at: Option<TimestampUtc>,
    updated_at: Option<TimestampUtc>,
    last_event_sequence: u64,
}

impl WorkflowView {
    /// Apply an event to update the view.
    pub fn apply_event(&mut self, aggregate_id: &str, event: &WorkflowEvent, sequence: u64) {
        match DirectiveId::parse(aggregate_id) {
            Ok(id) => self.directive_id = Some(id),
            Err(e) => tracing::warn!("Invalid aggregate ID '{}': {}", aggregate_id, e),
        }
        self.last_event_sequence = sequence;

        match event {
            WorkflowEvent::WorkflowDrafted {
                name,
                description,
                drafted_at,
                ..
            } => {
                self.name = Some(name.clone());
                self.description = Some(description.clone());
                self.state = Some(DirectiveState::Draft);
                self.has_content = false;
                self.step_count = 0;
                self.example_count = 0;
                self.created_at = Some(*drafted_at);
            }

            WorkflowEvent::DetailsUpdated {
                name, description, ..
            } => {
                self.name = Some(name.clone());
                self.description = Some(description.clone());
            }

            WorkflowEvent::ContentUpdated { content, .. } => {
                self.has_content = content.is_some();
            }

            WorkflowEvent::StepAdded { .. } => self.step_count += 1,
            WorkflowEvent::StepRemoved { .. } => {
                self.step_count = self.step_count.saturating_sub(1);
            }
            WorkflowEvent::StepUpdated { .. } | WorkflowEvent::StepMoved { .. } => {}

            WorkflowEvent::ExampleAdded { .. } => self.example_count += 1,
            WorkflowEvent::ExampleRemoved { .. } => {
                self.example_count = self.example_count.saturating_sub(1);
            }
            WorkflowEvent::ExampleUpdated { .. } => {}

            WorkflowEvent::WorkflowPublished { .. } => {
                self.state = Some(DirectiveState::Published);
            }
            WorkflowEvent::WorkflowArchived { .. } => {
                self.state = Some(DirectiveState::Archived);
            }
        }

        self.updated_at = Some(event.occurred_at());
    }

    pub fn directive_id(&self) -> Option<&DirectiveId> {
        self.directive_id.as_ref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn state(&self) -> Option<DirectiveState> {
        self.state
    }

    pub fn has_content(&self) -> bool {
        self.has_content
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn example_count(&self) -> usize {
        self.example_count
    }

    pub fn created_at(&self) -> Option<TimestampUtc> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<TimestampUtc> {
        self.updated_at
    }

    /// Get the last event sequence number.
    pub fn last_event_sequence(&self) -> u64 {
        self.last_event_sequence
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
