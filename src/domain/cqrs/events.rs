//! Workflow events for the CQRS aggregate.
//!
//! Events carry the normalized result of an operation (generated ids,
//! trimmed text, timestamps) so replaying them reproduces the aggregate
//! exactly.

use crate::domain::example::ExampleFields;
use crate::domain::notification::{DirectiveNotification, NotificationKind};
use crate::domain::types::{DirectiveId, ExampleId, StepId, TimestampUtc};
use cqrs_es::DomainEvent;
use serde::{Deserialize, Serialize};

/// Events emitted by the workflow aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowEvent {
    WorkflowDrafted {
        id: DirectiveId,
        name: String,
        description: String,
        drafted_at: TimestampUtc,
    },

    DetailsUpdated {
        name: String,
        description: String,
        updated_at: TimestampUtc,
    },

    ContentUpdated {
        content: Option<String>,
        updated_at: TimestampUtc,
    },

    StepAdded {
        step_id: StepId,
        content: String,
        after: Option<StepId>,
        added_at: TimestampUtc,
    },

    StepUpdated {
        step_id: StepId,
        content: String,
        updated_at: TimestampUtc,
    },

    StepRemoved {
        step_id: StepId,
        removed_at: TimestampUtc,
    },

    StepMoved {
        step_id: StepId,
        after: Option<StepId>,
        moved_at: TimestampUtc,
    },

    ExampleAdded {
        example_id: ExampleId,
        fields: ExampleFields,
        added_at: TimestampUtc,
    },

    ExampleUpdated {
        example_id: ExampleId,
        fields: ExampleFields,
        updated_at: TimestampUtc,
    },

    ExampleRemoved {
        example_id: ExampleId,
        removed_at: TimestampUtc,
    },

    WorkflowPublished { published_at: TimestampUtc },

    WorkflowArchived { archived_at: TimestampUtc },
}

impl WorkflowEvent {
    /// When the event happened.
    pub fn occurred_at(&self) -> TimestampUtc {
        match self {
            Self::WorkflowDrafted { drafted_at, .. } => *drafted_at,
            Self::DetailsUpdated { updated_at, .. }
            | Self::ContentUpdated { updated_at, .. }
            | Self::StepUpdated { updated_at, .. }
            | Self::ExampleUpdated { updated_at, .. } => *updated_at,
            Self::StepAdded { added_at, .. } | Self::ExampleAdded { added_at, .. } => *added_at,
            Self::StepRemoved { removed_at, .. } | Self::ExampleRemoved { removed_at, .. } => {
                *removed_at
            }
            Self::StepMoved { moved_at, .. } => *moved_at,
            Self::WorkflowPublished { published_at } => *published_at,
            Self::WorkflowArchived { archived_at } => *archived_at,
        }
    }

    /// The domain notification this event stands for, if any.
    ///
    /// Drafting creates a directive rather than updating one, so it has none.
    pub fn notification(&self, directive_id: &DirectiveId) -> Option<DirectiveNotification> {
        let kind = match self {
            Self::WorkflowDrafted { .. } => return None,
            Self::WorkflowPublished { .. } => NotificationKind::Published,
            Self::WorkflowArchived { .. } => NotificationKind::Archived,
            _ => NotificationKind::Updated,
        };
        Some(DirectiveNotification::new(
            kind,
            directive_id.clone(),
            self.occurred_at(),
        ))
    }
}

impl DomainEvent for WorkflowEvent {
    fn event_type(&self) -> String {
        let event_type = match self {
            Self::WorkflowDrafted { .. } => "WorkflowDrafted",
            Self::DetailsUpdated { .. } => "DetailsUpdated",
            Self::ContentUpdated { .. } => "ContentUpdated",
            Self::StepAdded { .. } => "StepAdded",
            Self::StepUpdated { .. } => "StepUpdated",
            Self::StepRemoved { .. } => "StepRemoved",
            Self::StepMoved { .. } => "StepMoved",
            Self::ExampleAdded { .. } => "ExampleAdded",
            Self::ExampleUpdated { .. } => "ExampleUpdated",
            Self::ExampleRemoved { .. } => "ExampleRemoved",
            Self::WorkflowPublished { .. } => "WorkflowPublished",
            Self::WorkflowArchived { .. } => "WorkflowArchived",
        };
        event_type.to_string()
    }

    fn event_version(&self) -> String {
        "1".to_string()
    }
}
