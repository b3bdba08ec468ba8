//! A single ordered step of a workflow.

use crate::domain::types::{StepId, StepPosition, TimestampUtc};
use serde::{Deserialize, Serialize};

/// Step entity owned by exactly one workflow.
///
/// Positions are assigned only by [`StepSequence`](crate::domain::sequence::StepSequence),
/// so a step never exists with a position inconsistent with its siblings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedStep {
    id: StepId,
    content: String,
    position: StepPosition,
    created_at: TimestampUtc,
    updated_at: TimestampUtc,
}

impl OrderedStep {
    pub(crate) fn new(
        id: StepId,
        content: String,
        position: StepPosition,
        at: TimestampUtc,
    ) -> Self {
        Self {
            id,
            content,
            position,
            created_at: at,
            updated_at: at,
        }
    }

    pub fn id(&self) -> &StepId {
        &self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn position(&self) -> StepPosition {
        self.position
    }

    pub fn created_at(&self) -> TimestampUtc {
        self.created_at
    }

    pub fn updated_at(&self) -> TimestampUtc {
        self.updated_at
    }

    /// Copy of this step at `position`; untouched if the position is unchanged.
    pub(crate) fn at_position(&self, position: StepPosition, at: TimestampUtc) -> Self {
        if position == self.position {
            return self.clone();
        }
        Self {
            position,
            updated_at: at,
            ..self.clone()
        }
    }

    pub(crate) fn with_content(&self, content: String, at: TimestampUtc) -> Self {
        Self {
            content,
            updated_at: at,
            ..self.clone()
        }
    }
}
