//! CQRS core types for event sourcing the workflow aggregate.
//!
//! This module contains the core CQRS types:
//! - **Commands**: Intent to change state
//! - **Events**: Facts that have happened
//! - **Aggregate**: Command validation and event application
//! - **Query**: Read-side projection and notification fan-out
//!
//! `handle` runs the domain operation on a copy of the workflow and records
//! its normalized result as an event. `apply` replays the same operation
//! with services pinned to the event's ids and timestamp, so the sequence
//! algorithm is the single source of truth for step positions.

pub mod commands;
pub mod events;
pub mod query;

pub use commands::WorkflowCommand;
pub use events::WorkflowEvent;
pub use query::WorkflowQuery;

use crate::domain::errors::DirectiveError;
use crate::domain::sequence::MoveOutcome;
use crate::domain::services::DirectiveServices;
use crate::domain::types::TimestampUtc;
use crate::domain::workflow::Workflow;
use async_trait::async_trait;
use cqrs_es::{Aggregate, DomainEvent};
use serde::{Deserialize, Serialize};

/// Workflow aggregate state.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub enum WorkflowState {
    /// Aggregate has not been drafted yet.
    #[default]
    Uninitialized,
    /// Aggregate holds a workflow (boxed for memory efficiency).
    Active(Box<Workflow>),
}

/// The workflow aggregate.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WorkflowAggregate {
    pub state: WorkflowState,
}

impl WorkflowAggregate {
    /// The workflow, once drafted.
    pub fn workflow(&self) -> Option<&Workflow> {
        match &self.state {
            WorkflowState::Active(workflow) => Some(workflow),
            WorkflowState::Uninitialized => None,
        }
    }
}

#[async_trait]
impl Aggregate for WorkflowAggregate {
    type Command = WorkflowCommand;
    type Event = WorkflowEvent;
    type Error = DirectiveError;
    type Services = DirectiveServices;

    fn aggregate_type() -> String {
        "workflow".to_string()
    }

    async fn handle(
        &self,
        command: Self::Command,
        services: &Self::Services,
    ) -> Result<Vec<Self::Event>, Self::Error> {
        match (&self.state, command) {
            // DraftWorkflow - only valid on uninitialized aggregate
            (
                WorkflowState::Uninitialized,
                WorkflowCommand::DraftWorkflow {
                    id,
                    name,
                    description,
                },
            ) => {
                let workflow = Workflow::draft(id, &name, &description, services)?;
                Ok(vec![WorkflowEvent::WorkflowDrafted {
                    id: workflow.id().clone(),
                    name: workflow.name().to_string(),
                    description: workflow.description().to_string(),
                    drafted_at: workflow.created_at(),
                }])
            }

            (WorkflowState::Uninitialized, _cmd) => Err(DirectiveError::NotInitialized),

            // Everything else runs against a scratch copy; the copy is
            // discarded and the event is what gets committed.
            (WorkflowState::Active(workflow), cmd) => {
                let mut scratch = (**workflow).clone();
                decide(&mut scratch, cmd, services)
            }
        }
    }

    fn apply(&mut self, event: Self::Event) {
        match (&mut self.state, event) {
            // WorkflowDrafted initializes the aggregate
            (
                WorkflowState::Uninitialized,
                WorkflowEvent::WorkflowDrafted {
                    id,
                    name,
                    description,
                    drafted_at,
                },
            ) => match Workflow::draft(id, &name, &description, &pinned(drafted_at)) {
                Ok(workflow) => self.state = WorkflowState::Active(Box::new(workflow)),
                Err(e) => tracing::warn!("Failed to replay WorkflowDrafted: {}", e),
            },

            (WorkflowState::Active(workflow), event) => {
                if let Err(e) = replay(workflow, &event) {
                    tracing::warn!("Failed to replay {} event: {}", event.event_type(), e);
                }
                // Replay is not a new mutation; nothing to notify.
                workflow.drain_events();
            }

            (WorkflowState::Uninitialized, event) => {
                tracing::warn!(
                    "Ignoring {} event on uninitialized workflow",
                    event.event_type()
                );
            }
        }
    }
}

/// Runs one command against the workflow and describes the outcome as events.
fn decide(
    workflow: &mut Workflow,
    command: WorkflowCommand,
    services: &DirectiveServices,
) -> Result<Vec<WorkflowEvent>, DirectiveError> {
    let event = match command {
        WorkflowCommand::DraftWorkflow { .. } => {
            return Err(DirectiveError::AlreadyDrafted {
                id: workflow.id().to_string(),
            });
        }

        WorkflowCommand::UpdateDetails { name, description } => {
            workflow.update_details(&name, &description, services)?;
            WorkflowEvent::DetailsUpdated {
                name: workflow.name().to_string(),
                description: workflow.description().to_string(),
                updated_at: workflow.updated_at(),
            }
        }

        WorkflowCommand::UpdateContent { content } => {
            workflow.update_content(content.as_deref(), services)?;
            WorkflowEvent::ContentUpdated {
                content: workflow.content().map(str::to_string),
                updated_at: workflow.updated_at(),
            }
        }

        WorkflowCommand::AddStep { content, after } => {
            let step = workflow.add_step(&content, after.as_ref(), services)?;
            WorkflowEvent::StepAdded {
                step_id: step.id().clone(),
                content: step.content().to_string(),
                after,
                added_at: step.created_at(),
            }
        }

        WorkflowCommand::UpdateStep { step_id, content } => {
            let step = workflow.update_step(&step_id, &content, services)?;
            WorkflowEvent::StepUpdated {
                step_id,
                content: step.content().to_string(),
                updated_at: step.updated_at(),
            }
        }

        WorkflowCommand::RemoveStep { step_id } => {
            workflow.remove_step(&step_id, services)?;
            WorkflowEvent::StepRemoved {
                step_id,
                removed_at: workflow.updated_at(),
            }
        }

        WorkflowCommand::MoveStepAfter { step_id, after } => {
            match workflow.move_step_after(&step_id, after.as_ref(), services)? {
                MoveOutcome::Unchanged => return Ok(Vec::new()),
                MoveOutcome::Moved { .. } => WorkflowEvent::StepMoved {
                    step_id,
                    after,
                    moved_at: workflow.updated_at(),
                },
            }
        }

        WorkflowCommand::AddExample { fields } => {
            let example = workflow.add_example(&fields, services)?;
            WorkflowEvent::ExampleAdded {
                example_id: example.id().clone(),
                fields: example.fields().clone(),
                added_at: example.created_at(),
            }
        }

        WorkflowCommand::UpdateExample { example_id, fields } => {
            let example = workflow.update_example(&example_id, &fields, services)?;
            WorkflowEvent::ExampleUpdated {
                example_id,
                fields: example.fields().clone(),
                updated_at: example.updated_at(),
            }
        }

        WorkflowCommand::RemoveExample { example_id } => {
            workflow.remove_example(&example_id, services)?;
            WorkflowEvent::ExampleRemoved {
                example_id,
                removed_at: workflow.updated_at(),
            }
        }

        WorkflowCommand::Publish => {
            workflow.publish(services)?;
            WorkflowEvent::WorkflowPublished {
                published_at: workflow.updated_at(),
            }
        }

        WorkflowCommand::Archive => {
            workflow.archive(services)?;
            WorkflowEvent::WorkflowArchived {
                archived_at: workflow.updated_at(),
            }
        }
    };

    Ok(vec![event])
}

/// Re-applies a recorded event to an active workflow.
fn replay(workflow: &mut Workflow, event: &WorkflowEvent) -> Result<(), DirectiveError> {
    match event {
        WorkflowEvent::WorkflowDrafted { id, .. } => Err(DirectiveError::AlreadyDrafted {
            id: id.to_string(),
        }),
        WorkflowEvent::DetailsUpdated {
            name,
            description,
            updated_at,
        } => workflow.update_details(name, description, &pinned(*updated_at)),
        WorkflowEvent::ContentUpdated {
            content,
            updated_at,
        } => workflow.update_content(content.as_deref(), &pinned(*updated_at)),
        WorkflowEvent::StepAdded {
            step_id,
            content,
            after,
            added_at,
        } => {
            let services = DirectiveServices::replay(*added_at, [step_id.as_str()]);
            workflow
                .add_step(content, after.as_ref(), &services)
                .map(|_| ())
        }
        WorkflowEvent::StepUpdated {
            step_id,
            content,
            updated_at,
        } => workflow
            .update_step(step_id, content, &pinned(*updated_at))
            .map(|_| ()),
        WorkflowEvent::StepRemoved {
            step_id,
            removed_at,
        } => workflow
            .remove_step(step_id, &pinned(*removed_at))
            .map(|_| ()),
        WorkflowEvent::StepMoved {
            step_id,
            after,
            moved_at,
        } => workflow
            .move_step_after(step_id, after.as_ref(), &pinned(*moved_at))
            .map(|_| ()),
        WorkflowEvent::ExampleAdded {
            example_id,
            fields,
            added_at,
        } => {
            let services = DirectiveServices::replay(*added_at, [example_id.as_str()]);
            workflow.add_example(fields, &services).map(|_| ())
        }
        WorkflowEvent::ExampleUpdated {
            example_id,
            fields,
            updated_at,
        } => workflow
            .update_example(example_id, fields, &pinned(*updated_at))
            .map(|_| ()),
        WorkflowEvent::ExampleRemoved {
            example_id,
            removed_at,
        } => workflow
            .remove_example(example_id, &pinned(*removed_at))
            .map(|_| ()),
        WorkflowEvent::WorkflowPublished { published_at } => {
            workflow.publish(&pinned(*published_at))
        }
        WorkflowEvent::WorkflowArchived { archived_at } => workflow.archive(&pinned(*archived_at)),
    }
}

/// Replay services that only need a fixed clock.
fn pinned(at: TimestampUtc) -> DirectiveServices {
    DirectiveServices::replay(at, std::iter::empty::<String>())
}

#[cfg(test)]
#[path = "../tests/aggregate_tests.rs"]
mod tests;
