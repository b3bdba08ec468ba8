//! Application service for authoring workflows against the event store.
//!
//! Every mutation goes through the CQRS framework as one command: the
//! aggregate is loaded, the command handled, the resulting event committed
//! and dispatched to the query, which projects it and broadcasts the
//! directive notification. Reads load the aggregate straight from the store.

use crate::config::DirectivesConfig;
use crate::domain::{
    DirectiveError, DirectiveId, DirectiveNotification, DirectiveServices, Example, ExampleFields,
    ExampleId, OrderedStep, StepId, StepPosition, Workflow, WorkflowCommand,
    WorkflowQuery, WorkflowState, WorkflowView,
};
use crate::event_store::FileEventStore;
use crate::paths::DirectivePaths;
use crate::structured_logger::StructuredLogger;
use anyhow::{Context, Result};
use cqrs_es::{AggregateError, CqrsFramework, EventStore};
use std::sync::Arc;
use tokio::sync::{broadcast, watch, RwLock};

/// Result of a committed command.
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    /// Summary projection after the command.
    pub view: WorkflowView,
    /// Notifications broadcast for the committed events (empty for no-ops).
    pub notifications: Vec<DirectiveNotification>,
}

pub struct AuthoringService {
    store: FileEventStore,
    services: DirectiveServices,
    logger: Option<Arc<StructuredLogger>>,
}

impl AuthoringService {
    pub fn new(store: FileEventStore, services: DirectiveServices) -> Self {
        Self {
            store,
            services,
            logger: None,
        }
    }

    /// Service over the store at `paths`, with limits and snapshot cadence
    /// from `config`.
    pub fn open(paths: &DirectivePaths, config: &DirectivesConfig) -> Result<Self> {
        paths.ensure()?;
        let store = FileEventStore::new(
            paths.event_log(),
            paths.snapshots_dir(),
            config.snapshot_every,
        );
        let services = DirectiveServices::default().with_limits(config.limits);
        Ok(Self::new(store, services))
    }

    pub fn with_logger(mut self, logger: Arc<StructuredLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn store(&self) -> &FileEventStore {
        &self.store
    }

    /// Runs one command against a directive and commits its events.
    pub async fn execute(
        &self,
        id: &DirectiveId,
        command: WorkflowCommand,
    ) -> Result<CommandOutcome, DirectiveError> {
        if let Some(logger) = &self.logger {
            logger.log_command(id.as_str(), &command);
        }
        let command_name = command.name();

        let view = Arc::new(RwLock::new(self.view(id).await?));
        let (snapshot_tx, _snapshot_rx) = watch::channel(WorkflowView::default());
        let (notification_tx, mut notification_rx) = broadcast::channel(16);
        let query = WorkflowQuery::new(view.clone(), snapshot_tx, notification_tx);
        let cqrs = CqrsFramework::new(
            self.store.clone(),
            vec![Box::new(query)],
            self.services.clone(),
        );

        if let Err(err) = cqrs.execute(id.as_str(), command).await {
            let err = map_aggregate_error(err);
            tracing::debug!("{} on {} failed: {}", command_name, id, err);
            if let Some(logger) = &self.logger {
                logger.log_command_failed(id.as_str(), command_name, &err.to_string());
            }
            return Err(err);
        }

        let mut notifications = Vec::new();
        while let Ok(notification) = notification_rx.try_recv() {
            tracing::info!(
                "{:?} notification for {} at {}",
                notification.kind,
                notification.directive_id,
                notification.occurred_at
            );
            if let Some(logger) = &self.logger {
                logger.log_notification(&notification);
            }
            notifications.push(notification);
        }

        let view = view.read().await.clone();
        Ok(CommandOutcome {
            view,
            notifications,
        })
    }

    // ========== Reads ==========

    /// Loads a drafted workflow, replaying from the latest snapshot.
    pub async fn load(&self, id: &DirectiveId) -> Result<Workflow, DirectiveError> {
        let context = self
            .store
            .load_aggregate(id.as_str())
            .await
            .map_err(map_aggregate_error)?;
        match context.aggregate.state {
            WorkflowState::Active(workflow) => Ok(*workflow),
            WorkflowState::Uninitialized => Err(DirectiveError::NotInitialized),
        }
    }

    /// Summary projection of one directive, folded from its events.
    pub async fn view(&self, id: &DirectiveId) -> Result<WorkflowView, DirectiveError> {
        let events = self
            .store
            .load_events(id.as_str())
            .await
            .map_err(map_aggregate_error)?;
        let mut view = WorkflowView::default();
        for envelope in &events {
            view.apply_event(&envelope.aggregate_id, &envelope.payload, envelope.sequence as u64);
        }
        Ok(view)
    }

    /// Summaries of every directive in the store, oldest first.
    pub async fn list(&self) -> Result<Vec<WorkflowView>, DirectiveError> {
        let ids = self.store.aggregate_ids().map_err(map_aggregate_error)?;
        let mut views = Vec::with_capacity(ids.len());
        for id in ids {
            let id = DirectiveId::parse(&id)?;
            views.push(self.view(&id).await?);
        }
        Ok(views)
    }

    // ========== Workflow commands ==========

    /// Drafts a workflow. The id defaults to the kebab-cased name.
    pub async fn draft(
        &self,
        name: &str,
        description: &str,
        id: Option<&str>,
    ) -> Result<Workflow> {
        let id = match id {
            Some(id) => DirectiveId::parse(id)?,
            None => DirectiveId::from_name(name)?,
        };
        let command = WorkflowCommand::DraftWorkflow {
            id: id.clone(),
            name: name.to_string(),
            description: description.to_string(),
        };
        self.execute(&id, command)
            .await
            .with_context(|| format!("Failed to draft workflow '{}'", id))?;
        Ok(self.load(&id).await?)
    }

    pub async fn update_details(
        &self,
        id: &DirectiveId,
        name: &str,
        description: &str,
    ) -> Result<Workflow> {
        let command = WorkflowCommand::UpdateDetails {
            name: name.to_string(),
            description: description.to_string(),
        };
        self.run(id, command).await
    }

    pub async fn update_content(&self, id: &DirectiveId, content: Option<&str>) -> Result<Workflow> {
        let command = WorkflowCommand::UpdateContent {
            content: content.map(str::to_string),
        };
        self.run(id, command).await
    }

    pub async fn publish(&self, id: &DirectiveId) -> Result<Workflow> {
        self.run(id, WorkflowCommand::Publish).await
    }

    pub async fn archive(&self, id: &DirectiveId) -> Result<Workflow> {
        self.run(id, WorkflowCommand::Archive).await
    }

    // ========== Step commands ==========

    /// Adds a step after the referenced step (or at the front) and returns it.
    pub async fn add_step(
        &self,
        id: &DirectiveId,
        content: &str,
        after: Option<&str>,
    ) -> Result<OrderedStep> {
        let workflow = self.load(id).await?;
        let after = after
            .map(|reference| resolve_step(&workflow, reference))
            .transpose()?;
        let position = match &after {
            Some(after_id) => workflow
                .step(after_id)
                .map(|s| s.position().next())
                .unwrap_or_else(StepPosition::first),
            None => StepPosition::first(),
        };

        let command = WorkflowCommand::AddStep {
            content: content.to_string(),
            after,
        };
        let workflow = self.run(id, command).await?;

        // The new step always lands right after its anchor.
        workflow
            .step_at(position)
            .cloned()
            .with_context(|| format!("No step at position {} after insert", position))
    }

    pub async fn update_step(
        &self,
        id: &DirectiveId,
        reference: &str,
        content: &str,
    ) -> Result<Workflow> {
        let workflow = self.load(id).await?;
        let command = WorkflowCommand::UpdateStep {
            step_id: resolve_step(&workflow, reference)?,
            content: content.to_string(),
        };
        self.run(id, command).await
    }

    pub async fn remove_step(&self, id: &DirectiveId, reference: &str) -> Result<Workflow> {
        let workflow = self.load(id).await?;
        let command = WorkflowCommand::RemoveStep {
            step_id: resolve_step(&workflow, reference)?,
        };
        self.run(id, command).await
    }

    /// Moves the referenced step after `after` (or to the front).
    pub async fn move_step(
        &self,
        id: &DirectiveId,
        reference: &str,
        after: Option<&str>,
    ) -> Result<Workflow> {
        let workflow = self.load(id).await?;
        let command = WorkflowCommand::MoveStepAfter {
            step_id: resolve_step(&workflow, reference)?,
            after: after
                .map(|reference| resolve_step(&workflow, reference))
                .transpose()?,
        };
        self.run(id, command).await
    }

    // ========== Example commands ==========

    pub async fn add_example(&self, id: &DirectiveId, fields: ExampleFields) -> Result<Example> {
        let workflow = self.run(id, WorkflowCommand::AddExample { fields }).await?;
        workflow
            .examples()
            .last()
            .cloned()
            .context("Example missing after insert")
    }

    pub async fn update_example(
        &self,
        id: &DirectiveId,
        example_id: &str,
        fields: ExampleFields,
    ) -> Result<Workflow> {
        let command = WorkflowCommand::UpdateExample {
            example_id: ExampleId::from(example_id),
            fields,
        };
        self.run(id, command).await
    }

    pub async fn remove_example(&self, id: &DirectiveId, example_id: &str) -> Result<Workflow> {
        let command = WorkflowCommand::RemoveExample {
            example_id: ExampleId::from(example_id),
        };
        self.run(id, command).await
    }

    /// Executes and reloads, with the directive named in any error.
    async fn run(&self, id: &DirectiveId, command: WorkflowCommand) -> Result<Workflow> {
        let command_name = command.name();
        self.execute(id, command)
            .await
            .with_context(|| format!("{} failed for workflow '{}'", command_name, id))?;
        Ok(self.load(id).await?)
    }
}

/// Resolves a step reference: all digits is a 1-based position, anything
/// else is taken as a step id and left for the aggregate to check.
pub fn resolve_step(workflow: &Workflow, reference: &str) -> Result<StepId, DirectiveError> {
    let reference = reference.trim();
    if !reference.is_empty() && reference.chars().all(|c| c.is_ascii_digit()) {
        let position: u32 = reference.parse().map_err(|_| {
            DirectiveError::validation("step position", format!("'{}' is out of range", reference))
        })?;
        return workflow
            .step_at(StepPosition(position))
            .map(|step| step.id().clone())
            .ok_or_else(|| {
                DirectiveError::validation(
                    "step position",
                    format!(
                        "no step at position {} (workflow has {})",
                        position,
                        workflow.steps().len()
                    ),
                )
            });
    }
    Ok(StepId::from(reference))
}

/// Maps framework errors back to the domain error.
pub fn map_aggregate_error(err: AggregateError<DirectiveError>) -> DirectiveError {
    match err {
        AggregateError::UserError(err) => err,
        AggregateError::AggregateConflict => DirectiveError::ConcurrencyConflict {
            message: "workflow was modified concurrently".to_string(),
        },
        err => DirectiveError::StorageFailure {
            message: err.to_string(),
        },
    }
}

#[cfg(test)]
#[path = "tests/authoring_tests.rs"]
mod tests;
