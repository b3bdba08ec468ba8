//! Workflow aggregate root.
//!
//! A workflow composes the directive lifecycle, a dense step sequence and an
//! unordered example collection. All mutation goes through the methods here;
//! each successful call re-stamps `updated_at` once and records exactly one
//! [`DirectiveNotification`], however many steps shifted underneath.

use crate::domain::errors::DirectiveError;
use crate::domain::example::{Example, ExampleFields};
use crate::domain::lifecycle::{DirectiveLifecycle, DirectiveState};
use crate::domain::notification::{DirectiveNotification, NotificationKind};
use crate::domain::sequence::{MoveOutcome, StepSequence};
use crate::domain::services::DirectiveServices;
use crate::domain::step::OrderedStep;
use crate::domain::types::{
    optional_text, required_text, DirectiveId, ExampleId, StepId, StepPosition, TimestampUtc,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    id: DirectiveId,
    #[serde(rename = "state")]
    lifecycle: DirectiveLifecycle,
    name: String,
    description: String,
    #[serde(default)]
    content: Option<String>,
    created_at: TimestampUtc,
    updated_at: TimestampUtc,
    #[serde(default)]
    steps: StepSequence,
    #[serde(default)]
    examples: Vec<Example>,
    #[serde(skip)]
    pending: Vec<DirectiveNotification>,
}

impl Workflow {
    /// Creates a draft workflow with no steps, examples or content.
    pub fn draft(
        id: DirectiveId,
        name: &str,
        description: &str,
        services: &DirectiveServices,
    ) -> Result<Self, DirectiveError> {
        let limits = &services.limits;
        let name = required_text("name", name, limits.name_max)?;
        let description = required_text("description", description, limits.description_max)?;
        let now = services.now();

        Ok(Self {
            id,
            lifecycle: DirectiveLifecycle::new(),
            name,
            description,
            content: None,
            created_at: now,
            updated_at: now,
            steps: StepSequence::new(),
            examples: Vec::new(),
            pending: Vec::new(),
        })
    }

    // ========== Read access ==========

    pub fn id(&self) -> &DirectiveId {
        &self.id
    }

    pub fn state(&self) -> DirectiveState {
        self.lifecycle.state()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn created_at(&self) -> TimestampUtc {
        self.created_at
    }

    pub fn updated_at(&self) -> TimestampUtc {
        self.updated_at
    }

    /// Steps in ascending position order.
    pub fn steps(&self) -> &StepSequence {
        &self.steps
    }

    pub fn step(&self, id: &StepId) -> Option<&OrderedStep> {
        self.steps.get(id)
    }

    pub fn step_at(&self, position: StepPosition) -> Option<&OrderedStep> {
        self.steps.at(position)
    }

    pub fn examples(&self) -> &[Example] {
        &self.examples
    }

    pub fn example(&self, id: &ExampleId) -> Option<&Example> {
        self.examples.iter().find(|e| e.id() == id)
    }

    /// Notifications recorded since the last drain.
    pub fn pending_events(&self) -> &[DirectiveNotification] {
        &self.pending
    }

    /// Takes the recorded notifications, leaving the buffer empty.
    pub fn drain_events(&mut self) -> Vec<DirectiveNotification> {
        std::mem::take(&mut self.pending)
    }

    // ========== Lifecycle ==========

    pub fn publish(&mut self, services: &DirectiveServices) -> Result<(), DirectiveError> {
        self.lifecycle.publish()?;
        self.touch(NotificationKind::Published, services.now());
        Ok(())
    }

    pub fn archive(&mut self, services: &DirectiveServices) -> Result<(), DirectiveError> {
        self.lifecycle.archive()?;
        self.touch(NotificationKind::Archived, services.now());
        Ok(())
    }

    // ========== Metadata and content ==========

    pub fn update_details(
        &mut self,
        name: &str,
        description: &str,
        services: &DirectiveServices,
    ) -> Result<(), DirectiveError> {
        self.assert_mutable()?;
        let limits = &services.limits;
        let name = required_text("name", name, limits.name_max)?;
        let description = required_text("description", description, limits.description_max)?;

        self.name = name;
        self.description = description;
        self.touch(NotificationKind::Updated, services.now());
        Ok(())
    }

    /// Replaces the free-text body. Blank text clears it.
    pub fn update_content(
        &mut self,
        content: Option<&str>,
        services: &DirectiveServices,
    ) -> Result<(), DirectiveError> {
        self.assert_mutable()?;
        let content = optional_text("content", content, services.limits.content_max)?;

        self.content = content;
        self.touch(NotificationKind::Updated, services.now());
        Ok(())
    }

    // ========== Steps ==========

    /// Inserts a step after `after`, or at the front when `after` is `None`.
    pub fn add_step(
        &mut self,
        content: &str,
        after: Option<&StepId>,
        services: &DirectiveServices,
    ) -> Result<OrderedStep, DirectiveError> {
        self.assert_mutable()?;
        let content = required_text("step content", content, services.limits.step_max)?;
        let id = StepId(services.next_id());
        let now = services.now();

        let step = self.steps.insert(id, content, after, now)?;
        self.touch(NotificationKind::Updated, now);
        Ok(step)
    }

    pub fn update_step(
        &mut self,
        step_id: &StepId,
        content: &str,
        services: &DirectiveServices,
    ) -> Result<OrderedStep, DirectiveError> {
        self.assert_mutable()?;
        let content = required_text("step content", content, services.limits.step_max)?;
        let now = services.now();

        let step = self.steps.replace_content(step_id, content, now)?;
        self.touch(NotificationKind::Updated, now);
        Ok(step)
    }

    pub fn remove_step(
        &mut self,
        step_id: &StepId,
        services: &DirectiveServices,
    ) -> Result<OrderedStep, DirectiveError> {
        self.assert_mutable()?;
        let now = services.now();

        let removed = self.steps.remove(step_id, now)?;
        self.touch(NotificationKind::Updated, now);
        Ok(removed)
    }

    /// Moves a step right after `after` (or to the front). Moving a step
    /// after itself or into its current slot changes nothing and records no
    /// notification.
    pub fn move_step_after(
        &mut self,
        step_id: &StepId,
        after: Option<&StepId>,
        services: &DirectiveServices,
    ) -> Result<MoveOutcome, DirectiveError> {
        self.assert_mutable()?;
        let now = services.now();

        let outcome = self.steps.move_after(step_id, after, now)?;
        if let MoveOutcome::Moved { .. } = outcome {
            self.touch(NotificationKind::Updated, now);
        }
        Ok(outcome)
    }

    // ========== Examples ==========

    pub fn add_example(
        &mut self,
        fields: &ExampleFields,
        services: &DirectiveServices,
    ) -> Result<Example, DirectiveError> {
        self.assert_mutable()?;
        let fields = fields.normalized(&services.limits)?;
        let id = ExampleId(services.next_id());
        if self.example(&id).is_some() {
            return Err(DirectiveError::validation(
                "example id",
                format!("'{}' is already used in this workflow", id),
            ));
        }
        let now = services.now();

        let example = Example::new(id, fields, now);
        self.examples.push(example.clone());
        self.touch(NotificationKind::Updated, now);
        Ok(example)
    }

    pub fn update_example(
        &mut self,
        example_id: &ExampleId,
        fields: &ExampleFields,
        services: &DirectiveServices,
    ) -> Result<Example, DirectiveError> {
        self.assert_mutable()?;
        let fields = fields.normalized(&services.limits)?;
        let index = self.example_index(example_id)?;
        let now = services.now();

        self.examples[index].replace_fields(fields, now);
        let example = self.examples[index].clone();
        self.touch(NotificationKind::Updated, now);
        Ok(example)
    }

    pub fn remove_example(
        &mut self,
        example_id: &ExampleId,
        services: &DirectiveServices,
    ) -> Result<Example, DirectiveError> {
        self.assert_mutable()?;
        let index = self.example_index(example_id)?;

        let removed = self.examples.remove(index);
        self.touch(NotificationKind::Updated, services.now());
        Ok(removed)
    }

    // ========== Internals ==========

    fn assert_mutable(&self) -> Result<(), DirectiveError> {
        self.lifecycle.assert_mutable(self.id.as_str())
    }

    fn example_index(&self, id: &ExampleId) -> Result<usize, DirectiveError> {
        self.examples
            .iter()
            .position(|e| e.id() == id)
            .ok_or_else(|| DirectiveError::ForeignExampleReference {
                example_id: id.to_string(),
            })
    }

    /// Re-stamps the workflow and records the single notification for this call.
    fn touch(&mut self, kind: NotificationKind, at: TimestampUtc) {
        self.updated_at = at;
        self.pending
            .push(DirectiveNotification::new(kind, self.id.clone(), at));
    }
}

#[cfg(test)]
#[path = "tests/workflow_tests.rs"]
mod tests;
