//! Dense, gapless ordering of the steps of one workflow.
//!
//! For N steps the positions are exactly {1..N}. Every operation computes the
//! complete next list from the current one and swaps it in at the end, so a
//! failed operation never leaves a half-shifted sequence behind.

use crate::domain::errors::DirectiveError;
use crate::domain::step::OrderedStep;
use crate::domain::types::{StepId, StepPosition, TimestampUtc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Result of a move request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved {
        from: StepPosition,
        to: StepPosition,
    },
    /// The step already sits at the requested slot; nothing was touched.
    Unchanged,
}

/// Ordered steps of a workflow, always sorted by ascending position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<OrderedStep>", into = "Vec<OrderedStep>")]
pub struct StepSequence {
    steps: Vec<OrderedStep>,
}

impl StepSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a sequence from persisted steps, in any order.
    ///
    /// Fails with `InconsistentSequence` unless positions are exactly 1..N
    /// and ids are unique.
    pub fn from_steps(mut steps: Vec<OrderedStep>) -> Result<Self, DirectiveError> {
        steps.sort_by_key(OrderedStep::position);
        check_dense(&steps)?;

        let mut seen = HashSet::with_capacity(steps.len());
        for step in &steps {
            if !seen.insert(step.id()) {
                return Err(DirectiveError::InconsistentSequence {
                    message: format!("step id '{}' appears twice", step.id()),
                });
            }
        }

        Ok(Self { steps })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Steps in rendering order (ascending position).
    pub fn iter(&self) -> std::slice::Iter<'_, OrderedStep> {
        self.steps.iter()
    }

    pub fn as_slice(&self) -> &[OrderedStep] {
        &self.steps
    }

    pub fn get(&self, id: &StepId) -> Option<&OrderedStep> {
        self.steps.iter().find(|s| s.id() == id)
    }

    pub fn contains(&self, id: &StepId) -> bool {
        self.get(id).is_some()
    }

    /// Step at a 1-based position.
    pub fn at(&self, position: StepPosition) -> Option<&OrderedStep> {
        let index = usize::try_from(position.get()).ok()?.checked_sub(1)?;
        self.steps.get(index)
    }

    fn position_of(&self, id: &StepId) -> Result<StepPosition, DirectiveError> {
        self.get(id)
            .map(OrderedStep::position)
            .ok_or_else(|| DirectiveError::ForeignStepReference {
                step_id: id.to_string(),
            })
    }

    /// Inserts a new step right after `after`, or at position 1 when `after`
    /// is `None`. Every step at or beyond the target slot moves up by one.
    pub(crate) fn insert(
        &mut self,
        id: StepId,
        content: String,
        after: Option<&StepId>,
        at: TimestampUtc,
    ) -> Result<OrderedStep, DirectiveError> {
        let target = match after {
            Some(after) => self.position_of(after)?.next(),
            None => StepPosition::first(),
        };
        if self.contains(&id) {
            return Err(DirectiveError::validation(
                "step id",
                format!("'{}' is already used in this workflow", id),
            ));
        }

        let step = OrderedStep::new(id, content, target, at);
        let mut next: Vec<OrderedStep> = self
            .steps
            .iter()
            .map(|s| {
                if s.position() >= target {
                    s.at_position(s.position().next(), at)
                } else {
                    s.clone()
                }
            })
            .collect();
        next.push(step.clone());

        self.commit(next);
        Ok(step)
    }

    /// Removes a step and closes the gap it leaves behind.
    pub(crate) fn remove(
        &mut self,
        id: &StepId,
        at: TimestampUtc,
    ) -> Result<OrderedStep, DirectiveError> {
        let removed_position = self.position_of(id)?;

        let mut removed = None;
        let mut next = Vec::with_capacity(self.steps.len().saturating_sub(1));
        for s in &self.steps {
            if s.id() == id {
                removed = Some(s.clone());
            } else if s.position() > removed_position {
                next.push(s.at_position(s.position().prev(), at));
            } else {
                next.push(s.clone());
            }
        }

        self.commit(next);
        removed.ok_or_else(|| DirectiveError::ForeignStepReference {
            step_id: id.to_string(),
        })
    }

    /// Moves `id` to the slot right after `after` (or to the front).
    ///
    /// A move rotates the sub-range between the old and new slots: moving
    /// forward pulls the steps in `(current, target]` down by one, moving
    /// backward pushes the steps in `[target, current)` up by one.
    pub(crate) fn move_after(
        &mut self,
        id: &StepId,
        after: Option<&StepId>,
        at: TimestampUtc,
    ) -> Result<MoveOutcome, DirectiveError> {
        let current = self.position_of(id)?;
        let after_position = match after {
            Some(after) => Some(self.position_of(after)?),
            None => None,
        };
        if after == Some(id) {
            return Ok(MoveOutcome::Unchanged);
        }

        let mut target = after_position.map_or(StepPosition::first(), |p| p.next());
        if current == target {
            return Ok(MoveOutcome::Unchanged);
        }
        // The target slot is counted after the step has left its old slot.
        if current < target {
            target = target.prev();
        }
        if current == target {
            return Ok(MoveOutcome::Unchanged);
        }

        let forward = current < target;
        let next: Vec<OrderedStep> = self
            .steps
            .iter()
            .map(|s| {
                let p = s.position();
                if s.id() == id {
                    s.at_position(target, at)
                } else if forward && p > current && p <= target {
                    s.at_position(p.prev(), at)
                } else if !forward && p >= target && p < current {
                    s.at_position(p.next(), at)
                } else {
                    s.clone()
                }
            })
            .collect();

        self.commit(next);
        Ok(MoveOutcome::Moved {
            from: current,
            to: target,
        })
    }

    /// Replaces the text of a step; positions are untouched.
    pub(crate) fn replace_content(
        &mut self,
        id: &StepId,
        content: String,
        at: TimestampUtc,
    ) -> Result<OrderedStep, DirectiveError> {
        let index = self
            .steps
            .iter()
            .position(|s| s.id() == id)
            .ok_or_else(|| DirectiveError::ForeignStepReference {
                step_id: id.to_string(),
            })?;
        let updated = self.steps[index].with_content(content, at);
        self.steps[index] = updated.clone();
        Ok(updated)
    }

    fn commit(&mut self, mut next: Vec<OrderedStep>) {
        next.sort_by_key(OrderedStep::position);
        debug_assert!(check_dense(&next).is_ok(), "step positions lost density");
        self.steps = next;
    }
}

/// Checks that already-sorted steps carry positions exactly 1..N.
fn check_dense(sorted: &[OrderedStep]) -> Result<(), DirectiveError> {
    for (index, step) in sorted.iter().enumerate() {
        let expected = index as u64 + 1;
        if u64::from(step.position().get()) != expected {
            return Err(DirectiveError::InconsistentSequence {
                message: format!(
                    "expected position {} but step '{}' has position {}",
                    expected,
                    step.id(),
                    step.position()
                ),
            });
        }
    }
    Ok(())
}

impl TryFrom<Vec<OrderedStep>> for StepSequence {
    type Error = DirectiveError;

    fn try_from(steps: Vec<OrderedStep>) -> Result<Self, Self::Error> {
        Self::from_steps(steps)
    }
}

impl From<StepSequence> for Vec<OrderedStep> {
    fn from(sequence: StepSequence) -> Self {
        sequence.steps
    }
}

impl<'a> IntoIterator for &'a StepSequence {
    type Item = &'a OrderedStep;
    type IntoIter = std::slice::Iter<'a, OrderedStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

#[cfg(test)]
#[path = "tests/sequence_tests.rs"]
mod tests;
