//! CQRS query handler for workflow event projection.
//!
//! The WorkflowQuery applies events to the WorkflowView projection and
//! broadcasts the matching directive notifications to subscribers.

use super::WorkflowAggregate;
use crate::domain::notification::DirectiveNotification;
use crate::domain::view::WorkflowView;
use async_trait::async_trait;
use cqrs_es::Query;
use std::sync::Arc;
use tokio::sync::{broadcast, watch, RwLock};

/// CQRS query handler that maintains the WorkflowView projection.
pub struct WorkflowQuery {
    /// In-memory projection of the workflow summary.
    pub projection: Arc<RwLock<WorkflowView>>,
    /// Watch channel for snapshot updates (latest view).
    pub snapshot_tx: watch::Sender<WorkflowView>,
    /// Broadcast channel for directive notifications.
    pub notification_tx: broadcast::Sender<DirectiveNotification>,
}

impl WorkflowQuery {
    pub fn new(
        projection: Arc<RwLock<WorkflowView>>,
        snapshot_tx: watch::Sender<WorkflowView>,
        notification_tx: broadcast::Sender<DirectiveNotification>,
    ) -> Self {
        Self {
            projection,
            snapshot_tx,
            notification_tx,
        }
    }
}

#[async_trait]
impl Query<WorkflowAggregate> for WorkflowQuery {
    async fn dispatch(
        &self,
        aggregate_id: &str,
        events: &[cqrs_es::EventEnvelope<WorkflowAggregate>],
    ) {
        let mut view = self.projection.write().await;

        for event in events {
            view.apply_event(aggregate_id, &event.payload, event.sequence as u64);

            let Some(directive_id) = view.directive_id() else {
                continue;
            };
            if let Some(notification) = event.payload.notification(directive_id) {
                if let Err(e) = self.notification_tx.send(notification) {
                    tracing::debug!("No notification subscribers: {:?}", e);
                }
            }
        }

        let _ = self.snapshot_tx.send(view.clone());
    }
}

#[cfg(test)]
#[path = "../tests/query_tests.rs"]
mod tests;
