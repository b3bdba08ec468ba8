//! Domain notifications recorded by directive aggregates.
//!
//! Each successful top-level mutation records exactly one notification.
//! Callers drain them after the call and forward them to whatever sink they
//! use (event bus, audit log).

use crate::domain::types::{DirectiveId, TimestampUtc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Updated,
    Published,
    Archived,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectiveNotification {
    pub kind: NotificationKind,
    pub directive_id: DirectiveId,
    pub occurred_at: TimestampUtc,
}

impl DirectiveNotification {
    pub fn new(kind: NotificationKind, directive_id: DirectiveId, occurred_at: TimestampUtc) -> Self {
        Self {
            kind,
            directive_id,
            occurred_at,
        }
    }
}
