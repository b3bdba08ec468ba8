//! Domain model for event-sourced directive authoring.
//!
//! A directive is a named, versionable unit of instruction content. The
//! workflow directive adds an ordered list of steps and a set of worked
//! examples on top of the shared Draft -> Published -> Archived lifecycle.
//!
//! # Architecture
//!
//! - **Lifecycle** (`lifecycle.rs`): State machine gating mutation
//! - **Sequence** (`sequence.rs`): Dense 1-based step ordering
//! - **Workflow** (`workflow.rs`): Aggregate root composing the above
//! - **CQRS** (`cqrs/`): Commands, events, aggregate and query for the event log
//! - **View** (`view.rs`): Summary projection for listings
//!
//! # Usage
//!
//! ```ignore
//! use crate::domain::{DirectiveServices, Workflow};
//!
//! let services = DirectiveServices::default();
//! let mut wf = Workflow::draft(id, "Release", "How we ship", &services)?;
//! let first = wf.add_step("Tag the commit", None, &services)?;
//! wf.add_step("Publish notes", Some(first.id()), &services)?;
//! for notification in wf.drain_events() {
//!     bus.send(notification);
//! }
//! ```

pub mod cqrs;
pub mod errors;
pub mod example;
pub mod lifecycle;
pub mod notification;
pub mod sequence;
pub mod services;
pub mod step;
pub mod types;
pub mod view;
pub mod workflow;

// Re-export CQRS types
pub use cqrs::*;

pub use errors::DirectiveError;
pub use example::{Example, ExampleFields};
pub use lifecycle::{DirectiveLifecycle, DirectiveState};
pub use notification::{DirectiveNotification, NotificationKind};
pub use sequence::{MoveOutcome, StepSequence};
pub use services::{Clock, DirectiveServices, IdGenerator};
pub use step::OrderedStep;
pub use types::{ContentLimits, DirectiveId, ExampleId, StepId, StepPosition, TimestampUtc};
pub use view::WorkflowView;
pub use workflow::Workflow;
