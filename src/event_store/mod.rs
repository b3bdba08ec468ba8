//! File-based event store for directive event sourcing.
//!
//! This module provides a JSONL-based event store with per-directive
//! snapshots for the CQRS/ES workflow aggregate.

pub mod file_store;

pub use file_store::{FileAggregateContext, FileEventStore, StoredEvent, StoredSnapshot};
