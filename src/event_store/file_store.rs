//! File-based event store implementation.
//!
//! All directives share one JSONL log (one JSON object per line) with:
//! - Optimistic concurrency per aggregate via file locking
//! - Per-aggregate snapshots for faster loading
//! - Atomic snapshot writes via temp file + rename

use crate::domain::errors::DirectiveError;
use crate::domain::types::TimestampUtc;
use crate::domain::WorkflowAggregate;
use crate::domain::WorkflowEvent;
use async_trait::async_trait;
use cqrs_es::{
    Aggregate, AggregateContext, AggregateError, DomainEvent, EventEnvelope, EventStore,
};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

type StoreResult<T> = Result<T, AggregateError<DirectiveError>>;

/// A stored event record in the event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEvent {
    pub aggregate_id: String,
    pub sequence: u64,
    pub recorded_at: TimestampUtc,
    pub event_type: String,
    pub event_version: String,
    pub event: WorkflowEvent,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// A stored snapshot for faster aggregate loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSnapshot {
    pub aggregate_id: String,
    pub sequence: u64,
    pub snapshot_at: TimestampUtc,
    pub state: WorkflowAggregate,
}

/// File-based event store configuration.
#[derive(Debug, Clone)]
pub struct FileEventStore {
    /// Path to the shared JSONL event log.
    pub log_path: PathBuf,
    /// Directory holding one `<aggregate_id>.json` snapshot per directive.
    pub snapshot_dir: PathBuf,
    /// Snapshot after every N events of an aggregate (0 = disabled).
    pub snapshot_every: u64,
}

/// Aggregate context for file-based storage.
pub struct FileAggregateContext<A: Aggregate> {
    pub aggregate_id: String,
    pub aggregate: A,
    /// The current sequence number (last applied event).
    pub current_sequence: u64,
}

impl<A: Aggregate> AggregateContext<A> for FileAggregateContext<A> {
    fn aggregate(&self) -> &A {
        &self.aggregate
    }
}

impl FileEventStore {
    pub fn new(log_path: PathBuf, snapshot_dir: PathBuf, snapshot_every: u64) -> Self {
        Self {
            log_path,
            snapshot_dir,
            snapshot_every,
        }
    }

    pub fn snapshot_path(&self, aggregate_id: &str) -> PathBuf {
        self.snapshot_dir.join(format!("{}.json", aggregate_id))
    }

    /// Ids of every aggregate in the log, in order of first appearance.
    pub fn aggregate_ids(&self) -> StoreResult<Vec<String>> {
        let Some(records) = self.read_records()? else {
            return Ok(Vec::new());
        };

        let mut ids: Vec<String> = Vec::new();
        for record in records {
            if !ids.contains(&record.aggregate_id) {
                ids.push(record.aggregate_id);
            }
        }
        Ok(ids)
    }

    /// Every record in the log, or `None` when nothing has been written yet.
    fn read_records(&self) -> StoreResult<Option<Vec<StoredEvent>>> {
        let file = match File::open(&self.log_path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(unexpected(e)),
        };
        file.lock_shared().map_err(unexpected)?;

        let mut records = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(unexpected)?;
            if line.trim().is_empty() {
                continue;
            }
            let stored: StoredEvent = serde_json::from_str(&line)
                .map_err(|e| AggregateError::DeserializationError(Box::new(e)))?;
            records.push(stored);
        }
        Ok(Some(records))
    }
}

#[async_trait]
impl EventStore<WorkflowAggregate> for FileEventStore {
    type AC = FileAggregateContext<WorkflowAggregate>;

    async fn load_events(
        &self,
        aggregate_id: &str,
    ) -> StoreResult<Vec<EventEnvelope<WorkflowAggregate>>> {
        let Some(records) = self.read_records()? else {
            return Ok(Vec::new());
        };

        let mut envelopes = Vec::new();
        for stored in records {
            if stored.aggregate_id != aggregate_id {
                continue;
            }
            // Validate event type and version match
            if stored.event_type != stored.event.event_type()
                || stored.event_version != stored.event.event_version()
            {
                return Err(unexpected(std::io::Error::new(
                    ErrorKind::InvalidData,
                    "event version/type mismatch",
                )));
            }

            envelopes.push(EventEnvelope {
                aggregate_id: stored.aggregate_id,
                sequence: stored.sequence as usize,
                payload: stored.event,
                metadata: stored.metadata,
            });
        }

        Ok(envelopes)
    }

    async fn load_aggregate(&self, aggregate_id: &str) -> StoreResult<Self::AC> {
        let mut aggregate = WorkflowAggregate::default();
        let mut current_sequence = 0u64;

        if let Some(snapshot) = load_snapshot(&self.snapshot_path(aggregate_id))? {
            if snapshot.aggregate_id == aggregate_id {
                aggregate = snapshot.state;
                current_sequence = snapshot.sequence;
            }
        }

        // Apply events after snapshot
        let events = self.load_events(aggregate_id).await?;
        for event in events {
            let seq = event.sequence as u64;
            if seq > current_sequence {
                current_sequence = seq;
                aggregate.apply(event.payload);
            }
        }

        Ok(FileAggregateContext {
            aggregate_id: aggregate_id.to_string(),
            aggregate,
            current_sequence,
        })
    }

    async fn commit(
        &self,
        events: Vec<WorkflowEvent>,
        context: Self::AC,
        metadata: HashMap<String, String>,
    ) -> StoreResult<Vec<EventEnvelope<WorkflowAggregate>>> {
        if events.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(parent) = self.log_path.parent() {
            std::fs::create_dir_all(parent).map_err(unexpected)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.log_path)
            .map_err(unexpected)?;

        file.lock_exclusive().map_err(unexpected)?;

        let FileAggregateContext {
            aggregate_id,
            mut aggregate,
            current_sequence,
        } = context;

        // Another writer appended to this aggregate since it was loaded
        let last_sequence = read_last_sequence(&file, &aggregate_id)?;
        if last_sequence != current_sequence {
            return Err(AggregateError::AggregateConflict);
        }

        let mut sequence = current_sequence;
        let mut envelopes: Vec<EventEnvelope<WorkflowAggregate>> = Vec::new();

        for event in events {
            sequence += 1;

            let record = StoredEvent {
                aggregate_id: aggregate_id.clone(),
                sequence,
                recorded_at: TimestampUtc::now(),
                event_type: event.event_type(),
                event_version: event.event_version(),
                event: event.clone(),
                metadata: metadata.clone(),
            };

            let line = serde_json::to_string(&record).map_err(unexpected)?;
            writeln!(file, "{}", line).map_err(unexpected)?;

            envelopes.push(EventEnvelope {
                aggregate_id: aggregate_id.clone(),
                sequence: sequence as usize,
                payload: event,
                metadata: metadata.clone(),
            });
        }

        file.flush().map_err(unexpected)?;
        file.sync_all().map_err(unexpected)?;

        if should_snapshot(sequence, self.snapshot_every) {
            for envelope in &envelopes {
                aggregate.apply(envelope.payload.clone());
            }
            let snapshot = StoredSnapshot {
                aggregate_id: aggregate_id.clone(),
                sequence,
                snapshot_at: TimestampUtc::now(),
                state: aggregate,
            };
            save_snapshot(&self.snapshot_path(&aggregate_id), &snapshot)?;
            tracing::debug!("Saved snapshot for {} at sequence {}", aggregate_id, sequence);
        }

        Ok(envelopes)
    }
}

fn unexpected<E>(e: E) -> AggregateError<DirectiveError>
where
    E: std::error::Error + Send + Sync + 'static,
{
    AggregateError::UnexpectedError(Box::new(e))
}

fn load_snapshot(path: &Path) -> StoreResult<Option<StoredSnapshot>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(unexpected(e)),
    };

    let snapshot: StoredSnapshot = serde_json::from_str(&content)
        .map_err(|e| AggregateError::DeserializationError(Box::new(e)))?;

    Ok(Some(snapshot))
}

/// Save a snapshot to disk atomically.
fn save_snapshot(path: &Path, snapshot: &StoredSnapshot) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(unexpected)?;
    }

    let content = serde_json::to_string(snapshot).map_err(unexpected)?;

    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, content).map_err(unexpected)?;
    std::fs::rename(&tmp_path, path).map_err(unexpected)?;

    Ok(())
}

/// Read the last sequence number for an aggregate from the log file.
fn read_last_sequence(file: &File, aggregate_id: &str) -> StoreResult<u64> {
    let mut reader = BufReader::new(file.try_clone().map_err(unexpected)?);
    reader.seek(SeekFrom::Start(0)).map_err(unexpected)?;

    let mut last_sequence = 0u64;
    for line in reader.lines() {
        let line = line.map_err(unexpected)?;
        if line.trim().is_empty() {
            continue;
        }
        let stored: StoredEvent = serde_json::from_str(&line)
            .map_err(|e| AggregateError::DeserializationError(Box::new(e)))?;

        if stored.aggregate_id == aggregate_id {
            last_sequence = stored.sequence;
        }
    }

    Ok(last_sequence)
}

fn should_snapshot(sequence: u64, snapshot_every: u64) -> bool {
    if snapshot_every == 0 {
        return false;
    }
    sequence.is_multiple_of(snapshot_every)
}

#[cfg(test)]
#[path = "tests/file_store_tests.rs"]
mod tests;
