//! External services for directive aggregates.
//!
//! Services provide time, identity and validation policy to the aggregate
//! without coupling it to specific implementations.

use crate::domain::types::{ContentLimits, TimestampUtc};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Source of timestamps.
pub trait Clock: std::fmt::Debug + Send + Sync {
    fn now(&self) -> TimestampUtc;
}

/// Source of opaque unique ids for steps and examples.
pub trait IdGenerator: std::fmt::Debug + Send + Sync {
    fn next_id(&self) -> String;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> TimestampUtc {
        TimestampUtc::now()
    }
}

/// Clock that returns whatever it was last set to.
#[derive(Debug)]
pub struct ManualClock {
    current: Mutex<TimestampUtc>,
}

impl ManualClock {
    pub fn new(at: TimestampUtc) -> Self {
        Self {
            current: Mutex::new(at),
        }
    }

    pub fn set(&self, at: TimestampUtc) {
        if let Ok(mut current) = self.current.lock() {
            *current = at;
        }
    }

    /// Moves the clock forward by `seconds`.
    pub fn advance(&self, seconds: i64) {
        if let Ok(mut current) = self.current.lock() {
            current.0 += chrono::Duration::seconds(seconds);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> TimestampUtc {
        match self.current.lock() {
            Ok(current) => *current,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// Random v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// `<prefix>-1`, `<prefix>-2`, ... in call order.
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    counter: AtomicU64,
}

impl SequentialIds {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            counter: AtomicU64::new(0),
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{}-{}", self.prefix, n)
    }
}

/// Hands out a recorded queue of ids, then falls back to UUIDs.
#[derive(Debug, Default)]
pub struct ScriptedIds {
    queue: Mutex<VecDeque<String>>,
}

impl ScriptedIds {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            queue: Mutex::new(ids.into_iter().map(Into::into).collect()),
        }
    }
}

impl IdGenerator for ScriptedIds {
    fn next_id(&self) -> String {
        let scripted = match self.queue.lock() {
            Ok(mut queue) => queue.pop_front(),
            Err(_) => None,
        };
        scripted.unwrap_or_else(|| UuidIds.next_id())
    }
}

/// Services injected into directive operations.
#[derive(Debug, Clone)]
pub struct DirectiveServices {
    pub clock: Arc<dyn Clock>,
    pub ids: Arc<dyn IdGenerator>,
    pub limits: ContentLimits,
}

impl DirectiveServices {
    pub fn new(clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>, limits: ContentLimits) -> Self {
        Self { clock, ids, limits }
    }

    /// Services that reproduce a recorded operation exactly: fixed time,
    /// recorded ids, no length limits.
    pub fn replay<I, S>(at: TimestampUtc, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            clock: Arc::new(ManualClock::new(at)),
            ids: Arc::new(ScriptedIds::new(ids)),
            limits: ContentLimits::unbounded(),
        }
    }

    pub fn with_limits(mut self, limits: ContentLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn now(&self) -> TimestampUtc {
        self.clock.now()
    }

    pub fn next_id(&self) -> String {
        self.ids.next_id()
    }
}

impl Default for DirectiveServices {
    fn default() -> Self {
        Self::new(
            Arc::new(SystemClock),
            Arc::new(UuidIds),
            ContentLimits::default(),
        )
    }
}
