// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Pending event buffer shared between the bridge task and the collector.
//!
//! The bridge appends one event at a time; the collector swaps the whole
//! vector out for an empty one. The lock is held for a single push or a
//! single swap, never while points are built or emitted.

use crate::item::Item;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

/// A controller value that matched a registry item.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Controller UUID.
    pub source_id: String,
    /// Reported value.
    pub value: f64,
    /// Receipt time, assigned by the bridge.
    pub observed_at: DateTime<Utc>,
    /// Resolved item, field default already applied.
    pub item: Item,
}

impl Event {
    /// Create an event stamped with the current time.
    pub fn now(source_id: impl Into<String>, value: f64, item: Item) -> Self {
        Self {
            source_id: source_id.into(),
            value,
            observed_at: Utc::now(),
            item,
        }
    }
}

/// Lock-guarded, swappable sequence of events awaiting delivery.
#[derive(Debug, Default)]
pub struct PendingBuffer {
    events: Mutex<Vec<Event>>,
}

impl PendingBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one event.
    pub fn push(&self, event: Event) {
        self.events.lock().push(event);
    }

    /// Take every pending event, leaving an empty buffer behind.
    ///
    /// Events pushed after this call belong to the next generation.
    pub fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Get the current number of pending events.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}
