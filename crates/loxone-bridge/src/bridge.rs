// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Event bridge: controller events in, pending events out.

use crate::buffer::{Event, PendingBuffer};
use crate::registry::ItemRegistry;
use crate::source::RawEvent;
use crate::stats::BridgeStats;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Lifecycle state of the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    /// Not started.
    Idle,
    /// Opening the controller session.
    Connecting,
    /// Consuming events.
    Streaming,
    /// Task alive, transport currently reconnecting.
    Reconnecting,
    /// Stopped or stream ended. Terminal.
    Stopped,
}

impl fmt::Display for BridgeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Streaming => "streaming",
            Self::Reconnecting => "reconnecting",
            Self::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Resolves raw controller events against the registry and appends
/// matches to the pending buffer.
#[derive(Clone)]
pub struct EventBridge {
    registry: Arc<ItemRegistry>,
    buffer: Arc<PendingBuffer>,
    stats: Arc<BridgeStats>,
}

impl EventBridge {
    pub fn new(
        registry: Arc<ItemRegistry>,
        buffer: Arc<PendingBuffer>,
        stats: Arc<BridgeStats>,
    ) -> Self {
        Self {
            registry,
            buffer,
            stats,
        }
    }

    /// Handle one raw event. Returns `true` if it was buffered.
    pub fn handle(&self, raw: RawEvent) -> bool {
        let Some(item) = self.registry.lookup(&raw.source_id) else {
            tracing::trace!("Ignoring unmapped event {}", raw.source_id);
            self.stats.record_received(false);
            return false;
        };

        let event = Event::now(raw.source_id, raw.value, item);
        tracing::info!(
            "Received event: {}, {}, {}={}",
            event.item.destination,
            event.item.metric_name,
            event.item.field_name,
            event.value
        );

        self.buffer.push(event);
        self.stats.record_received(true);
        true
    }

    /// Spawn the consumption loop.
    ///
    /// The task ends when the event stream closes or `shutdown` flips to
    /// `true` (or its sender is dropped). On shutdown, events already queued
    /// in the channel are still handled before the task exits.
    pub fn spawn(
        self,
        events: mpsc::Receiver<RawEvent>,
        shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        tokio::spawn(self.run(events, shutdown))
    }

    async fn run(self, mut events: mpsc::Receiver<RawEvent>, mut shutdown: watch::Receiver<bool>) {
        tracing::debug!("Event bridge started ({} items)", self.registry.len());

        loop {
            if *shutdown.borrow_and_update() {
                self.drain(&mut events);
                break;
            }

            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() {
                        self.drain(&mut events);
                        break;
                    }
                }
                event = events.recv() => match event {
                    Some(raw) => {
                        self.handle(raw);
                    }
                    None => {
                        tracing::debug!("Event stream closed");
                        break;
                    }
                },
            }
        }

        tracing::debug!("Event bridge exited");
    }

    /// Handle events already queued in the channel without waiting for more.
    fn drain(&self, events: &mut mpsc::Receiver<RawEvent>) {
        let mut drained = 0usize;
        while let Ok(raw) = events.try_recv() {
            self.handle(raw);
            drained += 1;
        }
        if drained > 0 {
            tracing::debug!("Drained {} queued events on shutdown", drained);
        }
    }
}
