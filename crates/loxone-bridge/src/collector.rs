// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Poll-and-flush collector.
//!
//! Called by the host on its own schedule. Each call swaps out the pending
//! buffer and turns every taken event into one metric point.

use crate::buffer::{Event, PendingBuffer};
use crate::sink::{MetricPoint, MetricSink};
use crate::stats::BridgeStats;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Tag key carrying the item's destination bucket.
pub const DESTINATION_TAG: &str = "bucket";

/// Outcome of one collector run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectReport {
    /// Events taken from the buffer.
    pub taken: usize,
    /// Points accepted by the sink.
    pub emitted: usize,
    /// Points the sink refused.
    pub failed: usize,
}

/// Drains the pending buffer into a sink.
#[derive(Clone)]
pub struct Collector {
    buffer: Arc<PendingBuffer>,
    stats: Arc<BridgeStats>,
}

impl Collector {
    pub fn new(buffer: Arc<PendingBuffer>, stats: Arc<BridgeStats>) -> Self {
        Self { buffer, stats }
    }

    /// Flush all pending events into `sink`.
    ///
    /// The buffer lock is released before any point is built. A refused
    /// point is logged and counted; the rest of the batch is still emitted.
    pub fn collect<S: MetricSink + ?Sized>(&self, sink: &mut S) -> CollectReport {
        let events = self.buffer.take();
        let mut report = CollectReport {
            taken: events.len(),
            ..Default::default()
        };

        for event in events {
            let point = to_point(event);
            let name = point.name.clone();
            match sink.add_point(point) {
                Ok(()) => report.emitted += 1,
                Err(err) => {
                    report.failed += 1;
                    tracing::warn!("Failed to emit point for {}: {}", name, err);
                }
            }
        }

        self.stats
            .record_flush(report.emitted as u64, report.failed as u64);
        if report.taken > 0 {
            tracing::debug!(
                "Flushed {} events ({} emitted, {} failed)",
                report.taken,
                report.emitted,
                report.failed
            );
        }

        report
    }
}

/// Build the metric point for an event.
///
/// Tags are the item's tags plus `bucket=<destination>` when the
/// destination is non-empty; the destination wins over an item tag with
/// the same key.
pub fn to_point(event: Event) -> MetricPoint {
    let Event {
        value,
        observed_at,
        item,
        ..
    } = event;

    let field = item.effective_field().to_string();
    let mut tags = item.tags;
    if !item.destination.is_empty() {
        tags.insert(DESTINATION_TAG.to_string(), item.destination);
    }

    let mut fields = BTreeMap::new();
    fields.insert(field, value);

    MetricPoint {
        name: item.metric_name,
        fields,
        tags,
        timestamp: observed_at,
    }
}
