// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bridge statistics.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Counters shared by the bridge task and the collector.
#[derive(Debug)]
pub struct BridgeStats {
    /// Raw events received from the controller.
    pub events_received: AtomicU64,

    /// Raw events with no registry item (dropped).
    pub events_unmatched: AtomicU64,

    /// Events appended to the pending buffer.
    pub events_buffered: AtomicU64,

    /// Points accepted by the sink.
    pub points_emitted: AtomicU64,

    /// Points the sink refused.
    pub emit_errors: AtomicU64,

    /// Completed collector runs.
    pub flushes: AtomicU64,

    /// Creation time.
    pub created: Instant,
}

impl Default for BridgeStats {
    fn default() -> Self {
        Self::new()
    }
}

impl BridgeStats {
    /// Create zeroed stats.
    pub fn new() -> Self {
        Self {
            events_received: AtomicU64::new(0),
            events_unmatched: AtomicU64::new(0),
            events_buffered: AtomicU64::new(0),
            points_emitted: AtomicU64::new(0),
            emit_errors: AtomicU64::new(0),
            flushes: AtomicU64::new(0),
            created: Instant::now(),
        }
    }

    pub(crate) fn record_received(&self, matched: bool) {
        self.events_received.fetch_add(1, Ordering::Relaxed);
        if matched {
            self.events_buffered.fetch_add(1, Ordering::Relaxed);
        } else {
            self.events_unmatched.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_flush(&self, emitted: u64, errors: u64) {
        self.points_emitted.fetch_add(emitted, Ordering::Relaxed);
        self.emit_errors.fetch_add(errors, Ordering::Relaxed);
        self.flushes.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of current stats.
    pub fn snapshot(&self) -> BridgeStatsSnapshot {
        BridgeStatsSnapshot {
            events_received: self.events_received.load(Ordering::Relaxed),
            events_unmatched: self.events_unmatched.load(Ordering::Relaxed),
            events_buffered: self.events_buffered.load(Ordering::Relaxed),
            points_emitted: self.points_emitted.load(Ordering::Relaxed),
            emit_errors: self.emit_errors.load(Ordering::Relaxed),
            flushes: self.flushes.load(Ordering::Relaxed),
            uptime_secs: self.created.elapsed().as_secs_f64(),
        }
    }
}

/// Point-in-time copy of [`BridgeStats`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BridgeStatsSnapshot {
    pub events_received: u64,
    pub events_unmatched: u64,
    pub events_buffered: u64,
    pub points_emitted: u64,
    pub emit_errors: u64,
    pub flushes: u64,
    pub uptime_secs: f64,
}

impl BridgeStatsSnapshot {
    /// Received events per second since creation.
    pub fn events_per_second(&self) -> f64 {
        if self.uptime_secs > 0.0 {
            self.events_received as f64 / self.uptime_secs
        } else {
            0.0
        }
    }
}

impl fmt::Display for BridgeStatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} events ({:.1}/s), {} unmatched, {} points emitted, {} emit errors, {} flushes",
            self.events_received,
            self.events_per_second(),
            self.events_unmatched,
            self.points_emitted,
            self.emit_errors,
            self.flushes
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_counters() {
        let stats = BridgeStats::new();
        stats.record_received(true);
        stats.record_received(true);
        stats.record_received(false);
        stats.record_flush(2, 0);
        stats.record_flush(0, 1);

        let snap = stats.snapshot();
        assert_eq!(snap.events_received, 3);
        assert_eq!(snap.events_buffered, 2);
        assert_eq!(snap.events_unmatched, 1);
        assert_eq!(snap.points_emitted, 2);
        assert_eq!(snap.emit_errors, 1);
        assert_eq!(snap.flushes, 2);
    }

    #[test]
    fn test_events_per_second_zero_uptime() {
        let snap = BridgeStatsSnapshot {
            events_received: 10,
            ..Default::default()
        };
        assert_eq!(snap.events_per_second(), 0.0);
    }
}
