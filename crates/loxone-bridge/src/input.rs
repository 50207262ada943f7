// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Loxone input: owns the registry, the pending buffer, the controller
//! session and the bridge task.
//!
//! ```rust,ignore
//! let mut input = LoxoneInput::new(config)?;
//! input.start(&source).await?;
//!
//! // host schedule
//! input.gather(&mut sink);
//!
//! input.stop().await;
//! ```

use crate::bridge::{BridgeState, EventBridge};
use crate::buffer::PendingBuffer;
use crate::collector::{CollectReport, Collector};
use crate::config::{BridgeConfig, ConfigError};
use crate::mapping;
use crate::registry::ItemRegistry;
use crate::sink::MetricSink;
use crate::source::{EventSource, Session, SourceError};
use crate::stats::{BridgeStats, BridgeStatsSnapshot};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Input lifecycle errors.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Connection error: {0}")]
    Connection(#[from] SourceError),

    #[error("Input already started")]
    AlreadyStarted,

    #[error("Input stopped; restart is not supported")]
    Stopped,
}

/// Build the registry from configured items and the optional mapping
/// document. A mapping document that fails to load is logged and skipped.
pub fn build_registry(config: &BridgeConfig) -> ItemRegistry {
    let mapped = match &config.mapping_path {
        Some(path) => match mapping::load(path) {
            Ok(items) => items,
            Err(err) => {
                tracing::warn!("Ignoring mapping document: {}", err);
                Vec::new()
            }
        },
        None => Vec::new(),
    };

    ItemRegistry::from_sources(config.items.clone(), mapped)
}

/// Bridge between a controller event stream and a metric sink.
pub struct LoxoneInput {
    config: BridgeConfig,
    registry: Arc<ItemRegistry>,
    buffer: Arc<PendingBuffer>,
    stats: Arc<BridgeStats>,
    collector: Collector,
    session: Option<Box<dyn Session>>,
    task: Option<JoinHandle<()>>,
    shutdown: Option<watch::Sender<bool>>,
    state: BridgeState,
}

impl LoxoneInput {
    /// Validate the configuration and build the item registry.
    pub fn new(config: BridgeConfig) -> Result<Self, InputError> {
        config.validate()?;
        let registry = build_registry(&config);
        Ok(Self::with_registry(config, registry))
    }

    /// Create an input around an already built registry.
    pub fn with_registry(config: BridgeConfig, registry: ItemRegistry) -> Self {
        let buffer = Arc::new(PendingBuffer::new());
        let stats = Arc::new(BridgeStats::new());
        let collector = Collector::new(Arc::clone(&buffer), Arc::clone(&stats));

        tracing::debug!("Registry holds {} items", registry.len());

        Self {
            config,
            registry: Arc::new(registry),
            buffer,
            stats,
            collector,
            session: None,
            task: None,
            shutdown: None,
            state: BridgeState::Idle,
        }
    }

    /// Connect to the controller and spawn the bridge task.
    ///
    /// Must be called from within a tokio runtime. A failed connect leaves
    /// the input `Idle` with no session retained, so `start` may be retried;
    /// starting after `stop` fails with [`InputError::Stopped`].
    pub async fn start(&mut self, source: &dyn EventSource) -> Result<(), InputError> {
        match self.state {
            BridgeState::Idle => {}
            BridgeState::Stopped => return Err(InputError::Stopped),
            _ => return Err(InputError::AlreadyStarted),
        }

        self.state = BridgeState::Connecting;
        let options = self.config.connect_options();
        tracing::debug!("Connecting: {:?}", options);

        let mut session = match source.connect(&options) {
            Ok(session) => session,
            Err(err) => {
                self.state = BridgeState::Idle;
                tracing::error!("Failed to connect to {}: {}", options.host, err);
                return Err(err.into());
            }
        };
        let Some(events) = session.events() else {
            session.close();
            self.state = BridgeState::Idle;
            return Err(SourceError::Closed.into());
        };

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let bridge = EventBridge::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.buffer),
            Arc::clone(&self.stats),
        );

        self.task = Some(bridge.spawn(events, shutdown_rx));
        self.shutdown = Some(shutdown_tx);
        self.session = Some(session);
        self.state = BridgeState::Streaming;

        tracing::info!(
            "Loxone input started on {} with {} items",
            options.host,
            self.registry.len()
        );
        Ok(())
    }

    /// Flush pending events into `sink`.
    pub fn gather<S: MetricSink + ?Sized>(&self, sink: &mut S) -> CollectReport {
        self.collector.collect(sink)
    }

    /// Close the session and wait for the bridge task to exit.
    ///
    /// Safe to call repeatedly and before `start`. The wait is bounded by
    /// the configured stop timeout; a task still running after that is
    /// aborted.
    pub async fn stop(&mut self) {
        if let Some(session) = self.session.as_mut() {
            if session.is_connected() {
                tracing::info!("Closing Loxone connection");
                session.close();
            }
        }

        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(true);
        }

        if let Some(mut task) = self.task.take() {
            match tokio::time::timeout(self.config.stop_timeout(), &mut task).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => tracing::warn!("Event bridge task failed: {}", err),
                Err(_) => {
                    tracing::warn!(
                        "Event bridge did not exit within {:?}, aborting",
                        self.config.stop_timeout()
                    );
                    task.abort();
                }
            }
        }

        self.session = None;
        if self.state != BridgeState::Idle {
            self.state = BridgeState::Stopped;
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> BridgeState {
        match self.state {
            BridgeState::Streaming => {
                if self.task.as_ref().is_some_and(|t| t.is_finished()) {
                    BridgeState::Stopped
                } else if self.session.as_ref().is_some_and(|s| !s.is_connected()) {
                    BridgeState::Reconnecting
                } else {
                    BridgeState::Streaming
                }
            }
            state => state,
        }
    }

    /// Item registry.
    pub fn registry(&self) -> &ItemRegistry {
        &self.registry
    }

    /// Number of events waiting for the next `gather`.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Statistics snapshot.
    pub fn stats(&self) -> BridgeStatsSnapshot {
        self.stats.snapshot()
    }

    /// Configuration.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }
}

impl Drop for LoxoneInput {
    fn drop(&mut self) {
        if let Some(session) = self.session.as_mut() {
            if session.is_connected() {
                session.close();
            }
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Item;
    use crate::sink::MetricPoint;
    use crate::source::{ChannelSource, RawEvent};
    use std::io::Write;
    use std::time::Duration;

    fn config() -> BridgeConfig {
        let mut config = BridgeConfig::new("192.168.1.253");
        config.items.push(Item::new("home", "temp", "abc").tag("room", "kitchen"));
        config
    }

    async fn wait_for_pending(input: &LoxoneInput, n: usize) {
        for _ in 0..500 {
            if input.pending() >= n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!("expected {} pending events, have {}", n, input.pending());
    }

    #[test]
    fn test_registry_merges_mapping_document() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(
            br#"{"pointMappings": [{"bucket": "mapped", "measurements": [
                {"name": "temp", "datapoints": [{"fields": {"value": "abc", "humidity": "xyz"}}]}
            ]}]}"#,
        )
        .expect("write");

        let mut config = config();
        config.mapping_path = Some(file.path().to_path_buf());

        let input = LoxoneInput::new(config).expect("input");
        assert_eq!(input.registry().len(), 3);
        assert_eq!(
            input.registry().lookup("abc").map(|i| i.destination),
            Some("home".to_string())
        );
        assert_eq!(
            input.registry().lookup("xyz").map(|i| i.field_name),
            Some("humidity".to_string())
        );
    }

    #[test]
    fn test_registry_ignores_broken_mapping_document() {
        let mut config = config();
        config.mapping_path = Some("/nonexistent/mappings.json".into());

        let input = LoxoneInput::new(config).expect("input");
        assert_eq!(input.registry().len(), 1);
    }

    #[test]
    fn test_registry_ignores_malformed_mapping_document() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(br#"{"pointMappings": 3}"#).expect("write");

        let mut config = config();
        config.mapping_path = Some(file.path().to_path_buf());

        let input = LoxoneInput::new(config).expect("input");
        assert_eq!(input.registry().len(), 1);
        assert_eq!(
            input.registry().lookup("abc").map(|i| i.metric_name),
            Some("temp".to_string())
        );
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let result = LoxoneInput::new(BridgeConfig::new(""));
        assert!(matches!(result, Err(InputError::Config(_))));
    }

    #[tokio::test]
    async fn test_start_gather_stop() {
        let (source, tx) = ChannelSource::new();
        let mut input = LoxoneInput::new(config()).expect("input");
        assert_eq!(input.state(), BridgeState::Idle);

        input.start(&source).await.expect("start");
        assert_eq!(input.state(), BridgeState::Streaming);

        tx.send(RawEvent::new("abc", 21.5)).await.expect("send");
        tx.send(RawEvent::new("unknown", 1.0)).await.expect("send");
        tx.send(RawEvent::new("abc", 22.0)).await.expect("send");
        wait_for_pending(&input, 2).await;

        let mut sink: Vec<MetricPoint> = Vec::new();
        let report = input.gather(&mut sink);
        assert_eq!(report.emitted, 2);
        assert_eq!(sink[0].fields.get("value"), Some(&21.5));
        assert_eq!(sink[1].fields.get("value"), Some(&22.0));

        input.stop().await;
        assert_eq!(input.state(), BridgeState::Stopped);

        let stats = input.stats();
        assert_eq!(stats.events_buffered, 2);
        assert_eq!(stats.points_emitted, 2);
    }

    #[tokio::test]
    async fn test_stop_keeps_queued_events() {
        let (source, tx) = ChannelSource::new();
        let mut input = LoxoneInput::new(config()).expect("input");
        input.start(&source).await.expect("start");

        for i in 0..50 {
            tx.send(RawEvent::new("abc", i as f64)).await.expect("send");
        }
        input.stop().await;

        let mut sink: Vec<MetricPoint> = Vec::new();
        let report = input.gather(&mut sink);
        assert_eq!(report.emitted, 50);
        assert_eq!(sink[0].fields.get("value"), Some(&0.0));
        assert_eq!(sink[49].fields.get("value"), Some(&49.0));
        assert_eq!(input.stats().events_buffered, 50);
    }

    #[tokio::test]
    async fn test_drop_closes_session() {
        let (source, _tx) = ChannelSource::new();
        let mut input = LoxoneInput::new(config()).expect("input");
        input.start(&source).await.expect("start");
        assert!(source.is_connected());

        drop(input);
        assert!(!source.is_connected());
    }

    #[tokio::test]
    async fn test_start_connection_error() {
        let source = ChannelSource::refusing("connection refused");
        let mut input = LoxoneInput::new(config()).expect("input");

        let result = input.start(&source).await;
        assert!(matches!(
            result,
            Err(InputError::Connection(SourceError::Connect { .. }))
        ));
        assert_eq!(input.state(), BridgeState::Idle);

        let result = input.start(&source).await;
        assert!(matches!(result, Err(InputError::Connection(_))));
        assert_eq!(input.state(), BridgeState::Idle);

        input.stop().await;
    }

    #[tokio::test]
    async fn test_start_twice_and_after_stop() {
        let (source, _tx) = ChannelSource::new();
        let mut input = LoxoneInput::new(config()).expect("input");

        input.start(&source).await.expect("start");
        assert!(matches!(
            input.start(&source).await,
            Err(InputError::AlreadyStarted)
        ));

        input.stop().await;
        assert!(matches!(input.start(&source).await, Err(InputError::Stopped)));
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let mut input = LoxoneInput::new(config()).expect("input");
        input.stop().await;
        input.stop().await;
        assert_eq!(input.state(), BridgeState::Idle);

        let (source, _tx) = ChannelSource::new();
        let mut input = LoxoneInput::new(config()).expect("input");
        input.start(&source).await.expect("start");
        input.stop().await;
        input.stop().await;
        assert_eq!(input.state(), BridgeState::Stopped);
    }

    #[tokio::test]
    async fn test_state_reports_reconnecting() {
        let (source, _tx) = ChannelSource::new();
        let mut input = LoxoneInput::new(config()).expect("input");
        input.start(&source).await.expect("start");

        source.set_connected(false);
        assert_eq!(input.state(), BridgeState::Reconnecting);

        source.set_connected(true);
        assert_eq!(input.state(), BridgeState::Streaming);

        input.stop().await;
    }

    #[tokio::test]
    async fn test_gather_before_start_is_empty() {
        let input = LoxoneInput::new(config()).expect("input");
        let mut sink: Vec<MetricPoint> = Vec::new();
        let report = input.gather(&mut sink);
        assert_eq!(report, CollectReport::default());
        assert!(sink.is_empty());
    }
}
