// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-process event source fed through a channel sender.

use super::{ConnectOptions, EventSource, RawEvent, Session, SourceError, EVENT_CHANNEL_CAPACITY};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Event source backed by a tokio channel.
///
/// Whoever holds the sender returned by [`ChannelSource::new`] plays the
/// controller. Useful for embedding the bridge behind another transport.
pub struct ChannelSource {
    rx: Mutex<Option<mpsc::Receiver<RawEvent>>>,
    connected: Arc<AtomicBool>,
    refusal: Option<String>,
    last_options: Mutex<Option<ConnectOptions>>,
}

impl ChannelSource {
    /// Create a source and the sender that feeds it.
    pub fn new() -> (Self, mpsc::Sender<RawEvent>) {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let source = Self {
            rx: Mutex::new(Some(rx)),
            connected: Arc::new(AtomicBool::new(false)),
            refusal: None,
            last_options: Mutex::new(None),
        };
        (source, tx)
    }

    /// Create a source whose `connect` always fails with `reason`.
    pub fn refusing(reason: impl Into<String>) -> Self {
        Self {
            rx: Mutex::new(None),
            connected: Arc::new(AtomicBool::new(false)),
            refusal: Some(reason.into()),
            last_options: Mutex::new(None),
        }
    }

    /// Override the connection flag reported by the session.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Relaxed);
    }

    /// Whether a session is currently open and not closed.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    /// Options passed to the last `connect` call.
    pub fn last_options(&self) -> Option<ConnectOptions> {
        self.last_options.lock().clone()
    }
}

impl EventSource for ChannelSource {
    fn connect(&self, options: &ConnectOptions) -> Result<Box<dyn Session>, SourceError> {
        *self.last_options.lock() = Some(options.clone());

        if let Some(reason) = &self.refusal {
            return Err(SourceError::Connect {
                host: options.host.clone(),
                reason: reason.clone(),
            });
        }

        let rx = self.rx.lock().take().ok_or(SourceError::Closed)?;
        self.connected.store(true, Ordering::Relaxed);

        Ok(Box::new(ChannelSession {
            rx: Some(rx),
            connected: Arc::clone(&self.connected),
        }))
    }
}

struct ChannelSession {
    rx: Option<mpsc::Receiver<RawEvent>>,
    connected: Arc<AtomicBool>,
}

impl Session for ChannelSession {
    fn events(&mut self) -> Option<mpsc::Receiver<RawEvent>> {
        self.rx.take()
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    fn close(&mut self) {
        self.connected.store(false, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_source_delivers_events() {
        let (source, tx) = ChannelSource::new();
        let mut session = source
            .connect(&ConnectOptions::new("host", "user", "pass"))
            .expect("connect");

        assert!(session.is_connected());
        let mut rx = session.events().expect("first take");
        assert!(session.events().is_none());

        tx.send(RawEvent::new("abc", 1.0)).await.expect("send");
        assert_eq!(rx.recv().await, Some(RawEvent::new("abc", 1.0)));

        session.close();
        assert!(!session.is_connected());
    }

    #[test]
    fn test_channel_source_connects_once() {
        let (source, _tx) = ChannelSource::new();
        let opts = ConnectOptions::new("host", "user", "pass");

        assert!(source.connect(&opts).is_ok());
        assert!(matches!(source.connect(&opts), Err(SourceError::Closed)));
    }

    #[test]
    fn test_refusing_source() {
        let source = ChannelSource::refusing("connection refused");
        let result = source.connect(&ConnectOptions::new("10.0.0.1", "user", "pass"));

        match result {
            Err(SourceError::Connect { host, reason }) => {
                assert_eq!(host, "10.0.0.1");
                assert_eq!(reason, "connection refused");
            }
            Err(other) => panic!("expected Connect, got {}", other),
            Ok(_) => panic!("expected Connect error"),
        }
        assert_eq!(
            source.last_options().map(|o| o.host),
            Some("10.0.0.1".to_string())
        );
    }
}
