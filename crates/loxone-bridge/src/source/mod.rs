// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Controller event sources.
//!
//! The websocket client that talks to the Miniserver (authentication,
//! keep-alive, reconnection) lives behind [`EventSource`] and [`Session`].
//! A session hands out its event stream once, as a channel receiver; the
//! stream ends when the sender side is dropped.

mod channel;
mod lines;

pub use channel::ChannelSource;
pub use lines::LinesSource;

use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

/// Capacity of the channel between a transport and the bridge task.
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Default keep-alive interval for controller sessions.
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(30);

/// Event source errors.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to connect to {host}: {reason}")]
    Connect { host: String, reason: String },

    #[error("event stream already consumed")]
    Closed,
}

/// A value update pushed by the controller.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawEvent {
    /// Controller UUID of the state that changed.
    #[serde(rename = "uuid")]
    pub source_id: String,
    /// New value.
    pub value: f64,
}

impl RawEvent {
    pub fn new(source_id: impl Into<String>, value: f64) -> Self {
        Self {
            source_id: source_id.into(),
            value,
        }
    }
}

/// Session parameters passed to [`EventSource::connect`].
#[derive(Clone)]
pub struct ConnectOptions {
    /// Controller address.
    pub host: String,
    /// User name.
    pub user: String,
    /// Password or key.
    pub secret: String,
    /// Keep-alive interval.
    pub keep_alive: Duration,
    /// Let the transport reconnect on its own after a drop.
    pub auto_reconnect: bool,
    /// Ask the controller to push value updates.
    pub register_events: bool,
}

impl ConnectOptions {
    /// Options with auto-reconnect and event registration enabled.
    pub fn new(host: impl Into<String>, user: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            secret: secret.into(),
            keep_alive: DEFAULT_KEEP_ALIVE,
            auto_reconnect: true,
            register_events: true,
        }
    }

    /// Set the keep-alive interval.
    pub fn keep_alive(mut self, interval: Duration) -> Self {
        self.keep_alive = interval;
        self
    }
}

impl fmt::Debug for ConnectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectOptions")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("secret", &"<redacted>")
            .field("keep_alive", &self.keep_alive)
            .field("auto_reconnect", &self.auto_reconnect)
            .field("register_events", &self.register_events)
            .finish()
    }
}

/// Something that can open a controller session.
pub trait EventSource: Send + Sync {
    /// Establish a session.
    fn connect(&self, options: &ConnectOptions) -> Result<Box<dyn Session>, SourceError>;
}

/// An established controller session.
pub trait Session: Send {
    /// Take the event stream. Returns `None` after the first call.
    fn events(&mut self) -> Option<mpsc::Receiver<RawEvent>>;

    /// Whether the transport currently holds a live connection.
    fn is_connected(&self) -> bool;

    /// Close the session.
    fn close(&mut self);
}
