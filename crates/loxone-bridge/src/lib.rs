// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Loxone to InfluxDB bridge
//!
//! Subscribes to a Loxone Miniserver's value-update stream, maps the
//! controller UUIDs to measurements, and hands buffered points to a metrics
//! sink each time the host polls.
//!
//! This crate provides:
//! - TOML configuration with directly declared items
//! - JSON point-mapping documents expanded into items
//! - A background bridge task feeding a lock-guarded pending buffer
//! - A poll-and-flush collector producing metric points
//! - InfluxDB v2 Line Protocol rendering
//!
//! # Overview
//!
//! The controller transport (websocket, authentication, reconnection) is
//! not part of this crate; it plugs in through [`EventSource`].
//!
//! ```text
//! EventSource --> EventBridge --> PendingBuffer --> Collector --> MetricSink
//!                      ^
//!                 ItemRegistry <-- BridgeConfig items + mapping document
//! ```

pub mod bridge;
pub mod buffer;
pub mod collector;
pub mod config;
pub mod influx;
pub mod input;
pub mod item;
pub mod logging;
pub mod mapping;
pub mod registry;
pub mod sink;
pub mod source;
pub mod stats;

pub use bridge::{BridgeState, EventBridge};
pub use buffer::{Event, PendingBuffer};
pub use collector::{CollectReport, Collector};
pub use config::{BridgeConfig, ConfigError};
pub use influx::LineProtocolSink;
pub use input::{InputError, LoxoneInput};
pub use item::Item;
pub use mapping::{MappingDocument, MappingError};
pub use registry::ItemRegistry;
pub use sink::{MetricPoint, MetricSink, SinkError};
pub use source::{ChannelSource, ConnectOptions, EventSource, LinesSource, RawEvent, Session, SourceError};
pub use stats::{BridgeStats, BridgeStatsSnapshot};
