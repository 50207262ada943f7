// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Metric points and the sink they are delivered to.

use crate::item::Tags;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use thiserror::Error;

/// Sink errors.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("point rejected: {0}")]
    Rejected(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single metric point ready for the metrics pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricPoint {
    /// Measurement name.
    pub name: String,
    /// Field name -> value.
    pub fields: BTreeMap<String, f64>,
    /// Tag key -> value.
    pub tags: Tags,
    /// Point timestamp.
    pub timestamp: DateTime<Utc>,
}

/// Receiver of metric points.
pub trait MetricSink {
    /// Add one point.
    fn add_point(&mut self, point: MetricPoint) -> Result<(), SinkError>;
}

impl MetricSink for Vec<MetricPoint> {
    fn add_point(&mut self, point: MetricPoint) -> Result<(), SinkError> {
        self.push(point);
        Ok(())
    }
}

impl<S: MetricSink + ?Sized> MetricSink for &mut S {
    fn add_point(&mut self, point: MetricPoint) -> Result<(), SinkError> {
        (**self).add_point(point)
    }
}

impl<S: MetricSink + ?Sized> MetricSink for Box<S> {
    fn add_point(&mut self, point: MetricPoint) -> Result<(), SinkError> {
        (**self).add_point(point)
    }
}
