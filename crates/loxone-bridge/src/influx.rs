// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! InfluxDB v2 Line Protocol sink.
//!
//! Line Protocol format:
//! ```text
//! measurement,tag1=val1,tag2=val2 field1=val1,field2=val2 timestamp_ns
//! ```
//!
//! See: <https://docs.influxdata.com/influxdb/v2/reference/syntax/line-protocol/>

use crate::sink::{MetricPoint, MetricSink, SinkError};
use std::io::Write;

/// Renders metric points as Line Protocol lines.
///
/// Lines accumulate in memory until [`flush`](Self::flush) or
/// [`write_to`](Self::write_to) hands them off.
#[derive(Debug, Default)]
pub struct LineProtocolSink {
    buffer: Vec<String>,
}

impl LineProtocolSink {
    /// Create a new empty sink.
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Render a point as one Line Protocol line.
    ///
    /// Tags are written in key order; tags with an empty key or value are
    /// dropped, as are fields with an empty key. Points without a
    /// measurement, without any remaining field, with non-finite values, or
    /// with timestamps outside the nanosecond range are rejected.
    pub fn render(point: &MetricPoint) -> Result<String, SinkError> {
        if point.name.is_empty() {
            return Err(SinkError::Rejected(
                "InfluxDB requires a measurement name".to_string(),
            ));
        }
        let timestamp_ns = point.timestamp.timestamp_nanos_opt().ok_or_else(|| {
            SinkError::Rejected(format!("{}: timestamp out of range", point.name))
        })?;

        let mut line = escape_measurement(&point.name);

        for (key, value) in &point.tags {
            if key.is_empty() || value.is_empty() {
                tracing::trace!("{}: dropping empty tag {:?}={:?}", point.name, key, value);
                continue;
            }
            line.push(',');
            line.push_str(&escape_key(key));
            line.push('=');
            line.push_str(&escape_key(value));
        }

        line.push(' ');

        let mut written = 0;
        for (key, value) in &point.fields {
            if key.is_empty() {
                continue;
            }
            if !value.is_finite() {
                return Err(SinkError::Rejected(format!(
                    "{}: field {} is not finite ({})",
                    point.name, key, value
                )));
            }
            if written > 0 {
                line.push(',');
            }
            line.push_str(&escape_key(key));
            line.push('=');
            line.push_str(&value.to_string());
            written += 1;
        }

        if written == 0 {
            return Err(SinkError::Rejected(format!(
                "{}: InfluxDB requires at least one field",
                point.name
            )));
        }

        line.push(' ');
        line.push_str(&timestamp_ns.to_string());

        Ok(line)
    }

    /// Flush the buffer, returning all accumulated lines.
    pub fn flush(&mut self) -> Vec<String> {
        std::mem::take(&mut self.buffer)
    }

    /// Write all accumulated lines to `out`, one per line, and clear the
    /// buffer. Returns the number of lines written.
    pub fn write_to<W: Write>(&mut self, out: &mut W) -> std::io::Result<usize> {
        let lines = self.flush();
        for line in &lines {
            writeln!(out, "{}", line)?;
        }
        out.flush()?;
        Ok(lines.len())
    }

    /// Get the current number of buffered lines.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl MetricSink for LineProtocolSink {
    fn add_point(&mut self, point: MetricPoint) -> Result<(), SinkError> {
        let line = Self::render(&point)?;
        self.buffer.push(line);
        Ok(())
    }
}

/// Line breaks and tabs cannot appear raw inside a line.
fn escape_whitespace(s: &str) -> String {
    s.replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

/// Spaces and commas must be escaped in measurement names.
fn escape_measurement(s: &str) -> String {
    escape_whitespace(s).replace(',', "\\,").replace(' ', "\\ ")
}

/// Tag keys, tag values and field keys additionally escape equals signs.
fn escape_key(s: &str) -> String {
    escape_whitespace(s)
        .replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}
