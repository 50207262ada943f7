// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! JSON point-mapping documents.
//!
//! A mapping document groups datapoints by bucket and measurement:
//!
//! ```text
//! pointMappings[] -> bucket
//!                 -> measurements[] -> name
//!                                   -> datapoints[] -> fields { field -> uuid }
//!                                                   -> tags   { key -> value }
//!                                                   -> isCritical
//! ```
//!
//! Every `field -> uuid` entry expands into one [`Item`].

use crate::item::{Item, Tags};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Mapping document errors.
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("mapping document not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Top-level mapping document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MappingDocument {
    #[serde(rename = "pointMappings", default)]
    pub point_mappings: Vec<PointMapping>,
}

/// All measurements recorded into one bucket.
#[derive(Debug, Clone, Deserialize)]
pub struct PointMapping {
    pub bucket: String,
    #[serde(default)]
    pub measurements: Vec<Measurement>,
}

/// A named measurement and its datapoints.
#[derive(Debug, Clone, Deserialize)]
pub struct Measurement {
    pub name: String,
    #[serde(default)]
    pub datapoints: Vec<Datapoint>,
}

/// One recording point: a set of fields sharing a tag set.
#[derive(Debug, Clone, Deserialize)]
pub struct Datapoint {
    /// Field name -> controller UUID.
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    #[serde(default)]
    pub tags: Tags,
    #[serde(rename = "isCritical", default)]
    pub is_critical: bool,
}

impl MappingDocument {
    /// Parse a mapping document from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, MappingError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a mapping document from a file.
    pub fn from_file(path: &Path) -> Result<Self, MappingError> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => MappingError::NotFound(path.to_path_buf()),
            _ => MappingError::Io {
                path: path.to_path_buf(),
                source: e,
            },
        })?;
        Self::from_json(&content)
    }

    /// Flatten the document into items, one per field occurrence.
    ///
    /// Order follows the document: bucket, then measurement, then datapoint,
    /// then field name.
    pub fn expand(&self) -> Vec<Item> {
        let mut items = Vec::new();

        for mapping in &self.point_mappings {
            tracing::debug!(
                "Mapping: {} ({} measurements)",
                mapping.bucket,
                mapping.measurements.len()
            );

            for measurement in &mapping.measurements {
                if measurement.name.is_empty() {
                    tracing::warn!(
                        "Skipping measurement without a name in bucket {}",
                        mapping.bucket
                    );
                    continue;
                }
                tracing::debug!(
                    "  Measurement: {} ({} datapoints)",
                    measurement.name,
                    measurement.datapoints.len()
                );

                for (i, datapoint) in measurement.datapoints.iter().enumerate() {
                    tracing::debug!(
                        "    Datapoint {}: {} fields, {} tags",
                        i,
                        datapoint.fields.len(),
                        datapoint.tags.len()
                    );

                    for (field, uuid) in &datapoint.fields {
                        if field.is_empty() || uuid.is_empty() {
                            tracing::warn!(
                                "Skipping incomplete field {:?} -> {:?} in {}",
                                field,
                                uuid,
                                measurement.name
                            );
                            continue;
                        }
                        tracing::trace!("      Field: {} -> {}", field, uuid);
                        items.push(Item {
                            destination: mapping.bucket.clone(),
                            metric_name: measurement.name.clone(),
                            source_id: uuid.clone(),
                            field_name: field.clone(),
                            tags: datapoint.tags.clone(),
                            critical: datapoint.is_critical,
                        });
                    }
                }
            }
        }

        items
    }
}

/// Load a mapping document and expand it into items.
pub fn load(path: &Path) -> Result<Vec<Item>, MappingError> {
    let document = MappingDocument::from_file(path)?;
    let items = document.expand();
    tracing::debug!(
        "Read {} point mappings from {} ({} items)",
        document.point_mappings.len(),
        path.display(),
        items.len()
    );
    Ok(items)
}
