// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Item registry.
//!
//! Built once at startup and never modified afterwards, so it is shared
//! between the bridge task and the collector without locking.

use crate::item::{Item, DEFAULT_FIELD};

/// Ordered table of mapping rules.
///
/// Lookups scan linearly and return the first item whose UUID matches,
/// so earlier entries shadow later ones with the same UUID.
#[derive(Debug, Clone, Default)]
pub struct ItemRegistry {
    items: Vec<Item>,
}

impl ItemRegistry {
    /// Create a registry from an ordered list of items.
    pub fn new(items: Vec<Item>) -> Self {
        Self { items }
    }

    /// Create a registry from directly declared items and items expanded
    /// from a mapping document. Direct items take precedence.
    pub fn from_sources(direct: Vec<Item>, mapped: Vec<Item>) -> Self {
        let mut items = direct;
        items.extend(mapped);
        Self { items }
    }

    /// Find the item for a controller UUID.
    ///
    /// The returned copy has its field name defaulted to `"value"` when the
    /// stored item declares none; the stored item is left untouched.
    pub fn lookup(&self, source_id: &str) -> Option<Item> {
        let mut item = self
            .items
            .iter()
            .find(|item| item.source_id == source_id)?
            .clone();
        if item.field_name.is_empty() {
            item.field_name = DEFAULT_FIELD.to_string();
        }
        Some(item)
    }

    /// All items in lookup order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
