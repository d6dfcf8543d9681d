// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::catalog::item::{CatalogItem, RawCatalogItem, validate_item};
use crate::error::{CatalogError, ValidationError};

/// An immutable, id-indexed collection of catalog items.
///
/// Items keep their document order; lookups go through the id index. There
/// is no mutation API after load.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<CatalogItem>,
    index: HashMap<u32, usize>,
}

impl Catalog {
    /// Build a catalog from raw entries, skipping the ones that fail
    /// validation. Returns the catalog together with the per-entry failures
    /// so the caller can surface them as warnings.
    pub fn load(raw_items: Vec<RawCatalogItem>) -> (Self, Vec<ValidationError>) {
        let mut items = Vec::with_capacity(raw_items.len());
        let mut index = HashMap::with_capacity(raw_items.len());
        let mut skipped = Vec::new();

        for (i, raw) in raw_items.into_iter().enumerate() {
            match validate_item(i, raw) {
                Ok(item) => {
                    if index.contains_key(&item.id) {
                        skipped.push(ValidationError::DuplicateId {
                            index: i,
                            id: item.id,
                        });
                        continue;
                    }
                    index.insert(item.id, items.len());
                    items.push(item);
                }
                Err(e) => skipped.push(e),
            }
        }

        (Self { items, index }, skipped)
    }

    /// Look up an item by id
    pub fn get(&self, id: u32) -> Option<&CatalogItem> {
        self.index.get(&id).map(|&i| &self.items[i])
    }

    /// All items, in document order
    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Position of an id in document order
    pub fn position_of(&self, id: u32) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// The item after `id` in document order, wrapping from last to first
    pub fn next_of(&self, id: u32) -> Option<&CatalogItem> {
        let pos = self.position_of(id)?;
        self.items.get((pos + 1) % self.items.len())
    }

    /// The item before `id` in document order, wrapping from first to last
    pub fn prev_of(&self, id: u32) -> Option<&CatalogItem> {
        let pos = self.position_of(id)?;
        let len = self.items.len();
        self.items.get((pos + len - 1) % len)
    }

    /// Item counts per category, for the section badges
    pub fn count_by_category(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for item in &self.items {
            *counts.entry(item.category.as_str()).or_insert(0) += 1;
        }
        counts
    }
}

/// Parse a raw catalog document (a JSON array of entries)
pub fn parse_catalog(json: &str) -> Result<Vec<RawCatalogItem>, CatalogError> {
    Ok(serde_json::from_str(json)?)
}

/// Read a raw catalog document from a file
pub fn read_catalog_file(path: &Path) -> Result<Vec<RawCatalogItem>, CatalogError> {
    let content = std::fs::read_to_string(path).map_err(|e| CatalogError::FileReadFailed {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_catalog(&content)
}
