use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PresetError;
use crate::events::{EventSink, LibraryEvent};
use crate::filter::state::FilterState;
use crate::storage::{KeyValueStore, keys, read_or, write_or_report};

/// A named snapshot of a filter state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterPreset {
    pub id: String,
    pub name: String,
    pub filters: FilterState,
    pub saved_at: DateTime<Utc>,
}

/// Saved filter presets, persisted as one list under a single key
#[derive(Debug, Default, Clone)]
pub struct PresetStore {
    presets: Vec<FilterPreset>,
}

impl PresetStore {
    /// Restore saved presets from storage
    pub fn load(store: &dyn KeyValueStore, events: &dyn EventSink) -> Self {
        Self {
            presets: read_or(store, keys::FILTER_PRESETS, Vec::new(), events),
        }
    }

    /// Snapshot `filters` under `name` and persist the full list.
    /// Saving an existing name adds a second preset with a distinct id.
    pub fn save(
        &mut self,
        name: &str,
        filters: FilterState,
        store: &mut dyn KeyValueStore,
        events: &dyn EventSink,
    ) -> &FilterPreset {
        let name = name.trim();
        let preset = FilterPreset {
            id: self.unique_slug(name),
            name: name.to_string(),
            filters,
            saved_at: Utc::now(),
        };

        self.presets.push(preset);
        write_or_report(store, keys::FILTER_PRESETS, &self.presets, events);
        events.emit(LibraryEvent::PresetSaved {
            name: name.to_string(),
        });

        self.presets.last().expect("preset was just pushed")
    }

    /// Find a preset by name or id, first match wins
    pub fn find(&self, name: &str) -> Option<&FilterPreset> {
        self.presets.iter().find(|p| p.name == name || p.id == name)
    }

    /// Remove a preset by name or id and persist the remaining list
    pub fn delete(
        &mut self,
        name: &str,
        store: &mut dyn KeyValueStore,
        events: &dyn EventSink,
    ) -> Result<FilterPreset, PresetError> {
        let pos = self
            .presets
            .iter()
            .position(|p| p.name == name || p.id == name)
            .ok_or_else(|| PresetError::NotFound {
                name: name.to_string(),
            })?;

        let removed = self.presets.remove(pos);
        write_or_report(store, keys::FILTER_PRESETS, &self.presets, events);
        events.emit(LibraryEvent::PresetDeleted {
            name: removed.name.clone(),
        });

        Ok(removed)
    }

    /// All presets in save order
    pub fn all(&self) -> &[FilterPreset] {
        &self.presets
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    fn unique_slug(&self, name: &str) -> String {
        let base = slugify(name);
        if !self.presets.iter().any(|p| p.id == base) {
            return base;
        }

        let mut counter = 2;
        loop {
            let candidate = format!("{base}-{counter}");
            if !self.presets.iter().any(|p| p.id == candidate) {
                return candidate;
            }
            counter += 1;
        }
    }
}

/// Lowercase a name into a dash-separated id
fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_dash = false;

    for c in name.to_lowercase().chars() {
        if c.is_alphanumeric() {
            slug.push(c);
            last_was_dash = false;
        } else if !last_was_dash && !slug.is_empty() {
            slug.push('-');
            last_was_dash = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    if slug.is_empty() { "preset".to_string() } else { slug }
}
