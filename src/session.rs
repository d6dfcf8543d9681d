// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, CatalogItem, RawCatalogItem};
use crate::error::{PlayerError, PresetError};
use crate::events::{LibraryEvent, SharedEventSink};
use crate::favorites::FavoritesStore;
use crate::filter::{self, FilterPreset, FilterState, PresetStore, SortKey, sort_items};
use crate::player::{PlaybackSnapshot, PlayerController};
use crate::storage::{KeyValueStore, keys, read_or, write_or_report};

/// How the host lays out the catalog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ViewMode {
    #[default]
    Grid,
    List,
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewMode::Grid => write!(f, "grid"),
            ViewMode::List => write!(f, "list"),
        }
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "grid" => Ok(ViewMode::Grid),
            "list" => Ok(ViewMode::List),
            other => Err(format!("invalid view mode '{other}'")),
        }
    }
}

impl From<String> for ViewMode {
    fn from(s: String) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl From<ViewMode> for String {
    fn from(v: ViewMode) -> Self {
        v.to_string()
    }
}

/// The library session: one catalog, one user, one storage namespace.
///
/// Replaces the ambient globals of a browser page with a single explicit
/// context object. The session owns the storage handle and the event sink
/// and threads them through every component; the presentation layer only
/// ever talks to this type.
pub struct Session {
    catalog: Catalog,
    favorites: FavoritesStore,
    presets: PresetStore,
    player: PlayerController,
    filter: FilterState,
    sort: SortKey,
    view: ViewMode,
    store: Box<dyn KeyValueStore>,
    events: SharedEventSink,
}

impl Session {
    /// Build a session from raw catalog entries, reporting skipped entries
    /// through the sink
    pub fn open(
        raw_items: Vec<RawCatalogItem>,
        store: Box<dyn KeyValueStore>,
        events: SharedEventSink,
    ) -> Self {
        let (catalog, skipped) = Catalog::load(raw_items);

        for issue in &skipped {
            events.emit(LibraryEvent::ItemSkipped {
                reason: issue.to_string(),
            });
        }
        events.emit(LibraryEvent::CatalogLoaded {
            total: catalog.len(),
            skipped: skipped.len(),
        });

        Self::new(catalog, store, events)
    }

    /// Build a session over an already-validated catalog, restoring all
    /// persisted user state
    pub fn new(catalog: Catalog, store: Box<dyn KeyValueStore>, events: SharedEventSink) -> Self {
        let favorites = FavoritesStore::load(store.as_ref(), events.as_ref());
        let presets = PresetStore::load(store.as_ref(), events.as_ref());
        let view = read_or(store.as_ref(), keys::VIEW_MODE, ViewMode::Grid, events.as_ref());
        let mut player = PlayerController::restore(store.as_ref(), events.as_ref());
        player.restore_session(&catalog, store.as_ref(), events.as_ref());

        Self {
            catalog,
            favorites,
            presets,
            player,
            filter: FilterState::default(),
            sort: SortKey::default(),
            view,
            store,
            events,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn favorites(&self) -> &FavoritesStore {
        &self.favorites
    }

    pub fn is_favorite(&self, id: u32) -> bool {
        self.favorites.is_favorite(id)
    }

    /// Flip a favorite and persist. Returns the new state.
    pub fn toggle_favorite(&mut self, id: u32) -> bool {
        self.favorites
            .toggle(id, self.store.as_mut(), self.events.as_ref())
    }

    // --- filtering ---

    pub fn filter_state(&self) -> &FilterState {
        &self.filter
    }

    /// Replace the filter state and report the new visible count
    pub fn set_filter(&mut self, filter: FilterState) {
        self.filter = filter;
        let visible = filter::apply(&self.catalog, &self.favorites, &self.filter).len();
        self.events.emit(LibraryEvent::FilterApplied {
            visible,
            total: self.catalog.len(),
        });
    }

    /// Reset every filter dimension to its match-all default
    pub fn clear_filter(&mut self) {
        self.set_filter(FilterState::default());
    }

    pub fn sort(&self) -> SortKey {
        self.sort
    }

    pub fn set_sort(&mut self, key: SortKey) {
        self.sort = key;
    }

    /// The current visible list: filter applied, then the sort key
    pub fn filtered(&self) -> Vec<&CatalogItem> {
        let mut items = filter::apply(&self.catalog, &self.favorites, &self.filter);
        sort_items(&mut items, self.sort);
        items
    }

    /// Item counts per category, for section badges
    pub fn category_counts(&self) -> BTreeMap<&str, usize> {
        self.catalog.count_by_category()
    }

    // --- view preference ---

    pub fn view(&self) -> ViewMode {
        self.view
    }

    pub fn set_view(&mut self, mode: ViewMode) {
        self.view = mode;
        write_or_report(self.store.as_mut(), keys::VIEW_MODE, &mode, self.events.as_ref());
        self.events.emit(LibraryEvent::ViewModeChanged {
            mode: mode.to_string(),
        });
    }

    // --- presets ---

    pub fn presets(&self) -> &[FilterPreset] {
        self.presets.all()
    }

    /// Snapshot the current filter state under `name`
    pub fn save_preset(&mut self, name: &str) {
        self.presets.save(
            name,
            self.filter.clone(),
            self.store.as_mut(),
            self.events.as_ref(),
        );
    }

    /// Replace the filter state with a saved preset
    pub fn apply_preset(&mut self, name: &str) -> Result<(), PresetError> {
        let preset = self
            .presets
            .find(name)
            .ok_or_else(|| PresetError::NotFound {
                name: name.to_string(),
            })?;

        let filters = preset.filters.clone();
        let preset_name = preset.name.clone();
        self.set_filter(filters);
        self.events
            .emit(LibraryEvent::PresetApplied { name: preset_name });
        Ok(())
    }

    pub fn delete_preset(&mut self, name: &str) -> Result<(), PresetError> {
        self.presets
            .delete(name, self.store.as_mut(), self.events.as_ref())?;
        Ok(())
    }

    // --- playback ---

    pub fn playback(&self) -> PlaybackSnapshot {
        self.player.snapshot()
    }

    /// The current load generation, passed back with host media events
    pub fn playback_generation(&self) -> u64 {
        self.player.generation()
    }

    /// Bind an item without playing it. Returns the load generation for
    /// host media events.
    pub fn load_item(&mut self, id: u32) -> Result<u64, PlayerError> {
        self.player
            .load(id, &self.catalog, self.store.as_mut(), self.events.as_ref())
    }

    /// Play an item, or resume the active one when `id` is `None`.
    /// Playing marks the item as played.
    pub fn play(&mut self, id: Option<u32>) -> Result<u32, PlayerError> {
        if let Some(id) = id
            && self.player.current_item() != Some(id)
        {
            self.load_item(id)?;
        }

        let playing = self.player.play(&self.catalog, self.events.as_ref())?;
        self.favorites
            .mark_played(playing, self.store.as_mut(), self.events.as_ref());
        Ok(playing)
    }

    pub fn pause(&mut self) {
        self.player.pause(self.store.as_mut(), self.events.as_ref());
    }

    /// Flip between playing and paused. Returns whether playback runs now.
    pub fn toggle_play(&mut self) -> Result<bool, PlayerError> {
        let playing =
            self.player
                .toggle_play(&self.catalog, self.store.as_mut(), self.events.as_ref())?;
        if playing && let Some(id) = self.player.current_item() {
            self.favorites
                .mark_played(id, self.store.as_mut(), self.events.as_ref());
        }
        Ok(playing)
    }

    pub fn seek(&mut self, target_seconds: f64) -> Result<f64, PlayerError> {
        self.player
            .seek(target_seconds, self.store.as_mut(), self.events.as_ref())
    }

    pub fn next(&mut self) -> Result<u32, PlayerError> {
        let id = self
            .player
            .next(&self.catalog, self.store.as_mut(), self.events.as_ref())?;
        self.favorites
            .mark_played(id, self.store.as_mut(), self.events.as_ref());
        Ok(id)
    }

    pub fn prev(&mut self) -> Result<u32, PlayerError> {
        let id = self
            .player
            .prev(&self.catalog, self.store.as_mut(), self.events.as_ref())?;
        self.favorites
            .mark_played(id, self.store.as_mut(), self.events.as_ref());
        Ok(id)
    }

    pub fn set_volume(&mut self, volume: f64) -> f64 {
        self.player
            .set_volume(volume, self.store.as_mut(), self.events.as_ref())
    }

    pub fn toggle_mute(&mut self) -> f64 {
        self.player
            .toggle_mute(self.store.as_mut(), self.events.as_ref())
    }

    /// Host media-element surface: real duration became known
    pub fn media_metadata(&mut self, generation: u64, duration_seconds: f64) {
        self.player.on_metadata(generation, duration_seconds);
    }

    /// Host media-element surface: playback progressed
    pub fn media_progress(&mut self, generation: u64, position_seconds: f64) {
        self.player.on_time_update(
            generation,
            position_seconds,
            self.store.as_mut(),
            self.events.as_ref(),
        );
    }

    /// Host media-element surface: natural end of the active item.
    /// Auto-advances; the new item is marked played.
    pub fn media_ended(&mut self, generation: u64) -> Option<u32> {
        let id = self.player.on_ended(
            generation,
            &self.catalog,
            self.store.as_mut(),
            self.events.as_ref(),
        )?;
        self.favorites
            .mark_played(id, self.store.as_mut(), self.events.as_ref());
        Some(id)
    }

    /// Host media-element surface: the asset failed to load
    pub fn media_error(&mut self, generation: u64, reason: &str) {
        self.player
            .on_error(generation, reason, self.events.as_ref());
    }

    /// Page-unload analog: flush playback position to storage
    pub fn close(&mut self) {
        self.player.close(self.store.as_mut(), self.events.as_ref());
    }

    // --- visit tracking ---

    /// Record today's visit. Returns true for a returning visitor on a new
    /// day, so the host can surface a "what's new" hint. A first-ever visit
    /// gets no hint.
    pub fn record_visit(&mut self) -> bool {
        let today = chrono::Local::now().date_naive().to_string();
        let last: Option<String> =
            read_or(self.store.as_ref(), keys::LAST_VISIT, None, self.events.as_ref());

        write_or_report(self.store.as_mut(), keys::LAST_VISIT, &today, self.events.as_ref());
        last.is_some_and(|previous| previous != today)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::catalog::MediaKind;
    use crate::error::StorageError;
    use crate::events::{EventSink, NoopSink};
    use crate::filter::{CategoryFilter, YearFilter};
    use crate::player::PlaybackPhase;
    use crate::storage::JsonFileStore;

    #[derive(Default)]
    struct CollectingSink(Mutex<Vec<LibraryEvent>>);

    impl EventSink for CollectingSink {
        fn emit(&self, event: LibraryEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    /// Store whose writes always fail, for degradation tests
    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, _key: &str) -> Result<Option<serde_json::Value>, StorageError> {
            Ok(None)
        }

        fn set(&mut self, _key: &str, _value: serde_json::Value) -> Result<(), StorageError> {
            Err(StorageError::WriteFailed {
                path: std::path::PathBuf::from("/dev/full"),
                source: std::io::Error::other("quota exceeded"),
            })
        }

        fn remove(&mut self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    fn make_raw(id: u32, title: &str, year: u32) -> RawCatalogItem {
        RawCatalogItem {
            id: Some(id),
            title: Some(title.to_string()),
            kind: Some(MediaKind::Audio),
            year: Some(year),
            duration_seconds: Some(930),
            category: Some("finanças".to_string()),
            media_url: Some(format!("https://example.com/{id}.m4a")),
            ..Default::default()
        }
    }

    fn sample_raw() -> Vec<RawCatalogItem> {
        vec![
            make_raw(1, "Bitcoin: Alternativa ao Sistema Financeiro Tradicional", 2014),
            make_raw(2, "Padrões de Sucesso e Fracasso na Psicologia do Dinheiro", 2021),
            make_raw(3, "Descodificando o Código Financeiro", 2005),
            make_raw(4, "Do Templo à Tokenização dos Mercados Financeiros", 2025),
        ]
    }

    fn open_session(store: Box<dyn KeyValueStore>) -> Session {
        Session::open(sample_raw(), store, NoopSink::shared())
    }

    #[test]
    fn open_reports_skipped_entries() {
        let sink = Arc::new(CollectingSink::default());
        let mut raw = sample_raw();
        raw.push(RawCatalogItem::default());

        let session = Session::open(
            raw,
            Box::new(crate::storage::MemoryStore::new()),
            sink.clone(),
        );

        assert_eq!(session.catalog().len(), 4);
        let events = sink.0.lock().unwrap();
        assert!(events
            .iter()
            .any(|e| matches!(e, LibraryEvent::ItemSkipped { .. })));
        assert!(events.iter().any(
            |e| matches!(e, LibraryEvent::CatalogLoaded { total: 4, skipped: 1 })
        ));
    }

    #[test]
    fn user_state_survives_across_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        {
            let store = JsonFileStore::open(&path).unwrap();
            let mut session = open_session(Box::new(store));

            session.toggle_favorite(3);
            session.set_view(ViewMode::List);
            session.set_volume(0.4);
            session.play(Some(2)).unwrap();
            session.media_progress(session.playback_generation(), 75.0);
            session.close();
        }

        let store = JsonFileStore::open(&path).unwrap();
        let session = open_session(Box::new(store));

        assert!(session.is_favorite(3));
        assert_eq!(session.view(), ViewMode::List);

        let snapshot = session.playback();
        assert!((snapshot.volume - 0.4).abs() < f64::EPSILON);
        assert_eq!(snapshot.item_id, Some(2));
        assert_eq!(snapshot.phase, PlaybackPhase::Loaded);
        assert!((snapshot.position_seconds - 75.0).abs() < f64::EPSILON);
        assert!(session.favorites().is_played(2));
    }

    #[test]
    fn play_marks_the_item_played() {
        let mut session = open_session(Box::new(crate::storage::MemoryStore::new()));

        assert!(!session.favorites().is_played(1));
        session.play(Some(1)).unwrap();
        assert!(session.favorites().is_played(1));
    }

    #[test]
    fn play_resumes_without_reloading_the_same_item() {
        let mut session = open_session(Box::new(crate::storage::MemoryStore::new()));

        session.play(Some(2)).unwrap();
        session.seek(100.0).unwrap();
        session.pause();

        // Playing the already-active item must not reset the playhead.
        session.play(Some(2)).unwrap();
        assert!((session.playback().position_seconds - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn filtered_combines_filter_and_sort() {
        let mut session = open_session(Box::new(crate::storage::MemoryStore::new()));

        session.set_filter(FilterState {
            year: YearFilter::After,
            ..Default::default()
        });
        session.set_sort(SortKey::YearDesc);

        let ids: Vec<u32> = session.filtered().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![4, 2]);
    }

    #[test]
    fn favorites_view_lists_in_favorited_order() {
        let mut session = open_session(Box::new(crate::storage::MemoryStore::new()));

        session.toggle_favorite(4);
        session.toggle_favorite(1);
        session.set_filter(FilterState {
            category: CategoryFilter::Favorites,
            ..Default::default()
        });

        let ids: Vec<u32> = session.filtered().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![4, 1]);
    }

    #[test]
    fn preset_roundtrip_restores_the_filter() {
        let mut session = open_session(Box::new(crate::storage::MemoryStore::new()));

        let wanted = FilterState {
            category: CategoryFilter::Category("finanças".to_string()),
            year: YearFilter::After,
            ..Default::default()
        };
        session.set_filter(wanted.clone());
        session.save_preset("recentes de finanças");

        session.clear_filter();
        assert!(session.filter_state().is_default());

        session.apply_preset("recentes de finanças").unwrap();
        assert_eq!(session.filter_state(), &wanted);

        assert!(matches!(
            session.apply_preset("fantasma"),
            Err(PresetError::NotFound { .. })
        ));
    }

    #[test]
    fn record_visit_flags_returning_visitors_on_a_new_day() {
        let mut store = crate::storage::MemoryStore::new();
        crate::storage::StoreExt::set_value(&mut store, keys::LAST_VISIT, &"2024-01-01").unwrap();

        let mut session = Session::open(sample_raw(), Box::new(store), NoopSink::shared());
        assert!(session.record_visit());
        // Same day now: no hint.
        assert!(!session.record_visit());

        // A first-ever visit gets no hint either.
        let mut fresh = open_session(Box::new(crate::storage::MemoryStore::new()));
        assert!(!fresh.record_visit());
    }

    #[test]
    fn failed_writes_degrade_to_memory_and_are_reported() {
        let sink = Arc::new(CollectingSink::default());
        let mut session = Session::open(sample_raw(), Box::new(FailingStore), sink.clone());

        assert!(session.toggle_favorite(3));
        assert!(session.is_favorite(3));

        let events = sink.0.lock().unwrap();
        assert!(events
            .iter()
            .any(|e| matches!(e, LibraryEvent::StorageFailed { .. })));
        assert!(events.iter().any(|e| matches!(
            e,
            LibraryEvent::FavoriteToggled {
                id: 3,
                favorited: true,
                ..
            }
        )));
    }

    #[test]
    fn next_from_session_wraps_and_marks_played() {
        let mut session = open_session(Box::new(crate::storage::MemoryStore::new()));

        session.play(Some(4)).unwrap();
        assert_eq!(session.next().unwrap(), 1);
        assert!(session.favorites().is_played(1));
        assert_eq!(session.playback().phase, PlaybackPhase::Playing);
    }

    #[test]
    fn media_ended_auto_advances_and_marks_the_new_item() {
        let mut session = open_session(Box::new(crate::storage::MemoryStore::new()));

        session.play(Some(2)).unwrap();
        let generation = session.playback_generation();

        assert_eq!(session.media_ended(generation), Some(3));
        assert!(session.favorites().is_played(3));
        assert_eq!(session.playback().phase, PlaybackPhase::Playing);
    }
}
