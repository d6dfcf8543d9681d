use crate::events::{EventSink, LibraryEvent};
use crate::storage::{KeyValueStore, keys, read_or, write_or_report};

/// User-marked item sets: favorites and the played history.
///
/// Both lists keep insertion order (first-marked-first) and persist in full
/// on every mutation. Ids are not validated against the catalog; an id the
/// catalog no longer knows simply never matches anything downstream.
#[derive(Debug, Default, Clone)]
pub struct FavoritesStore {
    favorites: Vec<u32>,
    played: Vec<u32>,
}

impl FavoritesStore {
    /// Restore both sets from storage. Corrupt or missing entries degrade
    /// to empty sets; the failure is reported through the sink.
    pub fn load(store: &dyn KeyValueStore, events: &dyn EventSink) -> Self {
        Self {
            favorites: read_or(store, keys::FAVORITES, Vec::new(), events),
            played: read_or(store, keys::PLAYED, Vec::new(), events),
        }
    }

    pub fn is_favorite(&self, id: u32) -> bool {
        self.favorites.contains(&id)
    }

    /// Flip the favorited state of `id` and persist the full set.
    /// Returns the new state (true = now favorited).
    pub fn toggle(
        &mut self,
        id: u32,
        store: &mut dyn KeyValueStore,
        events: &dyn EventSink,
    ) -> bool {
        let favorited = match self.favorites.iter().position(|&f| f == id) {
            Some(pos) => {
                self.favorites.remove(pos);
                false
            }
            None => {
                self.favorites.push(id);
                true
            }
        };

        write_or_report(store, keys::FAVORITES, &self.favorites, events);
        events.emit(LibraryEvent::FavoriteToggled {
            id,
            favorited,
            total_favorites: self.favorites.len(),
        });

        favorited
    }

    /// Favorited ids in insertion order (first-favorited-first)
    pub fn list(&self) -> &[u32] {
        &self.favorites
    }

    pub fn len(&self) -> usize {
        self.favorites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.favorites.is_empty()
    }

    pub fn is_played(&self, id: u32) -> bool {
        self.played.contains(&id)
    }

    /// Record that `id` has been played. Returns true when newly marked.
    pub fn mark_played(
        &mut self,
        id: u32,
        store: &mut dyn KeyValueStore,
        events: &dyn EventSink,
    ) -> bool {
        if self.played.contains(&id) {
            return false;
        }

        self.played.push(id);
        write_or_report(store, keys::PLAYED, &self.played, events);
        events.emit(LibraryEvent::ItemMarkedPlayed { id });
        true
    }

    /// Played ids in insertion order
    pub fn played(&self) -> &[u32] {
        &self.played
    }
}
