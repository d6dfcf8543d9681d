use std::sync::Arc;

/// Events emitted by the library engine for presentation layers to render
#[derive(Debug, Clone)]
pub enum LibraryEvent {
    /// A catalog finished loading
    CatalogLoaded { total: usize, skipped: usize },

    /// A raw catalog entry failed validation and was skipped
    ItemSkipped { reason: String },

    /// A favorite was added or removed
    FavoriteToggled {
        id: u32,
        favorited: bool,
        total_favorites: usize,
    },

    /// An item was marked as played for the first time
    ItemMarkedPlayed { id: u32 },

    /// The active filter state changed
    FilterApplied { visible: usize, total: usize },

    /// A filter preset was saved
    PresetSaved { name: String },

    /// A filter preset was applied
    PresetApplied { name: String },

    /// A filter preset was deleted
    PresetDeleted { name: String },

    /// An item was bound to the player
    PlaybackLoaded { id: u32, title: String },

    /// Playback started or resumed
    PlaybackStarted { id: u32, title: String },

    /// Playback was paused
    PlaybackPaused { id: u32, position_seconds: f64 },

    /// The active item played to its natural end
    PlaybackEnded { id: u32 },

    /// The player moved to another item (navigation or auto-advance)
    PlaybackAdvanced { from: u32, to: u32 },

    /// The active item's media failed to load
    PlaybackFailed { id: u32, reason: String },

    /// The volume setting changed
    VolumeChanged { volume: f64, muted: bool },

    /// The view mode preference changed
    ViewModeChanged { mode: String },

    /// A storage operation failed; the engine continues in memory
    StorageFailed { key: String, error: String },
}

/// Trait for observing engine events.
///
/// Implementations can render toasts, update counters, or collect
/// statistics. The engine never renders anything itself.
pub trait EventSink: Send + Sync {
    /// Receive a single event
    fn emit(&self, event: LibraryEvent);
}

/// A shared reference to an event sink
pub type SharedEventSink = Arc<dyn EventSink>;

/// An event sink that silently ignores all events.
/// Useful for tests or quiet mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&self, _event: LibraryEvent) {
        // Intentionally empty
    }
}

impl NoopSink {
    /// Create a new NoopSink wrapped in an Arc
    pub fn shared() -> SharedEventSink {
        Arc::new(Self)
    }
}
