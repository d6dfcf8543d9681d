pub mod catalog;
pub mod error;
pub mod events;
pub mod favorites;
pub mod filter;
pub mod player;
pub mod session;
pub mod storage;

// Re-export main types for convenience
pub use catalog::{Catalog, CatalogItem, MediaKind, RawCatalogItem, parse_catalog, read_catalog_file};
pub use error::{CatalogError, PlayerError, PresetError, StorageError, ValidationError};
pub use events::{EventSink, LibraryEvent, NoopSink, SharedEventSink};
pub use favorites::FavoritesStore;
pub use filter::{
    CategoryFilter, FilterPreset, FilterState, PagesFilter, PopularityFilter, SortKey, YearFilter,
};
pub use player::{DEFAULT_VOLUME, PlaybackPhase, PlaybackSnapshot, PlayerController};
pub use session::{Session, ViewMode};
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore, StoreExt};
