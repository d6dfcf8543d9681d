mod preset;
mod sort;
mod state;

pub use preset::{FilterPreset, PresetStore};
pub use sort::{SortKey, sort_items};
pub use state::{CategoryFilter, FilterState, PagesFilter, PopularityFilter, YearFilter, apply};
