mod item;
mod load;

pub use item::{CatalogItem, MediaKind, RawCatalogItem, validate_item};
pub use load::{Catalog, parse_catalog, read_catalog_file};
