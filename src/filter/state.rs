use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, CatalogItem};
use crate::favorites::FavoritesStore;

/// Downloads threshold for the "mais baixados" popularity bucket
const POPULAR_DOWNLOADS_MIN: u32 = 50;

/// The category dimension of a filter.
///
/// `Favorites` is special: it bypasses every other dimension and returns
/// the favorites list in its own order (see [`apply`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CategoryFilter {
    #[default]
    All,
    Favorites,
    Recent,
    Category(String),
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => write!(f, "todos"),
            CategoryFilter::Favorites => write!(f, "favoritos"),
            CategoryFilter::Recent => write!(f, "recentes"),
            CategoryFilter::Category(c) => write!(f, "{c}"),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "todos" | "all" => CategoryFilter::All,
            "favoritos" => CategoryFilter::Favorites,
            "recentes" => CategoryFilter::Recent,
            other => CategoryFilter::Category(other.to_string()),
        })
    }
}

impl From<String> for CategoryFilter {
    fn from(s: String) -> Self {
        s.parse().expect("category parse is infallible")
    }
}

impl From<CategoryFilter> for String {
    fn from(c: CategoryFilter) -> Self {
        c.to_string()
    }
}

/// Year bucket: everything, pre-2000, post-2020, or one exact year
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum YearFilter {
    #[default]
    All,
    Before,
    After,
    Exact(u32),
}

impl YearFilter {
    fn matches(&self, year: u32) -> bool {
        match self {
            YearFilter::All => true,
            YearFilter::Before => year < 2000,
            YearFilter::After => year > 2020,
            YearFilter::Exact(y) => year == *y,
        }
    }
}

impl fmt::Display for YearFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YearFilter::All => write!(f, "all"),
            YearFilter::Before => write!(f, "before"),
            YearFilter::After => write!(f, "after"),
            YearFilter::Exact(y) => write!(f, "{y}"),
        }
    }
}

impl FromStr for YearFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(YearFilter::All),
            "before" => Ok(YearFilter::Before),
            "after" => Ok(YearFilter::After),
            other => other
                .parse()
                .map(YearFilter::Exact)
                .map_err(|_| format!("invalid year filter '{other}'")),
        }
    }
}

impl From<String> for YearFilter {
    fn from(s: String) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl From<YearFilter> for String {
    fn from(y: YearFilter) -> Self {
        y.to_string()
    }
}

/// Page-count buckets, closed except for the open-ended last one
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PagesFilter {
    #[default]
    All,
    P1To10,
    P11To20,
    P21To30,
    P31To50,
    P51Plus,
}

impl PagesFilter {
    fn matches(&self, pages: u32) -> bool {
        match self {
            PagesFilter::All => true,
            PagesFilter::P1To10 => (1..=10).contains(&pages),
            PagesFilter::P11To20 => (11..=20).contains(&pages),
            PagesFilter::P21To30 => (21..=30).contains(&pages),
            PagesFilter::P31To50 => (31..=50).contains(&pages),
            PagesFilter::P51Plus => pages > 50,
        }
    }
}

impl fmt::Display for PagesFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PagesFilter::All => "all",
            PagesFilter::P1To10 => "1-10",
            PagesFilter::P11To20 => "11-20",
            PagesFilter::P21To30 => "21-30",
            PagesFilter::P31To50 => "31-50",
            PagesFilter::P51Plus => "51+",
        };
        write!(f, "{s}")
    }
}

impl FromStr for PagesFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(PagesFilter::All),
            "1-10" => Ok(PagesFilter::P1To10),
            "11-20" => Ok(PagesFilter::P11To20),
            "21-30" => Ok(PagesFilter::P21To30),
            "31-50" => Ok(PagesFilter::P31To50),
            "51+" => Ok(PagesFilter::P51Plus),
            other => Err(format!("invalid pages filter '{other}'")),
        }
    }
}

impl From<String> for PagesFilter {
    fn from(s: String) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl From<PagesFilter> for String {
    fn from(p: PagesFilter) -> Self {
        p.to_string()
    }
}

/// Popularity dimension: download volume, editorial recency, or classics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PopularityFilter {
    #[default]
    All,
    MostDownloaded,
    Recent,
    Classics,
}

impl PopularityFilter {
    fn matches(&self, item: &CatalogItem) -> bool {
        match self {
            PopularityFilter::All => true,
            PopularityFilter::MostDownloaded => item.downloads >= POPULAR_DOWNLOADS_MIN,
            PopularityFilter::Recent => item.recent,
            PopularityFilter::Classics => item.is_classic(),
        }
    }
}

impl fmt::Display for PopularityFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PopularityFilter::All => "all",
            PopularityFilter::MostDownloaded => "mais-baixados",
            PopularityFilter::Recent => "recentes",
            PopularityFilter::Classics => "classicos",
        };
        write!(f, "{s}")
    }
}

impl FromStr for PopularityFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(PopularityFilter::All),
            "mais-baixados" => Ok(PopularityFilter::MostDownloaded),
            "recentes" => Ok(PopularityFilter::Recent),
            "classicos" => Ok(PopularityFilter::Classics),
            other => Err(format!("invalid popularity filter '{other}'")),
        }
    }
}

impl From<String> for PopularityFilter {
    fn from(s: String) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl From<PopularityFilter> for String {
    fn from(p: PopularityFilter) -> Self {
        p.to_string()
    }
}

/// The full set of filter selections.
///
/// Dimensions compose conjunctively; the default state matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterState {
    pub category: CategoryFilter,
    pub search_term: String,
    pub year: YearFilter,
    pub pages: PagesFilter,
    pub language: Option<String>,
    pub item_type: Option<String>,
    pub popularity: PopularityFilter,
}

impl FilterState {
    /// Whether every dimension is at its match-all default
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Conjunction of all dimensions for a single item.
    ///
    /// `Favorites` is not a per-item predicate; [`apply`] resolves it
    /// against the favorites list before this is consulted.
    pub fn matches(&self, item: &CatalogItem) -> bool {
        let category_ok = match &self.category {
            CategoryFilter::All | CategoryFilter::Favorites => true,
            CategoryFilter::Recent => item.recent,
            CategoryFilter::Category(c) => item.category == *c,
        };

        category_ok
            && self.year.matches(item.year)
            && self.pages.matches(item.pages.unwrap_or(0))
            && self
                .language
                .as_ref()
                .is_none_or(|lang| item.language == *lang)
            && self
                .item_type
                .as_ref()
                .is_none_or(|t| item.item_type == *t)
            && self.popularity.matches(item)
            && item.matches_search(&self.search_term)
    }
}

/// Apply a filter state over a catalog, producing the visible items.
///
/// Pure function of its inputs. With `Favorites` selected the result is
/// the favorites list resolved against the catalog, in favorites order,
/// every other dimension ignored; otherwise items keep catalog order.
pub fn apply<'a>(
    catalog: &'a Catalog,
    favorites: &FavoritesStore,
    state: &FilterState,
) -> Vec<&'a CatalogItem> {
    if state.category == CategoryFilter::Favorites {
        return favorites
            .list()
            .iter()
            .filter_map(|&id| catalog.get(id))
            .collect();
    }

    catalog
        .items()
        .iter()
        .filter(|item| state.matches(item))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, RawCatalogItem};
    use crate::events::NoopSink;
    use crate::storage::MemoryStore;

    fn make_raw(id: u32, title: &str, year: u32) -> RawCatalogItem {
        RawCatalogItem {
            id: Some(id),
            title: Some(title.to_string()),
            kind: Some(crate::catalog::MediaKind::Audio),
            year: Some(year),
            category: Some("finanças".to_string()),
            media_url: Some(format!("https://example.com/{id}.m4a")),
            ..Default::default()
        }
    }

    fn sample_catalog() -> Catalog {
        let raw = vec![
            make_raw(1, "Bitcoin: Alternativa ao Sistema Financeiro Tradicional", 2014),
            make_raw(2, "Padrões de Sucesso e Fracasso na Psicologia do Dinheiro", 2021),
            make_raw(3, "Descodificando o Código Financeiro", 2005),
            make_raw(4, "Do Templo à Tokenização dos Mercados Financeiros", 2025),
        ];
        let (catalog, skipped) = Catalog::load(raw);
        assert!(skipped.is_empty());
        catalog
    }

    fn ids(items: &[&crate::catalog::CatalogItem]) -> Vec<u32> {
        items.iter().map(|i| i.id).collect()
    }

    #[test]
    fn default_state_matches_everything_in_catalog_order() {
        let catalog = sample_catalog();
        let favorites = FavoritesStore::default();

        let result = apply(&catalog, &favorites, &FilterState::default());
        assert_eq!(ids(&result), vec![1, 2, 3, 4]);
    }

    #[test]
    fn apply_is_idempotent() {
        let catalog = sample_catalog();
        let favorites = FavoritesStore::default();
        let state = FilterState {
            search_term: "financeiro".to_string(),
            ..Default::default()
        };

        let once = ids(&apply(&catalog, &favorites, &state));
        let twice = ids(&apply(&catalog, &favorites, &state));
        assert_eq!(once, twice);
    }

    #[test]
    fn year_buckets_before_and_after() {
        // Years in the sample are [2014, 2021, 2005, 2025].
        let catalog = sample_catalog();
        let favorites = FavoritesStore::default();

        let before = FilterState {
            year: YearFilter::Before,
            ..Default::default()
        };
        assert!(apply(&catalog, &favorites, &before).is_empty());

        let after = FilterState {
            year: YearFilter::After,
            ..Default::default()
        };
        assert_eq!(ids(&apply(&catalog, &favorites, &after)), vec![2, 4]);

        let exact = FilterState {
            year: YearFilter::Exact(2005),
            ..Default::default()
        };
        assert_eq!(ids(&apply(&catalog, &favorites, &exact)), vec![3]);
    }

    #[test]
    fn pages_buckets_use_closed_boundaries() {
        assert!(PagesFilter::P1To10.matches(1));
        assert!(PagesFilter::P1To10.matches(10));
        assert!(!PagesFilter::P1To10.matches(11));
        assert!(PagesFilter::P31To50.matches(50));
        assert!(!PagesFilter::P31To50.matches(51));
        assert!(PagesFilter::P51Plus.matches(51));
        assert!(!PagesFilter::P51Plus.matches(50));
        // Items without a page count never land in a bucket.
        assert!(!PagesFilter::P1To10.matches(0));
    }

    #[test]
    fn search_term_bitcoin_matches_exactly_item_one() {
        let catalog = sample_catalog();
        let favorites = FavoritesStore::default();

        let state = FilterState {
            search_term: "Bitcoin".to_string(),
            ..Default::default()
        };
        assert_eq!(ids(&apply(&catalog, &favorites, &state)), vec![1]);
    }

    #[test]
    fn dimensions_compose_conjunctively() {
        let catalog = sample_catalog();
        let favorites = FavoritesStore::default();

        // "financeiro" matches items 1, 3 and 4; the year bucket keeps only 4.
        let state = FilterState {
            search_term: "financeiro".to_string(),
            year: YearFilter::After,
            ..Default::default()
        };
        assert_eq!(ids(&apply(&catalog, &favorites, &state)), vec![4]);
    }

    #[test]
    fn favorites_branch_bypasses_other_dimensions() {
        let catalog = sample_catalog();
        let mut store = MemoryStore::new();
        let mut favorites = FavoritesStore::default();
        favorites.toggle(4, &mut store, &NoopSink);
        favorites.toggle(2, &mut store, &NoopSink);

        // The year filter would exclude item 4; the favorites branch ignores it.
        let state = FilterState {
            category: CategoryFilter::Favorites,
            year: YearFilter::Exact(2021),
            ..Default::default()
        };

        let result = apply(&catalog, &favorites, &state);
        assert_eq!(ids(&result), vec![4, 2]);
    }

    #[test]
    fn favorited_unknown_ids_are_silently_dropped_from_results() {
        let catalog = sample_catalog();
        let mut store = MemoryStore::new();
        let mut favorites = FavoritesStore::default();
        favorites.toggle(9999, &mut store, &NoopSink);
        favorites.toggle(1, &mut store, &NoopSink);

        let state = FilterState {
            category: CategoryFilter::Favorites,
            ..Default::default()
        };
        assert_eq!(ids(&apply(&catalog, &favorites, &state)), vec![1]);
    }

    #[test]
    fn filter_state_roundtrips_through_json() {
        let state = FilterState {
            category: CategoryFilter::Category("gestao".to_string()),
            search_term: "mercado".to_string(),
            year: YearFilter::Exact(2014),
            pages: PagesFilter::P11To20,
            language: Some("portugues".to_string()),
            item_type: None,
            popularity: PopularityFilter::Classics,
        };

        let json = serde_json::to_string(&state).unwrap();
        let back: FilterState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn unknown_stored_bucket_degrades_to_all() {
        let json = r#"{"year": "sometime", "pages": "huge", "popularity": "viral"}"#;
        let state: FilterState = serde_json::from_str(json).unwrap();

        assert_eq!(state.year, YearFilter::All);
        assert_eq!(state.pages, PagesFilter::All);
        assert_eq!(state.popularity, PopularityFilter::All);
    }

    #[test]
    fn category_filter_parses_known_values() {
        assert_eq!("todos".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
        assert_eq!(
            "favoritos".parse::<CategoryFilter>().unwrap(),
            CategoryFilter::Favorites
        );
        assert_eq!(
            "gestão".parse::<CategoryFilter>().unwrap(),
            CategoryFilter::Category("gestão".to_string())
        );
    }
}
