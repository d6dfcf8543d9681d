use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::catalog::CatalogItem;

/// Sort key applied after filtering.
///
/// `Relevance` is a stable passthrough: search matching is boolean, so
/// there is no score to order by and the filtered order stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SortKey {
    #[default]
    Relevance,
    TitleAsc,
    TitleDesc,
    AuthorAsc,
    YearAsc,
    YearDesc,
    DownloadsAsc,
    DownloadsDesc,
    PagesAsc,
    PagesDesc,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SortKey::Relevance => "relevance",
            SortKey::TitleAsc => "title-asc",
            SortKey::TitleDesc => "title-desc",
            SortKey::AuthorAsc => "author-asc",
            SortKey::YearAsc => "year-asc",
            SortKey::YearDesc => "year-desc",
            SortKey::DownloadsAsc => "downloads-asc",
            SortKey::DownloadsDesc => "downloads-desc",
            SortKey::PagesAsc => "pages-asc",
            SortKey::PagesDesc => "pages-desc",
        };
        write!(f, "{s}")
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "relevance" => Ok(SortKey::Relevance),
            "title-asc" => Ok(SortKey::TitleAsc),
            "title-desc" => Ok(SortKey::TitleDesc),
            "author-asc" => Ok(SortKey::AuthorAsc),
            "year-asc" => Ok(SortKey::YearAsc),
            "year-desc" => Ok(SortKey::YearDesc),
            "downloads-asc" => Ok(SortKey::DownloadsAsc),
            "downloads-desc" => Ok(SortKey::DownloadsDesc),
            "pages-asc" => Ok(SortKey::PagesAsc),
            "pages-desc" => Ok(SortKey::PagesDesc),
            other => Err(format!("invalid sort key '{other}'")),
        }
    }
}

impl From<String> for SortKey {
    fn from(s: String) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl From<SortKey> for String {
    fn from(k: SortKey) -> Self {
        k.to_string()
    }
}

fn cmp_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// Sort a filtered view in place.
///
/// The sort is stable: ties keep their incoming (catalog or favorites)
/// order. Items without a page count sort as zero pages.
pub fn sort_items(items: &mut [&CatalogItem], key: SortKey) {
    match key {
        SortKey::Relevance => {}
        SortKey::TitleAsc => items.sort_by(|a, b| cmp_text(&a.title, &b.title)),
        SortKey::TitleDesc => items.sort_by(|a, b| cmp_text(&b.title, &a.title)),
        SortKey::AuthorAsc => items.sort_by(|a, b| cmp_text(&a.author, &b.author)),
        SortKey::YearAsc => items.sort_by_key(|i| i.year),
        SortKey::YearDesc => items.sort_by(|a, b| b.year.cmp(&a.year)),
        SortKey::DownloadsAsc => items.sort_by_key(|i| i.downloads),
        SortKey::DownloadsDesc => items.sort_by(|a, b| b.downloads.cmp(&a.downloads)),
        SortKey::PagesAsc => items.sort_by_key(|i| i.pages.unwrap_or(0)),
        SortKey::PagesDesc => {
            items.sort_by(|a, b| b.pages.unwrap_or(0).cmp(&a.pages.unwrap_or(0)))
        }
    }
}
