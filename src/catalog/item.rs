use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ValidationError;

/// Items published before this year count as classics
const CLASSIC_YEAR_CUTOFF: u32 = 2000;

/// What kind of media an item is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Ebook,
    Video,
}

impl MediaKind {
    /// Lowercase name, used for tag derivation and display
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Audio => "audio",
            MediaKind::Ebook => "ebook",
            MediaKind::Video => "video",
        }
    }
}

/// A validated catalog entry.
///
/// Read-only after load; every field the filter and player layers consult
/// is resolved here, including the precomputed search haystack.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogItem {
    pub id: u32,
    pub title: String,
    pub subtitle: Option<String>,
    pub author: String,
    pub kind: MediaKind,
    pub category: String,
    pub year: u32,
    /// Running time for audio/video items
    pub duration_seconds: Option<u32>,
    /// Page count for document items
    pub pages: Option<u32>,
    pub downloads: u32,
    pub recent: bool,
    pub classic: bool,
    pub language: String,
    pub item_type: String,
    pub media_url: Url,
    pub tags: Vec<String>,
    /// Lowercase haystack built from title, subtitle, author and tags
    pub search_text: String,
}

impl CatalogItem {
    /// Whether the item counts as a classic (explicit flag or pre-2000)
    pub fn is_classic(&self) -> bool {
        self.classic || self.year < CLASSIC_YEAR_CUTOFF
    }

    /// Case-insensitive substring match against the search haystack.
    /// An empty term matches everything.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty() || self.search_text.contains(&term)
    }
}

/// A catalog entry as it appears in the raw data source, before validation.
///
/// Every field is permissive so one malformed entry cannot fail the whole
/// document parse; `validate_item` decides what is usable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCatalogItem {
    #[serde(default)]
    pub id: Option<u32>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default)]
    pub kind: Option<MediaKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub year: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloads: Option<u32>,
    #[serde(default)]
    pub recent: bool,
    #[serde(default)]
    pub classic: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Validate a raw entry into a catalog item.
///
/// `index` is the entry's position in the raw document, used for error
/// context only. Missing display metadata falls back to the catalog's
/// conventional defaults; missing identity or asset fields reject the entry.
pub fn validate_item(index: usize, raw: RawCatalogItem) -> Result<CatalogItem, ValidationError> {
    let id = raw.id.ok_or(ValidationError::MissingField { index, field: "id" })?;

    let title = raw
        .title
        .filter(|t| !t.trim().is_empty())
        .ok_or(ValidationError::MissingField {
            index,
            field: "title",
        })?;

    let kind = raw.kind.ok_or(ValidationError::MissingField {
        index,
        field: "kind",
    })?;

    let year = raw.year.ok_or(ValidationError::MissingField {
        index,
        field: "year",
    })?;

    let media_url = raw.media_url.ok_or(ValidationError::MissingField {
        index,
        field: "media_url",
    })?;
    let media_url = Url::parse(&media_url).map_err(|e| ValidationError::InvalidMediaUrl {
        index,
        reason: e.to_string(),
    })?;

    let author = raw
        .author
        .filter(|a| !a.trim().is_empty())
        .unwrap_or_else(|| "Autor desconhecido".to_string());
    let category = raw
        .category
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| "outros".to_string());
    let language = raw.language.unwrap_or_else(|| "portugues".to_string());
    let item_type = raw.item_type.unwrap_or_else(|| "resumo".to_string());

    let tags = if raw.tags.is_empty() {
        vec![
            category.to_lowercase(),
            kind.as_str().to_string(),
            author.to_lowercase(),
        ]
    } else {
        raw.tags.iter().map(|t| t.trim().to_lowercase()).collect()
    };

    let search_text = format!(
        "{} {} {} {}",
        title,
        raw.subtitle.as_deref().unwrap_or(""),
        author,
        tags.join(" ")
    )
    .to_lowercase();

    Ok(CatalogItem {
        id,
        title,
        subtitle: raw.subtitle,
        author,
        kind,
        category,
        year,
        duration_seconds: raw.duration_seconds,
        pages: raw.pages,
        downloads: raw.downloads.unwrap_or(0),
        recent: raw.recent,
        classic: raw.classic,
        language,
        item_type,
        media_url,
        tags,
        search_text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_raw(id: u32, title: &str) -> RawCatalogItem {
        RawCatalogItem {
            id: Some(id),
            title: Some(title.to_string()),
            kind: Some(MediaKind::Audio),
            year: Some(2014),
            media_url: Some("https://example.com/ep.m4a".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn validates_a_minimal_entry_with_defaults() {
        let item = validate_item(0, make_raw(1, "Bitcoin")).unwrap();

        assert_eq!(item.id, 1);
        assert_eq!(item.author, "Autor desconhecido");
        assert_eq!(item.category, "outros");
        assert_eq!(item.language, "portugues");
        assert_eq!(item.item_type, "resumo");
        assert_eq!(item.downloads, 0);
        assert!(!item.recent);
    }

    #[test]
    fn rejects_entry_without_id() {
        let mut raw = make_raw(1, "Sem id");
        raw.id = None;

        assert_eq!(
            validate_item(3, raw),
            Err(ValidationError::MissingField { index: 3, field: "id" })
        );
    }

    #[test]
    fn rejects_blank_title() {
        let mut raw = make_raw(1, "   ");

        assert_eq!(
            validate_item(0, raw.clone()),
            Err(ValidationError::MissingField {
                index: 0,
                field: "title"
            })
        );

        raw.title = None;
        assert!(validate_item(0, raw).is_err());
    }

    #[test]
    fn rejects_unparsable_media_url() {
        let mut raw = make_raw(1, "Quebrado");
        raw.media_url = Some("not a url".to_string());

        assert!(matches!(
            validate_item(2, raw),
            Err(ValidationError::InvalidMediaUrl { index: 2, .. })
        ));
    }

    #[test]
    fn derives_tags_from_category_kind_and_author() {
        let mut raw = make_raw(7, "Psicologia do Dinheiro");
        raw.author = Some("Morgan Housel".to_string());
        raw.category = Some("finanças".to_string());

        let item = validate_item(0, raw).unwrap();
        assert_eq!(
            item.tags,
            vec!["finanças".to_string(), "audio".to_string(), "morgan housel".to_string()]
        );
    }

    #[test]
    fn explicit_tags_are_lowercased_not_replaced() {
        let mut raw = make_raw(7, "Título");
        raw.tags = vec!["Investimento".to_string(), " Blockchain ".to_string()];

        let item = validate_item(0, raw).unwrap();
        assert_eq!(item.tags, vec!["investimento", "blockchain"]);
    }

    #[test]
    fn search_matches_title_case_insensitively() {
        let item = validate_item(
            0,
            make_raw(1, "Bitcoin: Alternativa ao Sistema Financeiro Tradicional"),
        )
        .unwrap();

        assert!(item.matches_search("BITCOIN"));
        assert!(item.matches_search("  bitcoin "));
        assert!(!item.matches_search("imobiliário"));
        assert!(item.matches_search(""));
    }

    #[test]
    fn search_matches_author_and_tags() {
        let mut raw = make_raw(2, "Padrões de Sucesso");
        raw.author = Some("Morgan Housel".to_string());
        raw.tags = vec!["comportamento".to_string()];

        let item = validate_item(0, raw).unwrap();
        assert!(item.matches_search("housel"));
        assert!(item.matches_search("comportamento"));
    }

    #[test]
    fn classic_follows_flag_or_year() {
        let mut raw = make_raw(3, "Os Segredos da Mente Milionária");
        raw.year = Some(1999);
        assert!(validate_item(0, raw.clone()).unwrap().is_classic());

        raw.year = Some(2005);
        assert!(!validate_item(0, raw.clone()).unwrap().is_classic());

        raw.classic = true;
        assert!(validate_item(0, raw).unwrap().is_classic());
    }
}
