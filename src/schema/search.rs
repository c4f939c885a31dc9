//! Search filters and sort orders for listing endpoints.

use super::enums::{ContentRating, MultiMode, PublicationDemographic, SortOrder, Status};
use crate::error::RequestError;
use crate::query::{QueryParams, QueryValue};
use chrono::{DateTime, Utc};

pub const MIN_YEAR: u16 = 1;
pub const MAX_YEAR: u16 = 9999;
pub const MAX_CHAPTER_TITLE_LEN: usize = 255;
pub const MAX_CHAPTER_NUMBER_LEN: usize = 8;

/// Sort order for manga searches; sent as `order[field]=asc|desc`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MangaSortOrder {
    pub created_at: Option<SortOrder>,
    pub updated_at: Option<SortOrder>,
}

impl MangaSortOrder {
    fn to_query_value(&self) -> Option<QueryValue> {
        order_map(&[("createdAt", self.created_at), ("updatedAt", self.updated_at)])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChapterSortOrder {
    pub created_at: Option<SortOrder>,
    pub updated_at: Option<SortOrder>,
    pub publish_at: Option<SortOrder>,
    pub volume: Option<SortOrder>,
    pub chapter: Option<SortOrder>,
}

impl ChapterSortOrder {
    fn to_query_value(&self) -> Option<QueryValue> {
        order_map(&[
            ("createdAt", self.created_at),
            ("updatedAt", self.updated_at),
            ("publishAt", self.publish_at),
            ("volume", self.volume),
            ("chapter", self.chapter),
        ])
    }
}

fn order_map(fields: &[(&str, Option<SortOrder>)]) -> Option<QueryValue> {
    let entries: Vec<(String, QueryValue)> = fields
        .iter()
        .filter_map(|(field, order)| order.map(|o| (field.to_string(), QueryValue::from(o))))
        .collect();
    if entries.is_empty() {
        None
    } else {
        Some(QueryValue::Map(entries))
    }
}

/// Filters for `GET /manga`. Ids may be given for authors, artists, tags
/// and manga.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MangaSearch {
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub artists: Vec<String>,
    pub year: Option<u16>,
    pub included_tags: Vec<String>,
    pub included_tags_mode: Option<MultiMode>,
    pub excluded_tags: Vec<String>,
    pub excluded_tags_mode: Option<MultiMode>,
    pub status: Vec<Status>,
    pub original_language: Vec<String>,
    pub publication_demographic: Vec<PublicationDemographic>,
    pub ids: Vec<String>,
    pub content_rating: Vec<ContentRating>,
    pub created_at_since: Option<DateTime<Utc>>,
    pub updated_at_since: Option<DateTime<Utc>>,
    pub order: Option<MangaSortOrder>,
}

impl MangaSearch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), RequestError> {
        if let Some(year) = self.year {
            if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
                return Err(RequestError::InvalidArgument {
                    name: "year",
                    reason: format!("must be between {MIN_YEAR} and {MAX_YEAR}, got {year}"),
                });
            }
        }
        Ok(())
    }

    pub fn to_query(&self) -> QueryParams {
        let mut params = QueryParams::new()
            .with("title", self.title.clone())
            .with("authors", self.authors.clone())
            .with("artists", self.artists.clone())
            .with("year", self.year)
            .with("includedTags", self.included_tags.clone())
            .with("includedTagsMode", self.included_tags_mode)
            .with("excludedTags", self.excluded_tags.clone())
            .with("excludedTagsMode", self.excluded_tags_mode)
            .with("status", self.status.clone())
            .with("originalLanguage", self.original_language.clone())
            .with("publicationDemographic", self.publication_demographic.clone())
            .with("ids", self.ids.clone())
            .with("contentRating", self.content_rating.clone())
            .with("createdAtSince", self.created_at_since)
            .with("updatedAtSince", self.updated_at_since);
        if let Some(order) = self.order.as_ref().and_then(MangaSortOrder::to_query_value) {
            params.insert("order", order);
        }
        params
    }
}

/// Filters for `GET /chapter`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChapterSearch {
    pub title: Option<String>,
    pub manga: Option<String>,
    pub uploader: Option<String>,
    pub volume: Option<String>,
    pub chapter: Option<String>,
    pub translated_language: Vec<String>,
    pub ids: Vec<String>,
    pub groups: Vec<String>,
    pub created_at_since: Option<DateTime<Utc>>,
    pub updated_at_since: Option<DateTime<Utc>>,
    pub publish_at_since: Option<DateTime<Utc>>,
    pub order: Option<ChapterSortOrder>,
}

impl ChapterSearch {
    pub fn for_manga(manga: impl Into<String>) -> Self {
        Self {
            manga: Some(manga.into()),
            ..Self::default()
        }
    }

    pub fn to_query(&self) -> QueryParams {
        let mut params = QueryParams::new()
            .with("title", self.title.clone())
            .with("manga", self.manga.clone())
            .with("uploader", self.uploader.clone())
            .with("volume", self.volume.clone())
            .with("chapter", self.chapter.clone())
            .with("translatedLanguage", self.translated_language.clone())
            .with("ids", self.ids.clone())
            .with("groups", self.groups.clone())
            .with("createdAtSince", self.created_at_since)
            .with("updatedAtSince", self.updated_at_since)
            .with("publishAtSince", self.publish_at_since);
        if let Some(order) = self.order.as_ref().and_then(ChapterSortOrder::to_query_value) {
            params.insert("order", order);
        }
        params
    }
}
