use super::{feed, listing, require_id, require_ids, require_non_empty, strip_nulls};
use crate::client::{ApiRequest, Client, unwrap_envelope};
use crate::endpoint::{Endpoint, endpoints};
use crate::error::RequestError;
use crate::pagination::Cursor;
use crate::query::QueryParams;
use crate::schema::{
    Chapter, ContentRating, Decode, LocalizedString, MAX_YEAR, MIN_YEAR, Manga, MangaSearch,
    PublicationDemographic, ReadingStatus, ResourceId, Status, Tag, TypedResource,
};
use serde::Serialize;
use serde_json::{Value as JsonValue, json};
use std::collections::BTreeMap;

/// Attributes for creating or editing a manga.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MangaDraft {
    pub title: LocalizedString,
    pub alt_titles: Vec<LocalizedString>,
    pub description: LocalizedString,
    pub authors: Vec<String>,
    pub artists: Vec<String>,
    /// External site ids keyed by site code.
    pub links: BTreeMap<String, String>,
    pub original_language: Option<String>,
    pub year: Option<u16>,
    pub last_volume: Option<String>,
    pub last_chapter: Option<String>,
    pub publication_demographic: Option<PublicationDemographic>,
    pub status: Option<Status>,
    pub content_rating: Option<ContentRating>,
}

impl MangaDraft {
    pub fn titled(lang: &str, title: &str) -> Self {
        Self {
            title: LocalizedString::new(lang, title),
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<(), RequestError> {
        if self.title.is_empty() {
            return Err(RequestError::InvalidArgument {
                name: "title",
                reason: "at least one localized title is required".to_string(),
            });
        }
        if let Some(year) = self.year {
            if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
                return Err(RequestError::InvalidArgument {
                    name: "year",
                    reason: format!("must be between {MIN_YEAR} and {MAX_YEAR}, got {year}"),
                });
            }
        }
        if let Some(lang) = &self.original_language {
            require_non_empty("original_language", lang)?;
        }
        require_ids("authors", &self.authors)?;
        require_ids("artists", &self.artists)?;
        Ok(())
    }
}

pub struct MangaApi<'c> {
    client: &'c mut Client,
}

impl<'c> MangaApi<'c> {
    pub(super) fn new(client: &'c mut Client) -> Self {
        Self { client }
    }

    pub fn search(self, search: &MangaSearch) -> Result<Cursor<'c, Manga>, RequestError> {
        search.validate()?;
        require_ids("authors", &search.authors)?;
        require_ids("artists", &search.artists)?;
        require_ids("included_tags", &search.included_tags)?;
        require_ids("excluded_tags", &search.excluded_tags)?;
        require_ids("ids", &search.ids)?;
        let request = ApiRequest::new(endpoints::manga::SEARCH).query(search.to_query());
        Ok(listing(self.client, request))
    }

    pub fn get<I: ResourceId + ?Sized>(self, manga: &I) -> Result<Manga, RequestError> {
        let id = require_id("manga", manga)?;
        self.client
            .execute_decoded(ApiRequest::new(endpoints::manga::GET).url_param("manga", id))
    }

    pub fn delete<I: ResourceId + ?Sized>(self, manga: &I) -> Result<(), RequestError> {
        let id = require_id("manga", manga)?;
        self.client
            .execute(ApiRequest::new(endpoints::manga::DELETE).url_param("manga", id))?;
        Ok(())
    }

    pub fn follow<I: ResourceId + ?Sized>(self, manga: &I) -> Result<(), RequestError> {
        let id = require_id("manga", manga)?;
        self.client
            .execute(ApiRequest::new(endpoints::manga::FOLLOW).url_param("manga", id))?;
        Ok(())
    }

    pub fn unfollow<I: ResourceId + ?Sized>(self, manga: &I) -> Result<(), RequestError> {
        let id = require_id("manga", manga)?;
        self.client
            .execute(ApiRequest::new(endpoints::manga::UNFOLLOW).url_param("manga", id))?;
        Ok(())
    }

    /// Every tag the service knows about.
    pub fn all_tags(self) -> Result<Vec<Tag>, RequestError> {
        let payload = self.client.execute(ApiRequest::new(endpoints::manga::TAGS))?;
        let items = match payload {
            JsonValue::Array(items) => items,
            JsonValue::Object(mut object) => match object.remove("results") {
                Some(JsonValue::Array(items)) => items,
                _ => return Err(RequestError::UnexpectedShape("tag list has no results".to_string())),
            },
            other => {
                return Err(RequestError::UnexpectedShape(format!(
                    "tag list must be an array, got {other}"
                )));
            }
        };

        items
            .into_iter()
            .map(|item| Tag::decode(&unwrap_envelope(item)).map_err(RequestError::from))
            .collect()
    }

    pub fn random(self) -> Result<Manga, RequestError> {
        self.client
            .execute_decoded(ApiRequest::new(endpoints::manga::RANDOM))
    }

    pub fn create(self, draft: &MangaDraft) -> Result<Manga, RequestError> {
        draft.validate()?;
        let mut body = strip_nulls(serde_json::to_value(draft)?);
        body["version"] = json!(1);
        self.client
            .execute_decoded(ApiRequest::new(endpoints::manga::CREATE).body(body))
    }

    /// Replaces a manga's attributes. Unset optional fields are sent as
    /// null and cleared on the service.
    pub fn edit(self, manga: &Manga, draft: &MangaDraft) -> Result<Manga, RequestError> {
        draft.validate()?;
        let version = manga.version().ok_or_else(|| RequestError::InvalidArgument {
            name: "manga",
            reason: "a version is required to edit".to_string(),
        })?;
        let mut body = serde_json::to_value(draft)?;
        body["version"] = json!(version);

        self.client.execute_decoded(
            ApiRequest::new(endpoints::manga::EDIT)
                .url_param("manga", require_id("manga", manga)?)
                .body(body)
                .keep_null(true),
        )
    }

    /// Chapters of a manga, optionally limited to translation languages.
    pub fn feed<I: ResourceId + ?Sized>(
        self,
        manga: &I,
        languages: &[&str],
    ) -> Result<Cursor<'c, Chapter>, RequestError> {
        let id = require_id("manga", manga)?;
        for lang in languages {
            require_non_empty("languages", lang)?;
        }
        let query = QueryParams::new().with("translatedLanguage", languages.to_vec());
        Ok(feed(
            self.client,
            ApiRequest::new(endpoints::manga::FEED)
                .url_param("manga", id)
                .query(query),
        ))
    }

    /// Ids of the chapters the logged-in user has read.
    pub fn read_markers<I: ResourceId + ?Sized>(self, manga: &I) -> Result<Vec<String>, RequestError> {
        let id = require_id("manga", manga)?;
        let payload = self
            .client
            .execute(ApiRequest::new(endpoints::manga::READ_MARKERS).url_param("manga", id))?;
        serde_json::from_value(payload)
            .map_err(|e| RequestError::UnexpectedShape(format!("read markers: {e}")))
    }

    /// Sets (or with `None`, clears) the reading status.
    pub fn set_status<I: ResourceId + ?Sized>(
        self,
        manga: &I,
        status: Option<ReadingStatus>,
    ) -> Result<(), RequestError> {
        let id = require_id("manga", manga)?;
        self.client.execute(
            ApiRequest::new(endpoints::manga::SET_STATUS)
                .url_param("manga", id)
                .body(json!({"status": status})),
        )?;
        Ok(())
    }

    pub fn add_to_list<M, L>(self, manga: &M, list: &L) -> Result<(), RequestError>
    where
        M: ResourceId + ?Sized,
        L: ResourceId + ?Sized,
    {
        self.list_membership(
            endpoints::manga::ADD_TO_LIST,
            require_id("manga", manga)?,
            require_id("list", list)?,
        )
    }

    pub fn remove_from_list<M, L>(self, manga: &M, list: &L) -> Result<(), RequestError>
    where
        M: ResourceId + ?Sized,
        L: ResourceId + ?Sized,
    {
        self.list_membership(
            endpoints::manga::REMOVE_FROM_LIST,
            require_id("manga", manga)?,
            require_id("list", list)?,
        )
    }

    fn list_membership(
        self,
        endpoint: Endpoint,
        manga: String,
        list: String,
    ) -> Result<(), RequestError> {
        self.client.execute(
            ApiRequest::new(endpoint)
                .url_param("manga", manga)
                .url_param("list", list),
        )?;
        Ok(())
    }
}
