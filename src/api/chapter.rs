use super::{listing, require_id, require_ids};
use crate::client::{ApiRequest, Client};
use crate::endpoint::endpoints;
use crate::error::RequestError;
use crate::pagination::Cursor;
use crate::schema::{
    Chapter, ChapterSearch, MAX_CHAPTER_NUMBER_LEN, MAX_CHAPTER_TITLE_LEN, ResourceId, TypedResource,
};
use serde::Serialize;
use serde_json::json;

/// New values for a chapter edit. Every field is sent; `None` clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterEdit {
    pub title: Option<String>,
    pub volume: Option<String>,
    pub chapter: Option<String>,
    pub translated_language: Option<String>,
    pub data: Vec<String>,
    pub data_saver: Vec<String>,
}

impl ChapterEdit {
    fn validate(&self) -> Result<(), RequestError> {
        check_length("title", self.title.as_deref(), MAX_CHAPTER_TITLE_LEN)?;
        check_length("chapter", self.chapter.as_deref(), MAX_CHAPTER_NUMBER_LEN)
    }
}

fn check_length(name: &'static str, value: Option<&str>, max: usize) -> Result<(), RequestError> {
    match value {
        Some(v) if v.chars().count() > max => Err(RequestError::InvalidArgument {
            name,
            reason: format!("must be at most {max} characters"),
        }),
        _ => Ok(()),
    }
}

pub struct ChapterApi<'c> {
    client: &'c mut Client,
}

impl<'c> ChapterApi<'c> {
    pub(super) fn new(client: &'c mut Client) -> Self {
        Self { client }
    }

    pub fn search(self, search: &ChapterSearch) -> Result<Cursor<'c, Chapter>, RequestError> {
        require_ids("ids", &search.ids)?;
        require_ids("groups", &search.groups)?;
        let request = ApiRequest::new(endpoints::chapter::SEARCH).query(search.to_query());
        Ok(listing(self.client, request))
    }

    pub fn get<I: ResourceId + ?Sized>(self, chapter: &I) -> Result<Chapter, RequestError> {
        let id = require_id("chapter", chapter)?;
        self.client
            .execute_decoded(ApiRequest::new(endpoints::chapter::GET).url_param("chapter", id))
    }

    /// Replaces a chapter's metadata and page lists.
    pub fn edit(self, chapter: &Chapter, edit: &ChapterEdit) -> Result<Chapter, RequestError> {
        edit.validate()?;
        let version = chapter.version().ok_or_else(|| RequestError::InvalidArgument {
            name: "chapter",
            reason: "a version is required to edit".to_string(),
        })?;
        let mut body = serde_json::to_value(edit)?;
        body["version"] = json!(version);

        self.client.execute_decoded(
            ApiRequest::new(endpoints::chapter::EDIT)
                .url_param("chapter", require_id("chapter", chapter)?)
                .body(body),
        )
    }

    pub fn delete<I: ResourceId + ?Sized>(self, chapter: &I) -> Result<(), RequestError> {
        let id = require_id("chapter", chapter)?;
        self.client
            .execute(ApiRequest::new(endpoints::chapter::DELETE).url_param("chapter", id))?;
        Ok(())
    }

    pub fn mark_read<I: ResourceId + ?Sized>(self, chapter: &I) -> Result<(), RequestError> {
        let id = require_id("chapter", chapter)?;
        self.client
            .execute(ApiRequest::new(endpoints::chapter::MARK_READ).url_param("chapter", id))?;
        Ok(())
    }

    pub fn mark_unread<I: ResourceId + ?Sized>(self, chapter: &I) -> Result<(), RequestError> {
        let id = require_id("chapter", chapter)?;
        self.client
            .execute(ApiRequest::new(endpoints::chapter::MARK_UNREAD).url_param("chapter", id))?;
        Ok(())
    }

    /// Image URLs for every page, served from an at-home node.
    pub fn page_urls(self, chapter: &Chapter, data_saver: bool) -> Result<Vec<String>, RequestError> {
        let hash = chapter.hash.as_deref().ok_or_else(|| RequestError::InvalidArgument {
            name: "chapter",
            reason: "chapter has no image hash".to_string(),
        })?;
        let base = self.client.misc().at_home_url(chapter, false)?;
        let (folder, files) = if data_saver {
            ("data-saver", &chapter.data_saver)
        } else {
            ("data", &chapter.data)
        };

        Ok(files
            .iter()
            .map(|file| format!("{}/{folder}/{hash}/{file}", base.trim_end_matches('/')))
            .collect())
    }
}
