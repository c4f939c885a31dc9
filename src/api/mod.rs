//! Typed operations grouped by resource.
//!
//! Each group is reached through a short-lived handle borrowed from the
//! client, e.g. `client.manga().get("...")`. Listing operations return a
//! [`Cursor`](crate::pagination::Cursor) that keeps the borrow.

mod account;
mod auth;
mod author;
mod chapter;
mod group;
mod list;
mod manga;
mod misc;
mod user;

pub use account::AccountApi;
pub use auth::AuthApi;
pub use author::AuthorApi;
pub use chapter::{ChapterApi, ChapterEdit};
pub use group::GroupApi;
pub use list::{CustomListDraft, ListApi};
pub use manga::{MangaApi, MangaDraft};
pub use misc::{AtHomeReport, MiscApi};
pub use user::UserApi;

use crate::client::{ApiRequest, Client};
use crate::error::RequestError;
use crate::pagination::Cursor;
use crate::schema::{Decode, ResourceId};
use serde_json::Value as JsonValue;

impl Client {
    pub fn auth(&mut self) -> AuthApi<'_> {
        AuthApi::new(self)
    }

    pub fn account(&mut self) -> AccountApi<'_> {
        AccountApi::new(self)
    }

    pub fn author(&mut self) -> AuthorApi<'_> {
        AuthorApi::new(self)
    }

    pub fn chapter(&mut self) -> ChapterApi<'_> {
        ChapterApi::new(self)
    }

    pub fn group(&mut self) -> GroupApi<'_> {
        GroupApi::new(self)
    }

    pub fn list(&mut self) -> ListApi<'_> {
        ListApi::new(self)
    }

    pub fn manga(&mut self) -> MangaApi<'_> {
        MangaApi::new(self)
    }

    pub fn user(&mut self) -> UserApi<'_> {
        UserApi::new(self)
    }

    pub fn misc(&mut self) -> MiscApi<'_> {
        MiscApi::new(self)
    }
}

/// Cursor with the configured listing page size.
fn listing<T: Decode>(client: &mut Client, request: ApiRequest) -> Cursor<'_, T> {
    let limit = client.config().pagination.default_limit;
    Cursor::new(client, request, limit)
}

/// Cursor with the configured chapter-feed page size.
fn feed<T: Decode>(client: &mut Client, request: ApiRequest) -> Cursor<'_, T> {
    let limit = client.config().pagination.feed_limit;
    Cursor::new(client, request, limit)
}

/// Extracts a non-empty id for the argument `name`.
fn require_id<I: ResourceId + ?Sized>(name: &'static str, item: &I) -> Result<String, RequestError> {
    let id = item.resource_id().trim();
    if id.is_empty() {
        return Err(RequestError::InvalidArgument {
            name,
            reason: "id must not be empty".to_string(),
        });
    }
    Ok(id.to_string())
}

/// Extracts ids for a list argument, rejecting any empty one.
fn require_ids<I: ResourceId>(name: &'static str, items: &[I]) -> Result<Vec<String>, RequestError> {
    items.iter().map(|item| require_id(name, item)).collect()
}

fn require_non_empty(name: &'static str, value: &str) -> Result<(), RequestError> {
    if value.trim().is_empty() {
        return Err(RequestError::InvalidArgument {
            name,
            reason: "must not be empty".to_string(),
        });
    }
    Ok(())
}

/// Drops `null` members from a JSON object body.
fn strip_nulls(body: JsonValue) -> JsonValue {
    match body {
        JsonValue::Object(map) => JsonValue::Object(map.into_iter().filter(|(_, v)| !v.is_null()).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Relationship;
    use serde_json::json;

    #[test]
    fn test_require_id_accepts_resources_and_strings() {
        assert_eq!(require_id("manga", "m-1").unwrap(), "m-1");
        assert_eq!(require_id("manga", &"m-2".to_string()).unwrap(), "m-2");
        assert_eq!(require_id("manga", &Relationship::new("m-3", "manga")).unwrap(), "m-3");
    }

    #[test]
    fn test_require_id_rejects_blank() {
        assert!(matches!(
            require_id("manga", "  "),
            Err(RequestError::InvalidArgument { name: "manga", .. })
        ));
        assert!(require_ids("authors", &["a", ""]).is_err());
    }

    #[test]
    fn test_strip_nulls() {
        assert_eq!(
            strip_nulls(json!({"a": 1, "b": null, "c": [null]})),
            json!({"a": 1, "c": [null]})
        );
    }
}
