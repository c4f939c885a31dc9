use super::{feed, listing, require_id};
use crate::client::{ApiRequest, Client};
use crate::endpoint::endpoints;
use crate::error::RequestError;
use crate::pagination::Cursor;
use crate::schema::{Chapter, CustomList, Manga, ResourceId, ScanlationGroup, User};

/// The logged-in user and what they follow.
pub struct UserApi<'c> {
    client: &'c mut Client,
}

impl<'c> UserApi<'c> {
    pub(super) fn new(client: &'c mut Client) -> Self {
        Self { client }
    }

    pub fn me(self) -> Result<User, RequestError> {
        self.client
            .execute_decoded(ApiRequest::new(endpoints::user::ME))
    }

    /// The logged-in user's custom lists.
    pub fn lists(self) -> Cursor<'c, CustomList> {
        listing(self.client, ApiRequest::new(endpoints::user::LISTS))
    }

    /// Public custom lists of another user.
    pub fn lists_of<I: ResourceId + ?Sized>(self, user: &I) -> Result<Cursor<'c, CustomList>, RequestError> {
        let id = require_id("user", user)?;
        Ok(listing(
            self.client,
            ApiRequest::new(endpoints::user::OTHER_LISTS).url_param("user", id),
        ))
    }

    pub fn followed_groups(self) -> Cursor<'c, ScanlationGroup> {
        listing(self.client, ApiRequest::new(endpoints::user::FOLLOWED_GROUPS))
    }

    pub fn followed_manga(self) -> Cursor<'c, Manga> {
        listing(self.client, ApiRequest::new(endpoints::user::FOLLOWED_MANGA))
    }

    /// Chapters of every followed manga, newest pages first as the
    /// service orders them.
    pub fn followed_feed(self) -> Cursor<'c, Chapter> {
        feed(self.client, ApiRequest::new(endpoints::user::FOLLOWED_FEED))
    }
}
