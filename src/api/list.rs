use super::{feed, require_id, require_ids, require_non_empty, strip_nulls};
use crate::client::{ApiRequest, Client};
use crate::endpoint::endpoints;
use crate::error::RequestError;
use crate::pagination::Cursor;
use crate::schema::{Chapter, CustomList, CustomListVisibility, ResourceId};
use serde::Serialize;

/// Fields for a new custom list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CustomListDraft {
    pub name: String,
    pub visibility: Option<CustomListVisibility>,
    /// Manga ids to seed the list with.
    pub manga: Vec<String>,
}

impl CustomListDraft {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// User-curated manga lists.
pub struct ListApi<'c> {
    client: &'c mut Client,
}

impl<'c> ListApi<'c> {
    pub(super) fn new(client: &'c mut Client) -> Self {
        Self { client }
    }

    pub fn create(self, draft: &CustomListDraft) -> Result<CustomList, RequestError> {
        require_non_empty("name", &draft.name)?;
        require_ids("manga", &draft.manga)?;
        let body = strip_nulls(serde_json::to_value(draft)?);
        self.client
            .execute_decoded(ApiRequest::new(endpoints::list::CREATE).body(body))
    }

    pub fn get<I: ResourceId + ?Sized>(self, list: &I) -> Result<CustomList, RequestError> {
        let id = require_id("list", list)?;
        self.client
            .execute_decoded(ApiRequest::new(endpoints::list::GET).url_param("list", id))
    }

    pub fn delete<I: ResourceId + ?Sized>(self, list: &I) -> Result<(), RequestError> {
        let id = require_id("list", list)?;
        self.client
            .execute(ApiRequest::new(endpoints::list::DELETE).url_param("list", id))?;
        Ok(())
    }

    /// Chapters of every manga in the list.
    pub fn feed<I: ResourceId + ?Sized>(self, list: &I) -> Result<Cursor<'c, Chapter>, RequestError> {
        let id = require_id("list", list)?;
        Ok(feed(
            self.client,
            ApiRequest::new(endpoints::list::FEED).url_param("list", id),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::anonymous_client;
    use crate::transport::tests::MockTransport;
    use serde_json::json;

    #[test]
    fn test_create_list_omits_unset_visibility() {
        let transport = MockTransport::new();
        transport.push_json(
            200,
            json!({"data": {"id": "l-1", "type": "custom_list", "attributes": {"name": "Faves", "visibility": "private"}}}),
        );
        let mut client = anonymous_client(&transport);

        let mut draft = CustomListDraft::named("Faves");
        draft.manga.push("m-1".into());
        let list = client.list().create(&draft).unwrap();

        assert_eq!(list.visibility, CustomListVisibility::Private);
        assert_eq!(
            transport.requests()[0].body,
            Some(json!({"name": "Faves", "manga": ["m-1"]}))
        );
    }

    #[test]
    fn test_create_requires_name() {
        let transport = MockTransport::new();
        let mut client = anonymous_client(&transport);
        assert!(matches!(
            client.list().create(&CustomListDraft::default()),
            Err(RequestError::InvalidArgument { name: "name", .. })
        ));
    }

    #[test]
    fn test_feed_uses_feed_page_size() {
        let transport = MockTransport::new();
        transport.push_json(200, json!({"results": [], "limit": 500, "total": 0}));
        let mut client = anonymous_client(&transport);

        let mut cursor = client.list().feed("l-1").unwrap();
        assert_eq!(cursor.limit(), 500);
        assert!(cursor.next_page().unwrap().is_empty());
        assert!(cursor.is_exhausted());
        assert_eq!(transport.paths(), vec!["/list/l-1/feed"]);
    }
}
