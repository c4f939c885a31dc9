use super::{listing, require_id, require_non_empty};
use crate::client::{ApiRequest, Client};
use crate::endpoint::endpoints;
use crate::error::RequestError;
use crate::pagination::Cursor;
use crate::query::QueryParams;
use crate::schema::{Author, ResourceId, TypedResource};
use serde_json::{Map, Value as JsonValue, json};

pub struct AuthorApi<'c> {
    client: &'c mut Client,
}

impl<'c> AuthorApi<'c> {
    pub(super) fn new(client: &'c mut Client) -> Self {
        Self { client }
    }

    pub fn create(self, name: &str) -> Result<Author, RequestError> {
        require_non_empty("name", name)?;
        self.client
            .execute_decoded(ApiRequest::new(endpoints::author::CREATE).body(json!({"name": name})))
    }

    pub fn get<I: ResourceId + ?Sized>(self, author: &I) -> Result<Author, RequestError> {
        let id = require_id("author", author)?;
        self.client
            .execute_decoded(ApiRequest::new(endpoints::author::GET).url_param("author", id))
    }

    /// Authors whose name matches `name`, or all authors.
    pub fn search(self, name: Option<&str>) -> Cursor<'c, Author> {
        let request = ApiRequest::new(endpoints::author::SEARCH).query(QueryParams::new().with("name", name));
        listing(self.client, request)
    }

    /// Renames an author. The service rejects edits against a stale version.
    pub fn edit(self, author: &Author, name: Option<&str>) -> Result<Author, RequestError> {
        let version = author.version().ok_or_else(|| RequestError::InvalidArgument {
            name: "author",
            reason: "a version is required to edit".to_string(),
        })?;

        let mut body = Map::new();
        body.insert("version".to_string(), json!(version));
        if let Some(name) = name {
            require_non_empty("name", name)?;
            body.insert("name".to_string(), json!(name));
        }

        self.client.execute_decoded(
            ApiRequest::new(endpoints::author::EDIT)
                .url_param("author", require_id("author", author)?)
                .body(JsonValue::Object(body)),
        )
    }

    pub fn delete<I: ResourceId + ?Sized>(self, author: &I) -> Result<(), RequestError> {
        let id = require_id("author", author)?;
        self.client
            .execute(ApiRequest::new(endpoints::author::DELETE).url_param("author", id))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::client::tests::anonymous_client;
    use crate::error::RequestError;
    use crate::schema::{Author, TypedResource, decode_as};
    use crate::transport::tests::MockTransport;
    use reqwest::Method;
    use serde_json::json;

    fn author_json(version: Option<u32>) -> serde_json::Value {
        json!({"id": "a-1", "type": "author", "version": version, "attributes": {"name": "Oda"}})
    }

    #[test]
    fn test_get_author() {
        let transport = MockTransport::new();
        transport.push_json(200, json!({"result": "ok", "data": author_json(Some(2))}));
        let mut client = anonymous_client(&transport);

        let author = client.author().get("a-1").unwrap();
        assert_eq!(author.name, "Oda");
        assert_eq!(author.version(), Some(2));
        assert_eq!(transport.paths(), vec!["/author/a-1"]);
    }

    #[test]
    fn test_search_sends_name_and_paging() {
        let transport = MockTransport::new();
        transport.push_json(200, json!({"results": [author_json(None)], "limit": 10, "total": 1}));
        let mut client = anonymous_client(&transport);

        let authors = client.author().search(Some("Oda")).collect_all().unwrap();
        assert_eq!(authors.len(), 1);
        let query = &transport.requests()[0].query;
        assert!(query.contains(&("name".to_string(), "Oda".to_string())));
        assert!(query.contains(&("limit".to_string(), "10".to_string())));
        assert!(query.contains(&("offset".to_string(), "0".to_string())));
    }

    #[test]
    fn test_edit_sends_version() {
        let transport = MockTransport::new();
        transport.push_json(200, json!({"data": author_json(Some(4))}));
        let mut client = anonymous_client(&transport);
        let author: Author = decode_as(&author_json(Some(3))).unwrap();

        client.author().edit(&author, Some("Eiichiro Oda")).unwrap();
        let request = &transport.requests()[0];
        assert_eq!(request.method, Method::PUT);
        assert_eq!(request.body, Some(json!({"version": 3, "name": "Eiichiro Oda"})));
    }

    #[test]
    fn test_edit_without_version_is_rejected() {
        let transport = MockTransport::new();
        let mut client = anonymous_client(&transport);
        let author: Author = decode_as(&author_json(None)).unwrap();

        assert!(matches!(
            client.author().edit(&author, None),
            Err(RequestError::InvalidArgument { name: "author", .. })
        ));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_delete_uses_resource_id() {
        let transport = MockTransport::new();
        transport.push_json(200, json!({"result": "ok"}));
        let mut client = anonymous_client(&transport);
        let author: Author = decode_as(&author_json(Some(1))).unwrap();

        client.author().delete(&author).unwrap();
        assert_eq!(transport.requests()[0].method, Method::DELETE);
        assert_eq!(transport.paths(), vec!["/author/a-1"]);
    }
}
