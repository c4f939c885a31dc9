use super::{listing, require_id, require_ids, require_non_empty};
use crate::client::{ApiRequest, Client};
use crate::endpoint::{Endpoint, endpoints};
use crate::error::RequestError;
use crate::pagination::Cursor;
use crate::query::QueryParams;
use crate::schema::{ResourceId, ScanlationGroup};
use serde_json::json;

/// Scanlation groups.
pub struct GroupApi<'c> {
    client: &'c mut Client,
}

impl<'c> GroupApi<'c> {
    pub(super) fn new(client: &'c mut Client) -> Self {
        Self { client }
    }

    /// Groups matching `name`, optionally restricted to `ids`.
    pub fn search(self, name: Option<&str>, ids: &[&str]) -> Result<Cursor<'c, ScanlationGroup>, RequestError> {
        let ids = require_ids("ids", ids)?;
        let query = QueryParams::new().with("name", name).with("ids", ids);
        Ok(listing(self.client, ApiRequest::new(endpoints::group::SEARCH).query(query)))
    }

    pub fn get<I: ResourceId + ?Sized>(self, group: &I) -> Result<ScanlationGroup, RequestError> {
        let id = require_id("group", group)?;
        self.client
            .execute_decoded(ApiRequest::new(endpoints::group::GET).url_param("group", id))
    }

    pub fn create(self, name: &str) -> Result<ScanlationGroup, RequestError> {
        require_non_empty("name", name)?;
        self.client
            .execute_decoded(ApiRequest::new(endpoints::group::CREATE).body(json!({"name": name})))
    }

    pub fn delete<I: ResourceId + ?Sized>(self, group: &I) -> Result<(), RequestError> {
        self.call_for(endpoints::group::DELETE, group)
    }

    pub fn follow<I: ResourceId + ?Sized>(self, group: &I) -> Result<(), RequestError> {
        self.call_for(endpoints::group::FOLLOW, group)
    }

    pub fn unfollow<I: ResourceId + ?Sized>(self, group: &I) -> Result<(), RequestError> {
        self.call_for(endpoints::group::UNFOLLOW, group)
    }

    fn call_for<I: ResourceId + ?Sized>(
        self,
        endpoint: Endpoint,
        group: &I,
    ) -> Result<(), RequestError> {
        let id = require_id("group", group)?;
        self.client
            .execute(ApiRequest::new(endpoint).url_param("group", id))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::client::tests::anonymous_client;
    use crate::schema::TypedResource;
    use crate::transport::tests::MockTransport;
    use reqwest::Method;
    use serde_json::json;

    fn group_json() -> serde_json::Value {
        json!({
            "id": "g-1",
            "type": "scanlation_group",
            "attributes": {
                "name": "Night Shift",
                "leader": {"id": "u-1", "type": "user", "attributes": {"username": "lead"}}
            }
        })
    }

    #[test]
    fn test_get_group_with_leader() {
        let transport = MockTransport::new();
        transport.push_json(200, json!({"data": group_json()}));
        let mut client = anonymous_client(&transport);

        let group = client.group().get("g-1").unwrap();
        assert_eq!(group.name, "Night Shift");
        assert_eq!(group.leader.as_ref().map(|u| u.username.as_str()), Some("lead"));
        assert_eq!(group.id(), "g-1");
    }

    #[test]
    fn test_search_groups() {
        let transport = MockTransport::new();
        transport.push_json(200, json!({"results": [group_json()], "limit": 10, "total": 1}));
        let mut client = anonymous_client(&transport);

        let groups = client.group().search(Some("night"), &["g-1"]).unwrap().collect_all().unwrap();
        assert_eq!(groups.len(), 1);
        let query = &transport.requests()[0].query;
        assert!(query.contains(&("ids[]".to_string(), "g-1".to_string())));
        assert!(query.contains(&("name".to_string(), "night".to_string())));
    }

    #[test]
    fn test_follow_and_unfollow() {
        let transport = MockTransport::new();
        transport
            .push_json(200, json!({"result": "ok"}))
            .push_json(200, json!({"result": "ok"}));
        let mut client = anonymous_client(&transport);

        client.group().follow("g-1").unwrap();
        client.group().unfollow("g-1").unwrap();

        let methods: Vec<Method> = transport.requests().into_iter().map(|r| r.method).collect();
        assert_eq!(methods, vec![Method::POST, Method::DELETE]);
        assert_eq!(transport.paths(), vec!["/group/g-1/follow", "/group/g-1/follow"]);
    }
}
