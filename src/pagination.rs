//! Offset-based cursor over listing endpoints.

use crate::client::{ApiRequest, Client, unwrap_envelope};
use crate::config::MAX_PAGE_LIMIT;
use crate::error::RequestError;
use crate::schema::{Decode, Resource};
use serde_json::Value as JsonValue;
use std::collections::VecDeque;
use std::marker::PhantomData;
use tracing::debug;

/// Checks a caller-supplied page size.
pub fn validate_limit(limit: usize) -> Result<usize, RequestError> {
    if limit == 0 || limit > MAX_PAGE_LIMIT {
        return Err(RequestError::InvalidArgument {
            name: "limit",
            reason: format!("must be between 1 and {MAX_PAGE_LIMIT}, got {limit}"),
        });
    }
    Ok(limit)
}

/// A lazy, forward-only sequence of resources from a listing endpoint.
///
/// Pages are fetched on demand. Once `total` is known the cursor is
/// exhausted when `offset >= total` and the buffer is empty. To start over,
/// build a new cursor.
pub struct Cursor<'c, T = Resource> {
    client: &'c mut Client,
    request: ApiRequest,
    offset: usize,
    limit: usize,
    total: Option<usize>,
    buffer: VecDeque<JsonValue>,
    /// Set when a page came back empty before `total` was reached.
    drained: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<'c, T: Decode> Cursor<'c, T> {
    pub fn new(client: &'c mut Client, request: ApiRequest, limit: usize) -> Self {
        Self {
            client,
            request,
            offset: 0,
            limit,
            total: None,
            buffer: VecDeque::new(),
            drained: false,
            _marker: PhantomData,
        }
    }

    /// Overrides the page size. Fails once a page has been fetched.
    pub fn page_size(mut self, limit: usize) -> Result<Self, RequestError> {
        if self.total.is_some() {
            return Err(RequestError::InvalidArgument {
                name: "limit",
                reason: "page size can't change after the first fetch".to_string(),
            });
        }
        self.limit = validate_limit(limit)?;
        Ok(self)
    }

    /// Starts at `offset` instead of the first element.
    pub fn starting_at(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Largest total the service has reported so far.
    pub fn total(&self) -> Option<usize> {
        self.total
    }

    pub fn is_exhausted(&self) -> bool {
        if !self.buffer.is_empty() {
            return false;
        }
        self.drained || self.total.is_some_and(|total| self.offset >= total)
    }

    /// Fetches the next page if the buffer is empty and more remain.
    pub fn ensure_populated(&mut self) -> Result<(), RequestError> {
        if !self.buffer.is_empty() || self.is_exhausted() {
            return Ok(());
        }

        let mut request = self.request.clone();
        request.query.insert("offset", self.offset);
        request.query.insert("limit", self.limit);

        let page = self.client.execute(request)?;
        let results = match page.get("results") {
            Some(JsonValue::Array(items)) => items.clone(),
            None | Some(JsonValue::Null) => Vec::new(),
            Some(other) => {
                return Err(RequestError::UnexpectedShape(format!(
                    "page 'results' must be an array, got {other}"
                )));
            }
        };
        let reported_total = read_count(&page, "total");
        let reported_limit = read_count(&page, "limit");

        self.total = Some(self.total.map_or(reported_total, |t| t.max(reported_total)));
        // A page that doesn't report its limit advances by what it returned.
        let step = if reported_limit > 0 {
            reported_limit
        } else {
            results.len()
        };
        self.offset += step;
        self.drained = results.is_empty();

        debug!(
            endpoint = self.request.endpoint.path,
            offset = self.offset,
            total = self.total,
            fetched = results.len(),
            "Fetched page"
        );

        self.buffer = results.into_iter().map(unwrap_envelope).collect();
        Ok(())
    }

    /// The next element, or `None` once the sequence has ended.
    pub fn next_item(&mut self) -> Result<Option<T>, RequestError> {
        self.ensure_populated()?;
        match self.buffer.pop_front() {
            Some(raw) => Ok(Some(T::decode(&raw)?)),
            None => Ok(None),
        }
    }

    /// Every element of the current page. Empty once the sequence has ended.
    ///
    /// An element that fails to decode aborts the whole page.
    pub fn next_page(&mut self) -> Result<Vec<T>, RequestError> {
        self.ensure_populated()?;
        let page = self
            .buffer
            .iter()
            .map(|raw| T::decode(raw))
            .collect::<Result<Vec<_>, _>>()?;
        self.buffer.clear();
        Ok(page)
    }

    /// Drains the cursor into a vector.
    pub fn collect_all(mut self) -> Result<Vec<T>, RequestError> {
        let mut items = Vec::new();
        loop {
            let page = self.next_page()?;
            if page.is_empty() && self.is_exhausted() {
                return Ok(items);
            }
            items.extend(page);
        }
    }
}

impl<T: Decode> Iterator for Cursor<'_, T> {
    type Item = Result<T, RequestError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_item().transpose()
    }
}

fn read_count(page: &JsonValue, key: &str) -> usize {
    page.get(key)
        .and_then(JsonValue::as_u64)
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::anonymous_client;
    use crate::endpoint::endpoints;
    use crate::query::QueryParam;
    use crate::schema::{Manga, Tag, TypedResource};
    use crate::transport::tests::MockTransport;
    use serde_json::json;

    fn tag(i: usize) -> JsonValue {
        json!({"id": format!("t-{i}"), "type": "tag", "attributes": {"name": {"en": format!("Tag {i}")}}})
    }

    fn page(range: std::ops::Range<usize>, limit: usize, total: usize) -> JsonValue {
        json!({
            "result": "ok",
            "results": range.map(tag).collect::<Vec<_>>(),
            "limit": limit,
            "offset": 0,
            "total": total
        })
    }

    fn offsets(transport: &MockTransport) -> Vec<String> {
        transport
            .requests()
            .iter()
            .map(|r| {
                r.query
                    .iter()
                    .find(|(k, _)| k == "offset")
                    .map(|(_, v)| v.clone())
                    .unwrap_or_default()
            })
            .collect()
    }

    #[test]
    fn test_cursor_walks_all_pages() {
        let transport = MockTransport::new();
        transport
            .push_json(200, page(0..10, 10, 25))
            .push_json(200, page(10..20, 10, 25))
            .push_json(200, page(20..25, 10, 25));
        let mut client = anonymous_client(&transport);
        let mut cursor: Cursor<'_, Tag> = Cursor::new(&mut client, ApiRequest::new(endpoints::manga::SEARCH), 10);

        let mut ids = Vec::new();
        while let Some(tag) = cursor.next_item().unwrap() {
            ids.push(tag.id().to_string());
        }

        assert_eq!(ids.len(), 25);
        assert_eq!(ids[0], "t-0");
        assert_eq!(ids[24], "t-24");
        assert!(cursor.is_exhausted());
        assert_eq!(cursor.next_item().unwrap(), None);
        assert_eq!(cursor.next_item().unwrap(), None);
        assert_eq!(offsets(&transport), vec!["0", "10", "20"]);
    }

    #[test]
    fn test_cursor_sends_limit_and_base_query() {
        let transport = MockTransport::new();
        transport.push_json(200, page(0..2, 2, 2));
        let mut client = anonymous_client(&transport);
        let request = ApiRequest::new(endpoints::manga::SEARCH)
            .query(crate::query::QueryParams::new().with("title", "Bunny"));
        let items: Vec<Tag> = Cursor::new(&mut client, request, 2).collect_all().unwrap();
        assert_eq!(items.len(), 2);

        let query = crate::query::serialize(
            &crate::query::QueryParams::new()
                .with("title", "Bunny")
                .with("offset", 0usize)
                .with("limit", 2usize),
            false,
        )
        .unwrap();
        assert_eq!(transport.requests()[0].query, query.pairs());
        assert_eq!(query.get("limit"), Some(&QueryParam::Single("2".into())));
    }

    #[test]
    fn test_next_page_drains_buffer() {
        let transport = MockTransport::new();
        transport
            .push_json(200, page(0..3, 3, 5))
            .push_json(200, page(3..5, 3, 5));
        let mut client = anonymous_client(&transport);
        let mut cursor: Cursor<'_, Tag> = Cursor::new(&mut client, ApiRequest::new(endpoints::manga::TAGS), 3);

        assert_eq!(cursor.next_item().unwrap().unwrap().id(), "t-0");
        let rest = cursor.next_page().unwrap();
        assert_eq!(rest.iter().map(|t| t.id()).collect::<Vec<_>>(), vec!["t-1", "t-2"]);
        assert_eq!(cursor.next_page().unwrap().len(), 2);
        assert!(cursor.next_page().unwrap().is_empty());
        assert!(cursor.is_exhausted());
        assert_eq!(transport.requests().len(), 2);
    }

    #[test]
    fn test_missing_total_ends_after_first_page() {
        let transport = MockTransport::new();
        transport.push_json(200, json!({"results": [tag(0)], "limit": 10}));
        let mut client = anonymous_client(&transport);
        let cursor: Cursor<'_, Tag> = Cursor::new(&mut client, ApiRequest::new(endpoints::manga::TAGS), 10);

        assert_eq!(cursor.collect::<Result<Vec<_>, _>>().unwrap().len(), 1);
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn test_total_never_decreases() {
        let transport = MockTransport::new();
        transport
            .push_json(200, page(0..2, 2, 6))
            .push_json(200, page(2..4, 2, 3));
        let mut client = anonymous_client(&transport);
        let mut cursor: Cursor<'_, Tag> = Cursor::new(&mut client, ApiRequest::new(endpoints::manga::TAGS), 2);

        cursor.next_page().unwrap();
        cursor.next_page().unwrap();
        assert_eq!(cursor.total(), Some(6));
        assert!(!cursor.is_exhausted());
    }

    #[test]
    fn test_empty_page_before_total_stops() {
        let transport = MockTransport::new();
        transport
            .push_json(200, page(0..2, 2, 10))
            .push_json(200, page(0..0, 2, 10));
        let mut client = anonymous_client(&transport);
        let cursor: Cursor<'_, Tag> = Cursor::new(&mut client, ApiRequest::new(endpoints::manga::TAGS), 2);

        assert_eq!(cursor.collect_all().unwrap().len(), 2);
        assert_eq!(transport.requests().len(), 2);
    }

    #[test]
    fn test_bad_element_aborts() {
        let transport = MockTransport::new();
        transport.push_json(
            200,
            json!({"results": [tag(0), {"id": "m", "type": "manga", "attributes": {}}], "limit": 2, "total": 2}),
        );
        let mut client = anonymous_client(&transport);
        let mut cursor: Cursor<'_, Manga> = Cursor::new(&mut client, ApiRequest::new(endpoints::manga::SEARCH), 2);

        assert!(matches!(cursor.next_page(), Err(RequestError::Decode(_))));
    }

    #[test]
    fn test_enveloped_elements_are_unwrapped() {
        let transport = MockTransport::new();
        transport.push_json(
            200,
            json!({
                "results": [{
                    "result": "ok",
                    "data": {"id": "t-9", "type": "tag", "attributes": {"name": {"en": "Nine"}}},
                    "relationships": [{"id": "g", "type": "user"}]
                }],
                "limit": 1,
                "total": 1
            }),
        );
        let mut client = anonymous_client(&transport);
        let mut cursor: Cursor<'_> = Cursor::new(&mut client, ApiRequest::new(endpoints::manga::TAGS), 1);

        let resource = cursor.next_item().unwrap().unwrap();
        assert_eq!(resource.id(), "t-9");
        assert_eq!(resource.relations_to("user").len(), 1);
    }

    #[test]
    fn test_fetch_error_is_returned() {
        let transport = MockTransport::new();
        transport.push_json(500, json!({"errors": [{"detail": "boom"}]}));
        let mut client = anonymous_client(&transport);
        let mut cursor: Cursor<'_, Tag> = Cursor::new(&mut client, ApiRequest::new(endpoints::manga::TAGS), 5);

        assert!(matches!(cursor.next(), Some(Err(RequestError::RequestFailed(_)))));
        assert_eq!(cursor.total(), None);
        assert_eq!(cursor.offset(), 0);
    }

    #[test]
    fn test_starting_offset() {
        let transport = MockTransport::new();
        transport.push_json(200, page(0..1, 10, 11));
        let mut client = anonymous_client(&transport);
        let mut cursor: Cursor<'_, Tag> =
            Cursor::new(&mut client, ApiRequest::new(endpoints::manga::TAGS), 10).starting_at(10);

        assert_eq!(cursor.next_page().unwrap().len(), 1);
        assert_eq!(offsets(&transport), vec!["10"]);
        assert!(cursor.is_exhausted());
    }

    #[test]
    fn test_page_size_override() {
        let transport = MockTransport::new();
        transport.push_json(200, page(0..1, 50, 1));
        let mut client = anonymous_client(&transport);

        let rejected = Cursor::<Tag>::new(&mut client, ApiRequest::new(endpoints::manga::TAGS), 10).page_size(0);
        assert!(matches!(rejected, Err(RequestError::InvalidArgument { name: "limit", .. })));

        let mut cursor = Cursor::<Tag>::new(&mut client, ApiRequest::new(endpoints::manga::TAGS), 10)
            .page_size(50)
            .unwrap();
        assert_eq!(cursor.limit(), 50);
        cursor.next_page().unwrap();
        assert!(transport.requests()[0].query.contains(&("limit".to_string(), "50".to_string())));
    }

    #[test]
    fn test_page_size_fixed_after_first_fetch() {
        let transport = MockTransport::new();
        transport.push_json(200, page(0..10, 10, 25));
        let mut client = anonymous_client(&transport);

        let mut cursor = Cursor::<Tag>::new(&mut client, ApiRequest::new(endpoints::manga::TAGS), 10);
        cursor.next_page().unwrap();
        assert!(matches!(
            cursor.page_size(20),
            Err(RequestError::InvalidArgument { name: "limit", .. })
        ));
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn test_validate_limit() {
        assert_eq!(validate_limit(10).unwrap(), 10);
        assert!(validate_limit(0).is_err());
        assert!(validate_limit(MAX_PAGE_LIMIT + 1).is_err());
    }
}
