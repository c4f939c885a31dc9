use super::{require_id, require_non_empty};
use crate::client::{ApiRequest, Client, unwrap_envelope};
use crate::endpoint::endpoints;
use crate::error::RequestError;
use crate::query::QueryParams;
use crate::schema::{LegacyType, MappingId, ResourceId, decode_as};
use serde::Serialize;
use serde_json::{Value as JsonValue, json};

/// Download statistics for one page fetched from an at-home node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AtHomeReport {
    pub url: String,
    pub success: bool,
    pub cached: bool,
    pub bytes: u64,
    /// Milliseconds.
    pub duration: u64,
}

/// Endpoints that don't belong to a resource family.
pub struct MiscApi<'c> {
    client: &'c mut Client,
}

impl<'c> MiscApi<'c> {
    pub(super) fn new(client: &'c mut Client) -> Self {
        Self { client }
    }

    /// Base URL of an at-home node serving `chapter`'s images.
    pub fn at_home_url<I: ResourceId + ?Sized>(
        self,
        chapter: &I,
        force_port_443: bool,
    ) -> Result<String, RequestError> {
        let id = require_id("chapter", chapter)?;
        let query = QueryParams::new().with("forcePort443", force_port_443.then_some(true));
        let payload = self.client.execute(
            ApiRequest::new(endpoints::AT_HOME_SERVER)
                .url_param("chapter", id)
                .query(query),
        )?;
        payload
            .get("baseUrl")
            .and_then(JsonValue::as_str)
            .map(str::to_string)
            .ok_or_else(|| RequestError::UnexpectedShape("at-home response has no baseUrl".to_string()))
    }

    pub fn solve_captcha(self, challenge: &str) -> Result<(), RequestError> {
        require_non_empty("challenge", challenge)?;
        self.client.execute(
            ApiRequest::new(endpoints::SOLVE_CAPTCHA).body(json!({"captchaChallenge": challenge})),
        )?;
        Ok(())
    }

    /// Maps legacy numeric ids to current ids.
    pub fn legacy_mapping(self, kind: LegacyType, ids: &[u64]) -> Result<Vec<MappingId>, RequestError> {
        if ids.is_empty() {
            return Err(RequestError::InvalidArgument {
                name: "ids",
                reason: "at least one id is required".to_string(),
            });
        }

        let payload = self.client.execute(
            ApiRequest::new(endpoints::LEGACY_MAPPING).body(json!({"type": kind, "ids": ids})),
        )?;
        let JsonValue::Array(items) = payload else {
            return Err(RequestError::UnexpectedShape(
                "legacy mapping response must be an array".to_string(),
            ));
        };

        items
            .into_iter()
            .map(|item| decode_as::<MappingId>(&unwrap_envelope(item)).map_err(RequestError::from))
            .collect()
    }

    /// Reports how a page download from an at-home node went.
    pub fn report_at_home(self, report: &AtHomeReport) -> Result<(), RequestError> {
        require_non_empty("url", &report.url)?;
        self.client
            .execute(ApiRequest::new(endpoints::AT_HOME_REPORT).body(serde_json::to_value(report)?))?;
        Ok(())
    }
}
