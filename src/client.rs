//! The request dispatcher.
//!
//! [`Client::execute`] turns an [`ApiRequest`] into one authenticated HTTP
//! call and normalizes the response envelope. Before any call other than
//! the token refresh itself, an expired session is refreshed; a failed
//! refresh aborts before the resource call is made.

use crate::auth::{AuthSession, CredentialStore, FileCredentialStore, IssuedTokens, SessionState, Token};
use crate::config::Config;
use crate::endpoint::{Endpoint, endpoints, resolve_path};
use crate::error::{ClientError, RequestError};
use crate::query::{self, QueryParams};
use crate::schema::{self, Decode};
use crate::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
use serde_json::{Map, Value as JsonValue, json};
use std::collections::HashMap;
use tracing::debug;

/// HTTP status with no response body.
const STATUS_NO_CONTENT: u16 = 204;
const STATUS_UNAUTHORIZED: u16 = 401;
const STATUS_FORBIDDEN: u16 = 403;

/// One logical call: endpoint plus its parameters.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub endpoint: Endpoint,
    pub body: Option<JsonValue>,
    pub query: QueryParams,
    pub url_params: HashMap<String, String>,
    /// Send nulls instead of dropping them (edit operations).
    pub keep_null: bool,
}

impl ApiRequest {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            body: None,
            query: QueryParams::new(),
            url_params: HashMap::new(),
            keep_null: false,
        }
    }

    pub fn body(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }

    pub fn query(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }

    pub fn url_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.url_params.insert(name.into(), value.into());
        self
    }

    pub fn keep_null(mut self, keep_null: bool) -> Self {
        self.keep_null = keep_null;
        self
    }
}

/// Builds and sends HTTP requests. Holds no session state.
struct Dispatcher {
    transport: Box<dyn Transport>,
    base_url: String,
    user_agent: String,
}

impl Dispatcher {
    fn call(
        &self,
        request: &ApiRequest,
        query: Vec<(String, String)>,
        access_token: Option<&Token>,
    ) -> Result<JsonValue, RequestError> {
        let path = resolve_path(request.endpoint.path, &request.url_params)?;
        let url = if request.endpoint.is_absolute() {
            path
        } else {
            format!("{}{}", self.base_url, path)
        };

        let mut headers = vec![("User-Agent".to_string(), self.user_agent.clone())];
        if let Some(token) = access_token {
            headers.push(("Authorization".to_string(), format!("Bearer {}", token.as_str())));
        }

        let http_request = HttpRequest {
            method: request.endpoint.method.clone(),
            url,
            query,
            headers,
            body: request.body.clone(),
        };

        let response = self.transport.send(&http_request)?;
        debug!(
            method = %http_request.method,
            url = %http_request.url,
            status = response.status,
            "-> request"
        );

        interpret_response(&response)
    }
}

/// Maps a transport response to a payload or a typed failure.
fn interpret_response(response: &HttpResponse) -> Result<JsonValue, RequestError> {
    let body = if response.status == STATUS_NO_CONTENT {
        JsonValue::Object(Map::new())
    } else if response.is_success() {
        serde_json::from_slice(&response.body)?
    } else {
        // Error pages are not always JSON; keep the text for the error.
        serde_json::from_slice(&response.body)
            .unwrap_or_else(|_| JsonValue::String(String::from_utf8_lossy(&response.body).into_owned()))
    };

    match response.status {
        200..=299 => Ok(unwrap_envelope(body)),
        STATUS_UNAUTHORIZED => Err(RequestError::NotLoggedIn(body)),
        STATUS_FORBIDDEN => Err(RequestError::ActionForbidden(body)),
        _ => {
            let errors = body
                .get("errors")
                .and_then(JsonValue::as_array)
                .cloned()
                .unwrap_or_default();
            Err(RequestError::RequestFailed(errors))
        }
    }
}

/// Unwraps `{data, relationships?}` envelopes.
///
/// A top-level `relationships` array replaces any nested in `data`.
/// Non-objects and objects without `data` are returned unchanged.
pub fn unwrap_envelope(body: JsonValue) -> JsonValue {
    let JsonValue::Object(mut object) = body else {
        return body;
    };

    match object.remove("data") {
        Some(mut data) => {
            if let Some(relationships) = object.remove("relationships") {
                if let JsonValue::Object(data_object) = &mut data {
                    data_object.insert("relationships".to_string(), relationships);
                }
            }
            data
        }
        None => JsonValue::Object(object),
    }
}

/// Client for the service. Owns the auth session; not meant to be shared
/// across threads without external locking.
pub struct Client {
    dispatcher: Dispatcher,
    session: AuthSession,
    config: Config,
}

impl Client {
    /// Builds a client with the reqwest transport and the file credential
    /// store from `config`, restoring any saved session.
    pub fn new(config: Config) -> Result<Self, ClientError> {
        config.validate()?;
        let transport = ReqwestTransport::new(&config.api)?;
        let store = FileCredentialStore::new(config.credentials_path()?);
        Self::with_parts(config, Box::new(transport), Box::new(store))
    }

    /// Builds a client from explicit parts.
    ///
    /// A restored session whose access token has expired is refreshed once;
    /// if that fails the client starts anonymous.
    pub fn with_parts(
        config: Config,
        transport: Box<dyn Transport>,
        store: Box<dyn CredentialStore>,
    ) -> Result<Self, ClientError> {
        config.validate()?;
        schema::validate_type_table()?;

        let dispatcher = Dispatcher {
            transport,
            base_url: config.base_url().to_string(),
            user_agent: config.api.user_agent.clone(),
        };
        let mut client = Self {
            dispatcher,
            session: AuthSession::restore(store),
            config,
        };

        if client.session.check_liveness() == SessionState::Expired {
            if let Err(err) = client.refresh_session() {
                debug!(error = %err, "Saved session could not be refreshed; continuing anonymous");
            }
        }

        Ok(client)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut AuthSession {
        &mut self.session
    }

    /// Username of the logged-in user, if any.
    pub fn identity(&self) -> Option<&str> {
        self.session.identity()
    }

    /// Executes one request.
    ///
    /// Makes at most one resource call, preceded by at most one refresh
    /// call. A 401 after a successful refresh is returned, not retried.
    pub fn execute(&mut self, request: ApiRequest) -> Result<JsonValue, RequestError> {
        let query = query::serialize(&request.query, request.keep_null)?.pairs();

        if !request.endpoint.is_refresh() && self.session.check_liveness() == SessionState::Expired {
            self.refresh_session()?;
        }

        self.dispatcher.call(&request, query, self.session.access_token())
    }

    /// Executes a request and decodes the payload into `T`.
    pub fn execute_decoded<T: Decode>(&mut self, request: ApiRequest) -> Result<T, RequestError> {
        let payload = self.execute(request)?;
        Ok(T::decode(&payload)?)
    }

    /// Exchanges the refresh token for a new session token.
    ///
    /// On failure the session is cleared and `RefreshTokenFailed` returned.
    pub fn refresh_session(&mut self) -> Result<(), RequestError> {
        let dispatcher = &self.dispatcher;
        self.session
            .refresh(|refresh_token| issue_refreshed_tokens(dispatcher, refresh_token))
    }
}

fn issue_refreshed_tokens(dispatcher: &Dispatcher, refresh_token: &Token) -> Result<IssuedTokens, RequestError> {
    let request =
        ApiRequest::new(endpoints::auth::REFRESH).body(json!({"token": refresh_token.as_str()}));
    let response = dispatcher.call(&request, Vec::new(), None)?;
    parse_issued_tokens(&response)
}

/// Reads `{"token": {"session": ..., "refresh": ...}}`.
pub(crate) fn parse_issued_tokens(response: &JsonValue) -> Result<IssuedTokens, RequestError> {
    let token = response
        .get("token")
        .ok_or_else(|| RequestError::UnexpectedShape("missing 'token' object".to_string()))?;
    let session = token
        .get("session")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| RequestError::UnexpectedShape("missing 'token.session'".to_string()))?;
    let refresh = token.get("refresh").and_then(JsonValue::as_str);

    Ok(IssuedTokens {
        session: Token::new(session),
        refresh: refresh.map(Token::new),
    })
}
