use super::require_non_empty;
use crate::client::{ApiRequest, Client, parse_issued_tokens};
use crate::endpoint::endpoints;
use crate::error::RequestError;
use serde_json::{Value as JsonValue, json};
use tracing::info;

/// Login, logout and session checks.
pub struct AuthApi<'c> {
    client: &'c mut Client,
}

impl<'c> AuthApi<'c> {
    pub(super) fn new(client: &'c mut Client) -> Self {
        Self { client }
    }

    /// Logs in and stores the issued tokens.
    pub fn login(self, username: &str, password: &str) -> Result<(), RequestError> {
        require_non_empty("username", username)?;
        require_non_empty("password", password)?;

        let response = self.client.execute(
            ApiRequest::new(endpoints::auth::LOGIN)
                .body(json!({"username": username, "password": password})),
        )?;
        let tokens = parse_issued_tokens(&response)?;
        self.client
            .session_mut()
            .authenticate(Some(username.to_string()), tokens.session, tokens.refresh)?;
        info!(identity = username, "Logged in");
        Ok(())
    }

    /// The service's view of the current token (`isAuthenticated`, roles, ...).
    pub fn check(self) -> Result<JsonValue, RequestError> {
        self.client.execute(ApiRequest::new(endpoints::auth::CHECK))
    }

    /// Ends the session on the service and clears local credentials.
    ///
    /// Local credentials are cleared even if the service call fails.
    pub fn logout(self) -> Result<(), RequestError> {
        let result = self.client.execute(ApiRequest::new(endpoints::auth::LOGOUT));
        self.client.session_mut().logout()?;
        info!("Logged out");
        result.map(|_| ())
    }

    /// Forces a token refresh regardless of expiry.
    pub fn refresh(self) -> Result<(), RequestError> {
        if self.client.session().refresh_token().is_none() {
            return Err(RequestError::NotLoggedIn(JsonValue::Null));
        }
        self.client.refresh_session()
    }
}
