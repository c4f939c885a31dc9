use super::require_non_empty;
use crate::client::{ApiRequest, Client};
use crate::endpoint::endpoints;
use crate::error::RequestError;
use crate::schema::User;
use serde_json::json;

/// Account registration and recovery.
pub struct AccountApi<'c> {
    client: &'c mut Client,
}

impl<'c> AccountApi<'c> {
    pub(super) fn new(client: &'c mut Client) -> Self {
        Self { client }
    }

    /// Registers a new account. It must be activated before logging in.
    pub fn create(self, username: &str, password: &str, email: &str) -> Result<User, RequestError> {
        require_non_empty("username", username)?;
        require_non_empty("password", password)?;
        if !email.contains('@') {
            return Err(RequestError::InvalidArgument {
                name: "email",
                reason: format!("'{email}' is not an email address"),
            });
        }

        self.client.execute_decoded(
            ApiRequest::new(endpoints::account::CREATE)
                .body(json!({"username": username, "password": password, "email": email})),
        )
    }

    pub fn activate(self, code: &str) -> Result<(), RequestError> {
        require_non_empty("code", code)?;
        self.client
            .execute(ApiRequest::new(endpoints::account::ACTIVATE).url_param("code", code))?;
        Ok(())
    }

    pub fn resend_activation(self, email: &str) -> Result<(), RequestError> {
        require_non_empty("email", email)?;
        self.client
            .execute(ApiRequest::new(endpoints::account::ACTIVATE_RESEND).body(json!({"email": email})))?;
        Ok(())
    }

    /// Starts password recovery; the service emails a code.
    pub fn recover(self, email: &str) -> Result<(), RequestError> {
        require_non_empty("email", email)?;
        self.client
            .execute(ApiRequest::new(endpoints::account::RECOVER).body(json!({"email": email})))?;
        Ok(())
    }

    pub fn complete_recovery(self, code: &str, new_password: &str) -> Result<(), RequestError> {
        require_non_empty("code", code)?;
        require_non_empty("new_password", new_password)?;
        self.client.execute(
            ApiRequest::new(endpoints::account::COMPLETE_RECOVER)
                .url_param("code", code)
                .body(json!({"newPassword": new_password})),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::client::tests::anonymous_client;
    use crate::error::RequestError;
    use crate::schema::TypedResource;
    use crate::transport::tests::MockTransport;
    use reqwest::Method;
    use serde_json::json;

    #[test]
    fn test_create_decodes_user() {
        let transport = MockTransport::new();
        transport.push_json(
            201,
            json!({
                "result": "ok",
                "data": {"id": "u-1", "type": "user", "attributes": {"username": "reader", "version": 1}}
            }),
        );
        let mut client = anonymous_client(&transport);

        let user = client.account().create("reader", "pw", "r@example.org").unwrap();
        assert_eq!(user.username, "reader");
        assert_eq!(user.id(), "u-1");
        assert_eq!(
            transport.requests()[0].body,
            Some(json!({"username": "reader", "password": "pw", "email": "r@example.org"}))
        );
    }

    #[test]
    fn test_create_rejects_bad_email() {
        let transport = MockTransport::new();
        let mut client = anonymous_client(&transport);
        assert!(matches!(
            client.account().create("reader", "pw", "nope"),
            Err(RequestError::InvalidArgument { name: "email", .. })
        ));
    }

    #[test]
    fn test_activation_and_recovery_paths() {
        let transport = MockTransport::new();
        transport
            .push_json(200, json!({"result": "ok"}))
            .push_json(200, json!({"result": "ok"}))
            .push_json(200, json!({"result": "ok"}));
        let mut client = anonymous_client(&transport);

        client.account().activate("abc").unwrap();
        client.account().recover("r@example.org").unwrap();
        client.account().complete_recovery("xyz", "new-pw").unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].method, Method::GET);
        assert_eq!(transport.paths(), vec!["/account/activate/abc", "/account/recover", "/account/recover/xyz"]);
        assert_eq!(requests[2].body, Some(json!({"newPassword": "new-pw"})));
    }
}
