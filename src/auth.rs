//! Bearer-token session state and its durable credential store.
//!
//! The session is owned by a single client. Every mutation updates the
//! in-memory state first and then writes the credential record, within the
//! same call.

use crate::error::{CredentialError, RequestError};
use base64::Engine;
use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// A signed bearer token. The payload's `exp` claim is its expiry.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Expiry as a unix timestamp, or `None` if the payload can't be read.
    pub fn expires_at(&self) -> Option<i64> {
        let payload = self.0.split('.').nth(1)?;
        let trimmed = payload.trim_end_matches('=');
        let bytes = URL_SAFE_NO_PAD
            .decode(trimmed)
            .or_else(|_| STANDARD_NO_PAD.decode(trimmed))
            .ok()?;
        let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
        let exp = claims.get("exp")?;
        exp.as_i64().or_else(|| exp.as_f64().map(|secs| secs.floor() as i64))
    }

    /// A token whose expiry can't be read counts as expired.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at().is_none_or(|exp| exp <= now)
    }
}

// Tokens are credentials; keep them out of logs.
impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token(<{} chars>)", self.0.len())
    }
}

/// Where a session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No access token.
    Anonymous,
    /// Access token present and not past its expiry.
    Authenticated,
    /// Access token past its expiry; a refresh is needed.
    Expired,
}

/// Tokens handed out by a login or refresh call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedTokens {
    pub session: Token,
    /// `None` keeps the current refresh token.
    pub refresh: Option<Token>,
}

/// Durable credential record.
///
/// Every key must be present (values may be null); a record missing any of
/// them is treated as unreadable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCredentials {
    #[serde(deserialize_with = "Option::deserialize")]
    pub identity: Option<String>,
    #[serde(deserialize_with = "Option::deserialize")]
    pub access_token: Option<Token>,
    #[serde(deserialize_with = "Option::deserialize")]
    pub refresh_token: Option<Token>,
}

/// Persists the credential record for one client.
pub trait CredentialStore: Send {
    /// Returns `Ok(None)` when nothing has been stored yet.
    fn load(&self) -> Result<Option<StoredCredentials>, CredentialError>;

    fn save(&self, credentials: &StoredCredentials) -> Result<(), CredentialError>;
}

/// JSON credential file on disk.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<StoredCredentials>, CredentialError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save(&self, credentials: &StoredCredentials) -> Result<(), CredentialError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(credentials)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

/// In-memory store. Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    record: Arc<Mutex<Option<StoredCredentials>>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(credentials: StoredCredentials) -> Self {
        Self {
            record: Arc::new(Mutex::new(Some(credentials))),
        }
    }

    /// The last saved record.
    pub fn snapshot(&self) -> Option<StoredCredentials> {
        self.record
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<StoredCredentials>, CredentialError> {
        Ok(self.snapshot())
    }

    fn save(&self, credentials: &StoredCredentials) -> Result<(), CredentialError> {
        let mut guard = self
            .record
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Some(credentials.clone());
        Ok(())
    }
}

/// Current identity and tokens for one client instance.
pub struct AuthSession {
    identity: Option<String>,
    access_token: Option<Token>,
    refresh_token: Option<Token>,
    store: Box<dyn CredentialStore>,
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("identity", &self.identity)
            .field("access_token", &self.access_token)
            .field("refresh_token", &self.refresh_token)
            .finish_non_exhaustive()
    }
}

impl AuthSession {
    /// An anonymous session that persists to `store`. Nothing is loaded.
    pub fn new(store: Box<dyn CredentialStore>) -> Self {
        Self {
            identity: None,
            access_token: None,
            refresh_token: None,
            store,
        }
    }

    /// Restores the session from `store`.
    ///
    /// A missing, unreadable or inconsistent record yields an anonymous
    /// session.
    pub fn restore(store: Box<dyn CredentialStore>) -> Self {
        let mut session = Self::new(store);
        match session.store.load() {
            Ok(Some(record)) if record.access_token.is_some() => {
                session.identity = record.identity;
                session.access_token = record.access_token;
                session.refresh_token = record.refresh_token;
                debug!(identity = ?session.identity, "Restored saved session");
            }
            Ok(Some(record)) => {
                if record.identity.is_some() || record.refresh_token.is_some() {
                    warn!("Saved credentials have no access token; starting anonymous");
                }
            }
            Ok(None) => debug!("No saved credentials"),
            Err(err) => warn!(error = %err, "Discarding unreadable saved credentials"),
        }
        session
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    pub fn access_token(&self) -> Option<&Token> {
        self.access_token.as_ref()
    }

    pub fn refresh_token(&self) -> Option<&Token> {
        self.refresh_token.as_ref()
    }

    pub fn check_liveness(&self) -> SessionState {
        self.check_liveness_at(chrono::Utc::now().timestamp())
    }

    /// State of the session at unix time `now`.
    pub fn check_liveness_at(&self, now: i64) -> SessionState {
        match &self.access_token {
            None => SessionState::Anonymous,
            Some(token) if token.is_expired_at(now) => SessionState::Expired,
            Some(_) => SessionState::Authenticated,
        }
    }

    /// Stores freshly issued tokens.
    ///
    /// `identity = None` keeps the current identity, which is what a token
    /// refresh wants.
    pub fn authenticate(
        &mut self,
        identity: Option<String>,
        access_token: Token,
        refresh_token: Option<Token>,
    ) -> Result<(), CredentialError> {
        if identity.is_some() {
            self.identity = identity;
        }
        self.access_token = Some(access_token);
        if refresh_token.is_some() {
            self.refresh_token = refresh_token;
        }
        self.persist()
    }

    /// Exchanges the refresh token for a new access token via `issue`.
    ///
    /// On failure the session is cleared: the user has to log in again.
    pub fn refresh<F>(&mut self, issue: F) -> Result<(), RequestError>
    where
        F: FnOnce(&Token) -> Result<IssuedTokens, RequestError>,
    {
        let Some(refresh_token) = self.refresh_token.clone() else {
            self.clear_after_failed_refresh();
            return Err(RequestError::RefreshTokenFailed {
                reason: "no refresh token".to_string(),
            });
        };

        match issue(&refresh_token) {
            Ok(tokens) => {
                if let Err(err) = self.authenticate(None, tokens.session, tokens.refresh) {
                    warn!(error = %err, "Failed to persist refreshed session");
                }
                info!(identity = ?self.identity, "Session token refreshed");
                Ok(())
            }
            Err(err) => {
                self.clear_after_failed_refresh();
                Err(RequestError::RefreshTokenFailed {
                    reason: err.to_string(),
                })
            }
        }
    }

    /// Drops all credentials.
    pub fn logout(&mut self) -> Result<(), CredentialError> {
        self.clear();
        self.persist()
    }

    fn clear(&mut self) {
        self.identity = None;
        self.access_token = None;
        self.refresh_token = None;
    }

    fn clear_after_failed_refresh(&mut self) {
        self.clear();
        if let Err(err) = self.persist() {
            warn!(error = %err, "Failed to persist cleared session");
        }
    }

    fn persist(&self) -> Result<(), CredentialError> {
        self.store.save(&StoredCredentials {
            identity: self.identity.clone(),
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Builds an unsigned token whose payload carries `exp`.
    pub(crate) fn token_expiring_at(exp: i64) -> Token {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{exp},"uid":"u-1"}}"#));
        Token::new(format!("{header}.{payload}.signature"))
    }

    #[test]
    fn test_token_expiry() {
        let token = token_expiring_at(1_000);
        assert_eq!(token.expires_at(), Some(1_000));
        assert!(!token.is_expired_at(999));
        assert!(token.is_expired_at(1_000));
        assert!(token.is_expired_at(1_001));
    }

    #[test]
    fn test_padded_standard_payload() {
        let payload = base64::engine::general_purpose::STANDARD.encode(r#"{"exp":42}"#);
        let token = Token::new(format!("h.{payload}.s"));
        assert_eq!(token.expires_at(), Some(42));
    }

    #[test]
    fn test_fractional_expiry() {
        let payload = URL_SAFE_NO_PAD.encode(r#"{"exp":4102444800.5}"#);
        let token = Token::new(format!("h.{payload}.s"));
        assert_eq!(token.expires_at(), Some(4_102_444_800));
        assert!(!token.is_expired_at(4_102_444_799));

        let mut session = AuthSession::new(Box::new(MemoryCredentialStore::new()));
        session.authenticate(None, token, None).unwrap();
        assert_eq!(session.check_liveness_at(1_700_000_000), SessionState::Authenticated);
    }

    #[test]
    fn test_garbage_token_is_expired() {
        let token = Token::new("not-a-jwt");
        assert_eq!(token.expires_at(), None);
        assert!(token.is_expired_at(0));
    }

    #[test]
    fn test_token_debug_hides_value() {
        let token = Token::new("secret.value.here");
        assert!(!format!("{token:?}").contains("secret"));
    }

    #[test]
    fn test_liveness_states() {
        let store = MemoryCredentialStore::new();
        let mut session = AuthSession::new(Box::new(store));
        assert_eq!(session.check_liveness_at(500), SessionState::Anonymous);

        session
            .authenticate(Some("reader".into()), token_expiring_at(1_000), Some(token_expiring_at(9_000)))
            .unwrap();
        assert_eq!(session.check_liveness_at(500), SessionState::Authenticated);
        assert_eq!(session.check_liveness_at(1_500), SessionState::Expired);
    }

    #[test]
    fn test_authenticate_persists() {
        let store = MemoryCredentialStore::new();
        let mut session = AuthSession::new(Box::new(store.clone()));
        session
            .authenticate(Some("reader".into()), token_expiring_at(1), Some(token_expiring_at(2)))
            .unwrap();

        let saved = store.snapshot().unwrap();
        assert_eq!(saved.identity.as_deref(), Some("reader"));
        assert_eq!(saved.access_token, Some(token_expiring_at(1)));
        assert_eq!(saved.refresh_token, Some(token_expiring_at(2)));
    }

    #[test]
    fn test_refresh_success_keeps_identity_and_refresh_token() {
        let store = MemoryCredentialStore::new();
        let mut session = AuthSession::new(Box::new(store.clone()));
        session
            .authenticate(Some("reader".into()), token_expiring_at(1), Some(token_expiring_at(2)))
            .unwrap();

        let mut seen = None;
        session
            .refresh(|refresh| {
                seen = Some(refresh.clone());
                Ok(IssuedTokens {
                    session: token_expiring_at(5_000),
                    refresh: None,
                })
            })
            .unwrap();

        assert_eq!(seen, Some(token_expiring_at(2)));
        assert_eq!(session.identity(), Some("reader"));
        assert_eq!(session.access_token(), Some(&token_expiring_at(5_000)));
        assert_eq!(session.refresh_token(), Some(&token_expiring_at(2)));
        assert_eq!(
            store.snapshot().unwrap().access_token,
            Some(token_expiring_at(5_000))
        );
    }

    #[test]
    fn test_refresh_failure_clears_session() {
        let store = MemoryCredentialStore::new();
        let mut session = AuthSession::new(Box::new(store.clone()));
        session
            .authenticate(Some("reader".into()), token_expiring_at(1), Some(token_expiring_at(2)))
            .unwrap();

        let err = session
            .refresh(|_| Err(RequestError::RequestFailed(Vec::new())))
            .unwrap_err();
        assert!(matches!(err, RequestError::RefreshTokenFailed { .. }));
        assert_eq!(session.check_liveness_at(0), SessionState::Anonymous);
        assert_eq!(session.identity(), None);
        assert_eq!(store.snapshot(), Some(StoredCredentials::default()));
    }

    #[test]
    fn test_refresh_without_refresh_token_fails() {
        let mut session = AuthSession::new(Box::new(MemoryCredentialStore::new()));
        let mut called = false;
        let err = session
            .refresh(|_| {
                called = true;
                unreachable!()
            })
            .unwrap_err();
        assert!(!called);
        assert!(matches!(err, RequestError::RefreshTokenFailed { .. }));
    }

    #[test]
    fn test_logout_clears_and_persists() {
        let store = MemoryCredentialStore::new();
        let mut session = AuthSession::new(Box::new(store.clone()));
        session
            .authenticate(Some("reader".into()), token_expiring_at(1), None)
            .unwrap();
        session.logout().unwrap();
        assert_eq!(session.check_liveness_at(0), SessionState::Anonymous);
        assert_eq!(store.snapshot(), Some(StoredCredentials::default()));
    }

    #[test]
    fn test_restore_round_trip_through_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("credentials.json");
        {
            let mut session = AuthSession::new(Box::new(FileCredentialStore::new(&path)));
            session
                .authenticate(Some("reader".into()), token_expiring_at(10), Some(token_expiring_at(20)))
                .unwrap();
        }

        let restored = AuthSession::restore(Box::new(FileCredentialStore::new(&path)));
        assert_eq!(restored.identity(), Some("reader"));
        assert_eq!(restored.access_token(), Some(&token_expiring_at(10)));
        assert_eq!(restored.refresh_token(), Some(&token_expiring_at(20)));
    }

    #[test]
    fn test_restore_missing_file_is_anonymous() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path().join("absent.json"));
        let session = AuthSession::restore(Box::new(store));
        assert_eq!(session.check_liveness(), SessionState::Anonymous);
    }

    #[test]
    fn test_restore_corrupt_file_is_anonymous() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "{not json").unwrap();
        let session = AuthSession::restore(Box::new(FileCredentialStore::new(&path)));
        assert_eq!(session.check_liveness(), SessionState::Anonymous);
    }

    #[test]
    fn test_restore_incomplete_record_is_anonymous() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.json");
        let token = token_expiring_at(i64::MAX / 2);
        std::fs::write(
            &path,
            format!(r#"{{"identity": "reader", "accessToken": "{}"}}"#, token.as_str()),
        )
        .unwrap();
        let session = AuthSession::restore(Box::new(FileCredentialStore::new(&path)));
        assert_eq!(session.check_liveness(), SessionState::Anonymous);
        assert_eq!(session.identity(), None);
    }

    #[test]
    fn test_restore_identity_without_token_is_anonymous() {
        let store = MemoryCredentialStore::with_credentials(StoredCredentials {
            identity: Some("reader".into()),
            access_token: None,
            refresh_token: None,
        });
        let session = AuthSession::restore(Box::new(store));
        assert_eq!(session.identity(), None);
        assert_eq!(session.check_liveness(), SessionState::Anonymous);
    }
}
