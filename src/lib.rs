//! mdapi - blocking client for the MangaDex HTTP API.
//!
//! This library provides:
//! - Query-string flattening for the service's bracketed parameter style
//! - Decoding of tagged resource objects into typed models
//! - A bearer-token session with proactive refresh and durable credentials
//! - Offset-based cursors over listing endpoints

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod console;
pub mod endpoint;
pub mod error;
pub mod pagination;
pub mod query;
pub mod schema;
pub mod transport;

// Re-export commonly used types
pub use auth::{AuthSession, CredentialStore, FileCredentialStore, MemoryCredentialStore, SessionState, Token};
pub use client::{ApiRequest, Client};
pub use config::Config;
pub use console::Console;
pub use endpoint::{Endpoint, endpoints};
pub use error::{ClientError, ConfigError, DecodeError, QueryError, RequestError};
pub use pagination::Cursor;
pub use query::{QueryParams, QueryValue};
pub use schema::{Decode, Resource, ResourceId, ResourceKind, TypedResource};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
