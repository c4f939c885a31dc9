//! Endpoint descriptors and path-template resolution.

use crate::error::RequestError;
use regex::Regex;
use reqwest::Method;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Regex for `{name}` placeholders in path templates.
static PLACEHOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("Invalid PLACEHOLDER_REGEX"));

/// An HTTP method paired with a path template such as `/manga/{manga}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub method: Method,
    pub path: &'static str,
}

impl Endpoint {
    pub const fn new(method: Method, path: &'static str) -> Self {
        Self { method, path }
    }

    /// True for the token refresh endpoint, which must never trigger a
    /// refresh itself.
    pub fn is_refresh(&self) -> bool {
        *self == endpoints::auth::REFRESH
    }

    /// Absolute templates bypass the configured base URL.
    pub fn is_absolute(&self) -> bool {
        self.path.starts_with("http://") || self.path.starts_with("https://")
    }

    /// Names of the placeholders in the template, in order.
    pub fn placeholders(&self) -> Vec<&'static str> {
        PLACEHOLDER_REGEX
            .captures_iter(self.path)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
            .collect()
    }
}

/// Substitutes every `{name}` in `template` from `params`.
///
/// Unused entries in `params` are ignored; an unresolved placeholder is an
/// error.
pub fn resolve_path(template: &str, params: &HashMap<String, String>) -> Result<String, RequestError> {
    let mut resolved = String::with_capacity(template.len());
    let mut last = 0;

    for caps in PLACEHOLDER_REGEX.captures_iter(template) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let value = params
            .get(name.as_str())
            .ok_or_else(|| RequestError::MissingUrlParam(name.as_str().to_string()))?;
        resolved.push_str(&template[last..whole.start()]);
        resolved.push_str(value);
        last = whole.end();
    }

    resolved.push_str(&template[last..]);
    Ok(resolved)
}

/// The service's endpoint table.
pub mod endpoints {
    use super::Endpoint;
    use reqwest::Method;

    pub mod auth {
        use super::*;

        pub const LOGIN: Endpoint = Endpoint::new(Method::POST, "/auth/login");
        pub const CHECK: Endpoint = Endpoint::new(Method::GET, "/auth/check");
        pub const LOGOUT: Endpoint = Endpoint::new(Method::POST, "/auth/logout");
        pub const REFRESH: Endpoint = Endpoint::new(Method::POST, "/auth/refresh");
    }

    pub mod account {
        use super::*;

        pub const CREATE: Endpoint = Endpoint::new(Method::POST, "/account/create");
        pub const RECOVER: Endpoint = Endpoint::new(Method::POST, "/account/recover");
        pub const COMPLETE_RECOVER: Endpoint = Endpoint::new(Method::POST, "/account/recover/{code}");
        pub const ACTIVATE: Endpoint = Endpoint::new(Method::GET, "/account/activate/{code}");
        pub const ACTIVATE_RESEND: Endpoint = Endpoint::new(Method::POST, "/account/activate/resend");
    }

    pub mod author {
        use super::*;

        pub const CREATE: Endpoint = Endpoint::new(Method::POST, "/author");
        pub const SEARCH: Endpoint = Endpoint::new(Method::GET, "/author");
        pub const GET: Endpoint = Endpoint::new(Method::GET, "/author/{author}");
        pub const EDIT: Endpoint = Endpoint::new(Method::PUT, "/author/{author}");
        pub const DELETE: Endpoint = Endpoint::new(Method::DELETE, "/author/{author}");
    }

    pub mod chapter {
        use super::*;

        pub const SEARCH: Endpoint = Endpoint::new(Method::GET, "/chapter");
        pub const GET: Endpoint = Endpoint::new(Method::GET, "/chapter/{chapter}");
        pub const EDIT: Endpoint = Endpoint::new(Method::PUT, "/chapter/{chapter}");
        pub const DELETE: Endpoint = Endpoint::new(Method::DELETE, "/chapter/{chapter}");
        pub const MARK_READ: Endpoint = Endpoint::new(Method::POST, "/chapter/{chapter}/read");
        pub const MARK_UNREAD: Endpoint = Endpoint::new(Method::DELETE, "/chapter/{chapter}/read");
    }

    pub mod group {
        use super::*;

        pub const SEARCH: Endpoint = Endpoint::new(Method::GET, "/group");
        pub const CREATE: Endpoint = Endpoint::new(Method::POST, "/group");
        pub const GET: Endpoint = Endpoint::new(Method::GET, "/group/{group}");
        pub const EDIT: Endpoint = Endpoint::new(Method::PUT, "/group/{group}");
        pub const DELETE: Endpoint = Endpoint::new(Method::DELETE, "/group/{group}");
        pub const FOLLOW: Endpoint = Endpoint::new(Method::POST, "/group/{group}/follow");
        pub const UNFOLLOW: Endpoint = Endpoint::new(Method::DELETE, "/group/{group}/follow");
    }

    pub mod list {
        use super::*;

        pub const CREATE: Endpoint = Endpoint::new(Method::POST, "/list");
        pub const GET: Endpoint = Endpoint::new(Method::GET, "/list/{list}");
        pub const EDIT: Endpoint = Endpoint::new(Method::PUT, "/list/{list}");
        pub const DELETE: Endpoint = Endpoint::new(Method::DELETE, "/list/{list}");
        pub const FEED: Endpoint = Endpoint::new(Method::GET, "/list/{list}/feed");
    }

    pub mod manga {
        use super::*;

        pub const SEARCH: Endpoint = Endpoint::new(Method::GET, "/manga");
        pub const CREATE: Endpoint = Endpoint::new(Method::POST, "/manga");
        pub const TAGS: Endpoint = Endpoint::new(Method::GET, "/manga/tag");
        pub const RANDOM: Endpoint = Endpoint::new(Method::GET, "/manga/random");
        pub const GET: Endpoint = Endpoint::new(Method::GET, "/manga/{manga}");
        pub const EDIT: Endpoint = Endpoint::new(Method::PUT, "/manga/{manga}");
        pub const DELETE: Endpoint = Endpoint::new(Method::DELETE, "/manga/{manga}");
        pub const SET_STATUS: Endpoint = Endpoint::new(Method::POST, "/manga/{manga}/status");
        pub const FOLLOW: Endpoint = Endpoint::new(Method::POST, "/manga/{manga}/follow");
        pub const UNFOLLOW: Endpoint = Endpoint::new(Method::DELETE, "/manga/{manga}/follow");
        pub const FEED: Endpoint = Endpoint::new(Method::GET, "/manga/{manga}/feed");
        pub const READ_MARKERS: Endpoint = Endpoint::new(Method::GET, "/manga/{manga}/read");
        pub const ADD_TO_LIST: Endpoint = Endpoint::new(Method::POST, "/manga/{manga}/list/{list}");
        pub const REMOVE_FROM_LIST: Endpoint =
            Endpoint::new(Method::DELETE, "/manga/{manga}/list/{list}");
    }

    pub mod user {
        use super::*;

        pub const ME: Endpoint = Endpoint::new(Method::GET, "/user/me");
        pub const LISTS: Endpoint = Endpoint::new(Method::GET, "/user/list");
        pub const OTHER_LISTS: Endpoint = Endpoint::new(Method::GET, "/user/{user}/list");
        pub const FOLLOWED_GROUPS: Endpoint = Endpoint::new(Method::GET, "/user/follows/group");
        pub const FOLLOWED_MANGA: Endpoint = Endpoint::new(Method::GET, "/user/follows/manga");
        pub const FOLLOWED_FEED: Endpoint = Endpoint::new(Method::GET, "/user/follows/manga/feed");
    }

    pub const AT_HOME_SERVER: Endpoint = Endpoint::new(Method::GET, "/at-home/server/{chapter}");
    pub const SOLVE_CAPTCHA: Endpoint = Endpoint::new(Method::POST, "/captcha/solve");
    pub const LEGACY_MAPPING: Endpoint = Endpoint::new(Method::POST, "/legacy/mapping");
    pub const AT_HOME_REPORT: Endpoint = Endpoint::new(Method::POST, "https://api.mangadex.network/report");
}
