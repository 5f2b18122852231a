//! Data structures for saved sessions
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::DomainInfo;

/// Information about the browser tab the core is acting on
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TabInfo {
    pub id: Option<i32>,
    pub url: Option<String>,
    pub fav_icon_url: Option<String>,
}

impl TabInfo {
    pub fn new(id: i32, url: &str) -> TabInfo {
        TabInfo {
            id: Some(id),
            url: Some(url.to_string()),
            fav_icon_url: None,
        }
    }

    pub fn with_favicon(mut self, fav_icon_url: &str) -> TabInfo {
        self.fav_icon_url = Some(fav_icon_url.to_string());
        self
    }
}

/// A saved snapshot of one site's client-side auth state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub title: String,
    pub icon_url: String,
    pub domain: DomainInfo,
    pub created_at: i64,
    pub updated_at: i64,
    pub state: SiteState,
}

/// Web Storage contents of a page, as read from or written to the tab
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WebStorage {
    #[serde(default)]
    pub local_storage: BTreeMap<String, String>,
    #[serde(default)]
    pub session_storage: BTreeMap<String, String>,
}

/// Everything needed to restore a logged-in state
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SiteState {
    #[serde(default)]
    pub local_storage: BTreeMap<String, String>,
    #[serde(default)]
    pub session_storage: BTreeMap<String, String>,
    #[serde(default)]
    pub cookies: Vec<Cookie>,
}

impl SiteState {
    pub fn new(storage: WebStorage, cookies: Vec<Cookie>) -> SiteState {
        SiteState {
            local_storage: storage.local_storage,
            session_storage: storage.session_storage,
            cookies,
        }
    }

    pub fn web_storage(&self) -> WebStorage {
        WebStorage {
            local_storage: self.local_storage.clone(),
            session_storage: self.session_storage.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.local_storage.is_empty() && self.session_storage.is_empty() && self.cookies.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SameSite {
    NoRestriction,
    #[default]
    Lax,
    Strict,
    Unspecified,
}

/// A cookie in the browser's native shape.
///
/// The value is a credential; `Debug` redacts it so it never reaches a log.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub same_site: SameSite,
    /// Seconds since the epoch; absent for session cookies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<f64>,
    #[serde(default)]
    pub host_only: bool,
    #[serde(default)]
    pub session: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_id: Option<String>,
}

impl fmt::Debug for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cookie")
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .field("domain", &self.domain)
            .field("path", &self.path)
            .field("secure", &self.secure)
            .field("http_only", &self.http_only)
            .field("same_site", &self.same_site)
            .field("expiration_date", &self.expiration_date)
            .field("host_only", &self.host_only)
            .finish()
    }
}

/// Arguments for writing one cookie back through the cookie API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CookieSetDetails {
    pub url: String,
    pub name: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<f64>,
}

impl CookieSetDetails {
    /// Build set-details for `cookie` against the tab's origin.
    ///
    /// Host-only cookies get no domain attribute, otherwise the browser
    /// would widen them into domain cookies.
    pub fn for_origin(origin: &str, cookie: &Cookie) -> CookieSetDetails {
        let path = if cookie.path.is_empty() {
            "/".to_string()
        } else {
            cookie.path.clone()
        };

        CookieSetDetails {
            url: origin.to_string(),
            name: cookie.name.clone(),
            value: cookie.value.clone(),
            domain: (!cookie.host_only && !cookie.domain.is_empty()).then(|| cookie.domain.clone()),
            path,
            secure: cookie.secure,
            http_only: cookie.http_only,
            same_site: cookie.same_site,
            expiration_date: cookie.expiration_date,
        }
    }
}
