//! Cookie types mirroring the DevTools `Network` domain.
//!
//! A cached session is a JSON array of [`Cookie`] values exactly as the
//! browser reported them, so a saved cookie can be re-applied without
//! translation loss. [`CookieParam`] is the write-side shape accepted
//! by `Network.setCookies`.

use serde::{Deserialize, Serialize};

/// SameSite cookie attribute.
///
/// Controls when cookies are sent with cross-site requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
    /// Cookie is only sent with same-site requests
    #[serde(rename = "Strict")]
    Strict,
    /// Cookie is sent with same-site requests and cross-site top-level navigations
    #[serde(rename = "Lax")]
    Lax,
    /// Cookie is sent with same-site and cross-site requests
    #[serde(rename = "None")]
    None,
}

/// Cookie retention priority, as reported by Chrome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CookiePriority {
    #[serde(rename = "Low")]
    Low,
    #[default]
    #[serde(rename = "Medium")]
    Medium,
    #[serde(rename = "High")]
    High,
}

/// A browser cookie as reported by `Network.getCookies`.
///
/// Field names and types follow the DevTools schema so that a stored
/// cookie round-trips byte-for-byte through the browser. Attributes
/// newer browsers omit or add are tolerated on read: everything past
/// `value` is defaulted when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    /// Cookie name
    pub name: String,

    /// Cookie value
    pub value: String,

    /// Domain the cookie is scoped to
    #[serde(default)]
    pub domain: String,

    /// Path the cookie is scoped to
    #[serde(default)]
    pub path: String,

    /// Expiry as a unix timestamp in seconds (-1 means session cookie)
    #[serde(default = "session_expiry")]
    pub expires: f64,

    /// Size on the wire, in bytes
    #[serde(default)]
    pub size: i64,

    /// Whether the cookie is HTTP-only
    #[serde(default)]
    pub http_only: bool,

    /// Whether the cookie requires HTTPS
    #[serde(default)]
    pub secure: bool,

    /// True for cookies without an expiry
    #[serde(default)]
    pub session: bool,

    /// SameSite attribute, absent when the cookie does not declare one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_site: Option<SameSite>,

    /// Retention priority, absent in output from older browsers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<CookiePriority>,
}

fn session_expiry() -> f64 {
    -1.0
}

impl Cookie {
    /// Creates a new session cookie with the required fields.
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            path: "/".to_string(),
            expires: -1.0,
            size: 0,
            http_only: false,
            secure: false,
            session: true,
            same_site: None,
            priority: None,
        }
    }

    /// Sets the path for the cookie.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Sets the expiration timestamp and clears the session flag.
    pub fn expires(mut self, expires: f64) -> Self {
        self.expires = expires;
        self.session = false;
        self
    }

    /// Sets whether the cookie is HTTP-only.
    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    /// Sets whether the cookie requires HTTPS.
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Sets the SameSite attribute.
    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }
}

/// A cookie to apply via `Network.setCookies`.
///
/// Only `name` and `value` are required; every optional attribute that
/// is present is honored by the browser.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieParam {
    /// Cookie name
    pub name: String,

    /// Cookie value
    pub value: String,

    /// URL to infer domain and path from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Domain for the cookie
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    /// Path for the cookie
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Whether the cookie requires HTTPS
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,

    /// Whether the cookie is HTTP-only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_only: Option<bool>,

    /// SameSite attribute
    #[serde(skip_serializing_if = "Option::is_none")]
    pub same_site: Option<SameSite>,

    /// Expiry as a unix timestamp in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<f64>,
}

impl CookieParam {
    /// Creates a new cookie param with required fields and a domain.
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: Some(domain.into()),
            ..Self::default()
        }
    }

    /// Creates a new cookie param from a URL (domain and path inferred).
    pub fn from_url(
        name: impl Into<String>,
        value: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            url: Some(url.into()),
            ..Self::default()
        }
    }
}

impl From<&Cookie> for CookieParam {
    /// Carries every attribute of a stored cookie that `setCookies`
    /// accepts. Session cookies keep `expires` unset so the browser
    /// treats them as session-scoped again.
    fn from(cookie: &Cookie) -> Self {
        Self {
            name: cookie.name.clone(),
            value: cookie.value.clone(),
            url: None,
            domain: Some(cookie.domain.clone()),
            path: Some(cookie.path.clone()),
            secure: Some(cookie.secure),
            http_only: Some(cookie.http_only),
            same_site: cookie.same_site,
            expires: (!cookie.session && cookie.expires >= 0.0).then_some(cookie.expires),
        }
    }
}
