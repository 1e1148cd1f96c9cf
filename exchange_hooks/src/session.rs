use crate::context::HttpExchange;
use crate::cookie::{Cookie, SameSiteMode};
use crate::error::ConfigError;
use log::trace;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

pub const DEFAULT_SESSION_ID: &str = "JSESSIONID";

/// Where a session id was found on an incoming request.
#[derive(Display, Debug, Copy, Clone, PartialEq, Eq)]
pub enum SessionCookieSource {
    #[strum(serialize = "cookie")]
    Cookie,
    #[strum(serialize = "none")]
    None,
}

/// Extension point through which a session manager attaches and reads
/// session ids on an exchange.
pub trait SessionConfig<E: HttpExchange> {
    fn set_session_id(&self, exchange: &mut E, session_id: &str);
    fn clear_session(&self, exchange: &mut E, session_id: &str);
    fn find_session_id(&self, exchange: &E) -> Option<String>;
    fn session_cookie_source(&self, exchange: &E) -> SessionCookieSource;
    fn rewrite_url(&self, original_url: &str, session_id: &str) -> String;
}

/// Cookie-based session config that can also emit the `SameSite` attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SessionCookieConfig {
    cookie_name: String,
    path: String,
    domain: Option<String>,
    discard: bool,
    secure: bool,
    http_only: bool,
    /// Seconds. Only positive values are written to the cookie.
    max_age: i64,
    comment: Option<String>,
    same_site_mode: Option<SameSiteMode>,
}

impl Default for SessionCookieConfig {
    fn default() -> Self {
        SessionCookieConfig {
            cookie_name: DEFAULT_SESSION_ID.to_owned(),
            path: "/".to_owned(),
            domain: None,
            discard: false,
            secure: false,
            http_only: true,
            max_age: -1,
            comment: None,
            same_site_mode: None,
        }
    }
}

impl SessionCookieConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn set_cookie_name(&mut self, cookie_name: impl Into<String>) -> &mut Self {
        self.cookie_name = cookie_name.into();
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn set_path(&mut self, path: impl Into<String>) -> &mut Self {
        self.path = path.into();
        self
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn set_domain(&mut self, domain: Option<String>) -> &mut Self {
        self.domain = domain;
        self
    }

    pub fn is_discard(&self) -> bool {
        self.discard
    }

    pub fn set_discard(&mut self, discard: bool) -> &mut Self {
        self.discard = discard;
        self
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub fn set_secure(&mut self, secure: bool) -> &mut Self {
        self.secure = secure;
        self
    }

    pub fn is_http_only(&self) -> bool {
        self.http_only
    }

    pub fn set_http_only(&mut self, http_only: bool) -> &mut Self {
        self.http_only = http_only;
        self
    }

    pub fn max_age(&self) -> i64 {
        self.max_age
    }

    pub fn set_max_age(&mut self, max_age: i64) -> &mut Self {
        self.max_age = max_age;
        self
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn set_comment(&mut self, comment: Option<String>) -> &mut Self {
        self.comment = comment;
        self
    }

    pub fn same_site_mode(&self) -> Option<SameSiteMode> {
        self.same_site_mode
    }

    pub fn set_same_site_mode(&mut self, mode: Option<SameSiteMode>) -> &mut Self {
        self.same_site_mode = mode;
        self
    }

    /// Accepts `strict`, `lax` or `none` in any case.
    pub fn set_same_site_mode_str(&mut self, mode: &str) -> Result<&mut Self, ConfigError> {
        let parsed = SameSiteMode::parse(mode)
            .ok_or_else(|| ConfigError::UnknownSameSiteMode(mode.to_owned()))?;
        Ok(self.set_same_site_mode(Some(parsed)))
    }

    fn base_cookie(&self, session_id: &str) -> Cookie {
        Cookie::new(self.cookie_name.clone(), session_id)
            .set_path(Some(self.path.clone()))
            .set_domain(self.domain.clone())
            .set_discard(self.discard)
            .set_secure(self.secure)
            .set_http_only(self.http_only)
    }
}

impl<E> SessionConfig<E> for SessionCookieConfig
where
    E: HttpExchange + std::fmt::Display,
{
    fn set_session_id(&self, exchange: &mut E, session_id: &str) {
        let mut cookie = self
            .base_cookie(session_id)
            .set_comment(self.comment.clone());
        if let Some(mode) = self.same_site_mode {
            cookie = cookie.set_same_site_mode(mode);
        }
        if self.max_age > 0 {
            cookie = cookie.set_max_age(self.max_age);
        }
        exchange.set_response_cookie(cookie);
        trace!(
            "Setting session cookie session id {} on {}",
            session_id,
            exchange
        );
    }

    fn clear_session(&self, exchange: &mut E, session_id: &str) {
        let cookie = self.base_cookie(session_id).set_max_age(0);
        exchange.set_response_cookie(cookie);
        trace!(
            "Clearing session cookie session id {} on {}",
            session_id,
            exchange
        );
    }

    fn find_session_id(&self, exchange: &E) -> Option<String> {
        let session_id = exchange.request_cookie(&self.cookie_name)?.to_owned();
        trace!("Found session cookie session id {} on {}", session_id, exchange);
        Some(session_id)
    }

    fn session_cookie_source(&self, exchange: &E) -> SessionCookieSource {
        if exchange.request_cookie(&self.cookie_name).is_some() {
            SessionCookieSource::Cookie
        } else {
            SessionCookieSource::None
        }
    }

    fn rewrite_url(&self, original_url: &str, _session_id: &str) -> String {
        original_url.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RequestContext;

    #[test]
    fn defaults_match_servlet_conventions() {
        let config = SessionCookieConfig::default();
        assert_eq!(config.cookie_name(), "JSESSIONID");
        assert_eq!(config.path(), "/");
        assert!(config.is_http_only());
        assert!(!config.is_secure());
        assert_eq!(config.max_age(), -1);
        assert_eq!(config.same_site_mode(), None);
    }

    #[test]
    fn rejects_unknown_same_site_mode() {
        let mut config = SessionCookieConfig::new();
        let err = config.set_same_site_mode_str("sometimes").unwrap_err();
        assert_eq!(err, ConfigError::UnknownSameSiteMode("sometimes".to_owned()));
        assert_eq!(config.same_site_mode(), None);

        config.set_same_site_mode_str("strict").unwrap();
        assert_eq!(config.same_site_mode(), Some(SameSiteMode::Strict));
    }

    #[test]
    fn rewrite_url_is_identity() {
        let config = SessionCookieConfig::new();
        assert_eq!(
            SessionConfig::<RequestContext>::rewrite_url(&config, "/a?b=c", "id"),
            "/a?b=c"
        );
    }
}
