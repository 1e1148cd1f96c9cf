use crate::error::ConfigError;
use chrono::{Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum_macros::{Display, EnumString, IntoStaticStr};

const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Value of the `SameSite` cookie attribute. Parsed case-insensitively, also
/// when loaded through serde.
#[derive(Display, Debug, Copy, Clone, PartialEq, Eq, EnumString, IntoStaticStr, Serialize, Deserialize)]
#[strum(ascii_case_insensitive)]
#[serde(try_from = "String")]
pub enum SameSiteMode {
    #[strum(serialize = "Strict")]
    Strict,
    #[strum(serialize = "Lax")]
    Lax,
    #[strum(serialize = "None")]
    None,
}

impl SameSiteMode {
    pub fn parse(input: &str) -> Option<SameSiteMode> {
        SameSiteMode::from_str(input.trim()).ok()
    }
}

impl TryFrom<String> for SameSiteMode {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        SameSiteMode::parse(&value).ok_or(ConfigError::UnknownSameSiteMode(value))
    }
}

/// A response cookie. Built once per call and handed to the exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct Cookie {
    name: String,
    value: String,
    path: Option<String>,
    domain: Option<String>,
    max_age: Option<i64>,
    discard: bool,
    secure: bool,
    http_only: bool,
    comment: Option<String>,
    same_site_mode: Option<SameSiteMode>,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Cookie {
            name: name.into(),
            value: value.into(),
            path: None,
            domain: None,
            max_age: None,
            discard: false,
            secure: false,
            http_only: false,
            comment: None,
            same_site_mode: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn max_age(&self) -> Option<i64> {
        self.max_age
    }

    pub fn is_discard(&self) -> bool {
        self.discard
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub fn is_http_only(&self) -> bool {
        self.http_only
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn same_site_mode(&self) -> Option<SameSiteMode> {
        self.same_site_mode
    }

    pub fn set_path(mut self, path: Option<String>) -> Self {
        self.path = path;
        self
    }

    pub fn set_domain(mut self, domain: Option<String>) -> Self {
        self.domain = domain;
        self
    }

    pub fn set_max_age(mut self, max_age: i64) -> Self {
        self.max_age = Some(max_age);
        self
    }

    pub fn set_discard(mut self, discard: bool) -> Self {
        self.discard = discard;
        self
    }

    pub fn set_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn set_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    pub fn set_comment(mut self, comment: Option<String>) -> Self {
        self.comment = comment;
        self
    }

    pub fn set_same_site_mode(mut self, mode: SameSiteMode) -> Self {
        self.same_site_mode = Some(mode);
        self
    }

    fn expires(&self) -> Option<String> {
        let max_age = self.max_age?;
        let date = if max_age <= 0 {
            Utc.timestamp_opt(0, 0).single()?
        } else {
            Utc::now().checked_add_signed(Duration::try_seconds(max_age)?)?
        };
        Some(date.format(HTTP_DATE_FORMAT).to_string())
    }
}

/// Renders the cookie as a `Set-Cookie` header value.
impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)?;
        if let Some(path) = &self.path {
            write!(f, "; Path={}", path)?;
        }
        if let Some(domain) = &self.domain {
            write!(f, "; Domain={}", domain)?;
        }
        if let Some(max_age) = self.max_age {
            write!(f, "; Max-Age={}", max_age.max(0))?;
        }
        if let Some(expires) = self.expires() {
            write!(f, "; Expires={}", expires)?;
        }
        if self.secure {
            f.write_str("; Secure")?;
        }
        if self.http_only {
            f.write_str("; HttpOnly")?;
        }
        if let Some(mode) = self.same_site_mode {
            write!(f, "; SameSite={}", mode)?;
        }
        if let Some(comment) = &self.comment {
            write!(f, "; Comment=\"{}\"", comment.replace('"', "\\\""))?;
        }
        if self.discard {
            f.write_str("; Discard")?;
        }
        Ok(())
    }
}

impl From<Cookie> for String {
    fn from(cookie: Cookie) -> String {
        cookie.to_string()
    }
}

/// Parses a `Cookie` request header into name/value pairs.
pub fn parse_cookie_header(header: &str) -> Vec<(String, String)> {
    header
        .split(';')
        .filter_map(|pair| {
            let mut parts = pair.splitn(2, '=');
            let name = parts.next()?.trim();
            let value = parts.next()?.trim().trim_matches('"');
            if name.is_empty() {
                None
            } else {
                Some((name.to_owned(), value.to_owned()))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_same_site_mode_case_insensitively() {
        assert_eq!(SameSiteMode::parse("strict"), Some(SameSiteMode::Strict));
        assert_eq!(SameSiteMode::parse("LAX"), Some(SameSiteMode::Lax));
        assert_eq!(SameSiteMode::parse(" None "), Some(SameSiteMode::None));
        assert_eq!(SameSiteMode::parse("sometimes"), None);
    }

    #[test]
    fn renders_minimal_cookie() {
        let cookie = Cookie::new("JSESSIONID", "abc");
        assert_eq!(String::from(cookie), "JSESSIONID=abc");
    }

    #[test]
    fn renders_all_attributes() {
        let cookie = Cookie::new("sid", "42")
            .set_path(Some("/app".to_owned()))
            .set_domain(Some("example.com".to_owned()))
            .set_secure(true)
            .set_http_only(true)
            .set_same_site_mode(SameSiteMode::Lax)
            .set_comment(Some("session".to_owned()))
            .set_discard(true);
        assert_eq!(
            cookie.to_string(),
            "sid=42; Path=/app; Domain=example.com; Secure; HttpOnly; SameSite=Lax; \
             Comment=\"session\"; Discard"
        );
    }

    #[test]
    fn zero_max_age_expires_at_epoch() {
        let cookie = Cookie::new("sid", "").set_max_age(0);
        assert_eq!(
            cookie.to_string(),
            "sid=; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT"
        );
    }

    #[test]
    fn positive_max_age_renders_expires() {
        let rendered = Cookie::new("sid", "1").set_max_age(3600).to_string();
        assert!(rendered.starts_with("sid=1; Max-Age=3600; Expires="));
        assert!(rendered.ends_with(" GMT"));
    }

    #[test]
    fn parses_cookie_header() {
        let pairs = parse_cookie_header("a=1; JSESSIONID=\"xyz\";  empty=; =bad; flag");
        assert_eq!(
            pairs,
            vec![
                ("a".to_owned(), "1".to_owned()),
                ("JSESSIONID".to_owned(), "xyz".to_owned()),
                ("empty".to_owned(), "".to_owned()),
            ]
        );
    }
}
