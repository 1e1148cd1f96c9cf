use crate::cookie::{parse_cookie_header, Cookie};
use std::collections::HashMap;
use std::fmt;

/// The slice of an HTTP exchange the session hooks need.
pub trait HttpExchange {
    fn request_cookie(&self, name: &str) -> Option<&str>;
    /// Attaches a cookie to the response, replacing one already set under the same name.
    fn set_response_cookie(&mut self, cookie: Cookie);
    fn response_cookies(&self) -> &[Cookie];
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RequestContext {
    pub query: HashMap<String, String>,
    pub headers: HashMap<String, String>,
    pub request_cookies: HashMap<String, String>,
    pub secure: bool,
    pub remote_address: Option<String>,
    pub request_url: String,
    response_cookies: Vec<Cookie>,
}

impl RequestContext {
    pub fn new(request_url: impl Into<String>) -> Self {
        RequestContext {
            request_url: request_url.into(),
            ..Default::default()
        }
    }

    /// Fills `request_cookies` from a raw `Cookie` header. The first occurrence of a name wins.
    pub fn with_cookie_header(mut self, header: &str) -> Self {
        for (name, value) in parse_cookie_header(header) {
            self.request_cookies.entry(name).or_insert(value);
        }
        self
    }

    pub fn take_response_cookies(&mut self) -> Vec<Cookie> {
        std::mem::take(&mut self.response_cookies)
    }
}

impl HttpExchange for RequestContext {
    fn request_cookie(&self, name: &str) -> Option<&str> {
        self.request_cookies.get(name).map(String::as_str)
    }

    fn set_response_cookie(&mut self, cookie: Cookie) {
        match self
            .response_cookies
            .iter_mut()
            .find(|existing| existing.name() == cookie.name())
        {
            Some(existing) => *existing = cookie,
            None => self.response_cookies.push(cookie),
        }
    }

    fn response_cookies(&self) -> &[Cookie] {
        &self.response_cookies
    }
}

impl fmt::Display for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.remote_address {
            Some(address) => write!(f, "{} from {}", self.request_url, address),
            None => f.write_str(&self.request_url),
        }
    }
}
