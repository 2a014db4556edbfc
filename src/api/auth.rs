//! Outgoing request authentication
//!
//! Every request the [`ApiClient`](super::ApiClient) sends first passes
//! through its registered [`RequestHook`]s. Two hooks ship with the crate:
//!
//! - [`CsrfHook`]: adds `X-CSRFToken` from the `csrftoken` cookie, but only
//!   for unsafe methods sent to the page's own origin.
//! - [`Session`](crate::session::Session): adds `Authorization: Token <token>`
//!   to every request while logged in.
//!
//! The hooks write disjoint headers, so their order does not matter.

use std::sync::Arc;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Method, Url};

/// Cookie holding the CSRF token
pub const CSRF_COOKIE: &str = "csrftoken";

/// Header the token is echoed in
pub const CSRF_HEADER: &str = "x-csrftoken";

/// A request about to be sent, as seen by hooks
#[derive(Debug, Clone)]
pub struct OutgoingRequest {
    pub method: Method,
    pub url: Url,
    /// Whether the target lies outside the page's origin
    pub cross_domain: bool,
    pub headers: HeaderMap,
}

impl OutgoingRequest {
    pub fn new(method: Method, url: Url, cross_domain: bool) -> Self {
        Self {
            method,
            url,
            cross_domain,
            headers: HeaderMap::new(),
        }
    }
}

/// Interception point invoked before every outgoing request
pub trait RequestHook: Send + Sync {
    fn before_send(&self, request: &mut OutgoingRequest);
}

/// Methods that never change server state and so need no CSRF token
pub fn is_safe_method(method: &str) -> bool {
    ["GET", "HEAD", "OPTIONS", "TRACE"]
        .iter()
        .any(|safe| safe.eq_ignore_ascii_case(method))
}

/// Find `name` in a `Cookie` header string and URL-decode its value.
///
/// Values that are not valid percent-encoding are returned as they appear.
pub fn parse_cookie(header: &str, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    header
        .split(';')
        .map(str::trim)
        .find_map(|cookie| cookie.strip_prefix(prefix.as_str()))
        .map(|value| match urlencoding::decode(value) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => value.to_string(),
        })
}

/// Adds the CSRF header to unsafe same-origin requests
pub struct CsrfHook {
    jar: Arc<Jar>,
}

impl CsrfHook {
    pub fn new(jar: Arc<Jar>) -> Self {
        Self { jar }
    }

    fn csrf_token(&self, url: &Url) -> Option<String> {
        let cookies = self.jar.cookies(url)?;
        let header = cookies.to_str().ok()?;
        parse_cookie(header, CSRF_COOKIE)
    }
}

impl RequestHook for CsrfHook {
    fn before_send(&self, request: &mut OutgoingRequest) {
        if is_safe_method(request.method.as_str()) || request.cross_domain {
            return;
        }
        let Some(token) = self.csrf_token(&request.url) else {
            tracing::debug!(url = %request.url, "no csrftoken cookie for unsafe request");
            return;
        };
        match HeaderValue::from_str(&token) {
            Ok(value) => {
                request.headers.insert(CSRF_HEADER, value);
            }
            Err(_) => tracing::warn!("csrftoken cookie is not a valid header value"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderName;

    fn jar_with(cookie: &str, url: &str) -> Arc<Jar> {
        let jar = Arc::new(Jar::default());
        jar.add_cookie_str(cookie, &Url::parse(url).unwrap());
        jar
    }

    #[test]
    fn test_safe_methods_case_insensitive() {
        for method in ["GET", "get", "Head", "OPTIONS", "trace"] {
            assert!(is_safe_method(method), "{} should be safe", method);
        }
        for method in ["POST", "put", "PATCH", "DELETE", "GETX", ""] {
            assert!(!is_safe_method(method), "{} should be unsafe", method);
        }
    }

    #[test]
    fn test_parse_cookie_finds_and_decodes() {
        let header = "sessionid=xyz; csrftoken=abc%2F123%3D; theme=dark";
        assert_eq!(parse_cookie(header, "csrftoken").as_deref(), Some("abc/123="));
        assert_eq!(parse_cookie(header, "theme").as_deref(), Some("dark"));
    }

    #[test]
    fn test_parse_cookie_requires_exact_name() {
        let header = "xcsrftoken=nope;csrftokenx=nope";
        assert_eq!(parse_cookie(header, "csrftoken"), None);
    }

    #[test]
    fn test_parse_cookie_empty_and_missing() {
        assert_eq!(parse_cookie("", "csrftoken"), None);
        assert_eq!(parse_cookie("a=1; b=2", "csrftoken"), None);
    }

    #[test]
    fn test_parse_cookie_first_match_wins() {
        let header = "csrftoken=first; csrftoken=second";
        assert_eq!(parse_cookie(header, "csrftoken").as_deref(), Some("first"));
    }

    #[test]
    fn test_parse_cookie_keeps_invalid_encoding() {
        assert_eq!(parse_cookie("csrftoken=%FF", "csrftoken").as_deref(), Some("%FF"));
    }

    #[test]
    fn test_csrf_hook_unsafe_same_origin() {
        let jar = jar_with("csrftoken=tok%20en", "http://localhost:8000/");
        let hook = CsrfHook::new(jar);

        let url = Url::parse("http://localhost:8000/api/tasks/").unwrap();
        let mut request = OutgoingRequest::new(Method::POST, url, false);
        hook.before_send(&mut request);

        assert_eq!(request.headers.get(CSRF_HEADER).unwrap(), "tok en");
    }

    #[test]
    fn test_csrf_hook_skips_safe_and_cross_domain() {
        let jar = jar_with("csrftoken=abc", "http://localhost:8000/");
        let hook = CsrfHook::new(jar);
        let url = Url::parse("http://localhost:8000/api/tasks/").unwrap();

        let mut get = OutgoingRequest::new(Method::GET, url.clone(), false);
        hook.before_send(&mut get);
        assert!(get.headers.get(CSRF_HEADER).is_none());

        let mut cross = OutgoingRequest::new(Method::PUT, url, true);
        hook.before_send(&mut cross);
        assert!(cross.headers.get(CSRF_HEADER).is_none());
    }

    #[test]
    fn test_csrf_header_name_is_valid() {
        let name = HeaderName::from_static(CSRF_HEADER);
        assert_eq!(name, "x-csrftoken");

        let jar = jar_with("csrftoken=abc", "http://localhost:8000/");
        let url = Url::parse("http://localhost:8000/api/tasks/").unwrap();
        let mut request = OutgoingRequest::new(Method::PATCH, url, false);
        CsrfHook::new(jar).before_send(&mut request);
        assert_eq!(request.headers.get(&name).unwrap(), "abc");
    }

    #[test]
    fn test_csrf_hook_without_cookie_adds_nothing() {
        let hook = CsrfHook::new(Arc::new(Jar::default()));
        let url = Url::parse("http://localhost:8000/api/tasks/").unwrap();
        let mut request = OutgoingRequest::new(Method::DELETE, url, false);
        hook.before_send(&mut request);
        assert!(request.headers.is_empty());
    }
}
