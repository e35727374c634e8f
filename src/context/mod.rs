//! Per-request context handed to route handlers and middleware.
//!
//! Wraps the parsed [`Request`] and exposes the accessors the proxy
//! operations actually consume: the method, the path, and percent-decoded
//! query parameters.

use crate::Request;
use crate::http::Method;

/// The per-request view flowing through the middleware chain into handlers.
pub struct Context {
    request: Request,
}

impl Context {
    /// Wraps a parsed request.
    pub fn new(request: Request) -> Self {
        Self { request }
    }

    /// Returns the underlying request.
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Returns the HTTP method.
    pub fn method(&self) -> &Method {
        self.request.method()
    }

    /// Returns the request path (without the query string).
    pub fn path(&self) -> &str {
        self.request.path()
    }

    /// Returns a percent-decoded query parameter by key.
    pub fn query(&self, key: &str) -> Option<&str> {
        self.request.query_param(key)
    }

    /// Returns a query parameter only when it is present and non-empty.
    ///
    /// The proxy contract treats an empty value the same as an absent one.
    pub fn query_nonempty(&self, key: &str) -> Option<&str> {
        self.query(key).filter(|v| !v.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_context(path_and_query: &str) -> Context {
        let raw = format!("GET {path_and_query} HTTP/1.1\r\nHost: localhost\r\n\r\n");
        let (request, _) = Request::parse(raw.as_bytes()).unwrap();
        Context::new(request)
    }

    #[test]
    fn exposes_method_and_path() {
        let ctx = make_context("/api/weather?city=London");
        assert_eq!(ctx.method(), &Method::Get);
        assert_eq!(ctx.path(), "/api/weather");
    }

    #[test]
    fn query_returns_decoded_value() {
        let ctx = make_context("/api/weather?city=New%20York");
        assert_eq!(ctx.query("city"), Some("New York"));
    }

    #[test]
    fn query_nonempty_filters_empty_values() {
        let ctx = make_context("/api/weather?city=");
        assert_eq!(ctx.query("city"), Some(""));
        assert_eq!(ctx.query_nonempty("city"), None);
    }

    #[test]
    fn query_nonempty_absent_key() {
        let ctx = make_context("/api/weather");
        assert_eq!(ctx.query_nonempty("city"), None);
    }
}
