//! Security middleware — CORS for browser-facing proxy endpoints.
//!
//! The proxy exists so browser pages can call third-party APIs without
//! seeing the credentials, which means the browser is the expected caller:
//! the service answers `OPTIONS` preflights and attaches
//! `Access-Control-*` headers to actual responses.

use std::future::Future;
use std::pin::Pin;

use crate::{
    Method, Response, StatusCode,
    context::Context,
    middleware::{Middleware, Next},
};

/// CORS middleware — validates the `Origin` header, short-circuits
/// preflight requests, and injects `Access-Control-*` headers on actual
/// responses.
///
/// Behavior:
///
/// - No `Origin` header, or an origin outside the allow-list: the request
///   passes through unmodified.
/// - `OPTIONS` preflight: short-circuits with `204 No Content` and the
///   `Access-Control-*` headers; the downstream handler is not called.
/// - Other requests: the handler runs and the CORS headers are appended.
///   `Vary: Origin` is added when a specific (non-wildcard) origin is
///   echoed back, for correct cache behavior.
///
/// # Examples
///
/// ```rust
/// use relay::security::CorsMiddleware;
///
/// let cors = CorsMiddleware::new().allow_origin("https://app.example.com");
/// ```
pub struct CorsMiddleware {
    allowed_origins: Vec<String>,
    allowed_methods: Vec<String>,
    allowed_headers: Vec<String>,
}

impl Default for CorsMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl CorsMiddleware {
    /// Creates a `CorsMiddleware` with defaults suited to a read-only JSON
    /// API: all origins (`*`), methods `GET` and `OPTIONS`, header
    /// `Content-Type`.
    pub fn new() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allowed_methods: vec!["GET".to_string(), "OPTIONS".to_string()],
            allowed_headers: vec!["Content-Type".to_string()],
        }
    }

    /// Adds an allowed origin. Pass `"*"` to permit all origins.
    #[must_use]
    pub fn allow_origin(mut self, origin: impl Into<String>) -> Self {
        self.allowed_origins.push(origin.into());
        self
    }

    /// Adds an allowed HTTP method, sent verbatim in
    /// `Access-Control-Allow-Methods`.
    #[must_use]
    pub fn allow_method(mut self, method: impl Into<String>) -> Self {
        self.allowed_methods.push(method.into());
        self
    }

    /// Adds an allowed request header, sent verbatim in
    /// `Access-Control-Allow-Headers`.
    #[must_use]
    pub fn allow_header(mut self, header: impl Into<String>) -> Self {
        self.allowed_headers.push(header.into());
        self
    }
}

impl Middleware for CorsMiddleware {
    fn handle(&self, ctx: Context, next: Next) -> Pin<Box<dyn Future<Output = Response> + Send>> {
        let allowed_origins = self.allowed_origins.clone();
        let allowed_methods = self.allowed_methods.clone();
        let allowed_headers = self.allowed_headers.clone();

        Box::pin(async move {
            let request_origin = ctx.request().headers().get("origin").map(str::to_owned);
            let is_preflight = ctx.method() == &Method::Options;
            let Some(origin) = request_origin else {
                return next.run(ctx).await;
            };

            let allow_origin = if allowed_origins.iter().any(|o| o == "*") {
                "*".to_owned()
            } else if allowed_origins.contains(&origin) {
                origin.clone()
            } else {
                return next.run(ctx).await;
            };

            let methods_str = allowed_methods.join(", ");
            let headers_str = allowed_headers.join(", ");
            let is_wildcard = allow_origin == "*";

            if is_preflight {
                let mut resp = Response::new(StatusCode::NoContent)
                    .header("Access-Control-Allow-Origin", &allow_origin)
                    .header("Access-Control-Allow-Methods", &methods_str)
                    .header("Access-Control-Allow-Headers", &headers_str)
                    .header("Access-Control-Max-Age", "3600");
                if !is_wildcard {
                    resp.add_header("Vary", "Origin");
                }
                return resp;
            }

            let mut resp = next.run(ctx).await;
            resp.add_header("Access-Control-Allow-Origin", &allow_origin);
            resp.add_header("Access-Control-Allow-Methods", &methods_str);
            resp.add_header("Access-Control-Allow-Headers", &headers_str);
            if !is_wildcard {
                resp.add_header("Vary", "Origin");
            }
            resp
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::Router;
    use crate::http::request::Request;
    use crate::middleware::{MiddlewareHandler, from_middleware, terminal};

    fn make_context(method: &str, origin: Option<&str>) -> Context {
        let origin_header = origin
            .map(|o| format!("Origin: {o}\r\n"))
            .unwrap_or_default();
        let raw = format!("{method} /api/joke HTTP/1.1\r\nHost: localhost\r\n{origin_header}\r\n");
        let (req, _) = Request::parse(raw.as_bytes()).unwrap();
        Context::new(req)
    }

    fn chain(cors: CorsMiddleware) -> Vec<MiddlewareHandler> {
        let mut router = Router::new();
        router.get("/api/joke", |_ctx| async { Response::new(StatusCode::Ok) });
        vec![from_middleware(Arc::new(cors)), terminal(router)]
    }

    fn header_value(resp: Response, name: &str) -> Option<String> {
        let text = String::from_utf8(resp.into_bytes().to_vec()).unwrap();
        text.lines()
            .find_map(|line| line.strip_prefix(&format!("{name}: ")).map(str::to_owned))
    }

    #[tokio::test]
    async fn no_origin_passes_through_untouched() {
        let res = Next::new(chain(CorsMiddleware::new()))
            .run(make_context("GET", None))
            .await;
        assert_eq!(res.status(), StatusCode::Ok);
        assert_eq!(header_value(res, "Access-Control-Allow-Origin"), None);
    }

    #[tokio::test]
    async fn preflight_short_circuits_with_204() {
        let res = Next::new(chain(CorsMiddleware::new()))
            .run(make_context("OPTIONS", Some("https://example.com")))
            .await;
        assert_eq!(res.status(), StatusCode::NoContent);
        assert_eq!(
            header_value(res, "Access-Control-Allow-Origin"),
            Some("*".to_owned())
        );
    }

    #[tokio::test]
    async fn actual_request_gets_cors_headers() {
        let res = Next::new(chain(CorsMiddleware::new()))
            .run(make_context("GET", Some("https://example.com")))
            .await;
        assert_eq!(res.status(), StatusCode::Ok);
        assert_eq!(
            header_value(res, "Access-Control-Allow-Origin"),
            Some("*".to_owned())
        );
    }

    #[tokio::test]
    async fn specific_origin_echoed_with_vary() {
        let cors = CorsMiddleware {
            allowed_origins: vec!["https://app.example.com".to_owned()],
            allowed_methods: vec!["GET".to_owned()],
            allowed_headers: vec!["Content-Type".to_owned()],
        };
        let res = Next::new(chain(cors))
            .run(make_context("GET", Some("https://app.example.com")))
            .await;
        let text = String::from_utf8(res.into_bytes().to_vec()).unwrap();
        assert!(text.contains("Access-Control-Allow-Origin: https://app.example.com\r\n"));
        assert!(text.contains("Vary: Origin\r\n"));
    }

    #[tokio::test]
    async fn rejected_origin_passes_through_without_headers() {
        let cors = CorsMiddleware {
            allowed_origins: vec!["https://app.example.com".to_owned()],
            allowed_methods: vec!["GET".to_owned()],
            allowed_headers: vec!["Content-Type".to_owned()],
        };
        let res = Next::new(chain(cors))
            .run(make_context("GET", Some("https://evil.example.com")))
            .await;
        assert_eq!(res.status(), StatusCode::Ok);
        assert_eq!(header_value(res, "Access-Control-Allow-Origin"), None);
    }
}
