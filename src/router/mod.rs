//! Request routing — map method + path to async handler functions.
//!
//! The proxy API is a fixed set of literal paths (`/`, `/api/weather`,
//! `/api/convert`, `/api/joke`), so routes are exact string matches; there
//! is no pattern language. Trailing slashes are normalized on both sides so
//! `/api/joke/` and `/api/joke` are equivalent. Routes are matched in
//! registration order and an unmatched request yields the contract's JSON
//! `404 {"error":"Not found"}`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::Context;
use crate::{Method, Response, StatusCode};

/// Type-erased, heap-allocated async handler that processes a [`Context`]
/// and returns a [`Response`].
///
/// Stored behind `Arc<dyn Fn(…)>` so handlers can be cloned and shared
/// across threads. Constructed through [`Router::get`] rather than directly.
pub type Handler =
    Arc<dyn Fn(Context) -> Pin<Box<dyn Future<Output = Response> + Send>> + Send + Sync + 'static>;

/// Conversion trait for async handler functions.
///
/// Any `Fn(Context) -> impl Future<Output = Response> + Send` that is also
/// `Send + Sync + 'static` implements this automatically via the blanket
/// impl, so route registration accepts plain async closures.
pub trait IntoHandler: Send + Sync + 'static {
    /// Call the handler with the given context, boxing the returned future.
    fn call(&self, ctx: Context) -> Pin<Box<dyn Future<Output = Response> + Send>>;
}

impl<T, F> IntoHandler for T
where
    T: Fn(Context) -> F + Send + Sync + 'static,
    F: Future<Output = Response> + Send + 'static,
{
    fn call(&self, ctx: Context) -> Pin<Box<dyn Future<Output = Response> + Send>> {
        Box::pin((self)(ctx))
    }
}

// A single registered route binding a method + literal path to a handler.
struct Route {
    method: Method,
    path: String,
    handler: Handler,
}

impl Route {
    fn matches(&self, method: &Method, path: &str) -> bool {
        &self.method == method && self.path == path
    }
}

/// Dispatches requests to registered handler functions by exact method and
/// path match.
///
/// # Examples
///
/// ```rust,no_run
/// use relay::{Router, Response, StatusCode};
///
/// let mut router = Router::new();
/// router.get("/api/joke", |_ctx| async {
///     Response::json(StatusCode::Ok, &serde_json::json!({"joke": "..."}))
/// });
/// ```
pub struct Router {
    routes: Vec<Route>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Creates a new, empty `Router`.
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Registers a handler for `GET` requests matching `path` exactly.
    pub fn get(&mut self, path: &str, handler: impl IntoHandler) {
        self.add_route(Method::Get, path, handler);
    }

    // Erase the concrete handler type and store it as a `Handler` trait object.
    fn add_route(&mut self, method: Method, path: &str, handler: impl IntoHandler) {
        let handler: Handler = Arc::new(move |ctx| handler.call(ctx));
        self.routes.push(Route {
            method,
            path: normalize(path).to_owned(),
            handler,
        });
    }

    /// Returns the number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if no routes have been registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Dispatches `ctx` to the first matching route and returns its response.
    ///
    /// When no route matches, returns `404 {"error":"Not found"}`.
    pub async fn dispatch(&self, ctx: Context) -> Response {
        let path = normalize(ctx.path()).to_owned();

        for route in &self.routes {
            if route.matches(ctx.method(), &path) {
                return (route.handler)(ctx).await;
            }
        }

        Response::error(StatusCode::NotFound, "Not found")
    }
}

// Strip a trailing slash (other than on the root `/`).
fn normalize(path: &str) -> &str {
    if path != "/" && path.ends_with('/') {
        &path[..path.len() - 1]
    } else {
        path
    }
}
