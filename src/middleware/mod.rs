//! Middleware pipeline — composable before/after request handler logic.
//!
//! An ordered stack of [`MiddlewareHandler`]s processes each request; every
//! layer may pass through, short-circuit with its own [`Response`], or
//! decorate the downstream response. The final layer is normally the router
//! terminal built by [`terminal`].
//!
//! Core types:
//!
//! - [`Middleware`] — trait implemented by all middleware.
//! - [`Next`] — cursor into the remaining chain; call [`Next::run`] to advance.
//! - [`MiddlewareHandler`] — type-erased, cheaply-cloneable middleware function.
//! - [`from_middleware`] — converts a [`Middleware`] trait object into a handler.
//! - [`LoggerMiddleware`] — built-in request/response logger.
//! - [`terminal`] — wraps a [`Router`] as the end of the chain.

use std::{future::Future, pin::Pin, sync::Arc};

use tokio::time::Instant;

use crate::{Response, Router, StatusCode, context::Context};

/// A cursor into the remaining middleware chain for a single request.
///
/// `Next` is consumed by each call to [`run`](Self::run), so a middleware
/// cannot invoke the rest of the chain more than once.
pub struct Next {
    middlewares: Vec<MiddlewareHandler>,
    // Tracks which middleware to invoke on the next `run` call.
    index: usize,
}

/// A type-erased, reference-counted middleware function.
///
/// The [`Arc`] wrapper makes handlers cheap to clone so [`Next`] can advance
/// through the chain without copying closures.
pub type MiddlewareHandler = Arc<
    dyn Fn(Context, Next) -> Pin<Box<dyn Future<Output = Response> + Send>> + Send + Sync + 'static,
>;

/// Converts a [`Middleware`] implementation into a [`MiddlewareHandler`].
pub fn from_middleware<M>(middleware: Arc<M>) -> MiddlewareHandler
where
    M: Middleware + 'static,
{
    Arc::new(move |ctx: Context, next: Next| middleware.handle(ctx, next))
}

/// Wraps a [`Router`] as the terminal element of a middleware chain.
///
/// The terminal ignores its `Next` cursor and always dispatches to the
/// router, so it must be registered last.
pub fn terminal(router: Router) -> MiddlewareHandler {
    let router = Arc::new(router);
    Arc::new(move |ctx: Context, _next: Next| {
        let router = Arc::clone(&router);
        Box::pin(async move { router.dispatch(ctx).await })
    })
}

impl Next {
    /// Creates a `Next` positioned at the start of the given middleware stack.
    pub fn new(middlewares: Vec<MiddlewareHandler>) -> Self {
        Self {
            middlewares,
            index: 0,
        }
    }

    /// Invokes the next middleware in the chain and returns its response.
    ///
    /// If the chain is exhausted without producing a response, a JSON
    /// `500` is returned as a safe fallback; a correctly assembled chain
    /// ends in [`terminal`] and never reaches it.
    pub async fn run(mut self, ctx: Context) -> Response {
        if self.index < self.middlewares.len() {
            let handler = self.middlewares[self.index].clone();
            self.index += 1;
            handler(ctx, self).await
        } else {
            Response::error(StatusCode::InternalServerError, "Internal server error")
        }
    }
}

/// The core trait for all middleware.
///
/// Implementors receive a [`Context`] and a [`Next`] cursor. They may pass
/// through (`next.run(ctx).await`), short-circuit by returning a
/// [`Response`] directly, or decorate the downstream response.
///
/// Implementations must be `Send + Sync` because middleware is shared
/// across Tokio tasks, and `handle` must return a pinned `Send` future.
pub trait Middleware: Send + Sync {
    /// Handle the request and optionally delegate to the next middleware.
    fn handle(&self, ctx: Context, next: Next) -> Pin<Box<dyn Future<Output = Response> + Send>>;
}

/// Built-in middleware that logs each request's method, path, status, and
/// duration through `tracing` after the downstream handler completes.
///
/// This is the service's diagnostic surface; it never modifies the response.
pub struct LoggerMiddleware;

impl Middleware for LoggerMiddleware {
    fn handle(&self, ctx: Context, next: Next) -> Pin<Box<dyn Future<Output = Response> + Send>> {
        Box::pin(async move {
            let start = Instant::now();
            let method = ctx.method().as_str().to_string();
            let path = ctx.path().to_string();

            let response = next.run(ctx).await;

            let duration = start.elapsed();
            let status = response.status().as_u16();

            tracing::info!("{} {} - {} ({:?})", method, path, status, duration);

            response
        })
    }
}
