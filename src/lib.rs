//! # relay
//!
//! A server-side JSON API proxy: browser pages call `relay`, `relay` calls
//! the third-party provider with a server-held credential, reshapes the
//! reply into a stable schema, and returns it. The credential never
//! reaches the browser.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use relay::config::Config;
//! use relay::context::Context;
//! use relay::middleware::Next;
//! use relay::proxy::{self, AppState};
//! use relay::server::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let state = Arc::new(AppState::new(Config::from_env()));
//!     let chain = proxy::pipeline(state);
//!     let server = Server::bind("127.0.0.1:8080").await?;
//!     server
//!         .run(move |request| {
//!             let chain = chain.clone();
//!             async move { Next::new(chain).run(Context::new(request)).await }
//!         })
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod context;
pub mod http;
pub mod middleware;
pub mod proxy;
pub mod router;
pub mod security;
pub mod server;
pub mod upstream;

// ── Convenience re-exports ────────────────────────────────────────────────────
pub use http::{Headers, Method, Request, Response, StatusCode};
pub use router::Router;
pub use server::{Server, ServerError};
