//! joke-fetch — `GET /api/joke?category=<cat>` proxied to JokeAPI v2.
//!
//! Keyless provider. The category defaults to `Any` and is constrained to
//! JokeAPI's fixed set; the joke payload itself is forwarded as-is rather
//! than reshaped, since its shape varies by joke type (`single` vs
//! `twopart`).

use std::sync::Arc;

use super::{AppState, ProxyError, encode, internal, respond};
use crate::context::Context;
use crate::http::Response;

/// Categories accepted by JokeAPI v2.
const CATEGORIES: [&str; 6] = [
    "Any",
    "Programming",
    "Miscellaneous",
    "Pun",
    "Spooky",
    "Christmas",
];

/// Content flags filtered out of every request.
const BLACKLIST_FLAGS: &str = "nsfw,racist,sexist,explicit";

/// Route handler.
pub async fn handle(state: Arc<AppState>, ctx: Context) -> Response {
    respond(fetch(&state, &ctx).await)
}

async fn fetch(state: &AppState, ctx: &Context) -> Result<serde_json::Value, ProxyError> {
    let category = ctx.query_nonempty("category").unwrap_or("Any");

    if !CATEGORIES.contains(&category) {
        return Err(ProxyError::InvalidParameter(format!(
            "Invalid category. Use one of: {}",
            CATEGORIES.join(", ")
        )));
    }

    let url = format!(
        "{}/joke/{}?blacklistFlags={}",
        state.config.jokes.base_url,
        encode(category),
        BLACKLIST_FLAGS
    );

    let reply = state.upstream.get(&url).await.map_err(internal)?;

    if !reply.is_success() {
        return Err(ProxyError::UpstreamUnavailable {
            status: reply.status(),
            message: "Failed to fetch joke",
        });
    }

    reply.json().map_err(internal)
}
