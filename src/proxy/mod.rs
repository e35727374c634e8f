//! The proxy operations — the reason this service exists.
//!
//! Each operation is one linear request/response transaction: read query
//! parameters, validate, resolve the provider credential, issue exactly one
//! upstream `GET`, translate the upstream result into the normalized
//! contract shape, respond. All failure paths collapse into [`ProxyError`]
//! and render as `{"error": <message>}` with the mapped status; nothing
//! else ever leaves the endpoint.

use std::fmt;
use std::sync::Arc;

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Serialize;
use thiserror::Error;

use crate::Router;
use crate::config::Config;
use crate::context::Context;
use crate::http::{Response, StatusCode};
use crate::middleware::{LoggerMiddleware, MiddlewareHandler, from_middleware, terminal};
use crate::security::CorsMiddleware;
use crate::upstream::UpstreamClient;

pub mod currency;
pub mod joke;
pub mod weather;

/// Shared, immutable per-process state handed to every handler.
pub struct AppState {
    pub config: Config,
    pub upstream: UpstreamClient,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            upstream: UpstreamClient::new(),
        }
    }
}

/// The operations this service proxies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    WeatherLookup,
    CurrencyConversion,
    JokeFetch,
}

impl Operation {
    pub const ALL: [Operation; 3] = [
        Operation::WeatherLookup,
        Operation::CurrencyConversion,
        Operation::JokeFetch,
    ];

    /// Route path the operation is served under.
    pub fn path(self) -> &'static str {
        match self {
            Self::WeatherLookup => "/api/weather",
            Self::CurrencyConversion => "/api/convert",
            Self::JokeFetch => "/api/joke",
        }
    }

    /// Stable operation name used in the service index.
    pub fn name(self) -> &'static str {
        match self {
            Self::WeatherLookup => "weather-lookup",
            Self::CurrencyConversion => "currency-conversion",
            Self::JokeFetch => "joke-fetch",
        }
    }

    /// Query parameters that must be present and non-empty.
    pub fn required_params(self) -> &'static [&'static str] {
        match self {
            Self::WeatherLookup => &["city"],
            Self::CurrencyConversion => &["from", "to", "amount"],
            Self::JokeFetch => &[],
        }
    }

    /// Query parameters the operation accepts but does not require.
    pub fn optional_params(self) -> &'static [&'static str] {
        match self {
            Self::JokeFetch => &["category"],
            _ => &[],
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything that can go wrong while handling one proxy request.
///
/// The `Display` text of each variant is exactly the caller-facing
/// `error` string; [`ProxyError::status`] supplies the HTTP status.
#[derive(Debug, Error, PartialEq)]
pub enum ProxyError {
    /// A required query parameter is absent or empty.
    #[error("{0}")]
    MissingParameter(String),

    /// A parameter is present but malformed or outside its allowed set.
    #[error("{0}")]
    InvalidParameter(String),

    /// The operation's credential is not configured. The message is fixed
    /// and generic; the cause is only ever logged server-side.
    #[error("Server configuration error")]
    Configuration,

    /// The provider confirmed the requested resource does not exist.
    #[error("{0}")]
    UpstreamNotFound(String),

    /// Non-2xx from the provider, relayed with its verbatim status and a
    /// per-operation generic message.
    #[error("{message}")]
    UpstreamUnavailable { status: u16, message: &'static str },

    /// 2xx transport but a provider-level failure envelope, already
    /// translated through the operation's lookup table.
    #[error("{0}")]
    UpstreamLogical(String),

    /// Anything uncaught. The message is fixed; details stay in the log.
    #[error("Internal server error")]
    Internal,
}

impl ProxyError {
    /// HTTP status the error renders with.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingParameter(_) | Self::InvalidParameter(_) | Self::UpstreamLogical(_) => {
                StatusCode::BadRequest
            }
            Self::UpstreamNotFound(_) => StatusCode::NotFound,
            Self::UpstreamUnavailable { status, .. } => StatusCode::from_u16(*status),
            Self::Configuration | Self::Internal => StatusCode::InternalServerError,
        }
    }

    /// Renders the error as the contract's JSON body.
    pub fn into_response(self) -> Response {
        Response::error(self.status(), &self.to_string())
    }
}

/// Logs an unexpected failure and collapses it into the generic internal
/// error. Used for transport faults, undecodable payloads, and success
/// payloads missing fields the contract needs.
pub(crate) fn internal(err: impl fmt::Display) -> ProxyError {
    tracing::error!(error = %err, "unexpected proxy failure");
    ProxyError::Internal
}

/// Returns the named query parameter when present and non-empty, otherwise
/// fails with `message` as the caller-facing error.
pub(crate) fn require<'a>(
    ctx: &'a Context,
    name: &str,
    message: &str,
) -> Result<&'a str, ProxyError> {
    ctx.query_nonempty(name)
        .ok_or_else(|| ProxyError::MissingParameter(message.to_owned()))
}

/// Percent-encodes a user-supplied operand for substitution into an
/// upstream URL template.
pub(crate) fn encode(value: &str) -> String {
    utf8_percent_encode(value, NON_ALPHANUMERIC).to_string()
}

/// Converts an operation outcome into the HTTP response: 200 with the
/// normalized JSON body, or the error's mapped status and body.
pub(crate) fn respond<T: Serialize>(result: Result<T, ProxyError>) -> Response {
    match result {
        Ok(body) => Response::json(StatusCode::Ok, &body),
        Err(e) => e.into_response(),
    }
}

#[derive(Serialize)]
struct IndexOperation {
    operation: &'static str,
    path: &'static str,
    required_params: &'static [&'static str],
    optional_params: &'static [&'static str],
}

#[derive(Serialize)]
struct Index {
    service: &'static str,
    version: &'static str,
    operations: Vec<IndexOperation>,
}

// `GET /` — a JSON directory of what the service offers.
async fn index(_ctx: Context) -> Response {
    let operations = Operation::ALL
        .iter()
        .map(|op| IndexOperation {
            operation: op.name(),
            path: op.path(),
            required_params: op.required_params(),
            optional_params: op.optional_params(),
        })
        .collect();

    Response::json(
        StatusCode::Ok,
        &Index {
            service: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            operations,
        },
    )
}

/// Builds the router with every proxy operation registered.
pub fn routes(state: Arc<AppState>) -> Router {
    let mut router = Router::new();

    router.get("/", index);

    {
        let state = Arc::clone(&state);
        router.get(Operation::WeatherLookup.path(), move |ctx| {
            let state = Arc::clone(&state);
            async move { weather::handle(state, ctx).await }
        });
    }

    {
        let state = Arc::clone(&state);
        router.get(Operation::CurrencyConversion.path(), move |ctx| {
            let state = Arc::clone(&state);
            async move { currency::handle(state, ctx).await }
        });
    }

    {
        let state = Arc::clone(&state);
        router.get(Operation::JokeFetch.path(), move |ctx| {
            let state = Arc::clone(&state);
            async move { joke::handle(state, ctx).await }
        });
    }

    router
}

/// The full request pipeline: CORS, request logging, then route dispatch.
pub fn pipeline(state: Arc<AppState>) -> Vec<MiddlewareHandler> {
    vec![
        from_middleware(Arc::new(CorsMiddleware::new())),
        from_middleware(Arc::new(LoggerMiddleware)),
        terminal(routes(state)),
    ]
}

#[cfg(test)]
pub(crate) mod testutil {
    use std::sync::Arc;

    use super::AppState;
    use crate::config::{Config, ProviderConfig};
    use crate::context::Context;
    use crate::http::Request;

    /// State whose three providers all point at `base_url`, with the given
    /// credentials for the keyed providers.
    pub fn state(base_url: &str, weather_key: Option<&str>, exchange_key: Option<&str>) -> Arc<AppState> {
        let provider = |key: Option<&str>| ProviderConfig {
            api_key: key.map(str::to_owned),
            base_url: base_url.to_owned(),
        };
        Arc::new(AppState::new(Config {
            bind_addr: "127.0.0.1:0".to_owned(),
            weather: provider(weather_key),
            exchange: provider(exchange_key),
            jokes: ProviderConfig::keyless(base_url),
        }))
    }

    pub fn context(path_and_query: &str) -> Context {
        let raw = format!("GET {path_and_query} HTTP/1.1\r\nHost: localhost\r\n\r\n");
        let (request, _) = Request::parse(raw.as_bytes()).unwrap();
        Context::new(request)
    }

    /// Splits a response into status and parsed JSON body.
    pub fn parts(response: crate::http::Response) -> (u16, serde_json::Value) {
        let status = response.status().as_u16();
        let text = String::from_utf8(response.into_bytes().to_vec()).unwrap();
        let body_start = text.find("\r\n\r\n").expect("header terminator") + 4;
        let body = serde_json::from_str(&text[body_start..]).expect("JSON body");
        (status, body)
    }
}
