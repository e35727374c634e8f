//! Process-wide configuration, loaded from the environment once at startup.
//!
//! Everything here is immutable after [`Config::from_env`] returns; request
//! handlers only ever read it. Credentials are optional at load time — a
//! missing key is a per-request configuration error for the operation that
//! needs it, never a startup crash, and its absence is reported to callers
//! only as a generic message.

/// Default bind address for the service.
const DEFAULT_ADDR: &str = "127.0.0.1:8080";

/// Default upstream hosts. Overridable through the environment so tests can
/// point an operation at a local fixture server.
const OPENWEATHER_BASE: &str = "https://api.openweathermap.org/data/2.5";
const EXCHANGERATE_BASE: &str = "https://v6.exchangerate-api.com/v6";
const JOKEAPI_BASE: &str = "https://v2.jokeapi.dev";

/// Connection details for one upstream provider.
#[derive(Clone, Debug)]
pub struct ProviderConfig {
    /// Server-held credential. `None` for keyless providers or when the
    /// environment variable is unset.
    pub api_key: Option<String>,
    /// Base URL the operation's path template is appended to.
    pub base_url: String,
}

impl ProviderConfig {
    /// A keyless provider rooted at `base_url`.
    pub fn keyless(base_url: impl Into<String>) -> Self {
        Self {
            api_key: None,
            base_url: base_url.into(),
        }
    }
}

/// Immutable service configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// TCP address the server binds to.
    pub bind_addr: String,
    /// OpenWeatherMap (weather-lookup).
    pub weather: ProviderConfig,
    /// ExchangeRate-API v6 (currency-conversion).
    pub exchange: ProviderConfig,
    /// JokeAPI v2 (joke-fetch) — keyless.
    pub jokes: ProviderConfig,
}

impl Config {
    /// Loads configuration from environment variables, falling back to the
    /// real provider hosts and the default bind address.
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("RELAY_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_owned()),
            weather: ProviderConfig {
                api_key: std::env::var("OPENWEATHER_API_KEY").ok(),
                base_url: std::env::var("OPENWEATHER_BASE_URL")
                    .unwrap_or_else(|_| OPENWEATHER_BASE.to_owned()),
            },
            exchange: ProviderConfig {
                api_key: std::env::var("EXCHANGERATE_API_KEY").ok(),
                base_url: std::env::var("EXCHANGERATE_BASE_URL")
                    .unwrap_or_else(|_| EXCHANGERATE_BASE.to_owned()),
            },
            jokes: ProviderConfig {
                // JokeAPI needs no credential; only the host is configurable.
                api_key: None,
                base_url: std::env::var("JOKEAPI_BASE_URL")
                    .unwrap_or_else(|_| JOKEAPI_BASE.to_owned()),
            },
        }
    }
}
