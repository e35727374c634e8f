//! weather-lookup — `GET /api/weather?city=<name>` proxied to OpenWeatherMap.
//!
//! Upstream reports metric units; the only derived field is visibility,
//! which the contract exposes in whole kilometres.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{AppState, ProxyError, encode, internal, require, respond};
use crate::context::Context;
use crate::http::Response;

/// The normalized weather-lookup result. Field names and types are fixed
/// regardless of upstream payload variance.
#[derive(Debug, Serialize, PartialEq)]
pub struct WeatherReport {
    pub city: String,
    pub country: String,
    pub temperature: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub description: String,
    pub humidity: f64,
    pub wind_speed: f64,
    pub pressure: f64,
    /// Kilometres, rounded; `null` when the provider omits visibility.
    pub visibility: Option<i64>,
}

// Provider shape, entirely optional: the payload is untrusted.
#[derive(Debug, Default, Deserialize)]
struct Payload {
    name: Option<String>,
    sys: Option<Sys>,
    main: Option<Metrics>,
    weather: Option<Vec<Condition>>,
    wind: Option<Wind>,
    visibility: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct Sys {
    country: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Metrics {
    temp: Option<f64>,
    feels_like: Option<f64>,
    temp_min: Option<f64>,
    temp_max: Option<f64>,
    humidity: Option<f64>,
    pressure: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct Condition {
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Wind {
    speed: Option<f64>,
}

/// Route handler.
pub async fn handle(state: Arc<AppState>, ctx: Context) -> Response {
    respond(lookup(&state, &ctx).await)
}

async fn lookup(state: &AppState, ctx: &Context) -> Result<WeatherReport, ProxyError> {
    let city = require(ctx, "city", "City parameter is required")?;

    let Some(key) = state.config.weather.api_key.as_deref() else {
        tracing::error!("weather credential is not configured");
        return Err(ProxyError::Configuration);
    };

    let url = format!(
        "{}/weather?q={}&appid={}&units=metric",
        state.config.weather.base_url,
        encode(city),
        key
    );

    let reply = state.upstream.get(&url).await.map_err(internal)?;

    if !reply.is_success() {
        if reply.status() == 404 {
            return Err(ProxyError::UpstreamNotFound(format!(
                "City \"{city}\" not found"
            )));
        }
        return Err(ProxyError::UpstreamUnavailable {
            status: reply.status(),
            message: "Failed to fetch weather data",
        });
    }

    let payload: Payload = reply.json().map_err(internal)?;
    normalize(payload).ok_or_else(|| internal("weather payload missing required fields"))
}

// Whitelist the contract fields; anything else the provider sent is dropped.
fn normalize(payload: Payload) -> Option<WeatherReport> {
    let metrics = payload.main?;
    Some(WeatherReport {
        city: payload.name?,
        country: payload.sys?.country?,
        temperature: metrics.temp?,
        feels_like: metrics.feels_like?,
        temp_min: metrics.temp_min?,
        temp_max: metrics.temp_max?,
        description: payload.weather?.into_iter().next()?.description?,
        humidity: metrics.humidity?,
        wind_speed: payload.wind?.speed?,
        pressure: metrics.pressure?,
        visibility: payload.visibility.map(|metres| (metres / 1000.0).round() as i64),
    })
}
