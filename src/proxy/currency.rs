//! currency-conversion — `GET /api/convert?from=&to=&amount=` proxied to
//! ExchangeRate-API v6 (pair endpoint with amount).
//!
//! The provider signals logical failures inside a 2xx body via an
//! `error-type` field; those are translated through a fixed lookup table.
//! Codes that would confirm or deny credential validity (`invalid-key`,
//! `inactive-account`) are deliberately conflated into the same generic
//! message as a missing credential.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{AppState, ProxyError, encode, internal, respond};
use crate::context::Context;
use crate::http::Response;

/// The normalized currency-conversion result.
#[derive(Debug, Serialize, PartialEq)]
pub struct Conversion {
    pub from: String,
    pub to: String,
    pub rate: f64,
    pub amount: f64,
    pub result: f64,
    pub last_updated: String,
}

// Provider shape. `result` is "success" or "error"; on error only
// `error-type` is populated, so everything is optional.
#[derive(Debug, Deserialize)]
struct PairPayload {
    result: Option<String>,
    #[serde(rename = "error-type")]
    error_type: Option<String>,
    base_code: Option<String>,
    target_code: Option<String>,
    conversion_rate: Option<f64>,
    conversion_result: Option<f64>,
    time_last_update_utc: Option<String>,
}

/// Route handler.
pub async fn handle(state: Arc<AppState>, ctx: Context) -> Response {
    respond(convert(&state, &ctx).await)
}

async fn convert(state: &AppState, ctx: &Context) -> Result<Conversion, ProxyError> {
    let (Some(from), Some(to), Some(raw_amount)) = (
        ctx.query_nonempty("from"),
        ctx.query_nonempty("to"),
        ctx.query_nonempty("amount"),
    ) else {
        return Err(ProxyError::MissingParameter(
            "Missing required parameters: from, to, amount".to_owned(),
        ));
    };

    let amount = parse_amount(raw_amount)?;

    let Some(key) = state.config.exchange.api_key.as_deref() else {
        tracing::error!("exchange-rate credential is not configured");
        return Err(ProxyError::Configuration);
    };

    let url = format!(
        "{}/{}/pair/{}/{}/{}",
        state.config.exchange.base_url,
        key,
        encode(&from.to_uppercase()),
        encode(&to.to_uppercase()),
        amount
    );

    let reply = state.upstream.get(&url).await.map_err(internal)?;

    if !reply.is_success() {
        return Err(ProxyError::UpstreamUnavailable {
            status: reply.status(),
            message: "Failed to fetch exchange rate data",
        });
    }

    let payload: PairPayload = reply.json().map_err(internal)?;

    if payload.result.as_deref() != Some("success") {
        return Err(ProxyError::UpstreamLogical(logical_error_message(
            payload.error_type.as_deref(),
            from,
            to,
        )));
    }

    let conversion = (|| {
        Some(Conversion {
            from: payload.base_code?,
            to: payload.target_code?,
            rate: payload.conversion_rate?,
            amount,
            result: payload.conversion_result?,
            last_updated: payload.time_last_update_utc?,
        })
    })();
    conversion.ok_or_else(|| internal("exchange-rate success payload missing required fields"))
}

// The contract requires a finite number strictly greater than zero.
fn parse_amount(raw: &str) -> Result<f64, ProxyError> {
    match raw.parse::<f64>() {
        Ok(amount) if amount.is_finite() && amount > 0.0 => Ok(amount),
        _ => Err(ProxyError::InvalidParameter(
            "Amount must be a positive number".to_owned(),
        )),
    }
}

/// Fixed translation from provider error codes to caller-facing messages.
/// Unrecognized codes fall back to a generic failure.
fn logical_error_message(code: Option<&str>, from: &str, to: &str) -> String {
    match code {
        Some("unsupported-code") => {
            format!("Currency code \"{from}\" or \"{to}\" is not supported")
        }
        Some("malformed-request") => "Invalid currency code format".to_owned(),
        // Never confirm credential state to the caller.
        Some("invalid-key") | Some("inactive-account") => "Server configuration error".to_owned(),
        Some("quota-reached") => "API quota reached. Try again later".to_owned(),
        _ => "Failed to fetch exchange rate".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::testutil::{context, parts, state};

    const FIXTURE: &str = r#"{
        "result": "success",
        "documentation": "https://www.exchangerate-api.com/docs",
        "base_code": "USD",
        "target_code": "EUR",
        "conversion_rate": 0.92,
        "conversion_result": 92.0,
        "time_last_update_utc": "Fri, 07 Aug 2026 00:00:01 +0000"
    }"#;

    // ── validation ────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn missing_any_parameter_is_400() {
        for query in [
            "/api/convert",
            "/api/convert?from=USD",
            "/api/convert?from=USD&to=EUR",
            "/api/convert?to=EUR&amount=100",
            "/api/convert?from=USD&to=&amount=100",
        ] {
            let state = state("http://127.0.0.1:9", None, Some("k"));
            let (status, body) = parts(handle(state, context(query)).await);
            assert_eq!(status, 400, "query: {query}");
            assert_eq!(body["error"], "Missing required parameters: from, to, amount");
        }
    }

    #[test]
    fn amount_must_be_positive_and_finite() {
        assert!(parse_amount("100").is_ok());
        assert!(parse_amount("0.5").is_ok());
        for bad in ["0", "-3", "abc", "NaN", "inf", ""] {
            assert_eq!(
                parse_amount(bad),
                Err(ProxyError::InvalidParameter(
                    "Amount must be a positive number".to_owned()
                )),
                "input: {bad}"
            );
        }
    }

    #[tokio::test]
    async fn non_numeric_amount_is_400() {
        let state = state("http://127.0.0.1:9", None, Some("k"));
        let (status, body) = parts(
            handle(state, context("/api/convert?from=USD&to=EUR&amount=lots")).await,
        );
        assert_eq!(status, 400);
        assert_eq!(body["error"], "Amount must be a positive number");
    }

    #[tokio::test]
    async fn missing_credential_is_500_generic() {
        let state = state("http://127.0.0.1:9", None, None);
        let (status, body) = parts(
            handle(state, context("/api/convert?from=USD&to=EUR&amount=100")).await,
        );
        assert_eq!(status, 500);
        assert_eq!(body["error"], "Server configuration error");
    }

    // ── error translation ─────────────────────────────────────────────────────

    #[test]
    fn lookup_table_covers_known_codes() {
        assert_eq!(
            logical_error_message(Some("unsupported-code"), "USD", "XXX"),
            "Currency code \"USD\" or \"XXX\" is not supported"
        );
        assert_eq!(
            logical_error_message(Some("malformed-request"), "USD", "EUR"),
            "Invalid currency code format"
        );
        assert_eq!(
            logical_error_message(Some("invalid-key"), "USD", "EUR"),
            "Server configuration error"
        );
        assert_eq!(
            logical_error_message(Some("inactive-account"), "USD", "EUR"),
            "Server configuration error"
        );
        assert_eq!(
            logical_error_message(Some("quota-reached"), "USD", "EUR"),
            "API quota reached. Try again later"
        );
    }

    #[test]
    fn lookup_table_falls_back_on_unknown_codes() {
        for code in [Some("plan-upgrade-required"), None] {
            assert_eq!(
                logical_error_message(code, "USD", "EUR"),
                "Failed to fetch exchange rate"
            );
        }
    }

    // ── handler against fixtures ──────────────────────────────────────────────

    #[tokio::test]
    async fn success_returns_normalized_conversion() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/test-key/pair/USD/EUR/100")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(FIXTURE)
            .create_async()
            .await;

        let state = state(&server.url(), None, Some("test-key"));
        let (status, body) = parts(
            handle(state, context("/api/convert?from=USD&to=EUR&amount=100")).await,
        );
        assert_eq!(status, 200);
        assert_eq!(
            body,
            serde_json::json!({
                "from": "USD",
                "to": "EUR",
                "rate": 0.92,
                "amount": 100.0,
                "result": 92.0,
                "last_updated": "Fri, 07 Aug 2026 00:00:01 +0000"
            })
        );
    }

    #[tokio::test]
    async fn currency_codes_are_uppercased_for_upstream() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/test-key/pair/USD/EUR/25")
            .with_status(200)
            .with_body(FIXTURE)
            .create_async()
            .await;

        let state = state(&server.url(), None, Some("test-key"));
        let (status, _) = parts(
            handle(state, context("/api/convert?from=usd&to=eur&amount=25")).await,
        );
        assert_eq!(status, 200);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn provider_error_envelope_is_translated() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/test-key/pair/USD/XXX/100")
            .with_status(200)
            .with_body(r#"{"result":"error","error-type":"unsupported-code"}"#)
            .create_async()
            .await;

        let state = state(&server.url(), None, Some("test-key"));
        let (status, body) = parts(
            handle(state, context("/api/convert?from=USD&to=XXX&amount=100")).await,
        );
        assert_eq!(status, 400);
        assert_eq!(body["error"], "Currency code \"USD\" or \"XXX\" is not supported");
    }

    #[tokio::test]
    async fn invalid_key_envelope_never_confirms_credential_state() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/test-key/pair/USD/EUR/100")
            .with_status(200)
            .with_body(r#"{"result":"error","error-type":"invalid-key"}"#)
            .create_async()
            .await;

        let state = state(&server.url(), None, Some("test-key"));
        let (status, body) = parts(
            handle(state, context("/api/convert?from=USD&to=EUR&amount=100")).await,
        );
        assert_eq!(status, 400);
        assert_eq!(body["error"], "Server configuration error");
    }

    #[tokio::test]
    async fn upstream_failure_relays_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/test-key/pair/USD/EUR/100")
            .with_status(429)
            .create_async()
            .await;

        let state = state(&server.url(), None, Some("test-key"));
        let (status, body) = parts(
            handle(state, context("/api/convert?from=USD&to=EUR&amount=100")).await,
        );
        assert_eq!(status, 429);
        assert_eq!(body["error"], "Failed to fetch exchange rate data");
    }
}
