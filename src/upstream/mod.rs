//! Outbound HTTP client for upstream provider calls.
//!
//! One shared [`reqwest::Client`] serves every operation: a single `GET`
//! per invocation, no retry, no timeout beyond the client default. Request
//! URLs embed provider credentials, so they are never logged here or
//! anywhere downstream.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors from the outbound call itself, before any contract mapping.
///
/// Operations fold these into the generic internal error after logging;
/// transport details never reach the caller.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("payload decode: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Status and raw body of one upstream reply.
///
/// Non-2xx statuses are data, not errors: each operation decides how a
/// given upstream status maps onto the caller-facing contract.
#[derive(Debug)]
pub struct UpstreamResponse {
    status: u16,
    body: Bytes,
}

impl UpstreamResponse {
    /// Builds a response from parts. Public so tests can fabricate fixtures
    /// without a socket.
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns the upstream HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Deserializes the body as JSON into `T`.
    ///
    /// The payload is untrusted; callers model provider shapes with
    /// optional fields and decide what absence means.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, UpstreamError> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Shared outbound HTTP client.
#[derive(Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
}

impl UpstreamClient {
    /// Creates a client with reqwest defaults — deliberately no timeout
    /// override and no retry policy.
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    /// Issues one `GET` to `url` and buffers the reply.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::Transport`] when the connection or read
    /// fails. A non-2xx status is not an error.
    pub async fn get(&self, url: &str) -> Result<UpstreamResponse, UpstreamError> {
        let reply = self.http.get(url).send().await?;
        let status = reply.status().as_u16();
        let body = reply.bytes().await?;
        Ok(UpstreamResponse { status, body })
    }
}

impl Default for UpstreamClient {
    fn default() -> Self {
        Self::new()
    }
}
