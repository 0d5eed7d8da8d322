//! Executes `HttpRequest` values over the network.
//!
//! The client never interprets status codes here: a transport returns every
//! completed exchange as an `HttpResponse`, 4xx/5xx included, and only
//! reports `ApiError::Transport` when no response was received at all.

use std::fmt;

use tracing::debug;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// A blocking HTTP round-trip.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Largest response body `UreqTransport` will read.
pub const MAX_RESPONSE_BODY: u64 = 10 * 1024 * 1024;

/// `Transport` backed by a `ureq` agent.
///
/// TLS is used when the request URL has an `https` scheme. Response bodies
/// are decoded as UTF-8 with invalid sequences replaced by U+FFFD, so a
/// binary body still reaches the classifier with its status. A `204` body is
/// never read. A body over [`MAX_RESPONSE_BODY`] bytes is reported as
/// `ApiError::Transport` and its status is lost.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport").finish_non_exhaustive()
    }
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }

    /// Use a preconfigured agent, e.g. one with timeouts or a proxy.
    ///
    /// The agent must be built with `http_status_as_error(false)`, otherwise
    /// error statuses arrive as transport failures.
    pub fn with_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let url = request.url.as_str();
        let headers = request.headers.as_slice();
        let body = request.body.as_deref();

        let result = match (request.method, body) {
            (HttpMethod::Get, _) => with_headers(self.agent.get(url), headers).call(),
            (HttpMethod::Delete, _) => with_headers(self.agent.delete(url), headers).call(),
            (HttpMethod::Post, Some(body)) => {
                with_headers(self.agent.post(url), headers).send(body.as_bytes())
            }
            (HttpMethod::Post, None) => with_headers(self.agent.post(url), headers).send_empty(),
            (HttpMethod::Put, Some(body)) => {
                with_headers(self.agent.put(url), headers).send(body.as_bytes())
            }
            (HttpMethod::Put, None) => with_headers(self.agent.put(url), headers).send_empty(),
        };
        let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = if status == 204 {
            String::new()
        } else {
            response
                .body_mut()
                .with_config()
                .limit(MAX_RESPONSE_BODY)
                .lossy_utf8(true)
                .read_to_string()
                .map_err(|e| ApiError::Transport(format!("{status} response body: {e}")))?
        };

        debug!(status, bytes = body.len(), "received response");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
