//! Request builder and call pipeline for the CalX API.
//!
//! # Design
//! `CalxClient` holds its credentials, the base URL, a `Signer` and a
//! `Transport`, and carries no mutable state between calls. Every operation
//! is available in two shapes:
//!
//! - `build_*` produces an unsigned `HttpRequest`, and `parse_response`
//!   classifies the matching `HttpResponse`. Nothing touches the network, so
//!   callers can run the round-trip themselves.
//! - The plain operation methods (`authorize`, `list_events`, ...) run the
//!   full pipeline: build, sign, execute, classify.
//!
//! Both shapes go through `build`, which reads the static endpoint table.

use tracing::debug;
use url::Url;

use crate::config::ClientOptions;
use crate::endpoint::{Operation, ParamPlacement};
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, CONTENT_TYPE, FORM_URLENCODED};
use crate::params::Params;
use crate::response::{classify, Outcome};
use crate::signer::{Credentials, HmacSigner, Signer};
use crate::transport::{Transport, UreqTransport};

/// Synchronous client for the CalX API.
#[derive(Debug, Clone)]
pub struct CalxClient<S = HmacSigner, T = UreqTransport> {
    credentials: Credentials,
    base_url: String,
    signer: S,
    transport: T,
}

impl CalxClient {
    /// Client for the default host, signing with `HmacSigner` and sending
    /// through `UreqTransport`.
    pub fn new(access_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self::with_options(access_id, secret_key, ClientOptions::default())
    }

    pub fn with_options(
        access_id: impl Into<String>,
        secret_key: impl Into<String>,
        options: ClientOptions,
    ) -> Self {
        Self::with_parts(
            Credentials::new(access_id, secret_key),
            &options,
            HmacSigner,
            UreqTransport::new(),
        )
    }
}

impl<S: Signer, T: Transport> CalxClient<S, T> {
    /// Client with a custom signer and transport.
    pub fn with_parts(credentials: Credentials, options: &ClientOptions, signer: S, transport: T) -> Self {
        Self {
            credentials,
            base_url: options.base_url(),
            signer,
            transport,
        }
    }

    /// Host plus the API prefix, e.g. `http://localhost:3000/api/v1`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    // -----------------------------------------------------------------------
    // Request building
    // -----------------------------------------------------------------------

    /// Build the unsigned request for `operation`.
    ///
    /// `id` fills the path placeholder. `params` go wherever the endpoint
    /// places them and are dropped for endpoints that take none. Fails with
    /// `ApiError::InvalidUrl` when `id` would not stay a single path segment.
    pub fn build(
        &self,
        operation: Operation,
        id: Option<&str>,
        params: &Params,
    ) -> Result<HttpRequest, ApiError> {
        let descriptor = operation.descriptor();
        let mut request = HttpRequest {
            method: descriptor.method,
            url: format!("{}{}", self.base_url, descriptor.render_path(id)?),
            headers: Vec::new(),
            body: None,
        };
        match descriptor.placement {
            ParamPlacement::Query if !params.is_empty() => {
                request.url.push('?');
                request.url.push_str(&params.encode());
            }
            ParamPlacement::FormBody => {
                request.set_header(CONTENT_TYPE, FORM_URLENCODED);
                request.body = Some(params.encode());
            }
            ParamPlacement::Query | ParamPlacement::None => {}
        }
        Ok(request)
    }

    pub fn build_authorize(&self, user_id: &str) -> Result<HttpRequest, ApiError> {
        self.build(Operation::Authorize, None, &Params::new().with("user_id", user_id))
    }

    pub fn build_list_events(&self, user_id: &str, params: &Params) -> Result<HttpRequest, ApiError> {
        self.build(Operation::ListEvents, Some(user_id), params)
    }

    pub fn build_get_event(&self, event_id: &str) -> Result<HttpRequest, ApiError> {
        self.build(Operation::GetEvent, Some(event_id), &Params::new())
    }

    pub fn build_create_event(&self, user_id: &str, params: &Params) -> Result<HttpRequest, ApiError> {
        self.build(Operation::CreateEvent, Some(user_id), params)
    }

    pub fn build_update_event(&self, event_id: &str, params: &Params) -> Result<HttpRequest, ApiError> {
        self.build(Operation::UpdateEvent, Some(event_id), params)
    }

    pub fn build_delete_event(&self, event_id: &str) -> Result<HttpRequest, ApiError> {
        self.build(Operation::DeleteEvent, Some(event_id), &Params::new())
    }

    // -----------------------------------------------------------------------
    // Response handling
    // -----------------------------------------------------------------------

    /// Classify `response`, received for `request`.
    pub fn parse_response(&self, request: &HttpRequest, response: &HttpResponse) -> Result<Outcome, ApiError> {
        classify(response, &host_of(&request.url)?)
    }

    // -----------------------------------------------------------------------
    // Full pipeline
    // -----------------------------------------------------------------------

    pub fn sign(&self, request: HttpRequest) -> Result<HttpRequest, ApiError> {
        self.signer.sign(request, &self.credentials)
    }

    /// Sign `request`, execute it and classify the response.
    pub fn send(&self, request: HttpRequest) -> Result<Outcome, ApiError> {
        debug!(method = %request.method, url = %request.url, "sending request");
        let signed = self.sign(request)?;
        let response = self.transport.execute(&signed)?;
        let outcome = self.parse_response(&signed, &response);
        debug!(status = response.status, ok = outcome.is_ok(), "classified response");
        outcome
    }

    pub fn call(&self, operation: Operation, id: Option<&str>, params: &Params) -> Result<Outcome, ApiError> {
        self.send(self.build(operation, id, params)?)
    }

    /// Request app authorization for `user_id`.
    pub fn authorize(&self, user_id: &str) -> Result<Outcome, ApiError> {
        self.send(self.build_authorize(user_id)?)
    }

    pub fn list_events(&self, user_id: &str, params: &Params) -> Result<Outcome, ApiError> {
        self.send(self.build_list_events(user_id, params)?)
    }

    pub fn get_event(&self, event_id: &str) -> Result<Outcome, ApiError> {
        self.send(self.build_get_event(event_id)?)
    }

    pub fn create_event(&self, user_id: &str, params: &Params) -> Result<Outcome, ApiError> {
        self.send(self.build_create_event(user_id, params)?)
    }

    /// Replace the event's fields with `params`. The API has no partial
    /// update, so pass the complete parameter set.
    pub fn update_event(&self, event_id: &str, params: &Params) -> Result<Outcome, ApiError> {
        self.send(self.build_update_event(event_id, params)?)
    }

    pub fn delete_event(&self, event_id: &str) -> Result<Outcome, ApiError> {
        self.send(self.build_delete_event(event_id)?)
    }
}

/// Host name of `url`, without scheme or port.
fn host_of(url: &str) -> Result<String, ApiError> {
    let parsed = Url::parse(url).map_err(|e| ApiError::InvalidUrl(format!("{url}: {e}")))?;
    parsed
        .host_str()
        .map(str::to_string)
        .ok_or_else(|| ApiError::InvalidUrl(format!("{url}: missing host")))
}
