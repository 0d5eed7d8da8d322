//! Response classification.
//!
//! # Design
//! Every `HttpResponse` maps to exactly one result, decided by status code
//! first and content type second:
//!
//! | status            | result                          |
//! |-------------------|---------------------------------|
//! | 204               | `Outcome::NoContent`            |
//! | other 2xx         | `Outcome::Success(Payload)`     |
//! | 401               | `ApiError::Authentication`      |
//! | other 4xx         | `ApiError::Client`              |
//! | 5xx               | `ApiError::Server`              |
//! | anything else     | `ApiError::Unexpected`          |
//!
//! Error messages read `"<status> response from <host>"`, followed by
//! `" | Response body: <json>"` when the body is not blank. Error bodies are
//! always read as JSON whatever their declared content type, so a non-JSON
//! error body surfaces as `ApiError::Decode` rather than a status error.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;
use crate::http::{HttpResponse, APPLICATION_JSON};

/// Body of a successful response.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// The response declared `application/json`.
    Json(Value),
    /// Any other (or missing) content type; body returned untouched.
    Text(String),
}

impl Payload {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Payload::Json(value) => Some(value),
            Payload::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Json(_) => None,
            Payload::Text(text) => Some(text),
        }
    }

    /// Deserialize the payload into a typed value.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        match self {
            Payload::Json(value) => serde_json::from_value(value.clone()),
            Payload::Text(text) => serde_json::from_str(text),
        }
        .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Result of a successful call.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    NoContent,
    Success(Payload),
}

impl Outcome {
    pub fn payload(&self) -> Option<&Payload> {
        match self {
            Outcome::NoContent => None,
            Outcome::Success(payload) => Some(payload),
        }
    }

    pub fn into_payload(self) -> Option<Payload> {
        match self {
            Outcome::NoContent => None,
            Outcome::Success(payload) => Some(payload),
        }
    }

    pub fn is_no_content(&self) -> bool {
        matches!(self, Outcome::NoContent)
    }
}

/// Classify `response` to a request sent to `host`.
pub fn classify(response: &HttpResponse, host: &str) -> Result<Outcome, ApiError> {
    let status = response.status;
    match status {
        204 => Ok(Outcome::NoContent),
        200..=299 => success_payload(response).map(Outcome::Success),
        401 => Err(ApiError::Authentication {
            status,
            message: error_message(response, host)?,
        }),
        400..=499 => Err(ApiError::Client {
            status,
            message: error_message(response, host)?,
        }),
        500..=599 => Err(ApiError::Server {
            status,
            message: error_message(response, host)?,
        }),
        _ => Err(ApiError::Unexpected {
            status,
            message: error_message(response, host)?,
        }),
    }
}

fn success_payload(response: &HttpResponse) -> Result<Payload, ApiError> {
    let is_json = response
        .media_type()
        .is_some_and(|media| media.eq_ignore_ascii_case(APPLICATION_JSON));
    if is_json {
        serde_json::from_str(&response.body)
            .map(Payload::Json)
            .map_err(|e| ApiError::Decode(e.to_string()))
    } else {
        Ok(Payload::Text(response.body.clone()))
    }
}

fn error_message(response: &HttpResponse, host: &str) -> Result<String, ApiError> {
    let mut message = format!("{} response from {host}", response.status);
    if !response.body.trim().is_empty() {
        let body: Value =
            serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()))?;
        message.push_str(&format!(" | Response body: {body}"));
    }
    Ok(message)
}
