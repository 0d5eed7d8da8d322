//! Request signing.
//!
//! The client only depends on the `Signer` trait. `HmacSigner` implements the
//! APIAuth HMAC-SHA256 header scheme the CalX service verifies:
//!
//! ```text
//! canonical = METHOD,content-type,content-hash,request-uri,date
//! Authorization: APIAuth-HMAC-SHA256 <access_id>:base64(hmac_sha256(secret, canonical))
//! ```
//!
//! `content-hash` is the base64 SHA-256 of the body, sent as
//! `X-Authorization-Content-SHA256`. Absent values are empty strings.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use url::Url;

use crate::error::ApiError;
use crate::http::{HttpRequest, CONTENT_TYPE};

type HmacSha256 = Hmac<Sha256>;

pub const AUTHORIZATION: &str = "Authorization";
pub const DATE: &str = "Date";
pub const CONTENT_HASH: &str = "X-Authorization-Content-SHA256";
pub const SCHEME: &str = "APIAuth-HMAC-SHA256";

/// Access identifier and secret key issued to an API tenant.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_id: String,
    secret_key: String,
}

impl Credentials {
    pub fn new(access_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_id: access_id.into(),
            secret_key: secret_key.into(),
        }
    }

    pub fn access_id(&self) -> &str {
        &self.access_id
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_id", &self.access_id)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Attaches authentication headers to an outgoing request.
///
/// Implementations must leave method, URL and body untouched.
pub trait Signer {
    fn sign(&self, request: HttpRequest, credentials: &Credentials) -> Result<HttpRequest, ApiError>;
}

/// APIAuth HMAC-SHA256 signer.
#[derive(Debug, Clone, Copy, Default)]
pub struct HmacSigner;

impl HmacSigner {
    /// Sign as of `timestamp`. A `Date` header already on the request wins
    /// over `timestamp`.
    pub fn sign_at(
        &self,
        mut request: HttpRequest,
        credentials: &Credentials,
        timestamp: DateTime<Utc>,
    ) -> Result<HttpRequest, ApiError> {
        if let Some(body) = &request.body {
            let digest = STANDARD.encode(Sha256::digest(body.as_bytes()));
            request.set_header(CONTENT_HASH, digest);
        }
        if request.header(DATE).is_none() {
            request.set_header(DATE, http_date(timestamp));
        }

        let canonical = canonical_string(&request)?;
        let mut mac = HmacSha256::new_from_slice(credentials.secret_key().as_bytes())
            .map_err(|e| ApiError::Signing(e.to_string()))?;
        mac.update(canonical.as_bytes());
        let signature = STANDARD.encode(mac.finalize().into_bytes());

        request.set_header(
            AUTHORIZATION,
            format!("{SCHEME} {}:{signature}", credentials.access_id()),
        );
        Ok(request)
    }
}

impl Signer for HmacSigner {
    fn sign(&self, request: HttpRequest, credentials: &Credentials) -> Result<HttpRequest, ApiError> {
        self.sign_at(request, credentials, Utc::now())
    }
}

/// IMF-fixdate, e.g. `Mon, 15 Jan 2024 10:30:00 GMT`.
pub fn http_date(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn canonical_string(request: &HttpRequest) -> Result<String, ApiError> {
    let url = Url::parse(&request.url).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
    let mut request_uri = url.path().to_string();
    if let Some(query) = url.query() {
        request_uri.push('?');
        request_uri.push_str(query);
    }
    Ok(format!(
        "{},{},{},{},{}",
        request.method,
        request.header(CONTENT_TYPE).unwrap_or_default(),
        request.header(CONTENT_HASH).unwrap_or_default(),
        request_uri,
        request.header(DATE).unwrap_or_default(),
    ))
}
