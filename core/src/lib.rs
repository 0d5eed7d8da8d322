//! Synchronous client for the CalX calendar API.
//!
//! # Overview
//! Builds signed HTTP requests for a fixed set of operations (authorize a
//! user, list/get/create/update/delete events) and classifies the responses
//! into an `Outcome` or a typed `ApiError`.
//!
//! # Design
//! - The endpoint table is static: one `EndpointDescriptor` per `Operation`.
//! - Requests and responses are plain data (`HttpRequest` / `HttpResponse`),
//!   so the build and classify steps can run without a network
//!   (host-does-IO). `CalxClient` also runs the whole pipeline through a
//!   pluggable `Signer` and `Transport`.
//! - Classification is a total function of status, content type and body.

pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod params;
pub mod response;
pub mod signer;
pub mod transport;

pub use client::CalxClient;
pub use config::{CalxConfig, ClientOptions, ConfigError};
pub use endpoint::{EndpointDescriptor, Operation, ParamPlacement};
pub use error::{ApiError, ErrorKind};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use params::Params;
pub use response::{classify, Outcome, Payload};
pub use signer::{Credentials, HmacSigner, Signer};
pub use transport::{Transport, UreqTransport};
