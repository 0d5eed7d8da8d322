//! The fixed set of CalX endpoints.
//!
//! Each logical operation maps to exactly one `EndpointDescriptor`. The set
//! is closed, so the table is a `match` on `Operation` rather than anything
//! registered at runtime.

use crate::error::ApiError;
use crate::http::HttpMethod;

/// Where an operation's parameters go on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamPlacement {
    /// Appended to the URL as a query string.
    Query,
    /// Sent as an `application/x-www-form-urlencoded` body.
    FormBody,
    /// The operation takes no parameters.
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Authorize,
    ListEvents,
    GetEvent,
    CreateEvent,
    UpdateEvent,
    DeleteEvent,
}

/// Static description of how an operation maps onto HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointDescriptor {
    pub method: HttpMethod,
    /// Path relative to the API prefix, with at most one `{...}` placeholder.
    pub path_template: &'static str,
    pub placement: ParamPlacement,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::Authorize,
        Operation::ListEvents,
        Operation::GetEvent,
        Operation::CreateEvent,
        Operation::UpdateEvent,
        Operation::DeleteEvent,
    ];

    pub const fn descriptor(self) -> EndpointDescriptor {
        match self {
            Operation::Authorize => EndpointDescriptor {
                method: HttpMethod::Post,
                path_template: "/app_authorization_requests",
                placement: ParamPlacement::FormBody,
            },
            Operation::ListEvents => EndpointDescriptor {
                method: HttpMethod::Get,
                path_template: "/users/{user_id}/events",
                placement: ParamPlacement::Query,
            },
            Operation::GetEvent => EndpointDescriptor {
                method: HttpMethod::Get,
                path_template: "/events/{event_id}",
                placement: ParamPlacement::None,
            },
            Operation::CreateEvent => EndpointDescriptor {
                method: HttpMethod::Post,
                path_template: "/users/{user_id}/events",
                placement: ParamPlacement::FormBody,
            },
            Operation::UpdateEvent => EndpointDescriptor {
                method: HttpMethod::Put,
                path_template: "/events/{event_id}",
                placement: ParamPlacement::FormBody,
            },
            Operation::DeleteEvent => EndpointDescriptor {
                method: HttpMethod::Delete,
                path_template: "/events/{event_id}",
                placement: ParamPlacement::None,
            },
        }
    }
}

impl EndpointDescriptor {
    /// Substitute the template's placeholder with `id`, escaped as a single
    /// path segment. Templates without a placeholder ignore `id`.
    ///
    /// Empty, `.` and `..` identifiers are rejected: URL normalisation would
    /// fold them into the surrounding path, even when percent-encoded.
    pub fn render_path(&self, id: Option<&str>) -> Result<String, ApiError> {
        let template = self.path_template;
        match (template.find('{'), template.find('}'), id) {
            (Some(open), Some(close), Some(id)) if open < close => {
                if matches!(id, "" | "." | "..") {
                    return Err(ApiError::InvalidUrl(format!(
                        "{id:?} is not a valid path identifier"
                    )));
                }
                Ok(format!(
                    "{}{}{}",
                    &template[..open],
                    urlencoding::encode(id),
                    &template[close + 1..]
                ))
            }
            _ => Ok(template.to_string()),
        }
    }

    pub fn has_placeholder(&self) -> bool {
        self.path_template.contains('{')
    }
}
