//! ---
//! tp_section: "02-protocol-data-model"
//! tp_subsection: "module"
//! tp_type: "source"
//! tp_scope: "code"
//! tp_description: "Protocol data model shared by adapters and transports."
//! tp_version: "v0.0.0-prealpha"
//! tp_owner: "tbd"
//! ---
use serde_json::{Map, Value as JsonValue};

use crate::entity::EntityId;
use crate::headers::HeaderMap;
use crate::status::HttpStatus;

/// Error reconstructed from, or rendered to, its JSON body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedError {
    /// Error code such as `things:thing.notfound`.
    pub error_code: String,
    /// HTTP-style status.
    pub status: HttpStatus,
    /// Human readable message.
    pub message: String,
    /// Longer description.
    pub description: Option<String>,
    /// Link to documentation.
    pub href: Option<String>,
}

impl TypedError {
    /// Error without description or link.
    pub fn new(error_code: impl Into<String>, status: HttpStatus, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            status,
            message: message.into(),
            description: None,
            href: None,
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the documentation link.
    #[must_use]
    pub fn with_href(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }

    /// `{status, error, message, description?, href?}`
    pub fn to_json(&self) -> JsonValue {
        let mut object = Map::new();
        object.insert("status".into(), self.status.code().into());
        object.insert("error".into(), self.error_code.clone().into());
        object.insert("message".into(), self.message.clone().into());
        if let Some(description) = &self.description {
            object.insert("description".into(), description.clone().into());
        }
        if let Some(href) = &self.href {
            object.insert("href".into(), href.clone().into());
        }
        JsonValue::Object(object)
    }
}

/// Error reply, optionally tied to the entity it concerns.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorResponse {
    /// Entity the failed request addressed.
    pub entity_id: Option<EntityId>,
    /// The error.
    pub error: TypedError,
    /// Headers.
    pub headers: HeaderMap,
}

impl ErrorResponse {
    /// Error reply.
    pub fn new(entity_id: Option<EntityId>, error: TypedError, headers: HeaderMap) -> Self {
        Self {
            entity_id,
            error,
            headers,
        }
    }

    /// Status of the error.
    pub fn status(&self) -> HttpStatus {
        self.error.status
    }
}
