//! ---
//! tp_section: "04-protocol-adapters"
//! tp_subsection: "module"
//! tp_type: "source"
//! tp_scope: "code"
//! tp_description: "Signal adapters and the dispatching registry."
//! tp_version: "v0.0.0-prealpha"
//! tp_owner: "tbd"
//! ---
//! Collaborator interfaces consumed by the adapters: header translation and
//! error reconstruction, each with a default implementation.
use std::fmt;

use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use twinproto_common::{ErrorsConfig, HeaderVisibility, HeadersConfig};
use twinproto_model::headers::keys;
use twinproto_model::signal::TypedError;
use twinproto_model::{HeaderMap, HttpStatus};

/// Which way headers cross the protocol boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderDirection {
    /// Signal headers written onto an outbound adaptable.
    ToExternal,
    /// Adaptable headers read into an inbound signal.
    FromExternal,
}

/// Maps headers across the protocol boundary, keeping the visible subset.
pub trait HeaderTranslator: Send + Sync + fmt::Debug {
    /// Translate `headers` travelling in `direction`.
    fn translate(&self, headers: &HeaderMap, direction: HeaderDirection) -> HeaderMap;
}

/// Keeps every header.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughHeaderTranslator;

impl HeaderTranslator for PassThroughHeaderTranslator {
    fn translate(&self, headers: &HeaderMap, _direction: HeaderDirection) -> HeaderMap {
        headers.clone()
    }
}

/// Keeps declared headers according to their visibility. Protocol headers
/// are always declared; configuration may narrow or extend them.
#[derive(Debug, Clone)]
pub struct AllowListHeaderTranslator {
    declared: IndexMap<String, HeaderVisibility>,
    pass_unknown: bool,
}

const PROTOCOL_HEADERS: &[&str] = &[
    keys::CONTENT_TYPE,
    keys::CORRELATION_ID,
    keys::CHANNEL,
    keys::RESPONSE_REQUIRED,
    keys::REQUESTED_ACKS,
    keys::WEAK_ACK,
    keys::TIMEOUT,
    keys::SUBJECT,
    keys::DIRECTION,
    keys::FEATURE_ID,
    keys::THING_ID,
    keys::STATUS,
];

impl AllowListHeaderTranslator {
    /// Translator declaring only the protocol headers.
    pub fn new(pass_unknown: bool) -> Self {
        Self {
            declared: PROTOCOL_HEADERS
                .iter()
                .map(|key| ((*key).to_owned(), HeaderVisibility::default()))
                .collect(),
            pass_unknown,
        }
    }

    /// Translator built from the `[headers]` configuration section.
    pub fn from_config(config: &HeadersConfig) -> Self {
        config
            .declared
            .iter()
            .fold(Self::new(config.pass_unknown), |translator, (name, visibility)| {
                translator.declare(name, *visibility)
            })
    }

    /// Copy with `name` declared.
    #[must_use]
    pub fn declare(mut self, name: &str, visibility: HeaderVisibility) -> Self {
        self.declared.insert(name.to_ascii_lowercase(), visibility);
        self
    }

    fn visible(&self, key: &str, direction: HeaderDirection) -> bool {
        match self.declared.get(key) {
            Some(visibility) => match direction {
                HeaderDirection::ToExternal => visibility.write_to_external,
                HeaderDirection::FromExternal => visibility.read_from_external,
            },
            None => self.pass_unknown,
        }
    }
}

impl HeaderTranslator for AllowListHeaderTranslator {
    fn translate(&self, headers: &HeaderMap, direction: HeaderDirection) -> HeaderMap {
        headers.filtered(|key, _| self.visible(key, direction))
    }
}

/// Rebuilds typed errors from their code and JSON body.
pub trait ErrorRegistry: Send + Sync + fmt::Debug {
    /// Reconstruct the error identified by `error_code`.
    fn resolve(&self, error_code: &str, body: &JsonValue, headers: &HeaderMap) -> TypedError;
}

/// Registry of known error codes and their default statuses.
///
/// The body's own `status` wins; unknown codes without status fall back to
/// 500.
#[derive(Debug, Clone, Default)]
pub struct ErrorCodeRegistry {
    codes: IndexMap<String, HttpStatus>,
}

const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred.";

impl ErrorCodeRegistry {
    /// Registry without codes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded from the `[errors]` configuration section.
    pub fn from_config(config: &ErrorsConfig) -> Self {
        config
            .codes
            .iter()
            .filter_map(|(code, status)| HttpStatus::new(*status).map(|status| (code, status)))
            .fold(Self::new(), |registry, (code, status)| {
                registry.register(code, status)
            })
    }

    /// Registry seeded with the built-in code table.
    pub fn with_defaults() -> Self {
        Self::from_config(&ErrorsConfig::default())
    }

    /// Copy with `code` registered.
    #[must_use]
    pub fn register(mut self, code: impl Into<String>, status: HttpStatus) -> Self {
        self.codes.insert(code.into(), status);
        self
    }

    /// Default status of `code`.
    pub fn status_of(&self, code: &str) -> Option<HttpStatus> {
        self.codes.get(code).copied()
    }
}

impl ErrorRegistry for ErrorCodeRegistry {
    fn resolve(&self, error_code: &str, body: &JsonValue, _headers: &HeaderMap) -> TypedError {
        let text = |key: &str| body.get(key).and_then(JsonValue::as_str).map(str::to_owned);
        let status = body
            .get("status")
            .and_then(JsonValue::as_u64)
            .and_then(|code| u16::try_from(code).ok())
            .and_then(HttpStatus::new)
            .or_else(|| self.status_of(error_code))
            .unwrap_or(HttpStatus::INTERNAL_SERVER_ERROR);
        TypedError {
            error_code: error_code.to_owned(),
            status,
            message: text("message").unwrap_or_else(|| UNKNOWN_ERROR_MESSAGE.to_owned()),
            description: text("description"),
            href: text("href"),
        }
    }
}
