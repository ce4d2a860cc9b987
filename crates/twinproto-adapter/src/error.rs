//! ---
//! tp_section: "04-protocol-adapters"
//! tp_subsection: "module"
//! tp_type: "source"
//! tp_scope: "code"
//! tp_description: "Signal adapters and the dispatching registry."
//! tp_version: "v0.0.0-prealpha"
//! tp_owner: "tbd"
//! ---
use twinproto_model::ModelError;

/// Shared result type for translations.
pub type Result<T> = std::result::Result<T, AdapterError>;

/// Translation failures. Every variant is recoverable and reported to the
/// caller.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AdapterError {
    /// Outbound command without a mapping rule.
    #[error("no mapping rule for command '{0}'")]
    UnknownCommand(String),
    /// Outbound event without a mapping rule.
    #[error("no mapping rule for event '{0}'")]
    UnknownEvent(String),
    /// Outbound command response without a mapping rule.
    #[error("no mapping rule for command response '{0}'")]
    UnknownCommandResponse(String),
    /// Inbound adaptable whose topic or path no rule owns.
    #[error("no mapping rule for path '{path}' of topic '{topic}'")]
    UnknownPath {
        /// Topic string.
        topic: String,
        /// Resource path.
        path: String,
    },
    /// Operation requires a value but none was sent.
    #[error("payload value required for topic '{0}'")]
    MissingPayload(String),
    /// Merge tried to remove the thing id.
    #[error("the thing id of '{0}' cannot be deleted")]
    ThingIdNotDeletable(String),
    /// Merge tried to remove the policy id.
    #[error("the policy id of '{0}' cannot be deleted")]
    PolicyIdNotDeletable(String),
    /// Merge tried to change the thing id.
    #[error("the thing id '{given}' does not match '{expected}' and cannot be set explicitly")]
    ThingIdNotExplicitlySettable {
        /// Thing id addressed by the topic.
        expected: String,
        /// Thing id found in the value.
        given: String,
    },
    /// Value has the wrong shape for the addressed resource.
    #[error("invalid payload at '{path}': {reason}")]
    InvalidPayload {
        /// Resource path.
        path: String,
        /// What is wrong.
        reason: String,
    },
    /// A required envelope or value field is absent.
    #[error("missing field '{0}'")]
    MissingField(&'static str),
    /// Model value could not be built or parsed.
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl AdapterError {
    pub(crate) fn invalid_payload(path: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidPayload {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}
