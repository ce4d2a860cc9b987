//! ---
//! tp_section: "02-protocol-data-model"
//! tp_subsection: "module"
//! tp_type: "source"
//! tp_scope: "code"
//! tp_description: "Protocol data model shared by adapters and transports."
//! tp_version: "v0.0.0-prealpha"
//! tp_owner: "tbd"
//! ---
//! Errors raised while building or parsing model values.

/// Shared result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;

/// Failures reported by model constructors and parsers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// A topic string could not be parsed into a descriptor.
    #[error("unknown topic '{topic}': {reason}")]
    UnknownTopic {
        /// Offending topic string.
        topic: String,
        /// Why parsing failed.
        reason: String,
    },
    /// An entity identifier violates the namespace/name rules.
    #[error("invalid entity id '{id}': {reason}")]
    InvalidEntityId {
        /// Offending identifier.
        id: String,
        /// Why validation failed.
        reason: String,
    },
    /// A resource path could not be parsed.
    #[error("invalid json pointer '{pointer}': {reason}")]
    InvalidPointer {
        /// Offending pointer string.
        pointer: String,
        /// Why parsing failed.
        reason: String,
    },
    /// A field selector could not be parsed.
    #[error("invalid field selector '{selector}': {reason}")]
    InvalidFieldSelector {
        /// Offending selector string.
        selector: String,
        /// Why parsing failed.
        reason: String,
    },
    /// The JSON form of an adaptable is malformed.
    #[error("invalid adaptable: {0}")]
    InvalidAdaptable(String),
    /// Acknowledgements could not be assembled from the supplied members.
    #[error("acknowledgements construction failed: {0}")]
    Construction(String),
    /// Serialized acknowledgements disagree with the recomputed aggregate.
    #[error("acknowledgements parse failed: {0}")]
    AggregateParse(String),
}

impl ModelError {
    pub(crate) fn unknown_topic(topic: &str, reason: impl Into<String>) -> Self {
        Self::UnknownTopic {
            topic: topic.to_owned(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_pointer(pointer: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPointer {
            pointer: pointer.to_owned(),
            reason: reason.into(),
        }
    }
}
