//! ---
//! tp_section: "02-protocol-data-model"
//! tp_subsection: "module"
//! tp_type: "source"
//! tp_scope: "code"
//! tp_description: "Protocol data model shared by adapters and transports."
//! tp_version: "v0.0.0-prealpha"
//! tp_owner: "tbd"
//! ---
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use crate::fields::JsonFieldSelector;
use crate::pointer::JsonPointer;
use crate::status::HttpStatus;

/// Payload part of an adaptable.
///
/// `value == None` means "no value" (delete commands, no-content
/// responses) and is distinct from `Some(JsonValue::Null)`, which merge
/// operations use to remove a field.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    path: JsonPointer,
    value: Option<JsonValue>,
    status: Option<HttpStatus>,
    revision: Option<u64>,
    timestamp: Option<DateTime<Utc>>,
    metadata: Option<JsonValue>,
    fields: Option<JsonFieldSelector>,
}

impl Payload {
    /// Payload addressing `path` with every optional part absent.
    pub fn new(path: JsonPointer) -> Self {
        Self {
            path,
            value: None,
            status: None,
            revision: None,
            timestamp: None,
            metadata: None,
            fields: None,
        }
    }

    /// Set the value.
    #[must_use]
    pub fn with_value(mut self, value: JsonValue) -> Self {
        self.value = Some(value);
        self
    }

    /// Set or clear the value.
    #[must_use]
    pub fn with_optional_value(mut self, value: Option<JsonValue>) -> Self {
        self.value = value;
        self
    }

    /// Set the status.
    #[must_use]
    pub fn with_status(mut self, status: HttpStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Set the revision.
    #[must_use]
    pub fn with_revision(mut self, revision: u64) -> Self {
        self.revision = Some(revision);
        self
    }

    /// Set or clear the timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: Option<DateTime<Utc>>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Set or clear the metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Option<JsonValue>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Set or clear the field selector.
    #[must_use]
    pub fn with_fields(mut self, fields: Option<JsonFieldSelector>) -> Self {
        self.fields = fields;
        self
    }

    /// Resource path.
    pub fn path(&self) -> &JsonPointer {
        &self.path
    }

    /// Value, if any.
    pub fn value(&self) -> Option<&JsonValue> {
        self.value.as_ref()
    }

    /// Status, if any.
    pub fn status(&self) -> Option<HttpStatus> {
        self.status
    }

    /// Revision, if any.
    pub fn revision(&self) -> Option<u64> {
        self.revision
    }

    /// Timestamp, if any.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    /// Metadata, if any.
    pub fn metadata(&self) -> Option<&JsonValue> {
        self.metadata.as_ref()
    }

    /// Field selector, if any.
    pub fn fields(&self) -> Option<&JsonFieldSelector> {
        self.fields.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_and_null_values_differ() {
        let absent = Payload::new(JsonPointer::root());
        let null = Payload::new(JsonPointer::root()).with_value(json!(null));
        assert!(absent.value().is_none());
        assert_eq!(null.value(), Some(&json!(null)));
        assert_ne!(absent, null);
    }
}
