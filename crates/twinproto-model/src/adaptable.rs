//! ---
//! tp_section: "02-protocol-data-model"
//! tp_subsection: "module"
//! tp_type: "source"
//! tp_scope: "code"
//! tp_description: "Protocol data model shared by adapters and transports."
//! tp_version: "v0.0.0-prealpha"
//! tp_owner: "tbd"
//! ---
//! The wire-level envelope exchanged with transports.
use chrono::{DateTime, Utc};
use serde_json::{Map, Value as JsonValue};

use crate::error::{ModelError, Result};
use crate::fields::JsonFieldSelector;
use crate::headers::HeaderMap;
use crate::payload::Payload;
use crate::pointer::JsonPointer;
use crate::status::HttpStatus;
use crate::topic::TopicDescriptor;

const TOPIC: &str = "topic";
const HEADERS: &str = "headers";
const PATH: &str = "path";
const VALUE: &str = "value";
const STATUS: &str = "status";
const REVISION: &str = "revision";
const TIMESTAMP: &str = "timestamp";
const METADATA: &str = "metadata";
const FIELDS: &str = "fields";

/// Topic, payload and headers of one translated signal.
#[derive(Debug, Clone, PartialEq)]
pub struct Adaptable {
    topic: TopicDescriptor,
    payload: Payload,
    headers: HeaderMap,
}

impl Adaptable {
    /// Assemble an adaptable.
    pub fn new(topic: TopicDescriptor, payload: Payload, headers: HeaderMap) -> Self {
        Self {
            topic,
            payload,
            headers,
        }
    }

    /// Topic descriptor.
    pub fn topic(&self) -> &TopicDescriptor {
        &self.topic
    }

    /// Payload.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Copy with the headers replaced.
    #[must_use]
    pub fn with_headers(&self, headers: HeaderMap) -> Self {
        Self {
            headers,
            ..self.clone()
        }
    }

    /// Render the JSON wire form.
    pub fn to_json(&self) -> JsonValue {
        let mut object = Map::new();
        object.insert(TOPIC.into(), JsonValue::String(self.topic.to_string()));
        object.insert(HEADERS.into(), self.headers.to_json());
        object.insert(PATH.into(), JsonValue::String(self.payload.path().to_string()));
        if let Some(value) = self.payload.value() {
            object.insert(VALUE.into(), value.clone());
        }
        if let Some(status) = self.payload.status() {
            object.insert(STATUS.into(), JsonValue::from(status.code()));
        }
        if let Some(revision) = self.payload.revision() {
            object.insert(REVISION.into(), JsonValue::from(revision));
        }
        if let Some(timestamp) = self.payload.timestamp() {
            object.insert(TIMESTAMP.into(), JsonValue::String(timestamp.to_rfc3339()));
        }
        if let Some(metadata) = self.payload.metadata() {
            object.insert(METADATA.into(), metadata.clone());
        }
        if let Some(fields) = self.payload.fields() {
            object.insert(FIELDS.into(), JsonValue::String(fields.to_string()));
        }
        JsonValue::Object(object)
    }

    /// Parse the JSON wire form.
    pub fn from_json(json: &JsonValue) -> Result<Self> {
        let object = json
            .as_object()
            .ok_or_else(|| invalid("adaptable must be a JSON object"))?;
        let topic = object
            .get(TOPIC)
            .and_then(JsonValue::as_str)
            .ok_or_else(|| invalid("missing string field 'topic'"))?;
        let topic = TopicDescriptor::parse(topic)?;
        let headers = match object.get(HEADERS) {
            None | Some(JsonValue::Null) => HeaderMap::new(),
            Some(value) => {
                HeaderMap::from_json(value).ok_or_else(|| invalid("'headers' must be an object"))?
            }
        };
        let path = match object.get(PATH) {
            None => JsonPointer::root(),
            Some(JsonValue::String(raw)) => JsonPointer::parse(raw)?,
            Some(_) => return Err(invalid("'path' must be a string")),
        };

        let mut payload = Payload::new(path).with_optional_value(object.get(VALUE).cloned());
        if let Some(status) = object.get(STATUS) {
            let status = status
                .as_u64()
                .and_then(|code| u16::try_from(code).ok())
                .and_then(HttpStatus::new)
                .ok_or_else(|| invalid("'status' must be an HTTP status code"))?;
            payload = payload.with_status(status);
        }
        if let Some(revision) = object.get(REVISION) {
            let revision = revision
                .as_u64()
                .ok_or_else(|| invalid("'revision' must be a non-negative integer"))?;
            payload = payload.with_revision(revision);
        }
        if let Some(timestamp) = object.get(TIMESTAMP) {
            let timestamp = timestamp
                .as_str()
                .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
                .map(|ts| ts.with_timezone(&Utc))
                .ok_or_else(|| invalid("'timestamp' must be an RFC 3339 string"))?;
            payload = payload.with_timestamp(Some(timestamp));
        }
        payload = payload.with_metadata(object.get(METADATA).cloned());
        if let Some(fields) = object.get(FIELDS) {
            let raw = fields
                .as_str()
                .ok_or_else(|| invalid("'fields' must be a string"))?;
            payload = payload.with_fields(Some(JsonFieldSelector::parse(raw)?));
        }
        Ok(Self::new(topic, payload, headers))
    }
}

fn invalid(reason: &str) -> ModelError {
    ModelError::InvalidAdaptable(reason.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_form_roundtrips() {
        let wire = json!({
            "topic": "org.acme/lamp/things/twin/events/modified",
            "headers": {"correlation-id": "c-1"},
            "path": "/attributes/location",
            "value": {"room": "kitchen"},
            "revision": 7,
            "timestamp": "2024-01-01T00:00:00+00:00",
            "metadata": {"attributes": {"location": {"issuedBy": "sensor"}}}
        });
        let adaptable = Adaptable::from_json(&wire).unwrap();
        assert_eq!(adaptable.payload().revision(), Some(7));
        assert_eq!(adaptable.headers().correlation_id(), Some("c-1"));
        assert_eq!(adaptable.to_json(), wire);
    }

    #[test]
    fn explicit_null_value_is_kept() {
        let wire = json!({
            "topic": "org.acme/lamp/things/twin/commands/merge",
            "path": "/attributes/a",
            "value": null
        });
        let adaptable = Adaptable::from_json(&wire).unwrap();
        assert_eq!(adaptable.payload().value(), Some(&json!(null)));

        let without = json!({
            "topic": "org.acme/lamp/things/twin/commands/merge",
            "path": "/attributes/a"
        });
        assert!(Adaptable::from_json(&without).unwrap().payload().value().is_none());
    }

    #[test]
    fn rejects_malformed_envelopes() {
        assert!(Adaptable::from_json(&json!([])).is_err());
        assert!(Adaptable::from_json(&json!({"path": "/"})).is_err());
        assert!(matches!(
            Adaptable::from_json(&json!({"topic": "a/b/c"})),
            Err(ModelError::UnknownTopic { .. })
        ));
        assert!(Adaptable::from_json(&json!({
            "topic": "org/lamp/things/twin/errors",
            "status": 99
        }))
        .is_err());
    }
}
