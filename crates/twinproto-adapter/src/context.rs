//! ---
//! tp_section: "04-protocol-adapters"
//! tp_subsection: "module"
//! tp_type: "source"
//! tp_scope: "code"
//! tp_description: "Signal adapters and the dispatching registry."
//! tp_version: "v0.0.0-prealpha"
//! tp_owner: "tbd"
//! ---
//! Collaborators and helpers shared by every family adapter.
use std::sync::Arc;

use serde_json::Value as JsonValue;
use twinproto_model::headers::keys;
use twinproto_model::topic::CriterionStep;
use twinproto_model::{
    Adaptable, Channel, EntityId, Group, HeaderMap, ModelError, ThingId,
    ThingResource, TopicDescriptor,
};

use crate::error::{AdapterError, Result};
use crate::ports::{
    ErrorCodeRegistry, ErrorRegistry, HeaderDirection, HeaderTranslator,
    PassThroughHeaderTranslator,
};

/// Header translator and error registry handed to each adapter.
#[derive(Debug, Clone)]
pub struct AdapterContext {
    headers: Arc<dyn HeaderTranslator>,
    errors: Arc<dyn ErrorRegistry>,
}

impl Default for AdapterContext {
    fn default() -> Self {
        Self::new(
            Arc::new(PassThroughHeaderTranslator),
            Arc::new(ErrorCodeRegistry::with_defaults()),
        )
    }
}

impl AdapterContext {
    /// Context over the given collaborators.
    pub fn new(headers: Arc<dyn HeaderTranslator>, errors: Arc<dyn ErrorRegistry>) -> Self {
        Self { headers, errors }
    }

    /// Error registry.
    pub fn error_registry(&self) -> &dyn ErrorRegistry {
        self.errors.as_ref()
    }

    /// Headers for an outbound adaptable: translated, with the channel header
    /// mirroring `channel`.
    pub fn outbound_headers(&self, headers: &HeaderMap, channel: Channel) -> HeaderMap {
        let translated = self.headers.translate(headers, HeaderDirection::ToExternal);
        with_channel(translated, channel)
    }

    /// Headers for an inbound signal: translated, live topics marked with the
    /// channel header and twin topics cleared of it.
    pub fn inbound_headers(&self, adaptable: &Adaptable) -> HeaderMap {
        let translated = self
            .headers
            .translate(adaptable.headers(), HeaderDirection::FromExternal);
        with_channel(translated, adaptable.topic().channel())
    }

    /// Translate headers without channel handling.
    pub fn translate(&self, headers: &HeaderMap, direction: HeaderDirection) -> HeaderMap {
        self.headers.translate(headers, direction)
    }
}

fn with_channel(headers: HeaderMap, channel: Channel) -> HeaderMap {
    match channel {
        Channel::Live => headers.with(keys::CHANNEL, Channel::Live.as_ref()),
        Channel::Twin => headers.without(keys::CHANNEL),
        Channel::None => headers,
    }
}

/// Topic builder for `id`, choosing a channel its group accepts.
pub(crate) fn entity_topic(id: &EntityId, channel: Channel) -> CriterionStep {
    TopicDescriptor::for_entity(id, channel)
}

/// Thing id addressed by the topic.
pub(crate) fn thing_id(topic: &TopicDescriptor) -> Result<ThingId> {
    match (topic.group(), topic.entity_id()) {
        (Group::Things, Some(id)) => Ok(id),
        _ => Err(ModelError::InvalidEntityId {
            id: format!("{}:{}", topic.namespace(), topic.entity_name()),
            reason: "topic does not address a single thing".to_owned(),
        }
        .into()),
    }
}

pub(crate) fn unknown_path(adaptable: &Adaptable) -> AdapterError {
    AdapterError::UnknownPath {
        topic: adaptable.topic().to_string(),
        path: adaptable.payload().path().to_string(),
    }
}

/// Resource addressed by the payload path.
pub(crate) fn resource_of(adaptable: &Adaptable) -> Result<ThingResource> {
    ThingResource::from_path(adaptable.payload().path()).ok_or_else(|| unknown_path(adaptable))
}

/// Payload value, which must be present.
pub(crate) fn require_value(adaptable: &Adaptable) -> Result<&JsonValue> {
    adaptable
        .payload()
        .value()
        .ok_or_else(|| AdapterError::MissingPayload(adaptable.topic().to_string()))
}

/// Payload path, which must be the root.
pub(crate) fn require_root(adaptable: &Adaptable) -> Result<()> {
    if adaptable.payload().path().is_root() {
        Ok(())
    } else {
        Err(unknown_path(adaptable))
    }
}

/// String field of a JSON object value.
pub(crate) fn str_field<'a>(value: &'a JsonValue, key: &'static str) -> Result<&'a str> {
    value
        .get(key)
        .and_then(JsonValue::as_str)
        .ok_or(AdapterError::MissingField(key))
}
