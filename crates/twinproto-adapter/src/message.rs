//! ---
//! tp_section: "04-protocol-adapters"
//! tp_subsection: "module"
//! tp_type: "source"
//! tp_scope: "code"
//! tp_description: "Signal adapters and the dispatching registry."
//! tp_version: "v0.0.0-prealpha"
//! tp_owner: "tbd"
//! ---
//! Live messages to and from things.
//!
//! The content type decides how the body travels: JSON types keep the value
//! as JSON, text types as a string and everything else as the base64 text of
//! the raw bytes. Without a content type the message has no body.
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::Value as JsonValue;
use twinproto_model::headers::keys;
use twinproto_model::resource::fields;
use twinproto_model::signal::{
    Message, MessageCommand, MessageCommandResponse, MessageDirection, MessagePayload,
};
use twinproto_model::{Adaptable, Channel, ContentType, Criterion, HeaderMap, Payload};

use crate::context::{entity_topic, thing_id, unknown_path, AdapterContext};
use crate::error::{AdapterError, Result};
use crate::Adapter;

/// Maps [`MessageCommand`] and [`MessageCommandResponse`].
#[derive(Debug, Clone, Default)]
pub struct MessageAdapter {
    ctx: AdapterContext,
}

impl MessageAdapter {
    /// Adapter using `ctx`.
    pub fn new(ctx: AdapterContext) -> Self {
        Self { ctx }
    }

    fn outbound(
        &self,
        message: &Message,
        status: Option<twinproto_model::HttpStatus>,
    ) -> Result<Adaptable> {
        let headers = with_payload_content_type(message);
        let mut payload = Payload::new(message.path())
            .with_optional_value(message.payload.as_ref().map(encode));
        if let Some(status) = status {
            payload = payload.with_status(status);
        }
        let topic = entity_topic(&message.thing_id, Channel::Live).messages(message.subject.clone())?;
        Ok(Adaptable::new(
            topic,
            payload,
            self.ctx.outbound_headers(&headers, Channel::Live),
        ))
    }

    fn inbound(&self, adaptable: &Adaptable) -> Result<Message> {
        let topic = adaptable.topic();
        let subject = match (topic.criterion(), topic.subject()) {
            (Criterion::Messages, Some(subject)) => subject,
            _ => return Err(unknown_path(adaptable)),
        };
        let thing_id = thing_id(topic)?;
        let (feature_id, direction) =
            parse_message_path(adaptable, subject).ok_or_else(|| unknown_path(adaptable))?;
        let headers = self.ctx.inbound_headers(adaptable);

        let mut message = Message::new(thing_id, direction, subject, headers.clone());
        if let Some(feature_id) = feature_id {
            message = message.with_feature(feature_id);
        }
        let value = adaptable.payload().value();
        if let (Some(content_type), Some(value)) = (headers.content_type(), value) {
            message = message.with_payload(decode(adaptable, &content_type, value)?);
        }
        Ok(message)
    }
}

impl Adapter<MessageCommand> for MessageAdapter {
    fn to_adaptable(&self, command: &MessageCommand, _channel: Channel) -> Result<Adaptable> {
        self.outbound(&command.message, None)
    }

    fn from_adaptable(&self, adaptable: &Adaptable) -> Result<MessageCommand> {
        Ok(MessageCommand::new(self.inbound(adaptable)?))
    }
}

impl Adapter<MessageCommandResponse> for MessageAdapter {
    fn to_adaptable(
        &self,
        response: &MessageCommandResponse,
        _channel: Channel,
    ) -> Result<Adaptable> {
        self.outbound(&response.message, Some(response.status))
    }

    fn from_adaptable(&self, adaptable: &Adaptable) -> Result<MessageCommandResponse> {
        let status = adaptable
            .payload()
            .status()
            .ok_or(AdapterError::MissingField("status"))?;
        Ok(MessageCommandResponse::new(self.inbound(adaptable)?, status))
    }
}

/// Headers of an outbound message; a body without content type gets the
/// type matching its kind.
fn with_payload_content_type(message: &Message) -> HeaderMap {
    let headers = message.headers();
    match (&message.payload, headers.content_type()) {
        (Some(payload), None) => {
            let content_type = match payload {
                MessagePayload::Json(_) => ContentType::APPLICATION_JSON,
                MessagePayload::Text(_) => ContentType::TEXT_PLAIN,
                MessagePayload::Binary(_) => ContentType::OCTET_STREAM,
            };
            headers.with(keys::CONTENT_TYPE, content_type)
        }
        _ => headers.clone(),
    }
}

fn encode(payload: &MessagePayload) -> JsonValue {
    match payload {
        MessagePayload::Json(value) => value.clone(),
        MessagePayload::Text(text) => JsonValue::String(text.clone()),
        MessagePayload::Binary(bytes) => JsonValue::String(STANDARD.encode(bytes)),
    }
}

fn decode(
    adaptable: &Adaptable,
    content_type: &ContentType,
    value: &JsonValue,
) -> Result<MessagePayload> {
    if content_type.is_json() {
        return Ok(MessagePayload::Json(value.clone()));
    }
    let text = match value {
        JsonValue::String(text) => text.clone(),
        other => other.to_string(),
    };
    if content_type.is_text() {
        return Ok(MessagePayload::Text(text));
    }
    STANDARD
        .decode(text.as_bytes())
        .map(MessagePayload::Binary)
        .map_err(|err| {
            AdapterError::invalid_payload(
                adaptable.payload().path(),
                format!("binary payload is not valid base64: {err}"),
            )
        })
}

/// Split `[/features/<id>]/<inbox|outbox>/messages/<subject>` and check the
/// subject against the topic.
fn parse_message_path(
    adaptable: &Adaptable,
    subject: &str,
) -> Option<(Option<String>, MessageDirection)> {
    let segments: Vec<&str> = adaptable.payload().path().segments().collect();
    let (feature_id, rest) = match segments.as_slice() {
        [fields::FEATURES, id, rest @ ..] => (Some((*id).to_owned()), rest),
        rest => (None, rest),
    };
    let [mailbox, "messages", subject_segments @ ..] = rest else {
        return None;
    };
    let direction = MessageDirection::from_mailbox(mailbox)?;
    (subject_segments.join("/") == subject).then_some((feature_id, direction))
}
