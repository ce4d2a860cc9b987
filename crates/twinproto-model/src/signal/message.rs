//! ---
//! tp_section: "02-protocol-data-model"
//! tp_subsection: "module"
//! tp_type: "source"
//! tp_scope: "code"
//! tp_description: "Protocol data model shared by adapters and transports."
//! tp_version: "v0.0.0-prealpha"
//! tp_owner: "tbd"
//! ---
//! Live messages exchanged with devices.
use std::time::Duration;

use serde_json::Value as JsonValue;
use strum::{AsRefStr, Display, EnumString};

use crate::entity::ThingId;
use crate::headers::{keys, ContentType, HeaderMap};
use crate::pointer::JsonPointer;
use crate::resource::fields::FEATURES;
use crate::status::HttpStatus;
use crate::topic::Channel;

/// Subject of claim messages.
pub const CLAIM_SUBJECT: &str = "claim";

/// Whether a message goes to the device or comes from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum MessageDirection {
    /// Sent to the thing (`inbox`).
    To,
    /// Sent by the thing (`outbox`).
    From,
}

impl MessageDirection {
    /// Mailbox path segment.
    pub fn mailbox(self) -> &'static str {
        match self {
            MessageDirection::To => "inbox",
            MessageDirection::From => "outbox",
        }
    }

    /// Direction of a mailbox path segment.
    pub fn from_mailbox(segment: &str) -> Option<Self> {
        match segment {
            "inbox" => Some(MessageDirection::To),
            "outbox" => Some(MessageDirection::From),
            _ => None,
        }
    }
}

/// Body of a message, classified by its content type.
#[derive(Debug, Clone, PartialEq)]
pub enum MessagePayload {
    /// Structured JSON.
    Json(JsonValue),
    /// UTF-8 text.
    Text(String),
    /// Raw bytes.
    Binary(Vec<u8>),
}

/// Message addressed to a thing or one of its features.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Thing the message is exchanged with.
    pub thing_id: ThingId,
    /// Feature, for feature messages.
    pub feature_id: Option<String>,
    /// To or from the thing.
    pub direction: MessageDirection,
    /// Subject; may contain `/`.
    pub subject: String,
    /// Body, absent without content type.
    pub payload: Option<MessagePayload>,
    headers: HeaderMap,
}

impl Message {
    /// Message without body. The headers are forced to the live channel.
    pub fn new(
        thing_id: ThingId,
        direction: MessageDirection,
        subject: impl Into<String>,
        headers: HeaderMap,
    ) -> Self {
        Self {
            thing_id,
            feature_id: None,
            direction,
            subject: subject.into(),
            payload: None,
            headers: live(headers),
        }
    }

    /// Address a feature.
    #[must_use]
    pub fn with_feature(mut self, feature_id: impl Into<String>) -> Self {
        self.feature_id = Some(feature_id.into());
        self
    }

    /// Attach a body.
    #[must_use]
    pub fn with_payload(mut self, payload: MessagePayload) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Headers, always on the live channel.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Copy with the headers replaced; the live channel is kept.
    #[must_use]
    pub fn with_headers(&self, headers: HeaderMap) -> Self {
        Self {
            headers: live(headers),
            ..self.clone()
        }
    }

    /// Content type header.
    pub fn content_type(&self) -> Option<ContentType> {
        self.headers.content_type()
    }

    /// Timeout header.
    pub fn timeout(&self) -> Option<Duration> {
        self.headers.timeout()
    }

    /// Claim message: subject `claim` sent to a thing inbox.
    pub fn is_claim(&self) -> bool {
        self.subject == CLAIM_SUBJECT
            && self.direction == MessageDirection::To
            && self.feature_id.is_none()
    }

    /// `[/features/<id>]/<inbox|outbox>/messages/<subject>`
    pub fn path(&self) -> JsonPointer {
        let base = match &self.feature_id {
            Some(feature) => JsonPointer::from_segments([FEATURES, feature.as_str()]),
            None => JsonPointer::root(),
        };
        let mailbox = base.append(self.direction.mailbox()).append("messages");
        mailbox.join(&JsonPointer::from_segments(self.subject.split('/')))
    }
}

fn live(headers: HeaderMap) -> HeaderMap {
    headers.with(keys::CHANNEL, Channel::Live.as_ref())
}

/// Message sent to or from a thing.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageCommand {
    /// The message.
    pub message: Message,
}

impl MessageCommand {
    /// Wrap a message.
    pub fn new(message: Message) -> Self {
        Self { message }
    }
}

/// Reply to a [`MessageCommand`].
#[derive(Debug, Clone, PartialEq)]
pub struct MessageCommandResponse {
    /// The reply message.
    pub message: Message,
    /// Reply status.
    pub status: HttpStatus,
}

impl MessageCommandResponse {
    /// Wrap a reply.
    pub fn new(message: Message, status: HttpStatus) -> Self {
        Self { message, status }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lamp() -> ThingId {
        ThingId::thing("org.acme", "lamp").unwrap()
    }

    #[test]
    fn paths_and_claims() {
        let claim = Message::new(lamp(), MessageDirection::To, CLAIM_SUBJECT, HeaderMap::new());
        assert!(claim.is_claim());
        assert_eq!(claim.path().to_string(), "/inbox/messages/claim");

        let feature = Message::new(lamp(), MessageDirection::From, "ask/question", HeaderMap::new())
            .with_feature("switch");
        assert!(!feature.is_claim());
        assert_eq!(
            feature.path().to_string(),
            "/features/switch/outbox/messages/ask/question"
        );
    }

    #[test]
    fn channel_is_always_live() {
        let message = Message::new(
            lamp(),
            MessageDirection::To,
            "on",
            HeaderMap::new().with(keys::CHANNEL, "twin"),
        );
        assert_eq!(message.headers().channel(), Channel::Live);
        let replaced = message.with_headers(HeaderMap::new());
        assert_eq!(replaced.headers().channel(), Channel::Live);
    }
}
