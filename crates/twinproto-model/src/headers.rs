//! ---
//! tp_section: "02-protocol-data-model"
//! tp_subsection: "module"
//! tp_type: "source"
//! tp_scope: "code"
//! tp_description: "Protocol data model shared by adapters and transports."
//! tp_version: "v0.0.0-prealpha"
//! tp_owner: "tbd"
//! ---
//! Immutable header maps and content types.
use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

use crate::topic::Channel;

/// Well-known header keys. Keys are always lower case.
pub mod keys {
    /// MIME type of the payload value.
    pub const CONTENT_TYPE: &str = "content-type";
    /// Correlates requests, responses and acknowledgements.
    pub const CORRELATION_ID: &str = "correlation-id";
    /// `twin` or `live`.
    pub const CHANNEL: &str = "channel";
    /// Whether the sender waits for a response.
    pub const RESPONSE_REQUIRED: &str = "response-required";
    /// Acknowledgement labels the sender waits for.
    pub const REQUESTED_ACKS: &str = "requested-acks";
    /// Marks an acknowledgement issued on behalf of an unreachable subscriber.
    pub const WEAK_ACK: &str = "ditto-weak-ack";
    /// Timeout in seconds.
    pub const TIMEOUT: &str = "timeout";
    /// Message subject.
    pub const SUBJECT: &str = "subject";
    /// Message direction (`TO` / `FROM`).
    pub const DIRECTION: &str = "direction";
    /// Feature addressed by a message.
    pub const FEATURE_ID: &str = "feature-id";
    /// Thing addressed by a message.
    pub const THING_ID: &str = "thing-id";
    /// Response status mirrored as header.
    pub const STATUS: &str = "status";
}

/// Ordered, case-insensitive header map with copy-on-write updates.
///
/// Equality ignores insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HeaderMap {
    entries: IndexMap<String, String>,
}

impl HeaderMap {
    /// Empty header map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from key/value pairs, lower-casing every key.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(key, value)| (key.as_ref().to_ascii_lowercase(), value.into()))
                .collect(),
        }
    }

    /// Copy with `key` set to `value`.
    #[must_use]
    pub fn with(&self, key: &str, value: impl Into<String>) -> Self {
        let mut entries = self.entries.clone();
        entries.insert(key.to_ascii_lowercase(), value.into());
        Self { entries }
    }

    /// Copy with every entry of `other` set, overriding existing keys.
    #[must_use]
    pub fn with_all(&self, other: &HeaderMap) -> Self {
        let mut entries = self.entries.clone();
        entries.extend(other.entries.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self { entries }
    }

    /// Copy without `key`.
    #[must_use]
    pub fn without(&self, key: &str) -> Self {
        let mut entries = self.entries.clone();
        entries.shift_remove(&key.to_ascii_lowercase());
        Self { entries }
    }

    /// Copy keeping only entries accepted by `keep`.
    #[must_use]
    pub fn filtered(&self, mut keep: impl FnMut(&str, &str) -> bool) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .filter(|(k, v)| keep(k, v))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// Value of `key`, case-insensitive.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// True when `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no header is set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parsed `content-type` header.
    pub fn content_type(&self) -> Option<ContentType> {
        self.get(keys::CONTENT_TYPE).map(ContentType::new)
    }

    /// `correlation-id` header.
    pub fn correlation_id(&self) -> Option<&str> {
        self.get(keys::CORRELATION_ID)
    }

    /// Channel declared by the `channel` header, twin when absent.
    pub fn channel(&self) -> Channel {
        match self.get(keys::CHANNEL) {
            Some(value) if value.eq_ignore_ascii_case("live") => Channel::Live,
            _ => Channel::Twin,
        }
    }

    /// True when the weak acknowledgement flag is set.
    pub fn is_weak_ack(&self) -> bool {
        self.get(keys::WEAK_ACK)
            .is_some_and(|value| value.eq_ignore_ascii_case("true"))
    }

    /// `timeout` header in seconds.
    pub fn timeout(&self) -> Option<Duration> {
        self.get(keys::TIMEOUT)
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
    }

    /// Render as a JSON object of string values.
    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(
            self.entries
                .iter()
                .map(|(k, v)| (k.clone(), JsonValue::String(v.clone())))
                .collect(),
        )
    }

    /// Read a JSON object; non-string values are kept as compact JSON text.
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        let object = value.as_object()?;
        Some(Self::from_pairs(object.iter().map(|(k, v)| {
            let text = match v {
                JsonValue::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k, text)
        })))
    }
}

impl<'de> Deserialize<'de> for HeaderMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = JsonValue::deserialize(deserializer)?;
        Self::from_json(&value).ok_or_else(|| serde::de::Error::custom("headers must be an object"))
    }
}

/// MIME type of a payload, classified for serialization purposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentType {
    raw: String,
}

impl ContentType {
    /// `application/json`
    pub const APPLICATION_JSON: &'static str = "application/json";
    /// JSON merge patch.
    pub const MERGE_PATCH_JSON: &'static str = "application/merge-patch+json";
    /// Content type of protocol envelopes themselves.
    pub const PROTOCOL_JSON: &'static str = "application/vnd.eclipse.ditto+json";
    /// Reserved binary content type.
    pub const OCTET_STREAM: &'static str = "application/octet-stream";
    /// `text/plain`
    pub const TEXT_PLAIN: &'static str = "text/plain";

    /// Wrap a raw header value.
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// Header value as given.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Media type without parameters, lower case.
    pub fn media_type(&self) -> String {
        self.raw
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
    }

    /// `application/json` or any `+json` suffix type.
    pub fn is_json(&self) -> bool {
        let media = self.media_type();
        media == Self::APPLICATION_JSON || media.ends_with("+json")
    }

    /// Textual content carried as a JSON string.
    pub fn is_text(&self) -> bool {
        let media = self.media_type();
        media.starts_with("text/")
            || media.ends_with("+xml")
            || matches!(
                media.as_str(),
                "application/xml"
                    | "application/javascript"
                    | "application/x-www-form-urlencoded"
            )
    }

    /// Everything that is neither JSON nor text.
    pub fn is_binary(&self) -> bool {
        !self.is_json() && !self.is_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn updates_are_copy_on_write() {
        let base = HeaderMap::new().with("Correlation-Id", "c-1");
        let extended = base.with(keys::CHANNEL, "live");
        assert_eq!(base.len(), 1);
        assert_eq!(extended.len(), 2);
        assert_eq!(extended.correlation_id(), Some("c-1"));
        assert_eq!(extended.channel(), Channel::Live);
        assert_eq!(extended.without("CHANNEL"), base);
    }

    #[test]
    fn equality_ignores_order() {
        let a = HeaderMap::from_pairs([("a", "1"), ("b", "2")]);
        let b = HeaderMap::from_pairs([("b", "2"), ("a", "1")]);
        assert_eq!(a, b);
    }

    #[test]
    fn json_values_become_text() {
        let headers =
            HeaderMap::from_json(&json!({"response-required": false, "requested-acks": ["a"]}))
                .unwrap();
        assert_eq!(headers.get(keys::RESPONSE_REQUIRED), Some("false"));
        assert_eq!(headers.get(keys::REQUESTED_ACKS), Some("[\"a\"]"));
    }

    #[test]
    fn content_type_classification() {
        assert!(ContentType::new("application/json; charset=utf-8").is_json());
        assert!(ContentType::new(ContentType::MERGE_PATCH_JSON).is_json());
        assert!(ContentType::new("text/plain").is_text());
        assert!(ContentType::new(ContentType::OCTET_STREAM).is_binary());
        assert!(ContentType::new("image/png").is_binary());
    }

    #[test]
    fn weak_ack_and_timeout() {
        let headers = HeaderMap::new()
            .with(keys::WEAK_ACK, "TRUE")
            .with(keys::TIMEOUT, "30");
        assert!(headers.is_weak_ack());
        assert_eq!(headers.timeout(), Some(Duration::from_secs(30)));
    }
}
