//! ---
//! tp_section: "02-protocol-data-model"
//! tp_subsection: "module"
//! tp_type: "source"
//! tp_scope: "code"
//! tp_description: "Protocol data model shared by adapters and transports."
//! tp_version: "v0.0.0-prealpha"
//! tp_owner: "tbd"
//! ---
//! Acknowledgements and their aggregate.
//!
//! Collecting the replies (timeouts, partial arrival) happens outside this
//! crate; [`Acknowledgements::of`] is called once with the complete set.
use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value as JsonValue};

use crate::entity::{EntityId, EntityType};
use crate::error::{ModelError, Result};
use crate::headers::{keys, ContentType, HeaderMap};
use crate::status::HttpStatus;

mod json_keys {
    pub const LABEL: &str = "label";
    pub const ENTITY_ID: &str = "entityId";
    pub const ENTITY_TYPE: &str = "entityType";
    pub const STATUS: &str = "status";
    pub const STATUS_CODE: &str = "statusCode";
    pub const PAYLOAD: &str = "payload";
    pub const HEADERS: &str = "headers";
    pub const ACKNOWLEDGEMENTS: &str = "acknowledgements";
    pub const DITTO_HEADERS: &str = "dittoHeaders";
}

/// Label identifying who acknowledged a signal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AcknowledgementLabel(String);

impl AcknowledgementLabel {
    /// Reserved label answered by live command responses.
    pub const LIVE_RESPONSE: &'static str = "live-response";
    /// Reserved label issued once a twin change is persisted.
    pub const TWIN_PERSISTED: &'static str = "twin-persisted";
    /// Reserved label issued once a change is visible to search.
    pub const SEARCH_PERSISTED: &'static str = "search-persisted";

    /// Validate a label: 1 to 100 characters out of `[A-Za-z0-9_:-]`.
    pub fn parse(raw: &str) -> Result<Self> {
        let legal = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':');
        if raw.is_empty() || raw.len() > 100 || !raw.chars().all(legal) {
            return Err(ModelError::Construction(format!(
                "invalid acknowledgement label '{raw}'"
            )));
        }
        Ok(Self(raw.to_owned()))
    }

    /// Label text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the reserved live-response label.
    pub fn is_live_response(&self) -> bool {
        self.0 == Self::LIVE_RESPONSE
    }
}

impl fmt::Display for AcknowledgementLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AcknowledgementLabel {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// One party's reply to a signal that requested acknowledgements.
#[derive(Debug, Clone, PartialEq)]
pub struct Acknowledgement {
    label: AcknowledgementLabel,
    entity_id: EntityId,
    status: HttpStatus,
    headers: HeaderMap,
    payload: Option<JsonValue>,
}

impl Acknowledgement {
    /// Acknowledgement without payload.
    pub fn new(
        label: AcknowledgementLabel,
        entity_id: EntityId,
        status: HttpStatus,
        headers: HeaderMap,
    ) -> Self {
        Self {
            label,
            entity_id,
            status,
            headers,
            payload: None,
        }
    }

    /// Weak acknowledgement issued on behalf of a subscriber that could not
    /// receive the signal.
    pub fn weak(label: AcknowledgementLabel, entity_id: EntityId, headers: HeaderMap) -> Self {
        let payload = JsonValue::String(format!(
            "Acknowledgement was issued automatically as weak ack, because the signal is \
             not relevant for the subscriber '{label}'."
        ));
        Self::new(
            label,
            entity_id,
            HttpStatus::OK,
            headers.with(keys::WEAK_ACK, "true"),
        )
        .with_payload(Some(payload))
    }

    /// Synthetic acknowledgement for a party that did not answer in time.
    pub fn timeout(label: AcknowledgementLabel, entity_id: EntityId, headers: HeaderMap) -> Self {
        Self::new(label, entity_id, HttpStatus::REQUEST_TIMEOUT, headers)
    }

    /// Copy with the payload replaced.
    #[must_use]
    pub fn with_payload(self, payload: Option<JsonValue>) -> Self {
        Self { payload, ..self }
    }

    /// Copy with the headers replaced.
    #[must_use]
    pub fn with_headers(&self, headers: HeaderMap) -> Self {
        Self {
            headers,
            ..self.clone()
        }
    }

    /// Label.
    pub fn label(&self) -> &AcknowledgementLabel {
        &self.label
    }

    /// Acknowledged entity.
    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    /// Status.
    pub fn status(&self) -> HttpStatus {
        self.status
    }

    /// Headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Payload, if any.
    pub fn payload(&self) -> Option<&JsonValue> {
        self.payload.as_ref()
    }

    /// Successful status; a live response counts as successful unless it
    /// timed out, whatever status the device answered with.
    pub fn is_success(&self) -> bool {
        if self.label.is_live_response() {
            !self.is_timeout()
        } else {
            self.status.is_success()
        }
    }

    /// Auto-issued on behalf of an unreachable subscriber.
    pub fn is_weak(&self) -> bool {
        self.headers.is_weak_ack()
    }

    /// Status 408.
    pub fn is_timeout(&self) -> bool {
        self.status == HttpStatus::REQUEST_TIMEOUT
    }

    /// Entity JSON as embedded into an aggregate: status, optional payload and
    /// headers, with a content type implied by the protocol stripped.
    fn entry_json(&self, schema_version: u8) -> JsonValue {
        let mut object = Map::new();
        object.insert(json_keys::STATUS.into(), self.status.code().into());
        if let Some(payload) = &self.payload {
            object.insert(json_keys::PAYLOAD.into(), payload.clone());
        }
        if schema_version >= 2 {
            let headers = self.headers.filtered(|key, value| {
                !(key == keys::CONTENT_TYPE
                    && ContentType::new(value).media_type() == ContentType::PROTOCOL_JSON)
            });
            object.insert(json_keys::HEADERS.into(), headers.to_json());
        }
        JsonValue::Object(object)
    }

    /// Full JSON form.
    pub fn to_json(&self) -> JsonValue {
        let mut object = Map::new();
        object.insert(json_keys::LABEL.into(), self.label.as_str().into());
        object.insert(json_keys::ENTITY_ID.into(), self.entity_id.to_string().into());
        object.insert(
            json_keys::ENTITY_TYPE.into(),
            self.entity_id.entity_type().as_ref().into(),
        );
        object.insert(json_keys::STATUS.into(), self.status.code().into());
        if let Some(payload) = &self.payload {
            object.insert(json_keys::PAYLOAD.into(), payload.clone());
        }
        object.insert(json_keys::HEADERS.into(), self.headers.to_json());
        JsonValue::Object(object)
    }

    /// Parse the full JSON form.
    pub fn from_json(json: &JsonValue) -> Result<Self> {
        let object = json
            .as_object()
            .ok_or_else(|| parse_error("acknowledgement must be an object"))?;
        let label = AcknowledgementLabel::parse(required_str(object, json_keys::LABEL)?)
            .map_err(|err| parse_error(&err.to_string()))?;
        let entity_type = entity_type(object)?;
        let entity_id = EntityId::parse(entity_type, required_str(object, json_keys::ENTITY_ID)?)?;
        let status = status(object, json_keys::STATUS)?;
        let headers = headers(object, json_keys::HEADERS)?;
        Ok(Self::new(label, entity_id, status, headers)
            .with_payload(object.get(json_keys::PAYLOAD).cloned()))
    }
}

/// Aggregate of every acknowledgement collected for one signal.
///
/// Members keep insertion order. Equality compares the members of each label
/// in order, with labels taken by first appearance, so the interleaving of
/// different labels does not count.
#[derive(Debug, Clone)]
pub struct Acknowledgements {
    entity_id: EntityId,
    members: Vec<Acknowledgement>,
    status: HttpStatus,
    headers: HeaderMap,
}

impl Acknowledgements {
    /// Aggregate `members`, which must be non-empty and share entity id and
    /// entity type.
    pub fn of(
        members: impl IntoIterator<Item = Acknowledgement>,
        headers: HeaderMap,
    ) -> Result<Self> {
        let members: Vec<Acknowledgement> = members.into_iter().collect();
        let Some(first) = members.first() else {
            return Err(ModelError::Construction(
                "acknowledgements must not be empty".to_owned(),
            ));
        };
        let entity_id = first.entity_id.clone();
        if let Some(other) = members.iter().find(|ack| ack.entity_id != entity_id) {
            return Err(ModelError::Construction(format!(
                "acknowledgement '{}' is for {} '{}', expected {} '{}'",
                other.label,
                other.entity_id.entity_type(),
                other.entity_id,
                entity_id.entity_type(),
                entity_id
            )));
        }
        let status = combined_status(&members);
        Ok(Self {
            entity_id,
            members,
            status,
            headers,
        })
    }

    /// Aggregate without members. Its status (500) is a sentinel; check
    /// [`Acknowledgements::is_empty`] before relying on it.
    pub fn empty(entity_id: EntityId, headers: HeaderMap) -> Self {
        Self {
            entity_id,
            members: Vec::new(),
            status: combined_status(&[]),
            headers,
        }
    }

    /// Shared entity id.
    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    /// Combined status.
    pub fn status(&self) -> HttpStatus {
        self.status
    }

    /// Headers of the aggregate.
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

    /// True without members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Members in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Acknowledgement> {
        self.members.iter()
    }

    /// Members that succeeded, in insertion order.
    pub fn successful(&self) -> Vec<&Acknowledgement> {
        self.members.iter().filter(|ack| ack.is_success()).collect()
    }

    /// Members that failed, in insertion order.
    pub fn failed(&self) -> Vec<&Acknowledgement> {
        self.members.iter().filter(|ack| !ack.is_success()).collect()
    }

    /// Labels whose acknowledgement never arrived (timed out).
    pub fn missing_labels(&self) -> Vec<&AcknowledgementLabel> {
        self.members
            .iter()
            .filter(|ack| ack.is_timeout())
            .map(Acknowledgement::label)
            .collect()
    }

    /// Entity of the aggregate as reported to the requester.
    ///
    /// No member yields `None` and a single member yields its payload as-is.
    /// Several members yield an object keyed by label where repeated labels
    /// collapse into an array.
    pub fn get_entity(&self, schema_version: u8) -> Option<JsonValue> {
        match self.members.as_slice() {
            [] => None,
            [single] => single.payload.clone(),
            members => Some(group_by_label(members, |ack| ack.entry_json(schema_version))),
        }
    }

    /// Full JSON of every member keyed by label; repeated labels collapse
    /// into an array.
    pub fn members_json(&self) -> JsonValue {
        group_by_label(&self.members, Acknowledgement::to_json)
    }

    /// Full JSON form.
    pub fn to_json(&self) -> JsonValue {
        let mut object = Map::new();
        object.insert(json_keys::ENTITY_ID.into(), self.entity_id.to_string().into());
        object.insert(
            json_keys::ENTITY_TYPE.into(),
            self.entity_id.entity_type().as_ref().into(),
        );
        object.insert(json_keys::STATUS_CODE.into(), self.status.code().into());
        object.insert(json_keys::ACKNOWLEDGEMENTS.into(), self.members_json());
        object.insert(json_keys::DITTO_HEADERS.into(), self.headers.to_json());
        JsonValue::Object(object)
    }

    /// Parse the full JSON form, re-validating entity type and combined status
    /// against the rebuilt aggregate.
    pub fn from_json(json: &JsonValue) -> Result<Self> {
        let object = json
            .as_object()
            .ok_or_else(|| parse_error("acknowledgements must be an object"))?;
        let entity_type = entity_type(object)?;
        let entity_id = EntityId::parse(entity_type, required_str(object, json_keys::ENTITY_ID)?)?;
        let declared = status(object, json_keys::STATUS_CODE)?;
        let headers = headers(object, json_keys::DITTO_HEADERS)?;
        let members = object
            .get(json_keys::ACKNOWLEDGEMENTS)
            .ok_or_else(|| parse_error("missing object field 'acknowledgements'"))?;
        Self::from_members_json(entity_id, declared, members, headers)
    }

    /// Rebuild an aggregate from the output of [`Self::members_json`] and
    /// check it against the declared entity and status.
    pub fn from_members_json(
        entity_id: EntityId,
        declared: HttpStatus,
        members_json: &JsonValue,
        headers: HeaderMap,
    ) -> Result<Self> {
        let grouped = members_json
            .as_object()
            .ok_or_else(|| parse_error("acknowledgements must be an object keyed by label"))?;
        let mut members = Vec::new();
        for entry in grouped.values() {
            match entry {
                JsonValue::Array(items) => {
                    for item in items {
                        members.push(Acknowledgement::from_json(item)?);
                    }
                }
                single => members.push(Acknowledgement::from_json(single)?),
            }
        }

        let aggregate = if members.is_empty() {
            Self::empty(entity_id.clone(), headers)
        } else {
            Self::of(members, headers)?
        };
        let entity_type = entity_id.entity_type();
        if aggregate.entity_id.entity_type() != entity_type {
            return Err(ModelError::AggregateParse(format!(
                "declared entity type '{entity_type}' does not match members of type '{}'",
                aggregate.entity_id.entity_type()
            )));
        }
        if aggregate.entity_id != entity_id {
            return Err(ModelError::AggregateParse(format!(
                "declared entity id '{entity_id}' does not match members for '{}'",
                aggregate.entity_id
            )));
        }
        if aggregate.status != declared {
            return Err(ModelError::AggregateParse(format!(
                "declared status {declared} does not match combined status {}",
                aggregate.status
            )));
        }
        Ok(aggregate)
    }
}

impl Acknowledgements {
    fn in_label_groups(&self) -> Vec<&Acknowledgement> {
        let mut labels: Vec<&AcknowledgementLabel> = Vec::new();
        for ack in &self.members {
            if !labels.contains(&&ack.label) {
                labels.push(&ack.label);
            }
        }
        labels
            .into_iter()
            .flat_map(|label| self.members.iter().filter(move |ack| ack.label == *label))
            .collect()
    }
}

impl PartialEq for Acknowledgements {
    fn eq(&self, other: &Self) -> bool {
        self.entity_id == other.entity_id
            && self.status == other.status
            && self.headers == other.headers
            && self.in_label_groups() == other.in_label_groups()
    }
}

impl<'a> IntoIterator for &'a Acknowledgements {
    type Item = &'a Acknowledgement;
    type IntoIter = std::slice::Iter<'a, Acknowledgement>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}

fn combined_status(members: &[Acknowledgement]) -> HttpStatus {
    match members {
        [] => HttpStatus::INTERNAL_SERVER_ERROR,
        [single] => single.status,
        all if all.iter().all(Acknowledgement::is_success) => HttpStatus::OK,
        _ => HttpStatus::FAILED_DEPENDENCY,
    }
}

fn group_by_label(
    members: &[Acknowledgement],
    render: impl Fn(&Acknowledgement) -> JsonValue,
) -> JsonValue {
    let mut grouped: Map<String, JsonValue> = Map::new();
    for ack in members {
        let rendered = render(ack);
        match grouped.get_mut(ack.label.as_str()) {
            None => {
                grouped.insert(ack.label.as_str().to_owned(), rendered);
            }
            Some(JsonValue::Array(items)) => items.push(rendered),
            Some(existing) => {
                let first = existing.take();
                *existing = JsonValue::Array(vec![first, rendered]);
            }
        }
    }
    JsonValue::Object(grouped)
}

fn parse_error(reason: &str) -> ModelError {
    ModelError::AggregateParse(reason.to_owned())
}

fn required_str<'a>(object: &'a Map<String, JsonValue>, key: &str) -> Result<&'a str> {
    object
        .get(key)
        .and_then(JsonValue::as_str)
        .ok_or_else(|| parse_error(&format!("missing string field '{key}'")))
}

fn entity_type(object: &Map<String, JsonValue>) -> Result<EntityType> {
    let raw = required_str(object, json_keys::ENTITY_TYPE)?;
    EntityType::from_str(raw).map_err(|_| parse_error(&format!("unknown entity type '{raw}'")))
}

fn status(object: &Map<String, JsonValue>, key: &str) -> Result<HttpStatus> {
    object
        .get(key)
        .and_then(JsonValue::as_u64)
        .and_then(|code| u16::try_from(code).ok())
        .and_then(HttpStatus::new)
        .ok_or_else(|| parse_error(&format!("field '{key}' must be an HTTP status code")))
}

fn headers(object: &Map<String, JsonValue>, key: &str) -> Result<HeaderMap> {
    match object.get(key) {
        None | Some(JsonValue::Null) => Ok(HeaderMap::new()),
        Some(value) => HeaderMap::from_json(value)
            .ok_or_else(|| parse_error(&format!("field '{key}' must be an object"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn thing() -> EntityId {
        EntityId::thing("org.acme", "lamp").unwrap()
    }

    fn ack(label: &str, status: u16) -> Acknowledgement {
        Acknowledgement::new(
            AcknowledgementLabel::parse(label).unwrap(),
            thing(),
            HttpStatus::new(status).unwrap(),
            HeaderMap::new().with(keys::CORRELATION_ID, "c-1"),
        )
    }

    #[test]
    fn combined_status_rules() {
        let ok = Acknowledgements::of([ack("ack1", 200), ack("ack2", 200)], HeaderMap::new()).unwrap();
        assert_eq!(ok.status(), HttpStatus::OK);

        let failed =
            Acknowledgements::of([ack("ack1", 200), ack("ack2", 400)], HeaderMap::new()).unwrap();
        assert_eq!(failed.status(), HttpStatus::FAILED_DEPENDENCY);

        let single = Acknowledgements::of([ack("ack1", 404)], HeaderMap::new()).unwrap();
        assert_eq!(single.status(), HttpStatus::NOT_FOUND);

        let empty = Acknowledgements::empty(thing(), HeaderMap::new());
        assert!(empty.is_empty());
        assert_eq!(empty.status(), HttpStatus::INTERNAL_SERVER_ERROR);
        assert_eq!(empty.get_entity(2), None);
    }

    #[test]
    fn rejects_empty_and_mixed_members() {
        assert!(matches!(
            Acknowledgements::of(Vec::new(), HeaderMap::new()),
            Err(ModelError::Construction(_))
        ));
        let other = Acknowledgement::new(
            AcknowledgementLabel::parse("ack2").unwrap(),
            EntityId::thing("org.acme", "other").unwrap(),
            HttpStatus::OK,
            HeaderMap::new(),
        );
        assert!(matches!(
            Acknowledgements::of([ack("ack1", 200), other], HeaderMap::new()),
            Err(ModelError::Construction(_))
        ));
        let policy = ack("ack2", 200);
        let policy = Acknowledgement::new(
            policy.label().clone(),
            thing().with_type(EntityType::Policy),
            HttpStatus::OK,
            HeaderMap::new(),
        );
        assert!(Acknowledgements::of([ack("ack1", 200), policy], HeaderMap::new()).is_err());
    }

    #[test]
    fn live_response_success_ignores_status() {
        let live = ack(AcknowledgementLabel::LIVE_RESPONSE, 404);
        assert!(live.is_success());
        let timed_out = ack(AcknowledgementLabel::LIVE_RESPONSE, 408);
        assert!(!timed_out.is_success());
        assert!(timed_out.is_timeout());
        assert!(!ack("custom", 404).is_success());
    }

    #[test]
    fn weak_acknowledgements() {
        let weak = Acknowledgement::weak(
            AcknowledgementLabel::parse("custom").unwrap(),
            thing(),
            HeaderMap::new(),
        );
        assert!(weak.is_weak());
        assert!(weak.is_success());
        assert!(!ack("custom", 200).is_weak());
    }

    #[test]
    fn views_preserve_order() {
        let acks = Acknowledgements::of(
            [ack("a", 200), ack("b", 408), ack("c", 201), ack("d", 500)],
            HeaderMap::new(),
        )
        .unwrap();
        let labels = |items: Vec<&Acknowledgement>| {
            items
                .into_iter()
                .map(|ack| ack.label().to_string())
                .collect::<Vec<_>>()
        };
        assert_eq!(labels(acks.successful()), ["a", "c"]);
        assert_eq!(labels(acks.failed()), ["b", "d"]);
        assert_eq!(
            acks.missing_labels()
                .iter()
                .map(|label| label.as_str())
                .collect::<Vec<_>>(),
            ["b"]
        );
    }

    #[test]
    fn repeated_labels_collapse_into_arrays() {
        let first = ack("custom-ack", 200).with_payload(Some(json!({"n": 1})));
        let second = ack("custom-ack", 400);
        let both = Acknowledgements::of([first.clone(), second.clone()], HeaderMap::new()).unwrap();
        assert_eq!(
            both.to_json()["acknowledgements"],
            json!({"custom-ack": [first.to_json(), second.to_json()]})
        );

        let single = Acknowledgements::of([first.clone()], HeaderMap::new()).unwrap();
        assert_eq!(
            single.to_json()["acknowledgements"],
            json!({"custom-ack": first.to_json()})
        );
    }

    #[test]
    fn entity_of_single_member_is_its_payload() {
        let single = Acknowledgements::of(
            [ack("custom", 200).with_payload(Some(json!({"done": true})))],
            HeaderMap::new(),
        )
        .unwrap();
        assert_eq!(single.get_entity(2), Some(json!({"done": true})));
    }

    #[test]
    fn entity_of_many_members_strips_protocol_content_type() {
        let headers = HeaderMap::new().with(keys::CONTENT_TYPE, ContentType::PROTOCOL_JSON);
        let a = ack("a", 200).with_headers(headers.clone());
        let b = ack("b", 204)
            .with_headers(headers.with(keys::CONTENT_TYPE, "text/plain"))
            .with_payload(Some(json!("hi")));
        let acks = Acknowledgements::of([a, b], HeaderMap::new()).unwrap();
        assert_eq!(
            acks.get_entity(2),
            Some(json!({
                "a": {"status": 200, "headers": {}},
                "b": {"status": 204, "payload": "hi", "headers": {"content-type": "text/plain"}}
            }))
        );
    }

    #[test]
    fn json_roundtrip_and_revalidation() {
        let acks = Acknowledgements::of(
            [ack("ack1", 200), ack("ack1", 200), ack("ack2", 400)],
            HeaderMap::new().with(keys::CORRELATION_ID, "c-1"),
        )
        .unwrap();
        let json = acks.to_json();
        assert_eq!(Acknowledgements::from_json(&json).unwrap(), acks);

        let mut wrong_status = json.clone();
        wrong_status["statusCode"] = json!(200);
        assert!(matches!(
            Acknowledgements::from_json(&wrong_status),
            Err(ModelError::AggregateParse(_))
        ));

        let mut wrong_type = json;
        wrong_type["entityType"] = json!("policy");
        assert!(Acknowledgements::from_json(&wrong_type).is_err());
    }

    #[test]
    fn interleaved_labels_survive_the_grouped_form() {
        let interleaved = Acknowledgements::of(
            [ack("a", 200), ack("b", 201), ack("a", 204)],
            HeaderMap::new(),
        )
        .unwrap();
        let labels: Vec<&str> = interleaved.iter().map(|ack| ack.label().as_str()).collect();
        assert_eq!(labels, ["a", "b", "a"]);

        let back = Acknowledgements::from_json(&interleaved.to_json()).unwrap();
        assert_eq!(back, interleaved);

        let reordered = Acknowledgements::of(
            [ack("a", 204), ack("b", 201), ack("a", 200)],
            HeaderMap::new(),
        )
        .unwrap();
        assert_ne!(reordered, interleaved);
    }

    #[test]
    fn labels_are_validated() {
        assert!(AcknowledgementLabel::parse("twin-persisted").is_ok());
        assert!(AcknowledgementLabel::parse("").is_err());
        assert!(AcknowledgementLabel::parse("has space").is_err());
    }
}
