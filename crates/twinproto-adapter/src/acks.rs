//! ---
//! tp_section: "04-protocol-adapters"
//! tp_subsection: "module"
//! tp_type: "source"
//! tp_scope: "code"
//! tp_description: "Signal adapters and the dispatching registry."
//! tp_version: "v0.0.0-prealpha"
//! tp_owner: "tbd"
//! ---
//! Single acknowledgements on `.../acks/<label>` and aggregates on `.../acks`.
use twinproto_model::{
    Acknowledgement, AcknowledgementLabel, Acknowledgements, Adaptable, Channel, Criterion,
    EntityId, HttpStatus, JsonPointer, ModelError, Payload,
};

use crate::context::{entity_topic, require_value, unknown_path, AdapterContext};
use crate::error::{AdapterError, Result};
use crate::Adapter;

/// Maps [`Acknowledgement`] and [`Acknowledgements`].
#[derive(Debug, Clone, Default)]
pub struct AcknowledgementAdapter {
    ctx: AdapterContext,
}

impl AcknowledgementAdapter {
    /// Adapter using `ctx`.
    pub fn new(ctx: AdapterContext) -> Self {
        Self { ctx }
    }
}

fn acked_entity(adaptable: &Adaptable) -> Result<EntityId> {
    let topic = adaptable.topic();
    if topic.criterion() != Criterion::Acks {
        return Err(unknown_path(adaptable));
    }
    topic.entity_id().ok_or_else(|| {
        AdapterError::Model(ModelError::InvalidEntityId {
            id: format!("{}:{}", topic.namespace(), topic.entity_name()),
            reason: "acknowledgements address a single entity".to_owned(),
        })
    })
}

fn ack_status(adaptable: &Adaptable) -> Result<HttpStatus> {
    adaptable
        .payload()
        .status()
        .ok_or(AdapterError::MissingField("status"))
}

impl Adapter<Acknowledgement> for AcknowledgementAdapter {
    fn to_adaptable(&self, ack: &Acknowledgement, channel: Channel) -> Result<Adaptable> {
        let topic = entity_topic(ack.entity_id(), channel).acks(Some(ack.label().as_str()))?;
        let payload = Payload::new(JsonPointer::root())
            .with_optional_value(ack.payload().cloned())
            .with_status(ack.status());
        Ok(Adaptable::new(
            topic,
            payload,
            self.ctx.outbound_headers(ack.headers(), channel),
        ))
    }

    fn from_adaptable(&self, adaptable: &Adaptable) -> Result<Acknowledgement> {
        let entity_id = acked_entity(adaptable)?;
        let label = adaptable
            .topic()
            .subject()
            .ok_or_else(|| unknown_path(adaptable))?;
        let label = AcknowledgementLabel::parse(label)?;
        Ok(Acknowledgement::new(
            label,
            entity_id,
            ack_status(adaptable)?,
            self.ctx.inbound_headers(adaptable),
        )
        .with_payload(adaptable.payload().value().cloned()))
    }
}

impl Adapter<Acknowledgements> for AcknowledgementAdapter {
    fn to_adaptable(&self, acks: &Acknowledgements, channel: Channel) -> Result<Adaptable> {
        let topic = entity_topic(acks.entity_id(), channel).acks(None)?;
        let payload = Payload::new(JsonPointer::root())
            .with_value(acks.members_json())
            .with_status(acks.status());
        Ok(Adaptable::new(
            topic,
            payload,
            self.ctx.outbound_headers(acks.headers(), channel),
        ))
    }

    fn from_adaptable(&self, adaptable: &Adaptable) -> Result<Acknowledgements> {
        let entity_id = acked_entity(adaptable)?;
        if adaptable.topic().subject().is_some() {
            return Err(unknown_path(adaptable));
        }
        Ok(Acknowledgements::from_members_json(
            entity_id,
            ack_status(adaptable)?,
            require_value(adaptable)?,
            self.ctx.inbound_headers(adaptable),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use twinproto_model::headers::keys;
    use twinproto_model::{HeaderMap, ThingId};

    fn lamp() -> ThingId {
        ThingId::thing("org.acme", "lamp").unwrap()
    }

    fn ack(label: &str, status: HttpStatus) -> Acknowledgement {
        Acknowledgement::new(
            AcknowledgementLabel::parse(label).unwrap(),
            lamp(),
            status,
            HeaderMap::new().with(keys::CORRELATION_ID, "c-1"),
        )
    }

    #[test]
    fn single_ack_roundtrip() {
        let single = ack("custom-ack", HttpStatus::OK).with_payload(Some(json!({"done": true})));
        let adapter = AcknowledgementAdapter::default();
        let adaptable = adapter.to_adaptable(&single, Channel::Twin).unwrap();
        assert_eq!(
            adaptable.topic().to_string(),
            "org.acme/lamp/things/twin/acks/custom-ack"
        );
        assert_eq!(adaptable.payload().status(), Some(HttpStatus::OK));
        let back: Acknowledgement = adapter.from_adaptable(&adaptable).unwrap();
        assert_eq!(back, single);
    }

    #[test]
    fn aggregate_roundtrip_keeps_repeated_labels() {
        let acks = Acknowledgements::of(
            vec![
                ack("custom-ack", HttpStatus::OK),
                ack("custom-ack", HttpStatus::BAD_REQUEST),
                ack(AcknowledgementLabel::TWIN_PERSISTED, HttpStatus::NO_CONTENT),
            ],
            HeaderMap::new().with(keys::CORRELATION_ID, "c-1"),
        )
        .unwrap();
        let adapter = AcknowledgementAdapter::default();
        let adaptable = adapter.to_adaptable(&acks, Channel::Twin).unwrap();
        assert_eq!(adaptable.topic().to_string(), "org.acme/lamp/things/twin/acks");
        assert_eq!(adaptable.payload().status(), Some(HttpStatus::FAILED_DEPENDENCY));
        assert!(adaptable.payload().value().unwrap()["custom-ack"].is_array());

        let back: Acknowledgements = adapter.from_adaptable(&adaptable).unwrap();
        assert_eq!(back, acks);
    }

    #[test]
    fn aggregate_status_is_revalidated() {
        let acks = Acknowledgements::of(
            vec![ack("a", HttpStatus::OK), ack("b", HttpStatus::OK)],
            HeaderMap::new(),
        )
        .unwrap();
        let adapter = AcknowledgementAdapter::default();
        let adaptable = adapter.to_adaptable(&acks, Channel::Twin).unwrap();
        let tampered = Adaptable::new(
            adaptable.topic().clone(),
            Payload::new(JsonPointer::root())
                .with_value(adaptable.payload().value().cloned().unwrap())
                .with_status(HttpStatus::FAILED_DEPENDENCY),
            adaptable.headers().clone(),
        );
        let result: Result<Acknowledgements> = adapter.from_adaptable(&tampered);
        assert!(matches!(
            result,
            Err(AdapterError::Model(ModelError::AggregateParse(_)))
        ));
    }
}
