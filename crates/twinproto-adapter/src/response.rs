//! ---
//! tp_section: "04-protocol-adapters"
//! tp_subsection: "module"
//! tp_type: "source"
//! tp_scope: "code"
//! tp_description: "Signal adapters and the dispatching registry."
//! tp_version: "v0.0.0-prealpha"
//! tp_owner: "tbd"
//! ---
//! Successful command responses. Failed commands are answered through the
//! `errors` criterion instead.
use std::str::FromStr;

use serde_json::{Map, Value as JsonValue};
use twinproto_model::signal::{
    MergeStatus, RetrieveThingsResponse, ThingCommandResponse, ThingResponseKind,
};
use twinproto_model::{
    Action, Adaptable, Channel, Criterion, EntityType, HttpStatus, Payload, ThingResource,
};

use crate::aspect;
use crate::command::multi_thing_topic;
use crate::context::{
    entity_topic, require_root, require_value, resource_of, str_field, thing_id, unknown_path,
    AdapterContext,
};
use crate::error::{AdapterError, Result};
use crate::Adapter;

const THING_ID: &str = "thingId";
const PATCH: &str = "patch";
const MERGE_STATUS: &str = "mergeStatus";

/// Maps [`ThingCommandResponse`] and [`RetrieveThingsResponse`].
#[derive(Debug, Clone, Default)]
pub struct ResponseAdapter {
    ctx: AdapterContext,
}

impl ResponseAdapter {
    /// Adapter using `ctx`.
    pub fn new(ctx: AdapterContext) -> Self {
        Self { ctx }
    }
}

/// Topic action answered by a response kind.
pub fn response_action(kind: &ThingResponseKind) -> Action {
    match kind {
        ThingResponseKind::Created { .. } => Action::Create,
        ThingResponseKind::Modified { .. } => Action::Modify,
        ThingResponseKind::Deleted { .. } => Action::Delete,
        ThingResponseKind::Retrieved { .. } => Action::Retrieve,
        ThingResponseKind::Merged { .. } => Action::Merge,
        ThingResponseKind::Migrated { .. } => Action::Migrate,
    }
}

fn response_status(adaptable: &Adaptable) -> Result<HttpStatus> {
    let status = adaptable
        .payload()
        .status()
        .ok_or(AdapterError::MissingField("status"))?;
    if status.is_success() {
        Ok(status)
    } else {
        Err(AdapterError::invalid_payload(
            adaptable.payload().path(),
            format!("status {status} belongs on the errors criterion"),
        ))
    }
}

impl Adapter<ThingCommandResponse> for ResponseAdapter {
    fn to_adaptable(&self, response: &ThingCommandResponse, channel: Channel) -> Result<Adaptable> {
        let action = response_action(&response.kind);
        let path = response.kind.path();
        let resource = ThingResource::from_path(&path);
        let supported = resource
            .as_ref()
            .is_some_and(|resource| aspect::rule(resource.aspect()).supports_command(action));
        if response.thing_id.entity_type() != EntityType::Thing || !supported {
            return Err(AdapterError::UnknownCommandResponse(format!(
                "{} at {path}",
                response.kind.name()
            )));
        }

        let value = match &response.kind {
            ThingResponseKind::Created { thing } => Some(thing.clone()),
            ThingResponseKind::Modified { value, .. } => value.clone(),
            ThingResponseKind::Retrieved { value, .. } => Some(value.clone()),
            ThingResponseKind::Deleted { .. } | ThingResponseKind::Merged { .. } => None,
            ThingResponseKind::Migrated {
                patch,
                merge_status,
            } => {
                let mut object = Map::new();
                object.insert(THING_ID.into(), response.thing_id.to_string().into());
                object.insert(PATCH.into(), patch.clone());
                object.insert(MERGE_STATUS.into(), merge_status.as_ref().into());
                Some(JsonValue::Object(object))
            }
        };
        let payload = Payload::new(path)
            .with_optional_value(value)
            .with_status(response.status());
        let topic = entity_topic(&response.thing_id, channel)
            .commands()
            .action(action)?;
        Ok(Adaptable::new(
            topic,
            payload,
            self.ctx.outbound_headers(&response.headers, channel),
        ))
    }

    fn from_adaptable(&self, adaptable: &Adaptable) -> Result<ThingCommandResponse> {
        let topic = adaptable.topic();
        let action = match (topic.criterion(), topic.action()) {
            (Criterion::Commands, Some(action)) => action,
            _ => return Err(unknown_path(adaptable)),
        };
        let thing_id = thing_id(topic)?;
        let status = response_status(adaptable)?;

        let kind = match action {
            Action::Create => {
                require_root(adaptable)?;
                ThingResponseKind::Created {
                    thing: require_value(adaptable)?.clone(),
                }
            }
            Action::Modify => {
                let resource = supported(adaptable, action)?;
                let value = match status {
                    HttpStatus::CREATED => Some(require_value(adaptable)?.clone()),
                    HttpStatus::NO_CONTENT => None,
                    other => {
                        return Err(AdapterError::invalid_payload(
                            adaptable.payload().path(),
                            format!("unexpected status {other} for a modify response"),
                        ))
                    }
                };
                ThingResponseKind::Modified { resource, value }
            }
            Action::Delete => ThingResponseKind::Deleted {
                resource: supported(adaptable, action)?,
            },
            Action::Retrieve => ThingResponseKind::Retrieved {
                resource: supported(adaptable, action)?,
                value: require_value(adaptable)?.clone(),
            },
            Action::Merge => {
                resource_of(adaptable)?;
                ThingResponseKind::Merged {
                    path: adaptable.payload().path().clone(),
                }
            }
            Action::Migrate => {
                require_root(adaptable)?;
                let value = require_value(adaptable)?;
                let reported = str_field(value, THING_ID)?;
                if reported != thing_id.to_string() {
                    return Err(AdapterError::invalid_payload(
                        adaptable.payload().path(),
                        format!("migration reported for '{reported}' on topic of '{thing_id}'"),
                    ));
                }
                let patch = value
                    .get(PATCH)
                    .cloned()
                    .ok_or(AdapterError::MissingField(PATCH))?;
                let merge_status = MergeStatus::from_str(str_field(value, MERGE_STATUS)?)
                    .map_err(|_| {
                        AdapterError::invalid_payload(
                            adaptable.payload().path(),
                            "merge status must be APPLIED or DRY_RUN",
                        )
                    })?;
                ThingResponseKind::Migrated {
                    patch,
                    merge_status,
                }
            }
            _ => return Err(unknown_path(adaptable)),
        };
        Ok(ThingCommandResponse::new(
            thing_id,
            kind,
            self.ctx.inbound_headers(adaptable),
        ))
    }
}

impl Adapter<RetrieveThingsResponse> for ResponseAdapter {
    fn to_adaptable(
        &self,
        response: &RetrieveThingsResponse,
        channel: Channel,
    ) -> Result<Adaptable> {
        let topic = multi_thing_topic(response.namespace.as_deref(), channel)
            .commands()
            .action(Action::Retrieve)?;
        let payload = Payload::new(twinproto_model::JsonPointer::root())
            .with_value(JsonValue::Array(response.things.clone()))
            .with_status(response.status());
        Ok(Adaptable::new(
            topic,
            payload,
            self.ctx.outbound_headers(&response.headers, channel),
        ))
    }

    fn from_adaptable(&self, adaptable: &Adaptable) -> Result<RetrieveThingsResponse> {
        let topic = adaptable.topic();
        if topic.criterion() != Criterion::Commands || topic.action() != Some(Action::Retrieve) {
            return Err(unknown_path(adaptable));
        }
        response_status(adaptable)?;
        require_root(adaptable)?;
        let things = match require_value(adaptable)? {
            JsonValue::Array(things) => things.clone(),
            _ => {
                return Err(AdapterError::invalid_payload(
                    adaptable.payload().path(),
                    "retrieved things must be an array",
                ))
            }
        };
        let namespace = (!topic.is_wildcard_namespace()).then(|| topic.namespace().to_owned());
        Ok(RetrieveThingsResponse::new(
            things,
            namespace,
            self.ctx.inbound_headers(adaptable),
        ))
    }
}

fn supported(adaptable: &Adaptable, action: Action) -> Result<ThingResource> {
    let resource = resource_of(adaptable)?;
    if aspect::rule(resource.aspect()).supports_command(action) {
        Ok(resource)
    } else {
        Err(unknown_path(adaptable))
    }
}
