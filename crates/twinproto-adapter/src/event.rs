//! ---
//! tp_section: "04-protocol-adapters"
//! tp_subsection: "module"
//! tp_type: "source"
//! tp_scope: "code"
//! tp_description: "Signal adapters and the dispatching registry."
//! tp_version: "v0.0.0-prealpha"
//! tp_owner: "tbd"
//! ---
use twinproto_model::signal::{ThingEvent, ThingEventKind};
use twinproto_model::{
    Action, Adaptable, Channel, Criterion, EntityType, JsonPointer, Payload, ThingResource,
};

use crate::aspect;
use crate::context::{
    entity_topic, require_root, require_value, resource_of, thing_id, unknown_path,
    AdapterContext,
};
use crate::error::{AdapterError, Result};
use crate::merge;
use crate::Adapter;

/// Maps [`ThingEvent`].
#[derive(Debug, Clone, Default)]
pub struct EventAdapter {
    ctx: AdapterContext,
}

impl EventAdapter {
    /// Adapter using `ctx`.
    pub fn new(ctx: AdapterContext) -> Self {
        Self { ctx }
    }
}

/// Topic action of an event kind.
pub fn event_action(kind: &ThingEventKind) -> Action {
    match kind {
        ThingEventKind::Created { .. } => Action::Created,
        ThingEventKind::Modified { .. } => Action::Modified,
        ThingEventKind::Deleted { .. } => Action::Deleted,
        ThingEventKind::Merged(_) => Action::Merged,
        ThingEventKind::DefinitionMigrated { .. } => Action::Migrated,
    }
}

impl Adapter<ThingEvent> for EventAdapter {
    fn to_adaptable(&self, event: &ThingEvent, channel: Channel) -> Result<Adaptable> {
        let action = event_action(&event.kind);
        let path = event.kind.path();
        let resource = ThingResource::from_path(&path)
            .filter(|resource| aspect::rule(resource.aspect()).supports_event(action));
        let resource = match resource {
            Some(resource) if event.thing_id.entity_type() == EntityType::Thing => resource,
            _ => {
                return Err(AdapterError::UnknownEvent(format!(
                    "{} at {path}",
                    event.kind.name()
                )))
            }
        };

        let mut headers = event.headers.clone();
        let value = match &event.kind {
            ThingEventKind::Created { value, .. } | ThingEventKind::Modified { value, .. } => {
                aspect::rule(resource.aspect()).check_value(&path, value)?;
                Some(value.clone())
            }
            ThingEventKind::Deleted { .. } => None,
            ThingEventKind::Merged(patch) => {
                merge::check_patch(&event.thing_id, &resource, patch)?;
                headers = merge::merge_headers(&headers);
                Some(patch.value().clone())
            }
            ThingEventKind::DefinitionMigrated { thing } => {
                aspect::rule(resource.aspect()).check_value(&path, thing)?;
                Some(thing.clone())
            }
        };
        let payload = Payload::new(path)
            .with_optional_value(value)
            .with_revision(event.revision)
            .with_timestamp(event.timestamp)
            .with_metadata(event.metadata.clone());
        let topic = entity_topic(&event.thing_id, channel).events().action(action)?;
        Ok(Adaptable::new(
            topic,
            payload,
            self.ctx.outbound_headers(&headers, channel),
        ))
    }

    fn from_adaptable(&self, adaptable: &Adaptable) -> Result<ThingEvent> {
        let topic = adaptable.topic();
        let action = match (topic.criterion(), topic.action()) {
            (Criterion::Events, Some(action)) => action,
            _ => return Err(unknown_path(adaptable)),
        };
        let thing_id = thing_id(topic)?;
        let revision = adaptable
            .payload()
            .revision()
            .ok_or(AdapterError::MissingField("revision"))?;
        let mut headers = self.ctx.inbound_headers(adaptable);

        let kind = match action {
            Action::Created | Action::Modified => {
                let resource = supported(adaptable, action)?;
                let value = require_value(adaptable)?;
                aspect::rule(resource.aspect()).check_value(adaptable.payload().path(), value)?;
                let value = value.clone();
                if action == Action::Created {
                    ThingEventKind::Created { resource, value }
                } else {
                    ThingEventKind::Modified { resource, value }
                }
            }
            Action::Deleted => ThingEventKind::Deleted {
                resource: supported(adaptable, action)?,
            },
            Action::Merged => {
                headers = merge::merge_headers(&headers);
                ThingEventKind::Merged(merge::parse_patch(&thing_id, adaptable)?)
            }
            Action::Migrated => {
                require_root(adaptable)?;
                let thing = require_value(adaptable)?;
                aspect::rule(twinproto_model::Aspect::Thing)
                    .check_value(&JsonPointer::root(), thing)?;
                ThingEventKind::DefinitionMigrated {
                    thing: thing.clone(),
                }
            }
            _ => return Err(unknown_path(adaptable)),
        };

        let mut event = ThingEvent::new(thing_id, kind, revision, headers);
        event.timestamp = adaptable.payload().timestamp();
        event.metadata = adaptable.payload().metadata().cloned();
        Ok(event)
    }
}

fn supported(adaptable: &Adaptable, action: Action) -> Result<ThingResource> {
    let resource = resource_of(adaptable)?;
    if aspect::rule(resource.aspect()).supports_event(action) {
        Ok(resource)
    } else {
        Err(unknown_path(adaptable))
    }
}
