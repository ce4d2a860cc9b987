//! ---
//! tp_section: "04-protocol-adapters"
//! tp_subsection: "module"
//! tp_type: "source"
//! tp_scope: "code"
//! tp_description: "Signal adapters and the dispatching registry."
//! tp_version: "v0.0.0-prealpha"
//! tp_owner: "tbd"
//! ---
//! Thing commands and the multi-thing retrieve.
use serde_json::{Map, Value as JsonValue};
use twinproto_model::resource::fields;
use twinproto_model::signal::{
    CreateThing, MigrateThingDefinition, RetrieveThings, ThingCommand, ThingCommandKind,
};
use twinproto_model::topic::WILDCARD_NAMESPACE;
use twinproto_model::{
    Action, Adaptable, Channel, Criterion, EntityId, EntityType, JsonPointer, Payload, ThingId,
    ThingResource, TopicDescriptor,
};

use crate::aspect;
use crate::context::{
    entity_topic, require_root, require_value, resource_of, str_field, thing_id, unknown_path,
    AdapterContext,
};
use crate::error::{AdapterError, Result};
use crate::merge;
use crate::Adapter;

pub(crate) const THING_IDS: &str = "thingIds";
const THING_DEFINITION_URL: &str = "thingDefinitionUrl";
const MIGRATION_PAYLOAD: &str = "migrationPayload";
const PATCH_CONDITIONS: &str = "patchConditions";
const INITIALIZE_FROM_DEFAULTS: &str = "initializeMissingPropertiesFromDefaults";

/// Maps [`ThingCommand`] and [`RetrieveThings`].
#[derive(Debug, Clone, Default)]
pub struct CommandAdapter {
    ctx: AdapterContext,
}

impl CommandAdapter {
    /// Adapter using `ctx`.
    pub fn new(ctx: AdapterContext) -> Self {
        Self { ctx }
    }
}

/// Topic action of a command kind.
pub fn command_action(kind: &ThingCommandKind) -> Action {
    match kind {
        ThingCommandKind::Create(_) => Action::Create,
        ThingCommandKind::Modify { .. } => Action::Modify,
        ThingCommandKind::Delete { .. } => Action::Delete,
        ThingCommandKind::Retrieve { .. } => Action::Retrieve,
        ThingCommandKind::Merge(_) => Action::Merge,
        ThingCommandKind::Migrate(_) => Action::Migrate,
    }
}

fn addressed_resource(kind: &ThingCommandKind) -> Option<ThingResource> {
    match kind {
        ThingCommandKind::Modify { resource, .. }
        | ThingCommandKind::Delete { resource }
        | ThingCommandKind::Retrieve { resource, .. } => Some(resource.clone()),
        ThingCommandKind::Merge(patch) => ThingResource::from_path(patch.path()),
        ThingCommandKind::Create(_) | ThingCommandKind::Migrate(_) => Some(ThingResource::Thing),
    }
}

impl Adapter<ThingCommand> for CommandAdapter {
    fn to_adaptable(&self, command: &ThingCommand, channel: Channel) -> Result<Adaptable> {
        let action = command_action(&command.kind);
        let resource = addressed_resource(&command.kind)
            .filter(|resource| aspect::rule(resource.aspect()).supports_command(action));
        let resource = match resource {
            Some(resource) if command.thing_id.entity_type() == EntityType::Thing => resource,
            _ => {
                return Err(AdapterError::UnknownCommand(format!(
                    "{} at {}",
                    command.kind.name(),
                    command.kind.path()
                )))
            }
        };

        let mut headers = command.headers.clone();
        let payload = match &command.kind {
            ThingCommandKind::Create(create) => Payload::new(JsonPointer::root())
                .with_value(create_value(&command.thing_id, create)?),
            ThingCommandKind::Modify { resource, value } => {
                let path = resource.path();
                aspect::rule(resource.aspect()).check_value(&path, value)?;
                Payload::new(path).with_value(value.clone())
            }
            ThingCommandKind::Delete { resource } => Payload::new(resource.path()),
            ThingCommandKind::Retrieve { resource, fields } => {
                Payload::new(resource.path()).with_fields(fields.clone())
            }
            ThingCommandKind::Merge(patch) => {
                merge::check_patch(&command.thing_id, &resource, patch)?;
                headers = merge::merge_headers(&headers);
                Payload::new(patch.path().clone()).with_value(patch.value().clone())
            }
            ThingCommandKind::Migrate(migration) => {
                Payload::new(JsonPointer::root()).with_value(migration_value(migration))
            }
        };
        let topic = entity_topic(&command.thing_id, channel)
            .commands()
            .action(action)?;
        Ok(Adaptable::new(
            topic,
            payload,
            self.ctx.outbound_headers(&headers, channel),
        ))
    }

    fn from_adaptable(&self, adaptable: &Adaptable) -> Result<ThingCommand> {
        let topic = adaptable.topic();
        let action = match (topic.criterion(), topic.action()) {
            (Criterion::Commands, Some(action)) => action,
            _ => return Err(unknown_path(adaptable)),
        };
        let thing_id = thing_id(topic)?;
        let mut headers = self.ctx.inbound_headers(adaptable);

        let kind = match action {
            Action::Create => ThingCommandKind::Create(parse_create(&thing_id, adaptable)?),
            Action::Modify => {
                let resource = supported(adaptable, action)?;
                let value = require_value(adaptable)?;
                aspect::rule(resource.aspect()).check_value(adaptable.payload().path(), value)?;
                ThingCommandKind::Modify {
                    resource,
                    value: value.clone(),
                }
            }
            Action::Delete => ThingCommandKind::Delete {
                resource: supported(adaptable, action)?,
            },
            Action::Retrieve => ThingCommandKind::Retrieve {
                resource: supported(adaptable, action)?,
                fields: adaptable.payload().fields().cloned(),
            },
            Action::Merge => {
                headers = merge::merge_headers(&headers);
                ThingCommandKind::Merge(merge::parse_patch(&thing_id, adaptable)?)
            }
            Action::Migrate => ThingCommandKind::Migrate(parse_migration(adaptable)?),
            _ => return Err(unknown_path(adaptable)),
        };
        Ok(ThingCommand::new(thing_id, kind, headers))
    }
}

impl Adapter<RetrieveThings> for CommandAdapter {
    fn to_adaptable(&self, retrieve: &RetrieveThings, channel: Channel) -> Result<Adaptable> {
        let topic = multi_thing_topic(retrieve.namespace.as_deref(), channel)
            .commands()
            .action(Action::Retrieve)?;
        let ids = retrieve
            .thing_ids
            .iter()
            .map(|id| JsonValue::String(id.to_string()))
            .collect();
        let mut value = Map::new();
        value.insert(THING_IDS.into(), JsonValue::Array(ids));
        let payload = Payload::new(JsonPointer::root())
            .with_value(JsonValue::Object(value))
            .with_fields(retrieve.fields.clone());
        Ok(Adaptable::new(
            topic,
            payload,
            self.ctx.outbound_headers(&retrieve.headers, channel),
        ))
    }

    fn from_adaptable(&self, adaptable: &Adaptable) -> Result<RetrieveThings> {
        let topic = adaptable.topic();
        if topic.criterion() != Criterion::Commands || topic.action() != Some(Action::Retrieve) {
            return Err(unknown_path(adaptable));
        }
        require_root(adaptable)?;
        let value = require_value(adaptable)?;
        let thing_ids = value
            .get(THING_IDS)
            .and_then(JsonValue::as_array)
            .ok_or(AdapterError::MissingField(THING_IDS))?
            .iter()
            .map(|id| {
                id.as_str()
                    .ok_or_else(|| {
                        AdapterError::invalid_payload(
                            adaptable.payload().path(),
                            "thing ids must be strings",
                        )
                    })
                    .and_then(|raw| EntityId::parse_thing(raw).map_err(AdapterError::from))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut retrieve = RetrieveThings::new(thing_ids, self.ctx.inbound_headers(adaptable));
        if !topic.is_wildcard_namespace() {
            retrieve = retrieve.with_namespace(topic.namespace());
        }
        if let Some(fields) = adaptable.payload().fields() {
            retrieve = retrieve.with_fields(fields.clone());
        }
        Ok(retrieve)
    }
}

/// Topic builder for a multi-thing request scoped to `namespace`.
pub(crate) fn multi_thing_topic(
    namespace: Option<&str>,
    channel: Channel,
) -> twinproto_model::topic::CriterionStep {
    TopicDescriptor::builder(namespace.unwrap_or(WILDCARD_NAMESPACE))
        .things()
        .channel(channel)
}

fn supported(adaptable: &Adaptable, action: Action) -> Result<ThingResource> {
    let resource = resource_of(adaptable)?;
    if aspect::rule(resource.aspect()).supports_command(action) {
        Ok(resource)
    } else {
        Err(unknown_path(adaptable))
    }
}

fn create_value(thing_id: &ThingId, create: &CreateThing) -> Result<JsonValue> {
    let JsonValue::Object(thing) = &create.thing else {
        return Err(AdapterError::invalid_payload(
            JsonPointer::root(),
            "a thing must be a JSON object",
        ));
    };
    check_thing_id(thing_id, thing)?;
    let mut thing = thing.clone();
    if let Some(policy) = &create.initial_policy {
        thing.insert(fields::INLINE_POLICY.into(), policy.clone());
    }
    if let Some(source) = &create.policy_id_or_placeholder {
        thing.insert(fields::COPY_POLICY_FROM.into(), JsonValue::String(source.clone()));
    }
    Ok(JsonValue::Object(thing))
}

fn check_thing_id(thing_id: &ThingId, thing: &Map<String, JsonValue>) -> Result<()> {
    match thing.get(fields::THING_ID) {
        None => Ok(()),
        Some(JsonValue::String(given)) if *given == thing_id.to_string() => Ok(()),
        Some(other) => Err(AdapterError::ThingIdNotExplicitlySettable {
            expected: thing_id.to_string(),
            given: other.as_str().map_or_else(|| other.to_string(), str::to_owned),
        }),
    }
}

fn parse_create(thing_id: &ThingId, adaptable: &Adaptable) -> Result<CreateThing> {
    require_root(adaptable)?;
    let path = adaptable.payload().path();
    let mut thing = match require_value(adaptable)? {
        JsonValue::Object(object) => object.clone(),
        _ => return Err(AdapterError::invalid_payload(path, "a thing must be a JSON object")),
    };

    check_thing_id(thing_id, &thing)?;

    let initial_policy = thing.remove(fields::INLINE_POLICY);
    let copy_from = match thing.remove(fields::COPY_POLICY_FROM) {
        None => None,
        Some(JsonValue::String(source)) => Some(source),
        Some(_) => {
            return Err(AdapterError::invalid_payload(
                path,
                format!("'{}' must be a string", fields::COPY_POLICY_FROM),
            ))
        }
    };

    let mut create = CreateThing::new(JsonValue::Object(thing));
    if let Some(policy) = initial_policy {
        create = create.with_initial_policy(policy);
    }
    if let Some(source) = copy_from {
        create = create.with_policy_copied_from(source);
    }
    Ok(create)
}

fn migration_value(migration: &MigrateThingDefinition) -> JsonValue {
    let mut value = Map::new();
    value.insert(
        THING_DEFINITION_URL.into(),
        JsonValue::String(migration.thing_definition_url.clone()),
    );
    if let Some(payload) = &migration.migration_payload {
        value.insert(MIGRATION_PAYLOAD.into(), payload.clone());
    }
    if let Some(conditions) = &migration.patch_conditions {
        value.insert(PATCH_CONDITIONS.into(), conditions.clone());
    }
    value.insert(
        INITIALIZE_FROM_DEFAULTS.into(),
        JsonValue::Bool(migration.initialize_missing_properties_from_defaults),
    );
    JsonValue::Object(value)
}

fn parse_migration(adaptable: &Adaptable) -> Result<MigrateThingDefinition> {
    require_root(adaptable)?;
    let value = require_value(adaptable)?;
    let mut migration = MigrateThingDefinition::new(str_field(value, THING_DEFINITION_URL)?);
    migration.migration_payload = value.get(MIGRATION_PAYLOAD).cloned();
    migration.patch_conditions = value.get(PATCH_CONDITIONS).cloned();
    migration.initialize_missing_properties_from_defaults = match value.get(INITIALIZE_FROM_DEFAULTS)
    {
        None => false,
        Some(JsonValue::Bool(flag)) => *flag,
        Some(_) => {
            return Err(AdapterError::invalid_payload(
                adaptable.payload().path(),
                format!("'{INITIALIZE_FROM_DEFAULTS}' must be a boolean"),
            ))
        }
    };
    Ok(migration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use twinproto_model::headers::keys;
    use twinproto_model::{ContentType, HeaderMap, JsonFieldSelector};

    fn lamp() -> ThingId {
        ThingId::thing("org.acme", "lamp").unwrap()
    }

    fn adapter() -> CommandAdapter {
        CommandAdapter::default()
    }

    fn roundtrip(command: ThingCommand, channel: Channel) -> (Adaptable, ThingCommand) {
        let adaptable = adapter().to_adaptable(&command, channel).unwrap();
        let back: ThingCommand = adapter().from_adaptable(&adaptable).unwrap();
        (adaptable, back)
    }

    #[test]
    fn modify_attribute_roundtrip() {
        let command = ThingCommand::modify(
            lamp(),
            ThingResource::Attribute(JsonPointer::parse("/location/room").unwrap()),
            json!("kitchen"),
            HeaderMap::new().with(keys::CORRELATION_ID, "c-1"),
        );
        let (adaptable, back) = roundtrip(command.clone(), Channel::Twin);
        assert_eq!(
            adaptable.topic().to_string(),
            "org.acme/lamp/things/twin/commands/modify"
        );
        assert_eq!(adaptable.payload().path().to_string(), "/attributes/location/room");
        assert_eq!(back, command);
    }

    #[test]
    fn delete_carries_no_value() {
        let command = ThingCommand::delete(lamp(), ThingResource::Features, HeaderMap::new());
        let (adaptable, back) = roundtrip(command.clone(), Channel::Twin);
        assert!(adaptable.payload().value().is_none());
        assert_eq!(back, command);
    }

    #[test]
    fn retrieve_keeps_field_selector() {
        let fields = JsonFieldSelector::parse("attributes,features(f1/properties)").unwrap();
        let command =
            ThingCommand::retrieve(lamp(), ThingResource::Thing, Some(fields.clone()), HeaderMap::new());
        let (adaptable, back) = roundtrip(command.clone(), Channel::Twin);
        assert!(adaptable.payload().value().is_none());
        assert_eq!(adaptable.payload().fields(), Some(&fields));
        assert_eq!(back, command);
    }

    #[test]
    fn live_channel_sets_header() {
        let command = ThingCommand::retrieve(lamp(), ThingResource::PolicyId, None, HeaderMap::new());
        let (adaptable, back) = roundtrip(command, Channel::Live);
        assert_eq!(adaptable.topic().channel(), Channel::Live);
        assert_eq!(back.headers.channel(), Channel::Live);
    }

    #[test]
    fn create_lifts_policy_helpers() {
        let create = CreateThing::new(json!({"thingId": "org.acme:lamp", "attributes": {"a": 1}}))
            .with_initial_policy(json!({"entries": {}}))
            .with_policy_copied_from("org.acme:template");
        let command = ThingCommand::create(lamp(), create, HeaderMap::new());
        let (adaptable, back) = roundtrip(command.clone(), Channel::Twin);
        let value = adaptable.payload().value().unwrap();
        assert_eq!(value["_policy"], json!({"entries": {}}));
        assert_eq!(value["_copyPolicyFrom"], json!("org.acme:template"));
        assert_eq!(back, command);
    }

    #[test]
    fn create_rejects_foreign_thing_id_both_ways() {
        let command = ThingCommand::create(
            lamp(),
            CreateThing::new(json!({"thingId": "org.acme:other"})),
            HeaderMap::new(),
        );
        assert!(matches!(
            adapter().to_adaptable(&command, Channel::Twin),
            Err(AdapterError::ThingIdNotExplicitlySettable { .. })
        ));

        let adaptable = Adaptable::new(
            TopicDescriptor::parse("org.acme/lamp/things/twin/commands/create").unwrap(),
            Payload::new(JsonPointer::root()).with_value(json!({"thingId": "org.acme:other"})),
            HeaderMap::new(),
        );
        let result: Result<ThingCommand> = adapter().from_adaptable(&adaptable);
        assert!(matches!(
            result,
            Err(AdapterError::ThingIdNotExplicitlySettable { .. })
        ));
    }

    #[test]
    fn create_requires_a_thing_object() {
        for thing in [json!("not-a-thing"), json!([1, 2]), json!(null)] {
            let command = ThingCommand::create(lamp(), CreateThing::new(thing), HeaderMap::new());
            assert!(matches!(
                adapter().to_adaptable(&command, Channel::Twin),
                Err(AdapterError::InvalidPayload { .. })
            ));
        }
    }

    #[test]
    fn outbound_values_follow_aspect_shapes() {
        let modify = ThingCommand::modify(lamp(), ThingResource::PolicyId, json!({}), HeaderMap::new());
        assert!(matches!(
            adapter().to_adaptable(&modify, Channel::Twin),
            Err(AdapterError::InvalidPayload { .. })
        ));

        let merge = ThingCommand::merge(
            lamp(),
            JsonPointer::parse("/attributes").unwrap(),
            json!([1]),
            HeaderMap::new(),
        );
        assert!(matches!(
            adapter().to_adaptable(&merge, Channel::Twin),
            Err(AdapterError::InvalidPayload { .. })
        ));

        let unknown = ThingCommand::merge(
            lamp(),
            JsonPointer::parse("/_unknownSegment").unwrap(),
            json!(1),
            HeaderMap::new(),
        );
        assert!(matches!(
            adapter().to_adaptable(&unknown, Channel::Twin),
            Err(AdapterError::UnknownCommand(_))
        ));

        let delete_id = ThingCommand::merge(
            lamp(),
            JsonPointer::root(),
            json!({"thingId": null, "attributes": {}}),
            HeaderMap::new(),
        );
        assert!(matches!(
            adapter().to_adaptable(&delete_id, Channel::Twin),
            Err(AdapterError::ThingIdNotDeletable(_))
        ));
    }

    #[test]
    fn merge_sets_content_type_both_ways() {
        let command = ThingCommand::new(
            lamp(),
            ThingCommandKind::Merge(twinproto_model::signal::MergePatch::new(
                JsonPointer::root(),
                json!({"attributes": {"a": null}}),
            )),
            HeaderMap::new(),
        );
        let (adaptable, back) = roundtrip(command, Channel::Twin);
        assert_eq!(
            adaptable.headers().get(keys::CONTENT_TYPE),
            Some(ContentType::MERGE_PATCH_JSON)
        );
        assert_eq!(adaptable.payload().path().to_string(), "/attributes/a");
        assert_eq!(adaptable.payload().value(), Some(&json!(null)));
        assert_eq!(
            back.headers.get(keys::CONTENT_TYPE),
            Some(ContentType::MERGE_PATCH_JSON)
        );
    }

    #[test]
    fn migrate_roundtrip() {
        let mut migration = MigrateThingDefinition::new("https://models.example.org/lamp-2.0.0.tm.jsonld");
        migration.migration_payload = Some(json!({"attributes": {"version": 2}}));
        migration.initialize_missing_properties_from_defaults = true;
        let command = ThingCommand::migrate(lamp(), migration, HeaderMap::new());
        let (adaptable, back) = roundtrip(command.clone(), Channel::Twin);
        assert_eq!(
            adaptable.topic().to_string(),
            "org.acme/lamp/things/twin/commands/migrate"
        );
        assert_eq!(back, command);
    }

    #[test]
    fn unsupported_operations() {
        let command = ThingCommand::delete(lamp(), ThingResource::PolicyId, HeaderMap::new());
        assert!(matches!(
            adapter().to_adaptable(&command, Channel::Twin),
            Err(AdapterError::UnknownCommand(_))
        ));

        let topic = TopicDescriptor::parse("org.acme/lamp/things/twin/commands/modify").unwrap();
        let adaptable = Adaptable::new(
            topic,
            Payload::new(JsonPointer::parse("/_unknownSegment").unwrap()).with_value(json!(1)),
            HeaderMap::new(),
        );
        let result: Result<ThingCommand> = adapter().from_adaptable(&adaptable);
        assert!(matches!(result, Err(AdapterError::UnknownPath { .. })));
    }

    #[test]
    fn modify_validates_value() {
        let topic = TopicDescriptor::parse("org.acme/lamp/things/twin/commands/modify").unwrap();
        let missing = Adaptable::new(
            topic.clone(),
            Payload::new(JsonPointer::parse("/attributes").unwrap()),
            HeaderMap::new(),
        );
        let result: Result<ThingCommand> = adapter().from_adaptable(&missing);
        assert!(matches!(result, Err(AdapterError::MissingPayload(_))));

        let wrong = Adaptable::new(
            topic,
            Payload::new(JsonPointer::parse("/policyId").unwrap()).with_value(json!({})),
            HeaderMap::new(),
        );
        let result: Result<ThingCommand> = adapter().from_adaptable(&wrong);
        assert!(matches!(result, Err(AdapterError::InvalidPayload { .. })));
    }

    #[test]
    fn retrieve_things_keeps_ids_and_namespace_apart() {
        let ids = vec![
            ThingId::thing("org.acme", "lamp").unwrap(),
            ThingId::thing("org.acme", "switch").unwrap(),
        ];
        let wildcard = RetrieveThings::new(ids.clone(), HeaderMap::new());
        let adaptable = adapter().to_adaptable(&wildcard, Channel::Twin).unwrap();
        assert_eq!(
            adaptable.topic().to_string(),
            "_/_/things/twin/commands/retrieve"
        );
        assert_eq!(
            adaptable.payload().value(),
            Some(&json!({"thingIds": ["org.acme:lamp", "org.acme:switch"]}))
        );
        let back: RetrieveThings = adapter().from_adaptable(&adaptable).unwrap();
        assert_eq!(back, wildcard);

        let scoped = RetrieveThings::new(ids, HeaderMap::new()).with_namespace("org.acme");
        let adaptable = adapter().to_adaptable(&scoped, Channel::Twin).unwrap();
        assert_eq!(adaptable.topic().namespace(), "org.acme");
        let back: RetrieveThings = adapter().from_adaptable(&adaptable).unwrap();
        assert_eq!(back, scoped);
    }
}
