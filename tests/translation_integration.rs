//! ---
//! tp_section: "15-testing-qa-runbook"
//! tp_subsection: "integration-tests"
//! tp_type: "source"
//! tp_scope: "code"
//! tp_description: "Integration and validation tests for the twinproto stack."
//! tp_version: "v0.0.0-prealpha"
//! tp_owner: "tbd"
//! ---
use chrono::{TimeZone, Utc};
use serde_json::json;
use twinproto_adapter::{AdapterError, SignalAdapterRegistry};
use twinproto_model::headers::keys;
use twinproto_model::signal::{
    CreateThing, ErrorResponse, Message, MessageCommand, MessageCommandResponse,
    MessageDirection, MessagePayload, MergeStatus, MigrateThingDefinition, RetrieveThings,
    RetrieveThingsResponse, SearchCommand, SearchCommandKind, SearchEvent, SearchEventKind,
    ThingCommand, ThingCommandResponse, ThingEvent, ThingEventKind, ThingResponseKind,
    TypedError,
};
use twinproto_model::topic::WILDCARD_NAMESPACE;
use twinproto_model::{
    Action, Adaptable, Channel, ContentType, EntityId, HeaderMap, HttpStatus, JsonFieldSelector,
    JsonPointer, Payload, SearchAction, Signal, ThingId, ThingResource, TopicDescriptor,
};

fn lamp() -> ThingId {
    ThingId::thing("org.acme", "lamp").unwrap()
}

fn headers_for(channel: Channel) -> HeaderMap {
    let headers = HeaderMap::new().with(keys::CORRELATION_ID, "c-42");
    match channel {
        Channel::Live => headers.with(keys::CHANNEL, "live"),
        _ => headers,
    }
}

fn pointer(raw: &str) -> JsonPointer {
    JsonPointer::parse(raw).unwrap()
}

fn thing_signals(channel: Channel) -> Vec<Signal> {
    let headers = headers_for(channel);
    let location = ThingResource::Attribute(pointer("/location"));
    vec![
        ThingCommand::create(
            lamp(),
            CreateThing::new(json!({"thingId": "org.acme:lamp", "attributes": {"room": "hall"}}))
                .with_initial_policy(json!({"entries": {}})),
            headers.clone(),
        )
        .into(),
        ThingCommand::modify(lamp(), location.clone(), json!("kitchen"), headers.clone()).into(),
        ThingCommand::delete(lamp(), location.clone(), headers.clone()).into(),
        ThingCommand::retrieve(
            lamp(),
            ThingResource::Thing,
            Some(JsonFieldSelector::parse("thingId,attributes").unwrap()),
            headers.clone(),
        )
        .into(),
        ThingCommand::merge(
            lamp(),
            pointer("/features/battery/properties"),
            json!({"level": 80, "charging": null}),
            headers.clone(),
        )
        .into(),
        ThingCommand::migrate(
            lamp(),
            MigrateThingDefinition {
                thing_definition_url: "https://models.acme.org/lamp-2.0.0.tm.jsonld".into(),
                migration_payload: Some(json!({"attributes": {"model": "v2"}})),
                patch_conditions: None,
                initialize_missing_properties_from_defaults: true,
            },
            headers.clone(),
        )
        .into(),
        ThingCommandResponse::new(
            lamp(),
            ThingResponseKind::Modified {
                resource: location.clone(),
                value: None,
            },
            headers.clone(),
        )
        .into(),
        ThingCommandResponse::new(
            lamp(),
            ThingResponseKind::Retrieved {
                resource: ThingResource::Feature("battery".into()),
                value: json!({"properties": {"level": 80}}),
            },
            headers.clone(),
        )
        .into(),
        ThingCommandResponse::new(
            lamp(),
            ThingResponseKind::Migrated {
                patch: json!({"attributes": {"model": "v2"}}),
                merge_status: MergeStatus::DryRun,
            },
            headers.clone(),
        )
        .into(),
        ThingEvent::new(
            lamp(),
            ThingEventKind::Modified {
                resource: location,
                value: json!("kitchen"),
            },
            7,
            headers.clone(),
        )
        .with_timestamp(Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap())
        .into(),
        ThingEvent::merged(
            lamp(),
            JsonPointer::root(),
            json!({"attributes": {"room": null}}),
            8,
            headers,
        )
        .into(),
    ]
}

#[test]
fn thing_signals_roundtrip_on_both_channels() {
    let registry = SignalAdapterRegistry::default();
    for channel in [Channel::Twin, Channel::Live] {
        for signal in thing_signals(channel) {
            let adaptable = registry.to_adaptable(&signal, channel).unwrap();
            assert_eq!(adaptable.topic().channel(), channel, "{}", signal.kind());
            let back = registry.from_adaptable(&adaptable).unwrap();
            assert_eq!(back, signal, "{} on {channel}", signal.kind());
        }
    }
}

#[test]
fn adaptables_survive_the_json_wire_form() {
    let registry = SignalAdapterRegistry::default();
    for signal in thing_signals(Channel::Twin) {
        let adaptable = registry.to_adaptable(&signal, Channel::Twin).unwrap();
        let wire = serde_json::to_string(&adaptable.to_json()).unwrap();
        let parsed = Adaptable::from_json(&serde_json::from_str(&wire).unwrap()).unwrap();
        assert_eq!(registry.from_adaptable(&parsed).unwrap(), signal);
    }
}

#[test]
fn other_families_roundtrip() {
    let registry = SignalAdapterRegistry::default();
    let retrieve_many = RetrieveThings::new(
        vec![lamp(), ThingId::thing("org.acme", "switch").unwrap()],
        HeaderMap::new(),
    )
    .with_namespace("org.acme");
    let message = Message::new(
        lamp(),
        MessageDirection::To,
        "switch-on",
        HeaderMap::new()
            .with(keys::CONTENT_TYPE, ContentType::TEXT_PLAIN)
            .with(keys::CHANNEL, "live"),
    )
    .with_payload(MessagePayload::Text("now".into()));
    let signals: Vec<Signal> = vec![
        retrieve_many.into(),
        RetrieveThingsResponse::new(
            vec![json!({"thingId": "org.acme:lamp"})],
            Some("org.acme".into()),
            HeaderMap::new(),
        )
        .into(),
        ErrorResponse::new(
            Some(lamp()),
            TypedError::new(
                "things:attribute.notmodifiable",
                HttpStatus::FORBIDDEN,
                "The Attribute could not be modified.",
            ),
            HeaderMap::new().with(keys::CORRELATION_ID, "c-1"),
        )
        .into(),
        MessageCommand::new(message.clone()).into(),
        MessageCommandResponse::new(message, HttpStatus::OK).into(),
        SearchCommand::new(
            SearchCommandKind::RequestFromSubscription {
                subscription_id: "sub-7".into(),
                demand: 25,
            },
            HeaderMap::new(),
        )
        .into(),
        SearchEvent::new(
            SearchEventKind::Complete {
                subscription_id: "sub-7".into(),
            },
            HeaderMap::new(),
        )
        .into(),
    ];
    for signal in signals {
        let adaptable = registry.to_adaptable_on_own_channel(&signal).unwrap();
        let back = registry.from_adaptable(&adaptable).unwrap();
        assert_eq!(back, signal, "{}", signal.kind());
    }
}

#[test]
fn binary_message_payload_is_base64_on_the_wire() {
    let registry = SignalAdapterRegistry::default();
    let message = Message::new(
        lamp(),
        MessageDirection::To,
        "firmware",
        HeaderMap::new()
            .with(keys::CONTENT_TYPE, ContentType::OCTET_STREAM)
            .with(keys::CHANNEL, "live"),
    )
    .with_payload(MessagePayload::Binary(b"binary payload".to_vec()));
    let signal: Signal = MessageCommand::new(message).into();

    let adaptable = registry.to_adaptable(&signal, Channel::Live).unwrap();
    assert_eq!(
        adaptable.payload().value(),
        Some(&json!("YmluYXJ5IHBheWxvYWQ="))
    );
    assert_eq!(registry.from_adaptable(&adaptable).unwrap(), signal);
}

fn merge_adaptable(path: &str, value: serde_json::Value) -> Adaptable {
    Adaptable::new(
        TopicDescriptor::parse("org.acme/lamp/things/twin/commands/merge").unwrap(),
        Payload::new(pointer(path)).with_value(value),
        HeaderMap::new().with(keys::CONTENT_TYPE, ContentType::MERGE_PATCH_JSON),
    )
}

#[test]
fn root_and_aspect_merge_forms_are_equal() {
    let registry = SignalAdapterRegistry::default();
    let value = json!({"room": "kitchen", "floor": 2});
    let at_root = registry
        .from_adaptable(&merge_adaptable("/", json!({"attributes": value.clone()})))
        .unwrap();
    let at_aspect = registry
        .from_adaptable(&merge_adaptable("/attributes", value))
        .unwrap();
    assert_eq!(at_root, at_aspect);
}

#[test]
fn merge_null_is_kept_at_any_depth() {
    let registry = SignalAdapterRegistry::default();
    let leaf = registry
        .from_adaptable(&merge_adaptable(
            "/features/battery/properties/status/charging",
            json!(null),
        ))
        .unwrap();
    let embedded = registry
        .from_adaptable(&merge_adaptable(
            "/",
            json!({"features": {"battery": {"properties": {"status": {"charging": null}}}}}),
        ))
        .unwrap();
    assert_eq!(leaf, embedded);

    let Signal::Command(command) = leaf else {
        panic!("expected a merge command");
    };
    assert_eq!(command.headers.get(keys::CONTENT_TYPE), Some(ContentType::MERGE_PATCH_JSON));
}

#[test]
fn unknown_resource_path_is_rejected() {
    let registry = SignalAdapterRegistry::default();
    for action in ["modify", "retrieve", "delete", "merge"] {
        let adaptable = Adaptable::new(
            TopicDescriptor::parse(&format!("org.acme/lamp/things/twin/commands/{action}"))
                .unwrap(),
            Payload::new(pointer("/_unknownSegment")).with_value(json!({})),
            HeaderMap::new(),
        );
        let result = registry.from_adaptable(&adaptable);
        assert!(
            matches!(result, Err(AdapterError::UnknownPath { .. })),
            "{action}: {result:?}"
        );
    }
}

#[test]
fn identity_fields_are_protected() {
    let registry = SignalAdapterRegistry::default();
    let delete_id = Adaptable::new(
        TopicDescriptor::parse("org.acme/lamp/things/twin/commands/merge").unwrap(),
        Payload::new(JsonPointer::root()).with_value(json!({"thingId": null})),
        HeaderMap::new(),
    );
    assert!(matches!(
        registry.from_adaptable(&delete_id),
        Err(AdapterError::ThingIdNotDeletable(_))
    ));
}

#[test]
fn built_topics_parse_back_for_every_group() {
    let policy = EntityId::policy("org.acme", "policy").unwrap();
    let built = [
        TopicDescriptor::for_entity(&lamp(), Channel::None).errors(),
        TopicDescriptor::for_entity(&lamp(), Channel::Live).messages("ask/question"),
        TopicDescriptor::for_entity(&lamp(), Channel::Twin).acks(Some("custom-ack")),
        TopicDescriptor::for_entity(&policy, Channel::Twin).announcements("subjectDeletion"),
        TopicDescriptor::for_entity(&policy, Channel::Live)
            .commands()
            .action(Action::Modify),
        TopicDescriptor::builder("org.acme").entity("conn").connections().errors(),
        TopicDescriptor::builder(WILDCARD_NAMESPACE)
            .things()
            .twin()
            .search(SearchAction::Subscribe),
    ];
    for topic in built {
        let topic = topic.unwrap();
        assert_eq!(TopicDescriptor::parse(&topic.to_string()).unwrap(), topic);
    }
    assert_eq!(
        TopicDescriptor::for_entity(&policy, Channel::Twin)
            .errors()
            .unwrap()
            .to_string(),
        "org.acme/policy/policies/errors"
    );
}

#[test]
fn builder_refuses_topics_that_do_not_parse() {
    let lamp_topic = || TopicDescriptor::builder("org").entity("x").things();
    assert!(lamp_topic().twin().commands().action(Action::Created).is_err());
    assert!(lamp_topic().live().events().action(Action::Merge).is_err());
    assert!(lamp_topic().live().messages("").is_err());
    assert!(TopicDescriptor::builder("org")
        .entity("")
        .policies()
        .errors()
        .is_err());
}

#[test]
fn create_of_a_non_object_thing_is_rejected() {
    let registry = SignalAdapterRegistry::default();
    let signal: Signal = ThingCommand::create(
        lamp(),
        CreateThing::new(json!("not-a-thing")),
        HeaderMap::new(),
    )
    .into();
    assert!(matches!(
        registry.to_adaptable(&signal, Channel::Twin),
        Err(AdapterError::InvalidPayload { .. })
    ));

    let inbound = Adaptable::new(
        TopicDescriptor::parse("org.acme/lamp/things/twin/commands/create").unwrap(),
        Payload::new(JsonPointer::root()).with_value(json!("not-a-thing")),
        HeaderMap::new(),
    );
    assert!(matches!(
        registry.from_adaptable(&inbound),
        Err(AdapterError::InvalidPayload { .. })
    ));
}
