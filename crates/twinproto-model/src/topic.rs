//! ---
//! tp_section: "02-protocol-data-model"
//! tp_subsection: "module"
//! tp_type: "source"
//! tp_scope: "code"
//! tp_description: "Protocol data model shared by adapters and transports."
//! tp_version: "v0.0.0-prealpha"
//! tp_owner: "tbd"
//! ---
//! Topic descriptors.
//!
//! String form:
//! `<namespace>/<entityName>/<group>[/<channel>]/<criterion>[/<action>|/<searchAction>|/<subject>]`.
//! The channel segment is omitted for channel [`Channel::None`].
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

use crate::entity::{EntityId, EntityType};
use crate::error::{ModelError, Result};

/// Namespace placeholder used by multi-entity topics.
pub const WILDCARD_NAMESPACE: &str = "_";
/// Entity name placeholder used by multi-entity topics.
pub const ID_PLACEHOLDER: &str = "_";

/// Entity group addressed by a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Group {
    /// `things`
    Things,
    /// `policies`
    Policies,
    /// `connections`
    Connections,
}

impl Group {
    /// Entity type of ids addressed through this group.
    pub fn entity_type(self) -> EntityType {
        match self {
            Group::Things => EntityType::Thing,
            Group::Policies => EntityType::Policy,
            Group::Connections => EntityType::Connection,
        }
    }

    fn of(entity_type: EntityType) -> Self {
        match entity_type {
            EntityType::Thing => Group::Things,
            EntityType::Policy => Group::Policies,
            EntityType::Connection => Group::Connections,
        }
    }
}

/// Persisted twin state, live device exchange, or neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Channel {
    /// `twin`
    Twin,
    /// `live`
    Live,
    /// Not rendered in the string form.
    None,
}

/// Broad traffic category of a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Criterion {
    /// `commands`
    Commands,
    /// `events`
    Events,
    /// `search`
    Search,
    /// `messages`
    Messages,
    /// `errors`
    Errors,
    /// `announcements`
    Announcements,
    /// `acks`
    Acks,
}

/// Command or event action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Action {
    /// `create`
    Create,
    /// `retrieve`
    Retrieve,
    /// `modify`
    Modify,
    /// `delete`
    Delete,
    /// `merge`
    Merge,
    /// `migrate`
    Migrate,
    /// `created`
    Created,
    /// `modified`
    Modified,
    /// `deleted`
    Deleted,
    /// `merged`
    Merged,
    /// `migrated`
    Migrated,
}

impl Action {
    /// True for actions that may follow the `commands` criterion.
    pub fn is_command(self) -> bool {
        matches!(
            self,
            Action::Create
                | Action::Retrieve
                | Action::Modify
                | Action::Delete
                | Action::Merge
                | Action::Migrate
        )
    }

    /// True for actions that may follow the `events` criterion.
    pub fn is_event(self) -> bool {
        !self.is_command()
    }
}

/// Action of search-protocol topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
pub enum SearchAction {
    /// `subscribe`
    #[strum(serialize = "subscribe")]
    Subscribe,
    /// `request`
    #[strum(serialize = "request")]
    Request,
    /// `cancel`
    #[strum(serialize = "cancel")]
    Cancel,
    /// `created`: the subscription was generated.
    #[strum(serialize = "created")]
    Generated,
    /// `complete`
    #[strum(serialize = "complete")]
    Complete,
    /// `failed`
    #[strum(serialize = "failed")]
    Failed,
    /// `next`: a page of results is available.
    #[strum(serialize = "next")]
    HasNext,
    /// `error`
    #[strum(serialize = "error")]
    Error,
}

/// Immutable, fully round-trippable topic descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicDescriptor {
    namespace: String,
    entity_name: String,
    group: Group,
    channel: Channel,
    criterion: Criterion,
    action: Option<Action>,
    subject: Option<String>,
    search_action: Option<SearchAction>,
}

impl TopicDescriptor {
    /// Start building a topic for `namespace`.
    pub fn builder(namespace: impl Into<String>) -> TopicBuilder {
        TopicBuilder {
            namespace: namespace.into(),
            entity_name: ID_PLACEHOLDER.to_owned(),
        }
    }

    /// Start building a topic for a concrete entity. The group follows from
    /// the entity type; things take `channel` (twin unless live), other groups
    /// carry none.
    pub fn for_entity(id: &EntityId, channel: Channel) -> CriterionStep {
        let builder = TopicBuilder {
            namespace: id.namespace().to_owned(),
            entity_name: id.name().to_owned(),
        };
        match Group::of(id.entity_type()) {
            Group::Things => builder.things().channel(channel),
            Group::Policies => builder.policies(),
            Group::Connections => builder.connections(),
        }
    }

    /// Parse the slash-separated string form.
    pub fn parse(topic: &str) -> Result<Self> {
        let fail = |reason: &str| ModelError::unknown_topic(topic, reason);
        let parts: Vec<&str> = topic.split('/').collect();
        if parts.len() < 4 {
            return Err(fail("expected at least namespace/name/group/criterion"));
        }
        let namespace = parts[0];
        let entity_name = parts[1];
        if namespace.is_empty() || entity_name.is_empty() {
            return Err(fail("namespace and entity name must not be empty"));
        }
        let group = Group::from_str(parts[2])
            .map_err(|_| fail(&format!("unknown group '{}'", parts[2])))?;

        let mut rest = parts[3..].iter().copied();
        let mut token = rest.next().unwrap_or_default();
        let channel = match Channel::from_str(token) {
            Ok(Channel::None) => return Err(fail("channel 'none' is implicit")),
            Ok(channel) => {
                token = rest
                    .next()
                    .ok_or_else(|| fail("missing criterion after channel"))?;
                channel
            }
            Err(_) => Channel::None,
        };
        match (group, channel) {
            (Group::Things, Channel::None) => {
                return Err(fail("things topics require channel 'twin' or 'live'"))
            }
            (Group::Policies | Group::Connections, Channel::Twin | Channel::Live) => {
                return Err(fail(&format!("{group} topics have no channel")))
            }
            _ => {}
        }
        let criterion = Criterion::from_str(token)
            .map_err(|_| fail(&format!("unknown criterion '{token}'")))?;
        let tail: Vec<&str> = rest.collect();

        let mut descriptor = Self {
            namespace: namespace.to_owned(),
            entity_name: entity_name.to_owned(),
            group,
            channel,
            criterion,
            action: None,
            subject: None,
            search_action: None,
        };
        match criterion {
            Criterion::Commands | Criterion::Events => {
                let [token] = tail.as_slice() else {
                    return Err(fail("expected exactly one action segment"));
                };
                let action =
                    Action::from_str(token).map_err(|_| fail(&format!("unknown action '{token}'")))?;
                let fits = match criterion {
                    Criterion::Commands => action.is_command(),
                    _ => action.is_event(),
                };
                if !fits {
                    return Err(fail(&format!("action '{action}' does not belong to {criterion}")));
                }
                descriptor.action = Some(action);
            }
            Criterion::Search => {
                let [token] = tail.as_slice() else {
                    return Err(fail("expected exactly one search action segment"));
                };
                let action = SearchAction::from_str(token)
                    .map_err(|_| fail(&format!("unknown search action '{token}'")))?;
                descriptor.search_action = Some(action);
            }
            Criterion::Messages | Criterion::Announcements => {
                if tail.is_empty() || tail.iter().any(|segment| segment.is_empty()) {
                    return Err(fail("subject is required"));
                }
                descriptor.subject = Some(tail.join("/"));
            }
            Criterion::Acks => {
                if tail.iter().any(|segment| segment.is_empty()) {
                    return Err(fail("empty acknowledgement label"));
                }
                if !tail.is_empty() {
                    descriptor.subject = Some(tail.join("/"));
                }
            }
            Criterion::Errors => {
                if !tail.is_empty() {
                    return Err(fail("errors topics take no further segments"));
                }
            }
        }
        Ok(descriptor)
    }

    /// Namespace or the wildcard placeholder.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Entity name or the id placeholder.
    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    /// True when the namespace is the wildcard placeholder.
    pub fn is_wildcard_namespace(&self) -> bool {
        self.namespace == WILDCARD_NAMESPACE
    }

    /// True when the entity name is the id placeholder.
    pub fn is_placeholder_name(&self) -> bool {
        self.entity_name == ID_PLACEHOLDER
    }

    /// Entity id formed by namespace and name, unless either is a placeholder.
    pub fn entity_id(&self) -> Option<EntityId> {
        if self.is_wildcard_namespace() || self.is_placeholder_name() {
            return None;
        }
        EntityId::new(
            self.group.entity_type(),
            self.namespace.clone(),
            self.entity_name.clone(),
        )
        .ok()
    }

    /// Group.
    pub fn group(&self) -> Group {
        self.group
    }

    /// Channel.
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Criterion.
    pub fn criterion(&self) -> Criterion {
        self.criterion
    }

    /// Command/event action.
    pub fn action(&self) -> Option<Action> {
        self.action
    }

    /// Message subject, announcement name or acknowledgement label.
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Search action.
    pub fn search_action(&self) -> Option<SearchAction> {
        self.search_action
    }
}

impl fmt::Display for TopicDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.namespace, self.entity_name, self.group)?;
        if self.channel != Channel::None {
            write!(f, "/{}", self.channel)?;
        }
        write!(f, "/{}", self.criterion)?;
        if let Some(action) = self.action {
            write!(f, "/{action}")?;
        }
        if let Some(action) = self.search_action {
            write!(f, "/{action}")?;
        }
        if let Some(subject) = &self.subject {
            write!(f, "/{subject}")?;
        }
        Ok(())
    }
}

impl FromStr for TopicDescriptor {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for TopicDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TopicDescriptor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// First builder step: namespace set, entity name optional.
///
/// The steps only offer the channels a group accepts, and every terminal
/// step checks that the rendered topic parses back to the same descriptor.
#[derive(Debug, Clone)]
pub struct TopicBuilder {
    namespace: String,
    entity_name: String,
}

impl TopicBuilder {
    /// Address a single entity by name.
    pub fn entity(mut self, name: impl Into<String>) -> Self {
        self.entity_name = name.into();
        self
    }

    /// `things`; a channel is required next.
    pub fn things(self) -> ThingChannelStep {
        ThingChannelStep {
            namespace: self.namespace,
            entity_name: self.entity_name,
        }
    }

    /// `policies`, which carry no channel.
    pub fn policies(self) -> CriterionStep {
        self.channelless(Group::Policies)
    }

    /// `connections`, which carry no channel.
    pub fn connections(self) -> CriterionStep {
        self.channelless(Group::Connections)
    }

    fn channelless(self, group: Group) -> CriterionStep {
        CriterionStep {
            namespace: self.namespace,
            entity_name: self.entity_name,
            group,
            channel: Channel::None,
        }
    }
}

/// Channel step of `things` topics: twin or live only.
#[derive(Debug, Clone)]
pub struct ThingChannelStep {
    namespace: String,
    entity_name: String,
}

impl ThingChannelStep {
    /// `twin`
    pub fn twin(self) -> CriterionStep {
        self.select(Channel::Twin)
    }

    /// `live`
    pub fn live(self) -> CriterionStep {
        self.select(Channel::Live)
    }

    /// `live` for [`Channel::Live`], otherwise `twin`.
    pub fn channel(self, channel: Channel) -> CriterionStep {
        match channel {
            Channel::Live => self.live(),
            Channel::Twin | Channel::None => self.twin(),
        }
    }

    fn select(self, channel: Channel) -> CriterionStep {
        CriterionStep {
            namespace: self.namespace,
            entity_name: self.entity_name,
            group: Group::Things,
            channel,
        }
    }
}

/// Criterion step.
#[derive(Debug, Clone)]
pub struct CriterionStep {
    namespace: String,
    entity_name: String,
    group: Group,
    channel: Channel,
}

impl CriterionStep {
    fn finish(self, criterion: Criterion) -> TopicDescriptor {
        TopicDescriptor {
            namespace: self.namespace,
            entity_name: self.entity_name,
            group: self.group,
            channel: self.channel,
            criterion,
            action: None,
            subject: None,
            search_action: None,
        }
    }

    /// `commands`; a command action is required next.
    pub fn commands(self) -> ActionStep {
        ActionStep {
            partial: self.finish(Criterion::Commands),
        }
    }

    /// `events`; an event action is required next.
    pub fn events(self) -> ActionStep {
        ActionStep {
            partial: self.finish(Criterion::Events),
        }
    }

    /// `search` with its search action.
    pub fn search(self, action: SearchAction) -> Result<TopicDescriptor> {
        TopicDescriptor {
            search_action: Some(action),
            ..self.finish(Criterion::Search)
        }
        .checked()
    }

    /// `messages` with its subject, which may span several non-empty
    /// segments.
    pub fn messages(self, subject: impl Into<String>) -> Result<TopicDescriptor> {
        TopicDescriptor {
            subject: Some(subject.into()),
            ..self.finish(Criterion::Messages)
        }
        .checked()
    }

    /// `announcements` with the announcement name.
    pub fn announcements(self, name: impl Into<String>) -> Result<TopicDescriptor> {
        TopicDescriptor {
            subject: Some(name.into()),
            ..self.finish(Criterion::Announcements)
        }
        .checked()
    }

    /// `acks`, optionally scoped to a single label.
    pub fn acks(self, label: Option<&str>) -> Result<TopicDescriptor> {
        TopicDescriptor {
            subject: label.map(str::to_owned),
            ..self.finish(Criterion::Acks)
        }
        .checked()
    }

    /// `errors`
    pub fn errors(self) -> Result<TopicDescriptor> {
        self.finish(Criterion::Errors).checked()
    }
}

/// Final step for commands and events.
#[derive(Debug, Clone)]
pub struct ActionStep {
    partial: TopicDescriptor,
}

impl ActionStep {
    /// Set the action and finish. Event actions are rejected after
    /// `commands` and command actions after `events`.
    pub fn action(self, action: Action) -> Result<TopicDescriptor> {
        TopicDescriptor {
            action: Some(action),
            ..self.partial
        }
        .checked()
    }
}

impl TopicDescriptor {
    /// `self` if its string form parses back to an equal descriptor.
    fn checked(self) -> Result<Self> {
        let rendered = self.to_string();
        if Self::parse(&rendered)? != self {
            return Err(ModelError::unknown_topic(
                &rendered,
                "segments do not survive rendering",
            ));
        }
        Ok(self)
    }
}

/// Iterate every action matching the criterion.
pub fn actions_for(criterion: Criterion) -> impl Iterator<Item = Action> {
    Action::iter().filter(move |action| match criterion {
        Criterion::Commands => action.is_command(),
        Criterion::Events => action.is_event(),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_thing_command() {
        let topic = TopicDescriptor::parse("org.acme/lamp/things/twin/commands/modify").unwrap();
        assert_eq!(topic.namespace(), "org.acme");
        assert_eq!(topic.entity_name(), "lamp");
        assert_eq!(topic.group(), Group::Things);
        assert_eq!(topic.channel(), Channel::Twin);
        assert_eq!(topic.criterion(), Criterion::Commands);
        assert_eq!(topic.action(), Some(Action::Modify));
        assert_eq!(
            topic.entity_id().map(|id| id.to_string()).as_deref(),
            Some("org.acme:lamp")
        );
    }

    #[test]
    fn policies_have_no_channel() {
        let topic =
            TopicDescriptor::parse("org.acme/policy/policies/announcements/subjectDeletion")
                .unwrap();
        assert_eq!(topic.channel(), Channel::None);
        assert_eq!(topic.subject(), Some("subjectDeletion"));
        assert_eq!(
            topic.to_string(),
            "org.acme/policy/policies/announcements/subjectDeletion"
        );
        assert!(TopicDescriptor::parse("org.acme/policy/policies/twin/commands/create").is_err());
    }

    #[test]
    fn message_subjects_keep_slashes() {
        let topic =
            TopicDescriptor::parse("org.acme/lamp/things/live/messages/ask/question").unwrap();
        assert_eq!(topic.subject(), Some("ask/question"));
        assert_eq!(topic.action(), None);
    }

    #[test]
    fn wildcard_search_topic() {
        let topic = TopicDescriptor::parse("_/_/things/twin/search/next").unwrap();
        assert!(topic.is_wildcard_namespace());
        assert!(topic.entity_id().is_none());
        assert_eq!(topic.search_action(), Some(SearchAction::HasNext));
        assert_eq!(topic.action(), None);
    }

    #[test]
    fn strict_parsing() {
        for bad in [
            "org/lamp/things",
            "org/lamp/gadgets/twin/commands/modify",
            "org/lamp/things/commands/modify",
            "org/lamp/things/none/commands/modify",
            "org/lamp/things/twin/orders/modify",
            "org/lamp/things/twin/commands/modified",
            "org/lamp/things/twin/events/modify",
            "org/lamp/things/twin/commands",
            "org/lamp/things/twin/commands/modify/extra",
            "org/lamp/things/twin/search/browse",
            "org/lamp/things/live/messages",
            "org/lamp/things/twin/errors/extra",
            "/lamp/things/twin/errors",
        ] {
            assert!(
                matches!(TopicDescriptor::parse(bad), Err(ModelError::UnknownTopic { .. })),
                "{bad} should not parse"
            );
        }
    }

    #[test]
    fn builder_matches_parse() {
        let id = EntityId::thing("org.acme", "lamp").unwrap();
        let built = TopicDescriptor::for_entity(&id, Channel::Live)
            .events()
            .action(Action::Merged)
            .unwrap();
        assert_eq!(built.to_string(), "org.acme/lamp/things/live/events/merged");
        assert_eq!(TopicDescriptor::parse(&built.to_string()).unwrap(), built);

        let multi = TopicDescriptor::builder(WILDCARD_NAMESPACE)
            .things()
            .twin()
            .commands()
            .action(Action::Retrieve)
            .unwrap();
        assert_eq!(multi.to_string(), "_/_/things/twin/commands/retrieve");
    }

    #[test]
    fn entity_topics_pick_a_valid_channel() {
        let lamp = EntityId::thing("org.acme", "lamp").unwrap();
        let policy = EntityId::new(EntityType::Policy, "org.acme", "policy").unwrap();
        let twin = TopicDescriptor::for_entity(&lamp, Channel::None).errors().unwrap();
        assert_eq!(twin.to_string(), "org.acme/lamp/things/twin/errors");
        let channelless = TopicDescriptor::for_entity(&policy, Channel::Live)
            .announcements("subjectDeletion")
            .unwrap();
        assert_eq!(
            channelless.to_string(),
            "org.acme/policy/policies/announcements/subjectDeletion"
        );
    }

    #[test]
    fn builder_rejects_what_parse_rejects() {
        let things = || TopicDescriptor::builder("org").entity("x").things();
        assert!(things().twin().commands().action(Action::Created).is_err());
        assert!(things().twin().events().action(Action::Modify).is_err());
        assert!(things().live().messages("").is_err());
        assert!(things().live().messages("ask//question").is_err());
        assert!(things().twin().acks(Some("")).is_err());
        assert!(TopicDescriptor::builder("").things().twin().errors().is_err());
        assert!(TopicDescriptor::builder("org")
            .entity("a/b")
            .things()
            .twin()
            .errors()
            .is_err());
        assert!(TopicDescriptor::builder("org")
            .entity("policy")
            .policies()
            .announcements("")
            .is_err());
    }

    fn arb_descriptor() -> impl Strategy<Value = TopicDescriptor> {
        let namespace = prop_oneof![Just("_".to_owned()), "[a-z][a-z0-9_]{0,5}(\\.[a-z][a-z0-9]{0,4})?"];
        let name = prop_oneof![Just("_".to_owned()), "[a-zA-Z0-9:_-]{1,8}"];
        let group = prop_oneof![
            Just(GroupChoice::Things(Channel::Twin)),
            Just(GroupChoice::Things(Channel::Live)),
            Just(GroupChoice::Policies),
            Just(GroupChoice::Connections),
        ];
        let tail = prop_oneof![
            (0usize..6).prop_map(|i| Tail::Command(actions_for(Criterion::Commands).nth(i).unwrap())),
            (0usize..5).prop_map(|i| Tail::Event(actions_for(Criterion::Events).nth(i).unwrap())),
            (0usize..8).prop_map(|i| Tail::Search(SearchAction::iter().nth(i).unwrap())),
            "[a-z]{1,5}(/[a-z]{1,5})?".prop_map(Tail::Message),
            "[a-zA-Z]{1,8}".prop_map(Tail::Announcement),
            proptest::option::of("[a-z-]{1,8}").prop_map(Tail::Acks),
            Just(Tail::Errors),
        ];
        (namespace, name, group, tail).prop_map(|(ns, name, group, tail)| {
            let builder = TopicDescriptor::builder(ns).entity(name);
            let step = match group {
                GroupChoice::Things(channel) => builder.things().channel(channel),
                GroupChoice::Policies => builder.policies(),
                GroupChoice::Connections => builder.connections(),
            };
            let built = match tail {
                Tail::Command(action) => step.commands().action(action),
                Tail::Event(action) => step.events().action(action),
                Tail::Search(action) => step.search(action),
                Tail::Message(subject) => step.messages(subject),
                Tail::Announcement(name) => step.announcements(name),
                Tail::Acks(label) => step.acks(label.as_deref()),
                Tail::Errors => step.errors(),
            };
            built.unwrap()
        })
    }

    #[derive(Debug, Clone)]
    enum GroupChoice {
        Things(Channel),
        Policies,
        Connections,
    }

    #[derive(Debug, Clone)]
    enum Tail {
        Command(Action),
        Event(Action),
        Search(SearchAction),
        Message(String),
        Announcement(String),
        Acks(Option<String>),
        Errors,
    }

    proptest! {
        #[test]
        fn string_form_roundtrips(topic in arb_descriptor()) {
            let parsed = TopicDescriptor::parse(&topic.to_string()).unwrap();
            prop_assert_eq!(parsed, topic);
        }
    }
}
