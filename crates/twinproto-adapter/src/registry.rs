//! ---
//! tp_section: "04-protocol-adapters"
//! tp_subsection: "module"
//! tp_type: "source"
//! tp_scope: "code"
//! tp_description: "Signal adapters and the dispatching registry."
//! tp_version: "v0.0.0-prealpha"
//! tp_owner: "tbd"
//! ---
//! Dispatching registry over every family adapter.
//!
//! Outbound dispatch is an exhaustive match on [`Signal`]. Inbound dispatch
//! looks the topic up in a route table built once at construction; topics
//! without a route fail with [`AdapterError::UnknownPath`].
use std::collections::HashMap;
use std::sync::Arc;

use strum::IntoEnumIterator;
use twinproto_common::AdapterConfig;
use twinproto_logging::{log_translation, tp_debug, LogContext, TranslationDirection};
use twinproto_model::{
    Action, Adaptable, Channel, Criterion, Group, SearchAction, Signal, SCHEMA_VERSION,
};

use crate::acks::AcknowledgementAdapter;
use crate::command::CommandAdapter;
use crate::context::{unknown_path, AdapterContext};
use crate::error::Result;
use crate::errors::ErrorResponseAdapter;
use crate::event::EventAdapter;
use crate::message::MessageAdapter;
use crate::ports::{AllowListHeaderTranslator, ErrorCodeRegistry};
use crate::response::ResponseAdapter;
use crate::search::SearchAdapter;
use crate::Adapter;

/// Topic token after the criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Token {
    None,
    Action(Action),
    Search(SearchAction),
    Label,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct RouteKey {
    group: Group,
    criterion: Criterion,
    token: Token,
    response: bool,
}

impl RouteKey {
    fn of(adaptable: &Adaptable) -> Self {
        let topic = adaptable.topic();
        let token = match (topic.action(), topic.search_action(), topic.criterion()) {
            (Some(action), _, _) => Token::Action(action),
            (None, Some(action), _) => Token::Search(action),
            (None, None, Criterion::Acks) if topic.subject().is_some() => Token::Label,
            _ => Token::None,
        };
        let response = matches!(topic.criterion(), Criterion::Commands | Criterion::Messages)
            && adaptable.payload().status().is_some();
        Self {
            group: topic.group(),
            criterion: topic.criterion(),
            token,
            response,
        }
    }
}

/// Family adapter owning a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Command,
    CommandResponse,
    Event,
    Error,
    Message,
    MessageResponse,
    SearchCommand,
    SearchEvent,
    Acknowledgement,
    Acknowledgements,
}

fn route_table() -> HashMap<RouteKey, Route> {
    let mut routes = HashMap::new();
    let mut add = |group, criterion, token, response, route| {
        routes.insert(
            RouteKey {
                group,
                criterion,
                token,
                response,
            },
            route,
        );
    };

    for action in Action::iter() {
        if action.is_command() {
            add(Group::Things, Criterion::Commands, Token::Action(action), false, Route::Command);
            add(
                Group::Things,
                Criterion::Commands,
                Token::Action(action),
                true,
                Route::CommandResponse,
            );
        } else {
            add(Group::Things, Criterion::Events, Token::Action(action), false, Route::Event);
        }
    }
    add(Group::Things, Criterion::Messages, Token::None, false, Route::Message);
    add(Group::Things, Criterion::Messages, Token::None, true, Route::MessageResponse);
    for action in SearchAction::iter() {
        let route = match action {
            SearchAction::Subscribe | SearchAction::Request | SearchAction::Cancel => {
                Route::SearchCommand
            }
            SearchAction::Generated
            | SearchAction::HasNext
            | SearchAction::Complete
            | SearchAction::Failed => Route::SearchEvent,
            SearchAction::Error => continue,
        };
        add(Group::Things, Criterion::Search, Token::Search(action), false, route);
    }
    for group in Group::iter() {
        add(group, Criterion::Errors, Token::None, false, Route::Error);
        add(group, Criterion::Acks, Token::Label, false, Route::Acknowledgement);
        add(group, Criterion::Acks, Token::None, false, Route::Acknowledgements);
    }
    routes
}

/// Immutable registry translating every signal family. Safe to share across
/// threads.
#[derive(Debug, Clone)]
pub struct SignalAdapterRegistry {
    routes: Arc<HashMap<RouteKey, Route>>,
    commands: CommandAdapter,
    responses: ResponseAdapter,
    events: EventAdapter,
    errors: ErrorResponseAdapter,
    messages: MessageAdapter,
    search: SearchAdapter,
    acks: AcknowledgementAdapter,
    schema_version: u8,
}

impl Default for SignalAdapterRegistry {
    fn default() -> Self {
        Self::new(AdapterContext::default())
    }
}

impl SignalAdapterRegistry {
    /// Registry whose adapters share `ctx`.
    pub fn new(ctx: AdapterContext) -> Self {
        let registry = Self {
            routes: Arc::new(route_table()),
            commands: CommandAdapter::new(ctx.clone()),
            responses: ResponseAdapter::new(ctx.clone()),
            events: EventAdapter::new(ctx.clone()),
            errors: ErrorResponseAdapter::new(ctx.clone()),
            messages: MessageAdapter::new(ctx.clone()),
            search: SearchAdapter::new(ctx.clone()),
            acks: AcknowledgementAdapter::new(ctx),
            schema_version: SCHEMA_VERSION,
        };
        tp_debug!("signal adapter registry ready with {} routes", registry.routes.len());
        registry
    }

    /// Registry configured from the `[headers]`, `[errors]` and `[protocol]`
    /// sections.
    pub fn from_config(config: &AdapterConfig) -> Self {
        let ctx = AdapterContext::new(
            Arc::new(AllowListHeaderTranslator::from_config(&config.headers)),
            Arc::new(ErrorCodeRegistry::from_config(&config.errors)),
        );
        Self {
            schema_version: config.protocol.schema_version,
            ..Self::new(ctx)
        }
    }

    /// Schema version used when rendering acknowledgement entities.
    pub fn schema_version(&self) -> u8 {
        self.schema_version
    }

    /// Translate `signal` into an adaptable on `channel`.
    pub fn to_adaptable(&self, signal: &Signal, channel: Channel) -> Result<Adaptable> {
        let result = match signal {
            Signal::Command(s) => self.commands.to_adaptable(s, channel),
            Signal::RetrieveThings(s) => self.commands.to_adaptable(s, channel),
            Signal::CommandResponse(s) => self.responses.to_adaptable(s, channel),
            Signal::RetrieveThingsResponse(s) => self.responses.to_adaptable(s, channel),
            Signal::Event(s) => self.events.to_adaptable(s, channel),
            Signal::ErrorResponse(s) => self.errors.to_adaptable(s, channel),
            Signal::Message(s) => self.messages.to_adaptable(s, channel),
            Signal::MessageResponse(s) => self.messages.to_adaptable(s, channel),
            Signal::Search(s) => self.search.to_adaptable(s, channel),
            Signal::SearchEvent(s) => self.search.to_adaptable(s, channel),
            Signal::Acknowledgement(s) => self.acks.to_adaptable(s, channel),
            Signal::Acknowledgements(s) => self.acks.to_adaptable(s, channel),
        };

        let topic = result.as_ref().ok().map(|adaptable| adaptable.topic().to_string());
        let mut ctx = LogContext::new().with_signal(signal.kind());
        if let Some(correlation_id) = signal.correlation_id() {
            ctx = ctx.with_correlation_id(correlation_id);
        }
        if let Some(topic) = topic.as_deref() {
            ctx = ctx.with_topic(topic);
        }
        log_translation(
            Some(&ctx),
            TranslationDirection::ToAdaptable,
            result.as_ref().err().map(|err| err as &dyn std::fmt::Display),
        );
        result
    }

    /// Translate `signal` on the channel its headers declare.
    pub fn to_adaptable_on_own_channel(&self, signal: &Signal) -> Result<Adaptable> {
        self.to_adaptable(signal, signal.headers().channel())
    }

    /// Translate `adaptable` into the signal its topic and payload describe.
    pub fn from_adaptable(&self, adaptable: &Adaptable) -> Result<Signal> {
        let result = self.dispatch(adaptable);

        let topic = adaptable.topic().to_string();
        let mut ctx = LogContext::new().with_topic(&topic);
        if let Some(correlation_id) = adaptable.headers().correlation_id() {
            ctx = ctx.with_correlation_id(correlation_id);
        }
        if let Ok(signal) = &result {
            ctx = ctx.with_signal(signal.kind());
        }
        log_translation(
            Some(&ctx),
            TranslationDirection::FromAdaptable,
            result.as_ref().err().map(|err| err as &dyn std::fmt::Display),
        );
        result
    }

    fn dispatch(&self, adaptable: &Adaptable) -> Result<Signal> {
        let route = self
            .routes
            .get(&RouteKey::of(adaptable))
            .copied()
            .ok_or_else(|| unknown_path(adaptable))?;
        let multi_thing = adaptable.topic().action() == Some(Action::Retrieve)
            && adaptable.topic().is_placeholder_name();

        let signal = match route {
            Route::Command if multi_thing => {
                Signal::RetrieveThings(self.commands.from_adaptable(adaptable)?)
            }
            Route::Command => Signal::Command(self.commands.from_adaptable(adaptable)?),
            Route::CommandResponse if multi_thing => {
                Signal::RetrieveThingsResponse(self.responses.from_adaptable(adaptable)?)
            }
            Route::CommandResponse => {
                Signal::CommandResponse(self.responses.from_adaptable(adaptable)?)
            }
            Route::Event => Signal::Event(self.events.from_adaptable(adaptable)?),
            Route::Error => Signal::ErrorResponse(self.errors.from_adaptable(adaptable)?),
            Route::Message => Signal::Message(self.messages.from_adaptable(adaptable)?),
            Route::MessageResponse => {
                Signal::MessageResponse(self.messages.from_adaptable(adaptable)?)
            }
            Route::SearchCommand => Signal::Search(self.search.from_adaptable(adaptable)?),
            Route::SearchEvent => Signal::SearchEvent(self.search.from_adaptable(adaptable)?),
            Route::Acknowledgement => {
                Signal::Acknowledgement(self.acks.from_adaptable(adaptable)?)
            }
            Route::Acknowledgements => {
                Signal::Acknowledgements(self.acks.from_adaptable(adaptable)?)
            }
        };
        Ok(signal)
    }
}
