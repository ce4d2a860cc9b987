//! ---
//! tp_section: "02-protocol-data-model"
//! tp_subsection: "module"
//! tp_type: "source"
//! tp_scope: "code"
//! tp_description: "Protocol data model shared by adapters and transports."
//! tp_version: "v0.0.0-prealpha"
//! tp_owner: "tbd"
//! ---
//! Strongly typed signals.
//!
//! [`Signal`] is a closed union; adding a variant forces every dispatcher to
//! handle it. Headers are replaced wholesale through `with_headers`.
pub mod command;
pub mod error;
pub mod event;
pub mod message;
pub mod response;
pub mod search;

pub use command::{
    CreateThing, MergePatch, MigrateThingDefinition, RetrieveThings, ThingCommand,
    ThingCommandKind,
};
pub use error::{ErrorResponse, TypedError};
pub use event::{ThingEvent, ThingEventKind};
pub use message::{Message, MessageCommand, MessageCommandResponse, MessageDirection, MessagePayload};
pub use response::{MergeStatus, RetrieveThingsResponse, ThingCommandResponse, ThingResponseKind};
pub use search::{SearchCommand, SearchCommandKind, SearchEvent, SearchEventKind};

use crate::ack::{Acknowledgement, Acknowledgements};
use crate::headers::HeaderMap;

/// Header accessors shared by every signal struct carrying a `headers` field.
macro_rules! impl_signal_headers {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $ty {
                /// Headers.
                pub fn headers(&self) -> &$crate::headers::HeaderMap {
                    &self.headers
                }

                /// Copy with the headers replaced.
                #[must_use]
                pub fn with_headers(&self, headers: $crate::headers::HeaderMap) -> Self {
                    Self {
                        headers,
                        ..self.clone()
                    }
                }
            }
        )+
    };
}

impl_signal_headers!(
    ThingCommand,
    RetrieveThings,
    ThingCommandResponse,
    RetrieveThingsResponse,
    ThingEvent,
    ErrorResponse,
    SearchCommand,
    SearchEvent,
);

/// Every message kind the protocol translates.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// Command on a single thing.
    Command(ThingCommand),
    /// Retrieve several things at once.
    RetrieveThings(RetrieveThings),
    /// Response to a thing command.
    CommandResponse(ThingCommandResponse),
    /// Response to [`RetrieveThings`].
    RetrieveThingsResponse(RetrieveThingsResponse),
    /// Thing event.
    Event(ThingEvent),
    /// Error reply.
    ErrorResponse(ErrorResponse),
    /// Live message to or from a thing.
    Message(MessageCommand),
    /// Response to a live message.
    MessageResponse(MessageCommandResponse),
    /// Search subscription command.
    Search(SearchCommand),
    /// Search subscription event.
    SearchEvent(SearchEvent),
    /// Single acknowledgement.
    Acknowledgement(Acknowledgement),
    /// Aggregated acknowledgements.
    Acknowledgements(Acknowledgements),
}

impl Signal {
    /// Short kind name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Signal::Command(command) => command.kind.name(),
            Signal::RetrieveThings(_) => "retrieveThings",
            Signal::CommandResponse(response) => response.kind.name(),
            Signal::RetrieveThingsResponse(_) => "retrieveThingsResponse",
            Signal::Event(event) => event.kind.name(),
            Signal::ErrorResponse(_) => "errorResponse",
            Signal::Message(_) => "message",
            Signal::MessageResponse(_) => "messageResponse",
            Signal::Search(search) => search.kind.name(),
            Signal::SearchEvent(event) => event.kind.name(),
            Signal::Acknowledgement(_) => "acknowledgement",
            Signal::Acknowledgements(_) => "acknowledgements",
        }
    }

    /// Headers of the wrapped signal.
    pub fn headers(&self) -> &HeaderMap {
        match self {
            Signal::Command(s) => s.headers(),
            Signal::RetrieveThings(s) => s.headers(),
            Signal::CommandResponse(s) => s.headers(),
            Signal::RetrieveThingsResponse(s) => s.headers(),
            Signal::Event(s) => s.headers(),
            Signal::ErrorResponse(s) => s.headers(),
            Signal::Message(s) => s.message.headers(),
            Signal::MessageResponse(s) => s.message.headers(),
            Signal::Search(s) => s.headers(),
            Signal::SearchEvent(s) => s.headers(),
            Signal::Acknowledgement(s) => s.headers(),
            Signal::Acknowledgements(s) => s.headers(),
        }
    }

    /// Copy with the headers of the wrapped signal replaced.
    #[must_use]
    pub fn with_headers(&self, headers: HeaderMap) -> Self {
        match self {
            Signal::Command(s) => Signal::Command(s.with_headers(headers)),
            Signal::RetrieveThings(s) => Signal::RetrieveThings(s.with_headers(headers)),
            Signal::CommandResponse(s) => Signal::CommandResponse(s.with_headers(headers)),
            Signal::RetrieveThingsResponse(s) => {
                Signal::RetrieveThingsResponse(s.with_headers(headers))
            }
            Signal::Event(s) => Signal::Event(s.with_headers(headers)),
            Signal::ErrorResponse(s) => Signal::ErrorResponse(s.with_headers(headers)),
            Signal::Message(s) => Signal::Message(MessageCommand {
                message: s.message.with_headers(headers),
            }),
            Signal::MessageResponse(s) => Signal::MessageResponse(MessageCommandResponse {
                message: s.message.with_headers(headers),
                status: s.status,
            }),
            Signal::Search(s) => Signal::Search(s.with_headers(headers)),
            Signal::SearchEvent(s) => Signal::SearchEvent(s.with_headers(headers)),
            Signal::Acknowledgement(s) => Signal::Acknowledgement(s.with_headers(headers)),
            Signal::Acknowledgements(s) => Signal::Acknowledgements(s.with_headers(headers)),
        }
    }

    /// Correlation id header, if set.
    pub fn correlation_id(&self) -> Option<&str> {
        self.headers().correlation_id()
    }
}

macro_rules! impl_from_signal {
    ($($variant:ident($ty:ty)),+ $(,)?) => {
        $(
            impl From<$ty> for Signal {
                fn from(value: $ty) -> Self {
                    Signal::$variant(value)
                }
            }
        )+
    };
}

impl_from_signal!(
    Command(ThingCommand),
    RetrieveThings(RetrieveThings),
    CommandResponse(ThingCommandResponse),
    RetrieveThingsResponse(RetrieveThingsResponse),
    Event(ThingEvent),
    ErrorResponse(ErrorResponse),
    Message(MessageCommand),
    MessageResponse(MessageCommandResponse),
    Search(SearchCommand),
    SearchEvent(SearchEvent),
    Acknowledgement(Acknowledgement),
    Acknowledgements(Acknowledgements),
);
