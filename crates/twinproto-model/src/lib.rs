//! ---
//! tp_section: "02-protocol-data-model"
//! tp_subsection: "module"
//! tp_type: "source"
//! tp_scope: "code"
//! tp_description: "Protocol data model shared by adapters and transports."
//! tp_version: "v0.0.0-prealpha"
//! tp_owner: "tbd"
//! ---
//! Data model of the twin protocol.
//!
//! The crate hosts the wire-level [`Adaptable`] envelope (topic, payload and
//! headers), the strongly typed [`Signal`] union it is translated into, and
//! the acknowledgement aggregate. Every type is an immutable value object;
//! translation logic lives in `twinproto-adapter`.
#![warn(missing_docs)]

pub mod ack;
pub mod adaptable;
pub mod entity;
pub mod error;
pub mod fields;
pub mod headers;
pub mod payload;
pub mod pointer;
pub mod resource;
pub mod signal;
pub mod status;
pub mod topic;

pub use ack::{AcknowledgementLabel, Acknowledgement, Acknowledgements};
pub use adaptable::Adaptable;
pub use entity::{EntityId, EntityType, ThingId};
pub use error::{ModelError, Result};
pub use fields::JsonFieldSelector;
pub use headers::{ContentType, HeaderMap};
pub use payload::Payload;
pub use pointer::JsonPointer;
pub use resource::{Aspect, ThingResource};
pub use signal::Signal;
pub use status::HttpStatus;
pub use topic::{
    Action, Channel, Criterion, Group, SearchAction, TopicBuilder, TopicDescriptor,
};

/// Schema version used when rendering JSON unless a caller asks for another.
pub const SCHEMA_VERSION: u8 = 2;
