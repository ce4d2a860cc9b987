//! ---
//! tp_section: "04-protocol-adapters"
//! tp_subsection: "module"
//! tp_type: "source"
//! tp_scope: "code"
//! tp_description: "Signal adapters and the dispatching registry."
//! tp_version: "v0.0.0-prealpha"
//! tp_owner: "tbd"
//! ---
//! Translation between [`Adaptable`] envelopes and typed [`Signal`]s.
//!
//! One adapter per signal family implements [`Adapter`]; the
//! [`SignalAdapterRegistry`] owns them all and dispatches by signal variant
//! (outbound) or by topic criterion and action (inbound).
//!
//! [`Adaptable`]: twinproto_model::Adaptable
//! [`Signal`]: twinproto_model::Signal
#![warn(missing_docs)]

pub mod acks;
pub mod aspect;
pub mod command;
pub mod context;
pub mod error;
pub mod errors;
pub mod event;
pub mod merge;
pub mod message;
pub mod ports;
pub mod registry;
pub mod response;
pub mod search;

use twinproto_model::{Adaptable, Channel};

pub use context::AdapterContext;
pub use error::{AdapterError, Result};
pub use ports::{
    AllowListHeaderTranslator, ErrorCodeRegistry, ErrorRegistry, HeaderDirection,
    HeaderTranslator, PassThroughHeaderTranslator,
};
pub use registry::SignalAdapterRegistry;

/// Bidirectional mapping between one signal family and adaptables.
pub trait Adapter<T>: Send + Sync {
    /// Translate `signal` into an adaptable on `channel`.
    fn to_adaptable(&self, signal: &T, channel: Channel) -> Result<Adaptable>;

    /// Translate `adaptable` back into a signal of this family.
    fn from_adaptable(&self, adaptable: &Adaptable) -> Result<T>;
}
