//! ---
//! tp_section: "04-protocol-adapters"
//! tp_subsection: "module"
//! tp_type: "source"
//! tp_scope: "code"
//! tp_description: "Signal adapters and the dispatching registry."
//! tp_version: "v0.0.0-prealpha"
//! tp_owner: "tbd"
//! ---
//! Error responses. Typed errors are rebuilt through the [`ErrorRegistry`]
//! of the context.
//!
//! [`ErrorRegistry`]: crate::ports::ErrorRegistry
use twinproto_model::signal::ErrorResponse;
use twinproto_model::topic::WILDCARD_NAMESPACE;
use twinproto_model::{Adaptable, Channel, Criterion, JsonPointer, Payload, TopicDescriptor};

use crate::context::{entity_topic, require_value, str_field, unknown_path, AdapterContext};
use crate::error::Result;
use crate::Adapter;

const ERROR: &str = "error";

/// Maps [`ErrorResponse`].
#[derive(Debug, Clone, Default)]
pub struct ErrorResponseAdapter {
    ctx: AdapterContext,
}

impl ErrorResponseAdapter {
    /// Adapter using `ctx`.
    pub fn new(ctx: AdapterContext) -> Self {
        Self { ctx }
    }
}

impl Adapter<ErrorResponse> for ErrorResponseAdapter {
    fn to_adaptable(&self, response: &ErrorResponse, channel: Channel) -> Result<Adaptable> {
        let topic = match &response.entity_id {
            Some(id) => entity_topic(id, channel).errors()?,
            None => TopicDescriptor::builder(WILDCARD_NAMESPACE)
                .things()
                .channel(channel)
                .errors()?,
        };
        let payload = Payload::new(JsonPointer::root())
            .with_value(response.error.to_json())
            .with_status(response.status());
        Ok(Adaptable::new(
            topic,
            payload,
            self.ctx.outbound_headers(&response.headers, channel),
        ))
    }

    fn from_adaptable(&self, adaptable: &Adaptable) -> Result<ErrorResponse> {
        if adaptable.topic().criterion() != Criterion::Errors {
            return Err(unknown_path(adaptable));
        }
        let body = require_value(adaptable)?;
        let code = str_field(body, ERROR)?;
        let headers = self.ctx.inbound_headers(adaptable);
        let error = self.ctx.error_registry().resolve(code, body, &headers);
        Ok(ErrorResponse::new(
            adaptable.topic().entity_id(),
            error,
            headers,
        ))
    }
}
