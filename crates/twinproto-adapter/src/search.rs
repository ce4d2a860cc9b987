//! ---
//! tp_section: "04-protocol-adapters"
//! tp_subsection: "module"
//! tp_type: "source"
//! tp_scope: "code"
//! tp_description: "Signal adapters and the dispatching registry."
//! tp_version: "v0.0.0-prealpha"
//! tp_owner: "tbd"
//! ---
//! Search subscription protocol on `_/_/things/twin/search/<action>`.
use serde_json::{Map, Value as JsonValue};
use twinproto_model::signal::{SearchCommand, SearchCommandKind, SearchEvent, SearchEventKind};
use twinproto_model::topic::WILDCARD_NAMESPACE;
use twinproto_model::{
    Adaptable, Channel, Criterion, HeaderMap, JsonPointer, Payload, SearchAction,
    TopicDescriptor,
};

use crate::context::{require_value, str_field, unknown_path, AdapterContext};
use crate::error::{AdapterError, Result};
use crate::Adapter;

const SUBSCRIPTION_ID: &str = "subscriptionId";
const FILTER: &str = "filter";
const OPTIONS: &str = "options";
const NAMESPACES: &str = "namespaces";
const DEMAND: &str = "demand";
const ITEMS: &str = "items";
const ERROR: &str = "error";

/// Maps [`SearchCommand`] and [`SearchEvent`].
#[derive(Debug, Clone, Default)]
pub struct SearchAdapter {
    ctx: AdapterContext,
}

impl SearchAdapter {
    /// Adapter using `ctx`.
    pub fn new(ctx: AdapterContext) -> Self {
        Self { ctx }
    }

    fn adaptable(
        &self,
        action: SearchAction,
        payload: Payload,
        headers: &HeaderMap,
    ) -> Result<Adaptable> {
        let topic = TopicDescriptor::builder(WILDCARD_NAMESPACE)
            .things()
            .twin()
            .search(action)?;
        Ok(Adaptable::new(
            topic,
            payload,
            self.ctx.outbound_headers(headers, Channel::Twin),
        ))
    }
}

fn search_action(adaptable: &Adaptable) -> Result<SearchAction> {
    match (adaptable.topic().criterion(), adaptable.topic().search_action()) {
        (Criterion::Search, Some(action)) => Ok(action),
        _ => Err(unknown_path(adaptable)),
    }
}

fn subscription(subscription_id: &str) -> Map<String, JsonValue> {
    let mut value = Map::new();
    value.insert(SUBSCRIPTION_ID.into(), subscription_id.into());
    value
}

fn optional_string(
    value: &JsonValue,
    key: &'static str,
    adaptable: &Adaptable,
) -> Result<Option<String>> {
    match value.get(key) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(text)) => Ok(Some(text.clone())),
        Some(_) => Err(AdapterError::invalid_payload(
            adaptable.payload().path(),
            format!("'{key}' must be a string"),
        )),
    }
}

impl Adapter<SearchCommand> for SearchAdapter {
    fn to_adaptable(&self, command: &SearchCommand, _channel: Channel) -> Result<Adaptable> {
        let mut payload = Payload::new(JsonPointer::root());
        let value = match &command.kind {
            SearchCommandKind::CreateSubscription {
                filter,
                options,
                namespaces,
                fields,
            } => {
                let mut value = Map::new();
                if let Some(filter) = filter {
                    value.insert(FILTER.into(), filter.as_str().into());
                }
                if let Some(options) = options {
                    value.insert(OPTIONS.into(), options.as_str().into());
                }
                if let Some(namespaces) = namespaces {
                    value.insert(NAMESPACES.into(), namespaces.clone().into());
                }
                payload = payload.with_fields(fields.clone());
                value
            }
            SearchCommandKind::RequestFromSubscription {
                subscription_id,
                demand,
            } => {
                let mut value = subscription(subscription_id);
                value.insert(DEMAND.into(), (*demand).into());
                value
            }
            SearchCommandKind::CancelSubscription { subscription_id } => {
                subscription(subscription_id)
            }
        };
        let payload = payload.with_value(JsonValue::Object(value));
        self.adaptable(command.kind.action(), payload, &command.headers)
    }

    fn from_adaptable(&self, adaptable: &Adaptable) -> Result<SearchCommand> {
        let action = search_action(adaptable)?;
        let empty = JsonValue::Object(Map::new());
        let kind = match action {
            SearchAction::Subscribe => {
                let value = adaptable.payload().value().unwrap_or(&empty);
                let namespaces = match value.get(NAMESPACES) {
                    None | Some(JsonValue::Null) => None,
                    Some(JsonValue::Array(items)) => Some(
                        items
                            .iter()
                            .map(|item| {
                                item.as_str().map(str::to_owned).ok_or_else(|| {
                                    AdapterError::invalid_payload(
                                        adaptable.payload().path(),
                                        "namespaces must be strings",
                                    )
                                })
                            })
                            .collect::<Result<Vec<_>>>()?,
                    ),
                    Some(_) => {
                        return Err(AdapterError::invalid_payload(
                            adaptable.payload().path(),
                            "namespaces must be an array",
                        ))
                    }
                };
                SearchCommandKind::CreateSubscription {
                    filter: optional_string(value, FILTER, adaptable)?,
                    options: optional_string(value, OPTIONS, adaptable)?,
                    namespaces,
                    fields: adaptable.payload().fields().cloned(),
                }
            }
            SearchAction::Request => {
                let value = require_value(adaptable)?;
                SearchCommandKind::RequestFromSubscription {
                    subscription_id: str_field(value, SUBSCRIPTION_ID)?.to_owned(),
                    demand: value
                        .get(DEMAND)
                        .and_then(JsonValue::as_u64)
                        .ok_or(AdapterError::MissingField(DEMAND))?,
                }
            }
            SearchAction::Cancel => SearchCommandKind::CancelSubscription {
                subscription_id: str_field(require_value(adaptable)?, SUBSCRIPTION_ID)?.to_owned(),
            },
            _ => return Err(unknown_path(adaptable)),
        };
        Ok(SearchCommand::new(kind, self.ctx.inbound_headers(adaptable)))
    }
}

impl Adapter<SearchEvent> for SearchAdapter {
    fn to_adaptable(&self, event: &SearchEvent, _channel: Channel) -> Result<Adaptable> {
        let mut value = subscription(event.kind.subscription_id());
        match &event.kind {
            SearchEventKind::HasNextPage { items, .. } => {
                value.insert(ITEMS.into(), JsonValue::Array(items.clone()));
            }
            SearchEventKind::Failed { error, .. } => {
                value.insert(ERROR.into(), error.to_json());
            }
            SearchEventKind::Created { .. } | SearchEventKind::Complete { .. } => {}
        }
        let payload = Payload::new(JsonPointer::root()).with_value(JsonValue::Object(value));
        self.adaptable(event.kind.action(), payload, &event.headers)
    }

    fn from_adaptable(&self, adaptable: &Adaptable) -> Result<SearchEvent> {
        let action = search_action(adaptable)?;
        let value = require_value(adaptable)?;
        let subscription_id = str_field(value, SUBSCRIPTION_ID)?.to_owned();
        let headers = self.ctx.inbound_headers(adaptable);
        let kind = match action {
            SearchAction::Generated => SearchEventKind::Created { subscription_id },
            SearchAction::Complete => SearchEventKind::Complete { subscription_id },
            SearchAction::HasNext => SearchEventKind::HasNextPage {
                subscription_id,
                items: value
                    .get(ITEMS)
                    .and_then(JsonValue::as_array)
                    .cloned()
                    .ok_or(AdapterError::MissingField(ITEMS))?,
            },
            SearchAction::Failed => {
                let body = value.get(ERROR).ok_or(AdapterError::MissingField(ERROR))?;
                let code = str_field(body, ERROR)?;
                SearchEventKind::Failed {
                    subscription_id,
                    error: self.ctx.error_registry().resolve(code, body, &headers),
                }
            }
            _ => return Err(unknown_path(adaptable)),
        };
        Ok(SearchEvent::new(kind, headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use twinproto_model::signal::TypedError;
    use twinproto_model::{HttpStatus, JsonFieldSelector};

    #[test]
    fn subscribe_roundtrip() {
        let command = SearchCommand::new(
            SearchCommandKind::CreateSubscription {
                filter: Some("eq(attributes/room,\"kitchen\")".into()),
                options: Some("size(10)".into()),
                namespaces: Some(vec!["org.acme".into()]),
                fields: Some(JsonFieldSelector::parse("thingId,attributes").unwrap()),
            },
            HeaderMap::new(),
        );
        let adapter = SearchAdapter::default();
        let adaptable = adapter.to_adaptable(&command, Channel::Live).unwrap();
        assert_eq!(
            adaptable.topic().to_string(),
            "_/_/things/twin/search/subscribe"
        );
        let back: SearchCommand = adapter.from_adaptable(&adaptable).unwrap();
        assert_eq!(back, command);
    }

    #[test]
    fn request_and_cancel() {
        let adapter = SearchAdapter::default();
        for kind in [
            SearchCommandKind::RequestFromSubscription {
                subscription_id: "sub-1".into(),
                demand: 3,
            },
            SearchCommandKind::CancelSubscription {
                subscription_id: "sub-1".into(),
            },
        ] {
            let command = SearchCommand::new(kind, HeaderMap::new());
            let adaptable = adapter.to_adaptable(&command, Channel::Twin).unwrap();
            let back: SearchCommand = adapter.from_adaptable(&adaptable).unwrap();
            assert_eq!(back, command);
        }
    }

    #[test]
    fn events_roundtrip() {
        let adapter = SearchAdapter::default();
        let failure = TypedError::new(
            "things:search.subscription.failed",
            HttpStatus::BAD_REQUEST,
            "invalid filter",
        );
        for kind in [
            SearchEventKind::Created {
                subscription_id: "sub-1".into(),
            },
            SearchEventKind::HasNextPage {
                subscription_id: "sub-1".into(),
                items: vec![json!({"thingId": "org.acme:lamp"})],
            },
            SearchEventKind::Complete {
                subscription_id: "sub-1".into(),
            },
            SearchEventKind::Failed {
                subscription_id: "sub-1".into(),
                error: failure.clone(),
            },
        ] {
            let event = SearchEvent::new(kind, HeaderMap::new());
            let adaptable = adapter.to_adaptable(&event, Channel::Twin).unwrap();
            let back: SearchEvent = adapter.from_adaptable(&adaptable).unwrap();
            assert_eq!(back, event);
        }
    }

    #[test]
    fn error_action_is_not_routed() {
        let topic = TopicDescriptor::parse("_/_/things/twin/search/error").unwrap();
        let adaptable = Adaptable::new(
            topic,
            Payload::new(JsonPointer::root()).with_value(json!({"subscriptionId": "sub-1"})),
            HeaderMap::new(),
        );
        let result: Result<SearchEvent> = SearchAdapter::default().from_adaptable(&adaptable);
        assert!(matches!(result, Err(AdapterError::UnknownPath { .. })));
    }
}
