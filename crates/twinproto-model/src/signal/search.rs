//! ---
//! tp_section: "02-protocol-data-model"
//! tp_subsection: "module"
//! tp_type: "source"
//! tp_scope: "code"
//! tp_description: "Protocol data model shared by adapters and transports."
//! tp_version: "v0.0.0-prealpha"
//! tp_owner: "tbd"
//! ---
use serde_json::Value as JsonValue;

use crate::fields::JsonFieldSelector;
use crate::headers::HeaderMap;
use crate::topic::SearchAction;

use super::error::TypedError;

/// Command of the search subscription protocol.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchCommand {
    /// Operation and its data.
    pub kind: SearchCommandKind,
    /// Headers.
    pub headers: HeaderMap,
}

/// Operation of a [`SearchCommand`].
#[derive(Debug, Clone, PartialEq)]
pub enum SearchCommandKind {
    /// Open a subscription.
    CreateSubscription {
        /// RQL filter.
        filter: Option<String>,
        /// Sort and size options.
        options: Option<String>,
        /// Namespaces to search in.
        namespaces: Option<Vec<String>>,
        /// Fields returned per item.
        fields: Option<JsonFieldSelector>,
    },
    /// Request more pages.
    RequestFromSubscription {
        /// Subscription.
        subscription_id: String,
        /// Number of pages requested.
        demand: u64,
    },
    /// Close a subscription.
    CancelSubscription {
        /// Subscription.
        subscription_id: String,
    },
}

impl SearchCommandKind {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            SearchCommandKind::CreateSubscription { .. } => "createSubscription",
            SearchCommandKind::RequestFromSubscription { .. } => "requestFromSubscription",
            SearchCommandKind::CancelSubscription { .. } => "cancelSubscription",
        }
    }

    /// Topic search action.
    pub fn action(&self) -> SearchAction {
        match self {
            SearchCommandKind::CreateSubscription { .. } => SearchAction::Subscribe,
            SearchCommandKind::RequestFromSubscription { .. } => SearchAction::Request,
            SearchCommandKind::CancelSubscription { .. } => SearchAction::Cancel,
        }
    }
}

impl SearchCommand {
    /// Wrap an operation.
    pub fn new(kind: SearchCommandKind, headers: HeaderMap) -> Self {
        Self { kind, headers }
    }
}

/// Event of the search subscription protocol.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchEvent {
    /// Event and its data.
    pub kind: SearchEventKind,
    /// Headers.
    pub headers: HeaderMap,
}

/// Kind of a [`SearchEvent`].
#[derive(Debug, Clone, PartialEq)]
pub enum SearchEventKind {
    /// Subscription opened.
    Created {
        /// Subscription.
        subscription_id: String,
    },
    /// One page of results.
    HasNextPage {
        /// Subscription.
        subscription_id: String,
        /// Items of the page.
        items: Vec<JsonValue>,
    },
    /// No more results.
    Complete {
        /// Subscription.
        subscription_id: String,
    },
    /// Subscription aborted.
    Failed {
        /// Subscription.
        subscription_id: String,
        /// Cause.
        error: TypedError,
    },
}

impl SearchEventKind {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            SearchEventKind::Created { .. } => "subscriptionCreated",
            SearchEventKind::HasNextPage { .. } => "subscriptionHasNextPage",
            SearchEventKind::Complete { .. } => "subscriptionComplete",
            SearchEventKind::Failed { .. } => "subscriptionFailed",
        }
    }

    /// Topic search action.
    pub fn action(&self) -> SearchAction {
        match self {
            SearchEventKind::Created { .. } => SearchAction::Generated,
            SearchEventKind::HasNextPage { .. } => SearchAction::HasNext,
            SearchEventKind::Complete { .. } => SearchAction::Complete,
            SearchEventKind::Failed { .. } => SearchAction::Failed,
        }
    }

    /// Subscription the event belongs to.
    pub fn subscription_id(&self) -> &str {
        match self {
            SearchEventKind::Created { subscription_id }
            | SearchEventKind::HasNextPage {
                subscription_id, ..
            }
            | SearchEventKind::Complete { subscription_id }
            | SearchEventKind::Failed {
                subscription_id, ..
            } => subscription_id,
        }
    }
}

impl SearchEvent {
    /// Wrap an event.
    pub fn new(kind: SearchEventKind, headers: HeaderMap) -> Self {
        Self { kind, headers }
    }
}
