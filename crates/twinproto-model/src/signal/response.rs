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
use strum::{AsRefStr, Display, EnumString};

use crate::entity::ThingId;
use crate::headers::HeaderMap;
use crate::pointer::JsonPointer;
use crate::resource::ThingResource;
use crate::status::HttpStatus;

/// Successful response to a [`ThingCommand`](super::ThingCommand).
#[derive(Debug, Clone, PartialEq)]
pub struct ThingCommandResponse {
    /// Addressed thing.
    pub thing_id: ThingId,
    /// Outcome and its data.
    pub kind: ThingResponseKind,
    /// Headers.
    pub headers: HeaderMap,
}

/// Whether a migration was applied or only simulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MergeStatus {
    /// `APPLIED`
    Applied,
    /// `DRY_RUN`
    DryRun,
}

/// Outcome of a thing command.
#[derive(Debug, Clone, PartialEq)]
pub enum ThingResponseKind {
    /// Thing created; carries the created thing.
    Created {
        /// Created thing JSON.
        thing: JsonValue,
    },
    /// Resource modified. A value means the resource was created (201),
    /// none means it was replaced (204).
    Modified {
        /// Addressed resource.
        resource: ThingResource,
        /// Created value.
        value: Option<JsonValue>,
    },
    /// Resource deleted.
    Deleted {
        /// Addressed resource.
        resource: ThingResource,
    },
    /// Resource retrieved.
    Retrieved {
        /// Addressed resource.
        resource: ThingResource,
        /// Retrieved value.
        value: JsonValue,
    },
    /// Merge applied.
    Merged {
        /// Path the patch was applied at.
        path: JsonPointer,
    },
    /// Definition migration applied or simulated.
    Migrated {
        /// Patch that was (or would have been) merged.
        patch: JsonValue,
        /// Applied or dry run.
        merge_status: MergeStatus,
    },
}

impl ThingResponseKind {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            ThingResponseKind::Created { .. } => "createThingResponse",
            ThingResponseKind::Modified { .. } => "modifyResponse",
            ThingResponseKind::Deleted { .. } => "deleteResponse",
            ThingResponseKind::Retrieved { .. } => "retrieveResponse",
            ThingResponseKind::Merged { .. } => "mergeThingResponse",
            ThingResponseKind::Migrated { .. } => "migrateThingDefinitionResponse",
        }
    }

    /// Status implied by the outcome.
    pub fn status(&self) -> HttpStatus {
        match self {
            ThingResponseKind::Created { .. } => HttpStatus::CREATED,
            ThingResponseKind::Modified { value: Some(_), .. } => HttpStatus::CREATED,
            ThingResponseKind::Modified { value: None, .. }
            | ThingResponseKind::Deleted { .. }
            | ThingResponseKind::Merged { .. } => HttpStatus::NO_CONTENT,
            ThingResponseKind::Retrieved { .. } | ThingResponseKind::Migrated { .. } => {
                HttpStatus::OK
            }
        }
    }

    /// Path addressed by the response.
    pub fn path(&self) -> JsonPointer {
        match self {
            ThingResponseKind::Created { .. } | ThingResponseKind::Migrated { .. } => {
                JsonPointer::root()
            }
            ThingResponseKind::Modified { resource, .. }
            | ThingResponseKind::Deleted { resource }
            | ThingResponseKind::Retrieved { resource, .. } => resource.path(),
            ThingResponseKind::Merged { path } => path.clone(),
        }
    }
}

impl ThingCommandResponse {
    /// Response with arbitrary kind.
    pub fn new(thing_id: ThingId, kind: ThingResponseKind, headers: HeaderMap) -> Self {
        Self {
            thing_id,
            kind,
            headers,
        }
    }

    /// Status implied by the outcome.
    pub fn status(&self) -> HttpStatus {
        self.kind.status()
    }
}

/// Response to [`RetrieveThings`](super::RetrieveThings).
#[derive(Debug, Clone, PartialEq)]
pub struct RetrieveThingsResponse {
    /// Retrieved things, in request order.
    pub things: Vec<JsonValue>,
    /// Namespace the request was scoped to.
    pub namespace: Option<String>,
    /// Headers.
    pub headers: HeaderMap,
}

impl RetrieveThingsResponse {
    /// Response carrying `things`.
    pub fn new(things: Vec<JsonValue>, namespace: Option<String>, headers: HeaderMap) -> Self {
        Self {
            things,
            namespace,
            headers,
        }
    }

    /// Always 200.
    pub fn status(&self) -> HttpStatus {
        HttpStatus::OK
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    #[test]
    fn status_follows_outcome() {
        let created = ThingResponseKind::Modified {
            resource: ThingResource::Attributes,
            value: Some(json!({})),
        };
        let replaced = ThingResponseKind::Modified {
            resource: ThingResource::Attributes,
            value: None,
        };
        assert_eq!(created.status(), HttpStatus::CREATED);
        assert_eq!(replaced.status(), HttpStatus::NO_CONTENT);
        assert_eq!(
            ThingResponseKind::Merged {
                path: JsonPointer::root()
            }
            .status(),
            HttpStatus::NO_CONTENT
        );
    }

    #[test]
    fn merge_status_tokens() {
        assert_eq!(MergeStatus::DryRun.to_string(), "DRY_RUN");
        assert_eq!(MergeStatus::from_str("APPLIED").unwrap(), MergeStatus::Applied);
    }
}
