//! ---
//! tp_section: "02-protocol-data-model"
//! tp_subsection: "module"
//! tp_type: "source"
//! tp_scope: "code"
//! tp_description: "Protocol data model shared by adapters and transports."
//! tp_version: "v0.0.0-prealpha"
//! tp_owner: "tbd"
//! ---
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use crate::entity::ThingId;
use crate::headers::{keys, ContentType, HeaderMap};
use crate::pointer::JsonPointer;
use crate::resource::ThingResource;

use super::command::MergePatch;

/// Persisted change of a thing.
#[derive(Debug, Clone, PartialEq)]
pub struct ThingEvent {
    /// Changed thing.
    pub thing_id: ThingId,
    /// Change and its data.
    pub kind: ThingEventKind,
    /// Revision of the thing after the change.
    pub revision: u64,
    /// When the change happened.
    pub timestamp: Option<DateTime<Utc>>,
    /// Metadata attached to the change.
    pub metadata: Option<JsonValue>,
    /// Headers.
    pub headers: HeaderMap,
}

/// Change carried by a [`ThingEvent`].
#[derive(Debug, Clone, PartialEq)]
pub enum ThingEventKind {
    /// Resource created.
    Created {
        /// Created resource.
        resource: ThingResource,
        /// Its value.
        value: JsonValue,
    },
    /// Resource replaced.
    Modified {
        /// Replaced resource.
        resource: ThingResource,
        /// New value.
        value: JsonValue,
    },
    /// Resource deleted.
    Deleted {
        /// Deleted resource.
        resource: ThingResource,
    },
    /// Merge patch applied.
    Merged(MergePatch),
    /// Thing migrated to another definition.
    DefinitionMigrated {
        /// Thing after migration.
        thing: JsonValue,
    },
}

impl ThingEventKind {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            ThingEventKind::Created { .. } => "created",
            ThingEventKind::Modified { .. } => "modified",
            ThingEventKind::Deleted { .. } => "deleted",
            ThingEventKind::Merged(_) => "thingMerged",
            ThingEventKind::DefinitionMigrated { .. } => "thingDefinitionMigrated",
        }
    }

    /// Path addressed by the event.
    pub fn path(&self) -> JsonPointer {
        match self {
            ThingEventKind::Created { resource, .. }
            | ThingEventKind::Modified { resource, .. }
            | ThingEventKind::Deleted { resource } => resource.path(),
            ThingEventKind::Merged(patch) => patch.path().clone(),
            ThingEventKind::DefinitionMigrated { .. } => JsonPointer::root(),
        }
    }
}

impl ThingEvent {
    /// Event at `revision` without timestamp or metadata.
    pub fn new(thing_id: ThingId, kind: ThingEventKind, revision: u64, headers: HeaderMap) -> Self {
        Self {
            thing_id,
            kind,
            revision,
            timestamp: None,
            metadata: None,
            headers,
        }
    }

    /// Merged event; the patch is normalised like a merge command and the
    /// merge-patch content type is set on the headers.
    pub fn merged(
        thing_id: ThingId,
        path: JsonPointer,
        value: JsonValue,
        revision: u64,
        headers: HeaderMap,
    ) -> Self {
        Self::new(
            thing_id,
            ThingEventKind::Merged(MergePatch::new(path, value)),
            revision,
            headers.with(keys::CONTENT_TYPE, ContentType::MERGE_PATCH_JSON),
        )
    }

    /// Set the timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Set the metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: JsonValue) -> Self {
        self.metadata = Some(metadata);
        self
    }
}
