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

use crate::entity::ThingId;
use crate::fields::JsonFieldSelector;
use crate::headers::{keys, ContentType, HeaderMap};
use crate::pointer::JsonPointer;
use crate::resource::{normalize_merge, ThingResource};

/// Command addressed to one thing.
#[derive(Debug, Clone, PartialEq)]
pub struct ThingCommand {
    /// Target thing.
    pub thing_id: ThingId,
    /// Operation and its data.
    pub kind: ThingCommandKind,
    /// Headers.
    pub headers: HeaderMap,
}

/// Operation of a [`ThingCommand`].
#[derive(Debug, Clone, PartialEq)]
pub enum ThingCommandKind {
    /// Create the thing.
    Create(CreateThing),
    /// Create or replace a resource.
    Modify {
        /// Addressed resource.
        resource: ThingResource,
        /// New value.
        value: JsonValue,
    },
    /// Delete a resource.
    Delete {
        /// Addressed resource.
        resource: ThingResource,
    },
    /// Read a resource, optionally restricted to selected fields.
    Retrieve {
        /// Addressed resource.
        resource: ThingResource,
        /// Selected fields.
        fields: Option<JsonFieldSelector>,
    },
    /// Apply a JSON merge patch.
    Merge(MergePatch),
    /// Migrate the thing to another definition.
    Migrate(MigrateThingDefinition),
}

impl ThingCommandKind {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            ThingCommandKind::Create(_) => "createThing",
            ThingCommandKind::Modify { .. } => "modify",
            ThingCommandKind::Delete { .. } => "delete",
            ThingCommandKind::Retrieve { .. } => "retrieve",
            ThingCommandKind::Merge(_) => "mergeThing",
            ThingCommandKind::Migrate(_) => "migrateThingDefinition",
        }
    }

    /// Path addressed by the command.
    pub fn path(&self) -> JsonPointer {
        match self {
            ThingCommandKind::Create(_) | ThingCommandKind::Migrate(_) => JsonPointer::root(),
            ThingCommandKind::Modify { resource, .. }
            | ThingCommandKind::Delete { resource }
            | ThingCommandKind::Retrieve { resource, .. } => resource.path(),
            ThingCommandKind::Merge(patch) => patch.path().clone(),
        }
    }
}

impl ThingCommand {
    /// Command with arbitrary kind.
    pub fn new(thing_id: ThingId, kind: ThingCommandKind, headers: HeaderMap) -> Self {
        Self {
            thing_id,
            kind,
            headers,
        }
    }

    /// Create `thing`.
    pub fn create(thing_id: ThingId, create: CreateThing, headers: HeaderMap) -> Self {
        Self::new(thing_id, ThingCommandKind::Create(create), headers)
    }

    /// Modify `resource`.
    pub fn modify(
        thing_id: ThingId,
        resource: ThingResource,
        value: JsonValue,
        headers: HeaderMap,
    ) -> Self {
        Self::new(thing_id, ThingCommandKind::Modify { resource, value }, headers)
    }

    /// Delete `resource`.
    pub fn delete(thing_id: ThingId, resource: ThingResource, headers: HeaderMap) -> Self {
        Self::new(thing_id, ThingCommandKind::Delete { resource }, headers)
    }

    /// Retrieve `resource`.
    pub fn retrieve(
        thing_id: ThingId,
        resource: ThingResource,
        fields: Option<JsonFieldSelector>,
        headers: HeaderMap,
    ) -> Self {
        Self::new(
            thing_id,
            ThingCommandKind::Retrieve { resource, fields },
            headers,
        )
    }

    /// Merge `value` at `path`; the merge-patch content type is set on the
    /// headers.
    pub fn merge(thing_id: ThingId, path: JsonPointer, value: JsonValue, headers: HeaderMap) -> Self {
        Self::new(
            thing_id,
            ThingCommandKind::Merge(MergePatch::new(path, value)),
            headers.with(keys::CONTENT_TYPE, ContentType::MERGE_PATCH_JSON),
        )
    }

    /// Migrate the definition.
    pub fn migrate(
        thing_id: ThingId,
        migration: MigrateThingDefinition,
        headers: HeaderMap,
    ) -> Self {
        Self::new(thing_id, ThingCommandKind::Migrate(migration), headers)
    }
}

/// Data of a create command.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateThing {
    /// Thing JSON without the policy helpers.
    pub thing: JsonValue,
    /// Inline policy created together with the thing.
    pub initial_policy: Option<JsonValue>,
    /// Policy id (or placeholder reference) whose policy is copied.
    pub policy_id_or_placeholder: Option<String>,
}

impl CreateThing {
    /// Create `thing` without policy helpers.
    pub fn new(thing: JsonValue) -> Self {
        Self {
            thing,
            initial_policy: None,
            policy_id_or_placeholder: None,
        }
    }

    /// Attach an inline policy.
    #[must_use]
    pub fn with_initial_policy(mut self, policy: JsonValue) -> Self {
        self.initial_policy = Some(policy);
        self
    }

    /// Copy the policy of another entity.
    #[must_use]
    pub fn with_policy_copied_from(mut self, policy_id: impl Into<String>) -> Self {
        self.policy_id_or_placeholder = Some(policy_id.into());
        self
    }
}

/// Normalised merge patch shared by merge commands and merged events.
///
/// Construction moves single-key objects into the path while the path keeps
/// naming a known aspect, so root and aspect forms of one change compare
/// equal. Explicit JSON nulls are kept as deletion markers.
#[derive(Debug, Clone, PartialEq)]
pub struct MergePatch {
    path: JsonPointer,
    value: JsonValue,
}

impl MergePatch {
    /// Normalise and wrap a patch.
    pub fn new(path: JsonPointer, value: JsonValue) -> Self {
        let (path, value) = normalize_merge(path, value);
        Self { path, value }
    }

    /// Normalised path.
    pub fn path(&self) -> &JsonPointer {
        &self.path
    }

    /// Normalised value.
    pub fn value(&self) -> &JsonValue {
        &self.value
    }

    /// Patch expressed against the thing root.
    pub fn to_root_value(&self) -> JsonValue {
        self.path.wrap_value(self.value.clone())
    }
}

/// Data of a definition migration.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrateThingDefinition {
    /// URL of the target definition.
    pub thing_definition_url: String,
    /// Patch applied together with the migration.
    pub migration_payload: Option<JsonValue>,
    /// Conditions per resource path deciding whether the patch applies.
    pub patch_conditions: Option<JsonValue>,
    /// Fill properties missing in the thing from the definition's defaults.
    pub initialize_missing_properties_from_defaults: bool,
}

impl MigrateThingDefinition {
    /// Migrate to `thing_definition_url` without extra patch.
    pub fn new(thing_definition_url: impl Into<String>) -> Self {
        Self {
            thing_definition_url: thing_definition_url.into(),
            migration_payload: None,
            patch_conditions: None,
            initialize_missing_properties_from_defaults: false,
        }
    }
}

/// Retrieve several things by id.
///
/// The namespace is carried separately from the ids; a wildcard topic with
/// ids from one namespace is valid.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrieveThings {
    /// Ids to retrieve, in order.
    pub thing_ids: Vec<ThingId>,
    /// Namespace the request is scoped to, `None` for the wildcard.
    pub namespace: Option<String>,
    /// Selected fields.
    pub fields: Option<JsonFieldSelector>,
    /// Headers.
    pub headers: HeaderMap,
}

impl RetrieveThings {
    /// Retrieve `thing_ids`.
    pub fn new(thing_ids: Vec<ThingId>, headers: HeaderMap) -> Self {
        Self {
            thing_ids,
            namespace: None,
            fields: None,
            headers,
        }
    }

    /// Scope the request to a namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Restrict the returned fields.
    #[must_use]
    pub fn with_fields(mut self, fields: JsonFieldSelector) -> Self {
        self.fields = Some(fields);
        self
    }
}
