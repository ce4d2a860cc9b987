//! ---
//! tp_section: "04-protocol-adapters"
//! tp_subsection: "module"
//! tp_type: "source"
//! tp_scope: "code"
//! tp_description: "Signal adapters and the dispatching registry."
//! tp_version: "v0.0.0-prealpha"
//! tp_owner: "tbd"
//! ---
//! Validation of inbound merge patches, shared by merge commands and merged
//! events.
//!
//! Checks run in a fixed order: a missing value first, then the thing id and
//! policy id rules, then path resolution, then the value shape.
use serde_json::Value as JsonValue;
use twinproto_model::headers::keys;
use twinproto_model::resource::fields;
use twinproto_model::signal::MergePatch;
use twinproto_model::{Adaptable, ContentType, HeaderMap, JsonPointer, ThingId, ThingResource};

use crate::aspect;
use crate::context::{require_value, resource_of};
use crate::error::{AdapterError, Result};

/// Headers of a merge signal: the merge-patch content type is always set.
pub fn merge_headers(headers: &HeaderMap) -> HeaderMap {
    headers.with(keys::CONTENT_TYPE, ContentType::MERGE_PATCH_JSON)
}

/// Validate the payload of a merge adaptable for `thing_id` and build the
/// normalised patch.
pub fn parse_patch(thing_id: &ThingId, adaptable: &Adaptable) -> Result<MergePatch> {
    let value = require_value(adaptable)?;
    let path = adaptable.payload().path();
    check_identity_fields(thing_id, path, value)?;

    let resource = resource_of(adaptable)?;
    check_shape(&resource, path, value)?;
    Ok(MergePatch::new(path.clone(), value.clone()))
}

/// Apply the inbound merge rules to an outbound patch addressing `resource`.
pub fn check_patch(thing_id: &ThingId, resource: &ThingResource, patch: &MergePatch) -> Result<()> {
    check_identity_fields(thing_id, patch.path(), patch.value())?;
    check_shape(resource, patch.path(), patch.value())
}

fn check_shape(resource: &ThingResource, path: &JsonPointer, value: &JsonValue) -> Result<()> {
    aspect::rule(resource.aspect()).check_merge_value(path, value)?;
    if *resource == ThingResource::Thing {
        check_root_members(value)?;
    }
    Ok(())
}

fn check_identity_fields(thing_id: &ThingId, path: &JsonPointer, value: &JsonValue) -> Result<()> {
    let segments: Vec<&str> = path.segments().collect();
    let (thing_field, policy_field) = match segments.as_slice() {
        [] => (value.get(fields::THING_ID), value.get(fields::POLICY_ID)),
        [fields::THING_ID] => (Some(value), None),
        [fields::POLICY_ID] => (None, Some(value)),
        _ => (None, None),
    };

    match thing_field {
        Some(JsonValue::Null) => {
            return Err(AdapterError::ThingIdNotDeletable(thing_id.to_string()))
        }
        Some(JsonValue::String(given)) if *given == thing_id.to_string() => {}
        Some(other) => {
            let given = match other {
                JsonValue::String(given) => given.clone(),
                other => other.to_string(),
            };
            return Err(AdapterError::ThingIdNotExplicitlySettable {
                expected: thing_id.to_string(),
                given,
            });
        }
        None => {}
    }
    if matches!(policy_field, Some(JsonValue::Null)) {
        return Err(AdapterError::PolicyIdNotDeletable(thing_id.to_string()));
    }
    Ok(())
}

/// Top-level members of a root merge that name an aspect must fit its shape.
fn check_root_members(value: &JsonValue) -> Result<()> {
    let Some(object) = value.as_object() else {
        return Ok(());
    };
    for (key, member) in object {
        let path = JsonPointer::from_segments([key.as_str()]);
        if let Some(resource) = ThingResource::from_path(&path) {
            aspect::rule(resource.aspect()).check_merge_value(&path, member)?;
        }
    }
    Ok(())
}
