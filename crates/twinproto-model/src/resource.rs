//! ---
//! tp_section: "02-protocol-data-model"
//! tp_subsection: "module"
//! tp_type: "source"
//! tp_scope: "code"
//! tp_description: "Protocol data model shared by adapters and transports."
//! tp_version: "v0.0.0-prealpha"
//! tp_owner: "tbd"
//! ---
//! Addressable sub-resources of a thing.
//!
//! [`ThingResource::from_path`] and [`ThingResource::path`] form the
//! translation table between resource paths and aspects; every adapter
//! resolves paths through it so unknown paths are rejected in one place.
use serde_json::Value as JsonValue;
use strum::{AsRefStr, Display, EnumIter};

use crate::pointer::JsonPointer;

/// Top-level JSON keys of a thing.
pub mod fields {
    /// Thing id field.
    pub const THING_ID: &str = "thingId";
    /// Policy id field.
    pub const POLICY_ID: &str = "policyId";
    /// Thing definition field.
    pub const DEFINITION: &str = "definition";
    /// Attributes object.
    pub const ATTRIBUTES: &str = "attributes";
    /// Features object.
    pub const FEATURES: &str = "features";
    /// Feature properties.
    pub const PROPERTIES: &str = "properties";
    /// Feature desired properties.
    pub const DESIRED_PROPERTIES: &str = "desiredProperties";
    /// Inline policy on thing creation.
    pub const INLINE_POLICY: &str = "_policy";
    /// Policy to copy on thing creation.
    pub const COPY_POLICY_FROM: &str = "_copyPolicyFrom";
}

/// Entity aspect without addressing details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter)]
#[strum(serialize_all = "camelCase")]
pub enum Aspect {
    /// Entire thing.
    Thing,
    /// Policy id.
    PolicyId,
    /// Thing definition.
    Definition,
    /// All attributes.
    Attributes,
    /// One attribute.
    Attribute,
    /// All features.
    Features,
    /// One feature.
    Feature,
    /// Definition of one feature.
    FeatureDefinition,
    /// Properties of one feature.
    FeatureProperties,
    /// One feature property.
    FeatureProperty,
    /// Desired properties of one feature.
    FeatureDesiredProperties,
    /// One desired feature property.
    FeatureDesiredProperty,
}

/// Aspect together with the feature id and leaf pointer it needs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ThingResource {
    /// `/`
    Thing,
    /// `/policyId`
    PolicyId,
    /// `/definition`
    Definition,
    /// `/attributes`
    Attributes,
    /// `/attributes/<pointer>`
    Attribute(JsonPointer),
    /// `/features`
    Features,
    /// `/features/<id>`
    Feature(String),
    /// `/features/<id>/definition`
    FeatureDefinition(String),
    /// `/features/<id>/properties`
    FeatureProperties(String),
    /// `/features/<id>/properties/<pointer>`
    FeatureProperty(String, JsonPointer),
    /// `/features/<id>/desiredProperties`
    FeatureDesiredProperties(String),
    /// `/features/<id>/desiredProperties/<pointer>`
    FeatureDesiredProperty(String, JsonPointer),
}

impl ThingResource {
    /// Resolve a resource path, `None` when no aspect owns it.
    pub fn from_path(path: &JsonPointer) -> Option<Self> {
        let segments: Vec<&str> = path.segments().collect();
        let resource = match segments.as_slice() {
            [] => Self::Thing,
            [fields::POLICY_ID] => Self::PolicyId,
            [fields::DEFINITION] => Self::Definition,
            [fields::ATTRIBUTES] => Self::Attributes,
            [fields::ATTRIBUTES, ..] => Self::Attribute(path.sub_pointer(1)),
            [fields::FEATURES] => Self::Features,
            [fields::FEATURES, id] => Self::Feature((*id).to_owned()),
            [fields::FEATURES, id, fields::DEFINITION] => Self::FeatureDefinition((*id).to_owned()),
            [fields::FEATURES, id, fields::PROPERTIES] => Self::FeatureProperties((*id).to_owned()),
            [fields::FEATURES, id, fields::PROPERTIES, ..] => {
                Self::FeatureProperty((*id).to_owned(), path.sub_pointer(3))
            }
            [fields::FEATURES, id, fields::DESIRED_PROPERTIES] => {
                Self::FeatureDesiredProperties((*id).to_owned())
            }
            [fields::FEATURES, id, fields::DESIRED_PROPERTIES, ..] => {
                Self::FeatureDesiredProperty((*id).to_owned(), path.sub_pointer(3))
            }
            _ => return None,
        };
        Some(resource)
    }

    /// Resource path of this resource.
    pub fn path(&self) -> JsonPointer {
        let feature = |id: &str| JsonPointer::from_segments([fields::FEATURES, id]);
        match self {
            Self::Thing => JsonPointer::root(),
            Self::PolicyId => JsonPointer::from_segments([fields::POLICY_ID]),
            Self::Definition => JsonPointer::from_segments([fields::DEFINITION]),
            Self::Attributes => JsonPointer::from_segments([fields::ATTRIBUTES]),
            Self::Attribute(pointer) => {
                JsonPointer::from_segments([fields::ATTRIBUTES]).join(pointer)
            }
            Self::Features => JsonPointer::from_segments([fields::FEATURES]),
            Self::Feature(id) => feature(id),
            Self::FeatureDefinition(id) => feature(id).append(fields::DEFINITION),
            Self::FeatureProperties(id) => feature(id).append(fields::PROPERTIES),
            Self::FeatureProperty(id, pointer) => {
                feature(id).append(fields::PROPERTIES).join(pointer)
            }
            Self::FeatureDesiredProperties(id) => feature(id).append(fields::DESIRED_PROPERTIES),
            Self::FeatureDesiredProperty(id, pointer) => {
                feature(id).append(fields::DESIRED_PROPERTIES).join(pointer)
            }
        }
    }

    /// Aspect of this resource.
    pub fn aspect(&self) -> Aspect {
        match self {
            Self::Thing => Aspect::Thing,
            Self::PolicyId => Aspect::PolicyId,
            Self::Definition => Aspect::Definition,
            Self::Attributes => Aspect::Attributes,
            Self::Attribute(_) => Aspect::Attribute,
            Self::Features => Aspect::Features,
            Self::Feature(_) => Aspect::Feature,
            Self::FeatureDefinition(_) => Aspect::FeatureDefinition,
            Self::FeatureProperties(_) => Aspect::FeatureProperties,
            Self::FeatureProperty(..) => Aspect::FeatureProperty,
            Self::FeatureDesiredProperties(_) => Aspect::FeatureDesiredProperties,
            Self::FeatureDesiredProperty(..) => Aspect::FeatureDesiredProperty,
        }
    }

    /// Feature id for feature-scoped resources.
    pub fn feature_id(&self) -> Option<&str> {
        match self {
            Self::Feature(id)
            | Self::FeatureDefinition(id)
            | Self::FeatureProperties(id)
            | Self::FeatureProperty(id, _)
            | Self::FeatureDesiredProperties(id)
            | Self::FeatureDesiredProperty(id, _) => Some(id),
            _ => None,
        }
    }
}

/// Bring a merge into canonical form.
///
/// While `value` is an object with exactly one key and the extended path
/// still names an aspect, the key moves from the value into the path. A
/// change expressed at the root (`{"attributes": {"a": null}}` at `/`) and
/// the same change at its leaf (`null` at `/attributes/a`) thus become equal.
pub fn normalize_merge(path: JsonPointer, value: JsonValue) -> (JsonPointer, JsonValue) {
    let mut path = path;
    let mut value = value;
    loop {
        let key = match &value {
            JsonValue::Object(object) if object.len() == 1 => object.keys().next().cloned(),
            _ => None,
        };
        let Some(key) = key else {
            return (path, value);
        };
        let deeper = path.append(key.clone());
        if ThingResource::from_path(&deeper).is_none() {
            return (path, value);
        }
        let inner = match value {
            JsonValue::Object(mut object) => object.remove(&key).unwrap_or(JsonValue::Null),
            other => other,
        };
        path = deeper;
        value = inner;
    }
}
