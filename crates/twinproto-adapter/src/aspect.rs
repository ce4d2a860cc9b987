//! ---
//! tp_section: "04-protocol-adapters"
//! tp_subsection: "module"
//! tp_type: "source"
//! tp_scope: "code"
//! tp_description: "Signal adapters and the dispatching registry."
//! tp_version: "v0.0.0-prealpha"
//! tp_owner: "tbd"
//! ---
//! Aspect mapping rules: which operations each aspect supports and which
//! value shapes it accepts.
use serde_json::Value as JsonValue;
use twinproto_model::{Action, Aspect, JsonPointer};

use crate::error::{AdapterError, Result};

/// Accepted JSON shape of an aspect's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    /// JSON object.
    Object,
    /// JSON string.
    String,
    /// Non-empty array of strings.
    StringArray,
    /// Any JSON value.
    Any,
}

impl ValueShape {
    fn accepts(self, value: &JsonValue) -> bool {
        match self {
            ValueShape::Object => value.is_object(),
            ValueShape::String => value.is_string(),
            ValueShape::StringArray => value
                .as_array()
                .is_some_and(|items| !items.is_empty() && items.iter().all(JsonValue::is_string)),
            ValueShape::Any => true,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            ValueShape::Object => "a JSON object",
            ValueShape::String => "a string",
            ValueShape::StringArray => "a non-empty array of strings",
            ValueShape::Any => "any JSON value",
        }
    }
}

/// Mapping rule of one aspect.
#[derive(Debug, Clone, Copy)]
pub struct AspectRule {
    /// Aspect the rule covers.
    pub aspect: Aspect,
    /// Shape of modify values; merge values additionally accept `null`
    /// unless `deletable` is false.
    pub shape: ValueShape,
    /// Whether a merge may remove the aspect.
    pub deletable: bool,
    /// Command actions supported at this aspect.
    pub commands: &'static [Action],
    /// Event actions supported at this aspect.
    pub events: &'static [Action],
}

const RESOURCE_COMMANDS: &[Action] = &[Action::Modify, Action::Delete, Action::Retrieve, Action::Merge];
const RESOURCE_EVENTS: &[Action] = &[Action::Created, Action::Modified, Action::Deleted, Action::Merged];

const fn resource(aspect: Aspect, shape: ValueShape) -> AspectRule {
    AspectRule {
        aspect,
        shape,
        deletable: true,
        commands: RESOURCE_COMMANDS,
        events: RESOURCE_EVENTS,
    }
}

static THING: AspectRule = AspectRule {
    aspect: Aspect::Thing,
    shape: ValueShape::Object,
    deletable: false,
    commands: &[
        Action::Create,
        Action::Modify,
        Action::Delete,
        Action::Retrieve,
        Action::Merge,
        Action::Migrate,
    ],
    events: &[
        Action::Created,
        Action::Modified,
        Action::Deleted,
        Action::Merged,
        Action::Migrated,
    ],
};

static POLICY_ID: AspectRule = AspectRule {
    aspect: Aspect::PolicyId,
    shape: ValueShape::String,
    deletable: false,
    commands: &[Action::Modify, Action::Retrieve, Action::Merge],
    events: &[Action::Modified, Action::Merged],
};

static DEFINITION: AspectRule = resource(Aspect::Definition, ValueShape::String);
static ATTRIBUTES: AspectRule = resource(Aspect::Attributes, ValueShape::Object);
static ATTRIBUTE: AspectRule = resource(Aspect::Attribute, ValueShape::Any);
static FEATURES: AspectRule = resource(Aspect::Features, ValueShape::Object);
static FEATURE: AspectRule = resource(Aspect::Feature, ValueShape::Object);
static FEATURE_DEFINITION: AspectRule =
    resource(Aspect::FeatureDefinition, ValueShape::StringArray);
static FEATURE_PROPERTIES: AspectRule =
    resource(Aspect::FeatureProperties, ValueShape::Object);
static FEATURE_PROPERTY: AspectRule = resource(Aspect::FeatureProperty, ValueShape::Any);
static FEATURE_DESIRED_PROPERTIES: AspectRule =
    resource(Aspect::FeatureDesiredProperties, ValueShape::Object);
static FEATURE_DESIRED_PROPERTY: AspectRule =
    resource(Aspect::FeatureDesiredProperty, ValueShape::Any);

/// Rule of `aspect`.
pub fn rule(aspect: Aspect) -> &'static AspectRule {
    match aspect {
        Aspect::Thing => &THING,
        Aspect::PolicyId => &POLICY_ID,
        Aspect::Definition => &DEFINITION,
        Aspect::Attributes => &ATTRIBUTES,
        Aspect::Attribute => &ATTRIBUTE,
        Aspect::Features => &FEATURES,
        Aspect::Feature => &FEATURE,
        Aspect::FeatureDefinition => &FEATURE_DEFINITION,
        Aspect::FeatureProperties => &FEATURE_PROPERTIES,
        Aspect::FeatureProperty => &FEATURE_PROPERTY,
        Aspect::FeatureDesiredProperties => &FEATURE_DESIRED_PROPERTIES,
        Aspect::FeatureDesiredProperty => &FEATURE_DESIRED_PROPERTY,
    }
}

impl AspectRule {
    /// True when the command `action` is supported.
    pub fn supports_command(&self, action: Action) -> bool {
        self.commands.contains(&action)
    }

    /// True when the event `action` is supported.
    pub fn supports_event(&self, action: Action) -> bool {
        self.events.contains(&action)
    }

    /// Check the value of a modify/create at `path`.
    pub fn check_value(&self, path: &JsonPointer, value: &JsonValue) -> Result<()> {
        if self.shape.accepts(value) {
            Ok(())
        } else {
            Err(AdapterError::invalid_payload(
                path,
                format!("{} requires {}", self.aspect, self.shape.describe()),
            ))
        }
    }

    /// Check the value of a merge at `path`.
    pub fn check_merge_value(&self, path: &JsonPointer, value: &JsonValue) -> Result<()> {
        if value.is_null() && self.deletable {
            return Ok(());
        }
        self.check_value(path, value)
    }
}
