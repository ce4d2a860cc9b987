//! ---
//! tp_section: "02-protocol-data-model"
//! tp_subsection: "module"
//! tp_type: "source"
//! tp_scope: "code"
//! tp_description: "Protocol data model shared by adapters and transports."
//! tp_version: "v0.0.0-prealpha"
//! tp_owner: "tbd"
//! ---
use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::error::{ModelError, Result};

/// Kind of entity an identifier refers to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EntityType {
    /// Digital twin.
    Thing,
    /// Access policy.
    Policy,
    /// Connectivity connection.
    Connection,
}

/// Namespaced entity identifier rendered as `namespace:name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityId {
    entity_type: EntityType,
    namespace: String,
    name: String,
}

/// Identifier of a thing.
pub type ThingId = EntityId;

impl EntityId {
    /// Construct an identifier after validating namespace and name.
    pub fn new(
        entity_type: EntityType,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self> {
        let namespace = namespace.into();
        let name = name.into();
        validate_namespace(&namespace).map_err(|reason| ModelError::InvalidEntityId {
            id: format!("{namespace}:{name}"),
            reason,
        })?;
        validate_name(&name).map_err(|reason| ModelError::InvalidEntityId {
            id: format!("{namespace}:{name}"),
            reason,
        })?;
        Ok(Self {
            entity_type,
            namespace,
            name,
        })
    }

    /// Construct a thing identifier.
    pub fn thing(namespace: impl Into<String>, name: impl Into<String>) -> Result<Self> {
        Self::new(EntityType::Thing, namespace, name)
    }

    /// Construct a policy identifier.
    pub fn policy(namespace: impl Into<String>, name: impl Into<String>) -> Result<Self> {
        Self::new(EntityType::Policy, namespace, name)
    }

    /// Parse `namespace:name`, splitting on the first colon.
    pub fn parse(entity_type: EntityType, raw: &str) -> Result<Self> {
        let Some((namespace, name)) = raw.split_once(':') else {
            return Err(ModelError::InvalidEntityId {
                id: raw.to_owned(),
                reason: "missing ':' between namespace and name".to_owned(),
            });
        };
        Self::new(entity_type, namespace, name)
    }

    /// Parse a thing identifier.
    pub fn parse_thing(raw: &str) -> Result<Self> {
        Self::parse(EntityType::Thing, raw)
    }

    /// Entity type of this identifier.
    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    /// Namespace part.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Name part.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Same namespace and name, different entity type.
    pub fn with_type(&self, entity_type: EntityType) -> Self {
        Self {
            entity_type,
            ..self.clone()
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.name)
    }
}

fn validate_namespace(namespace: &str) -> std::result::Result<(), String> {
    if namespace.is_empty() {
        return Ok(());
    }
    for segment in namespace.split('.') {
        let mut chars = segment.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() => {}
            Some(_) => return Err(format!("namespace segment '{segment}' must start with a letter")),
            None => return Err("namespace contains an empty segment".to_owned()),
        }
        if let Some(bad) = chars.find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
            return Err(format!("namespace contains illegal character '{bad}'"));
        }
    }
    Ok(())
}

fn validate_name(name: &str) -> std::result::Result<(), String> {
    if name.is_empty() {
        return Err("name must not be empty".to_owned());
    }
    if let Some(bad) = name.chars().find(|c| *c == '/' || c.is_control()) {
        return Err(format!("name contains illegal character {bad:?}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_on_first_colon() {
        let id = EntityId::parse_thing("org.acme:sensor:42").expect("valid id");
        assert_eq!(id.namespace(), "org.acme");
        assert_eq!(id.name(), "sensor:42");
        assert_eq!(id.to_string(), "org.acme:sensor:42");
        assert_eq!(id.entity_type(), EntityType::Thing);
    }

    #[test]
    fn empty_namespace_is_allowed() {
        let id = EntityId::parse_thing(":device").expect("valid id");
        assert_eq!(id.namespace(), "");
    }

    #[test]
    fn rejects_bad_namespaces_and_names() {
        assert!(EntityId::thing("1abc", "x").is_err());
        assert!(EntityId::thing("org..acme", "x").is_err());
        assert!(EntityId::thing("org-acme", "x").is_err());
        assert!(EntityId::thing("org", "").is_err());
        assert!(EntityId::thing("org", "a/b").is_err());
        assert!(EntityId::parse_thing("no-colon").is_err());
    }

    #[test]
    fn entity_type_tokens() {
        assert_eq!(EntityType::Policy.to_string(), "policy");
        assert_eq!("thing".parse::<EntityType>().unwrap(), EntityType::Thing);
    }
}
