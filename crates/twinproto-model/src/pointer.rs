//! ---
//! tp_section: "02-protocol-data-model"
//! tp_subsection: "module"
//! tp_type: "source"
//! tp_scope: "code"
//! tp_description: "Protocol data model shared by adapters and transports."
//! tp_version: "v0.0.0-prealpha"
//! tp_owner: "tbd"
//! ---
//! Resource paths into an entity.
//!
//! A [`JsonPointer`] is an ordered list of unescaped segments. The empty list
//! addresses the entity root and renders as `/`. Segment `~` and `/`
//! characters are escaped as `~0` and `~1` in the string form.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ModelError, Result};

/// JSON-Pointer-like address relative to the entity root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct JsonPointer {
    segments: Vec<String>,
}

impl JsonPointer {
    /// The entity root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a pointer from already unescaped segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse the string form. A leading slash is optional and a single
    /// trailing slash is tolerated; empty inner segments are rejected.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.strip_prefix('/').unwrap_or(raw);
        let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        let segments = trimmed
            .split('/')
            .map(|segment| {
                if segment.is_empty() {
                    Err(ModelError::invalid_pointer(raw, "empty segment"))
                } else {
                    unescape(segment).ok_or_else(|| {
                        ModelError::invalid_pointer(raw, "dangling '~' escape")
                    })
                }
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { segments })
    }

    /// Pointer with `segment` appended.
    pub fn append(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// Pointer with every segment of `other` appended.
    pub fn join(&self, other: &JsonPointer) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    /// True when this pointer addresses the entity root.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// True when `prefix` is a segment-wise prefix of this pointer.
    pub fn starts_with(&self, prefix: &JsonPointer) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Last segment, if any.
    pub fn leaf(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Segment at `index`.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.segments.get(index).map(String::as_str)
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Same as [`JsonPointer::is_root`].
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Pointer made of the segments from `start` onwards.
    pub fn sub_pointer(&self, start: usize) -> Self {
        Self {
            segments: self.segments.iter().skip(start).cloned().collect(),
        }
    }

    /// Pointer without its last segment, `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.segments.split_last()?;
        Some(Self {
            segments: rest.to_vec(),
        })
    }

    /// Iterate the unescaped segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }

    /// Wrap `value` so that it sits at this pointer inside an otherwise empty
    /// object: `/a/b` with `1` becomes `{"a":{"b":1}}`.
    pub fn wrap_value(&self, value: serde_json::Value) -> serde_json::Value {
        self.segments.iter().rev().fold(value, |inner, key| {
            let mut object = serde_json::Map::new();
            object.insert(key.clone(), inner);
            serde_json::Value::Object(object)
        })
    }
}

fn escape(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

fn unescape(segment: &str) -> Option<String> {
    let mut out = String::with_capacity(segment.len());
    let mut chars = segment.chars();
    while let Some(c) = chars.next() {
        if c == '~' {
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                _ => return None,
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{}", escape(segment))?;
        }
        Ok(())
    }
}

impl FromStr for JsonPointer {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for JsonPointer {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for JsonPointer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
