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
use std::str::FromStr;

use crate::error::{ModelError, Result};
use crate::pointer::JsonPointer;

/// Selection of fields requested by a retrieve operation.
///
/// Parsed from `thingId,attributes/model,features(lamp/properties,fan)`;
/// parentheses group sub-pointers under a common prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JsonFieldSelector {
    pointers: Vec<JsonPointer>,
}

impl JsonFieldSelector {
    /// Build a selector from explicit pointers.
    pub fn new(pointers: impl IntoIterator<Item = JsonPointer>) -> Self {
        Self {
            pointers: pointers.into_iter().collect(),
        }
    }

    /// Parse the comma separated string form.
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = |reason: &str| ModelError::InvalidFieldSelector {
            selector: raw.to_owned(),
            reason: reason.to_owned(),
        };
        if raw.trim().is_empty() {
            return Err(invalid("selector is empty"));
        }
        let mut pointers = Vec::new();
        for part in split_top_level(raw).map_err(|reason| invalid(&reason))? {
            expand(part.trim(), &mut pointers).map_err(|reason| invalid(&reason))?;
        }
        Ok(Self { pointers })
    }

    /// Selected pointers in declaration order.
    pub fn pointers(&self) -> &[JsonPointer] {
        &self.pointers
    }

    /// Number of selected pointers.
    pub fn len(&self) -> usize {
        self.pointers.len()
    }

    /// True when nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.pointers.is_empty()
    }
}

/// Split on commas that are not nested inside parentheses.
fn split_top_level(raw: &str) -> std::result::Result<Vec<&str>, String> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (idx, ch) in raw.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| "unbalanced ')'".to_owned())?;
            }
            ',' if depth == 0 => {
                parts.push(&raw[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err("unbalanced '('".to_owned());
    }
    parts.push(&raw[start..]);
    Ok(parts)
}

fn expand(part: &str, out: &mut Vec<JsonPointer>) -> std::result::Result<(), String> {
    if part.is_empty() {
        return Err("empty field".to_owned());
    }
    match part.find('(') {
        None => {
            let pointer = JsonPointer::parse(part).map_err(|err| err.to_string())?;
            if pointer.is_root() {
                return Err("field addresses the root".to_owned());
            }
            out.push(pointer);
        }
        Some(open) => {
            let inner = part[open + 1..]
                .strip_suffix(')')
                .ok_or_else(|| format!("'{part}' must end with ')'"))?;
            let prefix = JsonPointer::parse(&part[..open]).map_err(|err| err.to_string())?;
            let mut nested = Vec::new();
            for sub in split_top_level(inner)? {
                expand(sub.trim(), &mut nested)?;
            }
            out.extend(nested.iter().map(|pointer| prefix.join(pointer)));
        }
    }
    Ok(())
}

impl fmt::Display for JsonFieldSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, pointer) in self.pointers.iter().enumerate() {
            if idx > 0 {
                f.write_str(",")?;
            }
            write!(f, "{pointer}")?;
        }
        Ok(())
    }
}

impl FromStr for JsonFieldSelector {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
