// Core shipment types

use crate::workflows::Step;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Opaque, stable shipment identifier assigned by the shipment service.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShipmentId(String);

impl ShipmentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShipmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ShipmentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ShipmentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A tracked shipment as the engine sees it.
///
/// Flags are already normalized to `bool`; see [`crate::service::ShipmentRecord`]
/// for the wire form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shipment {
    pub id: ShipmentId,
    /// The step the backend considers active. `None` means nothing has begun.
    pub workflow_pointer: Option<Step>,
    completion: [bool; 6],
    comments: BTreeMap<Step, String>,
}

impl Shipment {
    /// A freshly created shipment: pointer on the first step, nothing done.
    pub fn new(id: impl Into<ShipmentId>) -> Self {
        Self {
            id: id.into(),
            workflow_pointer: Some(Step::FIRST),
            completion: [false; 6],
            comments: BTreeMap::new(),
        }
    }

    /// A shipment with no pointer at all.
    pub fn unstarted(id: impl Into<ShipmentId>) -> Self {
        Self {
            workflow_pointer: None,
            ..Self::new(id)
        }
    }

    pub fn with_pointer(mut self, pointer: Option<Step>) -> Self {
        self.workflow_pointer = pointer;
        self
    }

    pub fn with_completed(mut self, step: Step) -> Self {
        self.set_completed(step, true);
        self
    }

    pub fn with_comment(mut self, step: Step, text: &str) -> Self {
        self.set_comment(step, text);
        self
    }

    pub fn is_completed(&self, step: Step) -> bool {
        self.completion[step.position()]
    }

    pub fn set_completed(&mut self, step: Step, completed: bool) {
        self.completion[step.position()] = completed;
    }

    /// The step's comment, if present and not blank.
    pub fn comment(&self, step: Step) -> Option<&str> {
        self.comments
            .get(&step)
            .map(String::as_str)
            .filter(|text| !text.trim().is_empty())
    }

    pub fn has_comment(&self, step: Step) -> bool {
        self.comment(step).is_some()
    }

    /// Blank text clears the comment.
    pub fn set_comment(&mut self, step: Step, text: &str) {
        if text.trim().is_empty() {
            self.comments.remove(&step);
        } else {
            self.comments.insert(step, text.to_string());
        }
    }

    pub fn clear_comment(&mut self, step: Step) {
        self.comments.remove(&step);
    }

    pub fn comments(&self) -> impl Iterator<Item = (Step, &str)> {
        self.comments.iter().map(|(step, text)| (*step, text.as_str()))
    }
}

/// Normalize the backend's many encodings of a completion flag.
///
/// `true`, `"true"` (any case), `1` and `"1"` are truthy; everything else,
/// including `null` and unexpected types, is not.
pub fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64() == Some(1.0),
        serde_json::Value::String(s) => {
            let s = s.trim();
            s == "1" || s.eq_ignore_ascii_case("true")
        }
        _ => false,
    }
}
