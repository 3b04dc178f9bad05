// Wire types exchanged with the shipment service

use crate::shipment::{is_truthy, Shipment, ShipmentId};
use crate::workflows::Step;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A shipment exactly as the service stores it.
///
/// Completion flags and the pointer are kept as raw JSON because the backend
/// encodes them inconsistently; [`ShipmentRecord::to_shipment`] normalizes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShipmentRecord {
    pub id: String,
    #[serde(default)]
    pub current_step: Value,
    #[serde(default)]
    pub add_products_completed: Value,
    #[serde(default)]
    pub label_check_completed: Value,
    #[serde(default)]
    pub formula_check_completed: Value,
    #[serde(default)]
    pub book_shipment_completed: Value,
    #[serde(default)]
    pub sort_products_completed: Value,
    #[serde(default)]
    pub sort_formulas_completed: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_check_comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula_check_comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ShipmentRecord {
    /// Record for a newly created shipment.
    pub fn new(id: impl Into<String>) -> Self {
        let mut record = Self {
            id: id.into(),
            current_step: Value::String(Step::FIRST.pointer_key().to_string()),
            updated_at: Some(Utc::now()),
            ..Default::default()
        };
        for step in Step::ALL {
            *record.flag_mut(step) = Value::Bool(false);
        }
        record
    }

    pub fn shipment_id(&self) -> ShipmentId {
        ShipmentId::new(self.id.clone())
    }

    pub fn flag(&self, step: Step) -> &Value {
        match step {
            Step::AddProducts => &self.add_products_completed,
            Step::LabelCheck => &self.label_check_completed,
            Step::FormulaCheck => &self.formula_check_completed,
            Step::BookShipment => &self.book_shipment_completed,
            Step::SortProducts => &self.sort_products_completed,
            Step::SortFormulas => &self.sort_formulas_completed,
        }
    }

    fn flag_mut(&mut self, step: Step) -> &mut Value {
        match step {
            Step::AddProducts => &mut self.add_products_completed,
            Step::LabelCheck => &mut self.label_check_completed,
            Step::FormulaCheck => &mut self.formula_check_completed,
            Step::BookShipment => &mut self.book_shipment_completed,
            Step::SortProducts => &mut self.sort_products_completed,
            Step::SortFormulas => &mut self.sort_formulas_completed,
        }
    }

    fn comment_slot_mut(&mut self, step: Step) -> Option<&mut Option<String>> {
        match step {
            Step::LabelCheck => Some(&mut self.label_check_comment),
            Step::FormulaCheck => Some(&mut self.formula_check_comment),
            _ => None,
        }
    }

    pub fn comment(&self, step: Step) -> Option<&str> {
        match step {
            Step::LabelCheck => self.label_check_comment.as_deref(),
            Step::FormulaCheck => self.formula_check_comment.as_deref(),
            _ => None,
        }
    }

    /// Normalized pointer. Missing, null or unrecognized values mean the
    /// shipment has not started.
    pub fn pointer(&self) -> Option<Step> {
        match &self.current_step {
            Value::Null => None,
            Value::String(key) if key.trim().is_empty() => None,
            Value::String(key) => {
                let step = Step::from_pointer_key(key);
                if step.is_none() {
                    tracing::warn!(
                        shipment_id = %self.id,
                        pointer = %key,
                        "Unknown workflow pointer, treating shipment as not started"
                    );
                }
                step
            }
            other => {
                tracing::warn!(
                    shipment_id = %self.id,
                    pointer = %other,
                    "Malformed workflow pointer, treating shipment as not started"
                );
                None
            }
        }
    }

    pub fn to_shipment(&self) -> Shipment {
        let mut shipment = Shipment::unstarted(self.id.as_str()).with_pointer(self.pointer());
        for step in Step::ALL {
            shipment.set_completed(step, is_truthy(self.flag(step)));
            if let Some(text) = self.comment(step) {
                shipment.set_comment(step, text);
            }
        }
        shipment
    }

    /// Apply a partial update the way the service does.
    pub fn apply_update(&mut self, update: &ShipmentUpdate) {
        for (step, completed) in &update.flags {
            *self.flag_mut(*step) = Value::Bool(*completed);
        }
        if let Some(pointer) = update.workflow_pointer {
            self.current_step = pointer
                .map(|step| Value::String(step.pointer_key().to_string()))
                .unwrap_or(Value::Null);
        }
        if let Some(note) = &update.note {
            if let Some(slot) = self.comment_slot_mut(note.step) {
                *slot = Some(note.text.clone()).filter(|text| !text.trim().is_empty());
            }
        }
        self.updated_at = Some(Utc::now());
    }
}

impl From<&Shipment> for ShipmentRecord {
    fn from(shipment: &Shipment) -> Self {
        let mut record = ShipmentRecord {
            id: shipment.id.as_str().to_string(),
            current_step: shipment
                .workflow_pointer
                .map(|step| Value::String(step.pointer_key().to_string()))
                .unwrap_or(Value::Null),
            ..Default::default()
        };
        for step in Step::ALL {
            *record.flag_mut(step) = Value::Bool(shipment.is_completed(step));
            if let (Some(slot), Some(text)) = (record.comment_slot_mut(step), shipment.comment(step)) {
                *slot = Some(text.to_string());
            }
        }
        record
    }
}

/// Free-text note attached to one step. Empty text clears the note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepNote {
    pub step: Step,
    pub text: String,
}

/// A partial update. Only the fields that are set are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShipmentUpdate {
    pub flags: BTreeMap<Step, bool>,
    /// `Some(None)` clears the pointer.
    pub workflow_pointer: Option<Option<Step>>,
    pub note: Option<StepNote>,
}

impl ShipmentUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flag(mut self, step: Step, completed: bool) -> Self {
        self.flags.insert(step, completed);
        self
    }

    pub fn pointer(mut self, pointer: Option<Step>) -> Self {
        self.workflow_pointer = Some(pointer);
        self
    }

    pub fn note(mut self, step: Step, text: impl Into<String>) -> Self {
        self.note = Some(StepNote {
            step,
            text: text.into(),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty() && self.workflow_pointer.is_none() && self.note.is_none()
    }

    /// The partial JSON body, keyed by backend field names.
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        for (step, completed) in &self.flags {
            fields.insert(step.completion_field().to_string(), Value::Bool(*completed));
        }
        if let Some(pointer) = self.workflow_pointer {
            fields.insert(
                "current_step".to_string(),
                pointer
                    .map(|step| Value::String(step.pointer_key().to_string()))
                    .unwrap_or(Value::Null),
            );
        }
        if let Some(note) = &self.note {
            fields.insert("comment".to_string(), Value::String(note.text.clone()));
            fields.insert(
                "comment_step".to_string(),
                Value::String(note.step.pointer_key().to_string()),
            );
        }
        fields
    }
}

impl Serialize for ShipmentUpdate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_fields().serialize(serializer)
    }
}

/// Convenience for building a record list from engine shipments.
pub fn records_for(shipments: &[Shipment]) -> Vec<ShipmentRecord> {
    shipments.iter().map(ShipmentRecord::from).collect()
}
