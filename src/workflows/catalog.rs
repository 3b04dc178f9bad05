// Step Catalog - the fixed fulfillment pipeline
// Pipeline order is defined here and nowhere else

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One step of the fulfillment pipeline, in pipeline order.
///
/// The discriminant is the step's position. `LabelCheck` deliberately comes
/// before `FormulaCheck`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    AddProducts = 0,
    LabelCheck = 1,
    FormulaCheck = 2,
    BookShipment = 3,
    SortProducts = 4,
    SortFormulas = 5,
}

struct StepMeta {
    display_name: &'static str,
    pointer_key: &'static str,
    completion_field: &'static str,
    comment_field: Option<&'static str>,
}

// Indexed by position
const CATALOG: [StepMeta; 6] = [
    StepMeta {
        display_name: "Add Products",
        pointer_key: "add_products",
        completion_field: "add_products_completed",
        comment_field: None,
    },
    StepMeta {
        display_name: "Label Check",
        pointer_key: "label_check",
        completion_field: "label_check_completed",
        comment_field: Some("label_check_comment"),
    },
    StepMeta {
        display_name: "Formula Check",
        pointer_key: "formula_check",
        completion_field: "formula_check_completed",
        comment_field: Some("formula_check_comment"),
    },
    StepMeta {
        display_name: "Book Shipment",
        pointer_key: "book_shipment",
        completion_field: "book_shipment_completed",
        comment_field: None,
    },
    StepMeta {
        display_name: "Sort Products",
        pointer_key: "sort_products",
        completion_field: "sort_products_completed",
        comment_field: None,
    },
    StepMeta {
        display_name: "Sort Formulas",
        pointer_key: "sort_formulas",
        completion_field: "sort_formulas_completed",
        comment_field: None,
    },
];

impl Step {
    /// Every step in pipeline order.
    pub const ALL: [Step; 6] = [
        Step::AddProducts,
        Step::LabelCheck,
        Step::FormulaCheck,
        Step::BookShipment,
        Step::SortProducts,
        Step::SortFormulas,
    ];

    /// The step a newly created shipment starts on.
    pub const FIRST: Step = Step::AddProducts;

    /// Booking acts as a routing checkpoint once completed.
    pub const CHECKPOINT: Step = Step::BookShipment;

    pub fn position(self) -> usize {
        self as usize
    }

    fn meta(self) -> &'static StepMeta {
        &CATALOG[self.position()]
    }

    pub fn display_name(self) -> &'static str {
        self.meta().display_name
    }

    /// Value used for this step in the backend's workflow pointer field.
    pub fn pointer_key(self) -> &'static str {
        self.meta().pointer_key
    }

    /// Backend field holding this step's completion flag.
    pub fn completion_field(self) -> &'static str {
        self.meta().completion_field
    }

    /// Backend field holding this step's comment, for steps that carry one.
    pub fn comment_field(self) -> Option<&'static str> {
        self.meta().comment_field
    }

    /// Only the two review steps take an operator note.
    pub fn accepts_comment(self) -> bool {
        self.comment_field().is_some()
    }

    /// Completing these steps sends the operator back to the shipment list.
    pub fn returns_to_list(self) -> bool {
        matches!(self, Step::LabelCheck | Step::FormulaCheck)
    }

    pub fn from_position(position: usize) -> Option<Step> {
        Step::ALL.get(position).copied()
    }

    /// The step after this one, `None` for the last step.
    pub fn next(self) -> Option<Step> {
        Step::from_position(self.position() + 1)
    }

    /// Parse a backend pointer value. Unknown values yield `None`.
    pub fn from_pointer_key(key: &str) -> Option<Step> {
        let key = key.trim();
        Step::ALL
            .iter()
            .copied()
            .find(|step| step.pointer_key().eq_ignore_ascii_case(key))
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown workflow step: {0}")]
pub struct UnknownStep(pub String);

impl FromStr for Step {
    type Err = UnknownStep;

    /// Accepts the pointer key (`label_check`) or a dashed form (`label-check`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Step::from_pointer_key(&s.replace('-', "_")).ok_or_else(|| UnknownStep(s.to_string()))
    }
}
