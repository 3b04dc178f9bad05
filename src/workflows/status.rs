// Status derivation - reconciles the backend's single pointer and
// independent completion flags into four display states

use crate::shipment::Shipment;
use crate::workflows::Step;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayStatus {
    Pending,
    InProgress,
    Completed,
    Incomplete,
}

impl fmt::Display for DisplayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DisplayStatus::Pending => "pending",
            DisplayStatus::InProgress => "in progress",
            DisplayStatus::Completed => "completed",
            DisplayStatus::Incomplete => "incomplete",
        };
        f.write_str(label)
    }
}

/// Derive the display status of `step` for `shipment`.
///
/// Rules are evaluated in order and the first match wins:
/// 1. the completion flag is set: `Completed`
/// 2. the pointer has moved past the step: `Completed`, or `Incomplete` when
///    a comment overrides the implicit completion
/// 3. the pointer sits on the step: `InProgress`
/// 4. the step carries a comment: `Incomplete`
/// 5. otherwise `Pending`
pub fn derive_status(step: Step, shipment: &Shipment) -> DisplayStatus {
    if shipment.is_completed(step) {
        return DisplayStatus::Completed;
    }

    if let Some(pointer) = shipment.workflow_pointer {
        if step.position() < pointer.position() {
            return if shipment.has_comment(step) {
                DisplayStatus::Incomplete
            } else {
                DisplayStatus::Completed
            };
        }
        if pointer == step {
            return DisplayStatus::InProgress;
        }
    }

    if shipment.has_comment(step) {
        DisplayStatus::Incomplete
    } else {
        DisplayStatus::Pending
    }
}

/// Display statuses for every step of one shipment, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepStatuses([DisplayStatus; 6]);

impl StepStatuses {
    pub fn get(&self, step: Step) -> DisplayStatus {
        self.0[step.position()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Step, DisplayStatus)> + '_ {
        Step::ALL.iter().map(move |step| (*step, self.get(*step)))
    }

    pub fn all_completed(&self) -> bool {
        self.0.iter().all(|status| *status == DisplayStatus::Completed)
    }
}

pub fn derive_all(shipment: &Shipment) -> StepStatuses {
    StepStatuses(Step::ALL.map(|step| derive_status(step, shipment)))
}
