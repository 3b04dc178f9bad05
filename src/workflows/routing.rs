// Routing - which step screen a selected shipment opens on

use crate::shipment::Shipment;
use crate::workflows::{derive_all, DisplayStatus, Step};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextStep {
    Step(Step),
    /// Every step is done; there is nowhere left to route to.
    Completed,
}

impl fmt::Display for NextStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NextStep::Step(step) => write!(f, "{step}"),
            NextStep::Completed => f.write_str("Completed"),
        }
    }
}

/// Compute the single step a user should be sent to.
///
/// The pointer always wins. Without one, a fully completed shipment routes
/// to [`NextStep::Completed`]; otherwise a completed booking acts as a
/// checkpoint, and failing that the first step not derived as completed is
/// chosen.
pub fn next_step(shipment: &Shipment) -> NextStep {
    if let Some(pointer) = shipment.workflow_pointer {
        return NextStep::Step(pointer);
    }

    let statuses = derive_all(shipment);
    let Some(first_open) = statuses
        .iter()
        .find(|(_, status)| *status != DisplayStatus::Completed)
        .map(|(step, _)| step)
    else {
        return NextStep::Completed;
    };

    if shipment.is_completed(Step::CHECKPOINT) {
        return NextStep::Step(Step::CHECKPOINT);
    }

    NextStep::Step(first_open)
}
