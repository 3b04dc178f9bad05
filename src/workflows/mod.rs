// Shipment workflow engine: step catalog, status derivation, routing and
// the reentrancy guard. Everything here is synchronous.

pub mod catalog;
pub mod guard;
pub mod routing;
pub mod status;

pub use catalog::{Step, UnknownStep};
pub use guard::{GuardPhase, ReentrancyGuard, DEFAULT_COOLDOWN};
pub use routing::{next_step, NextStep};
pub use status::{derive_all, derive_status, DisplayStatus, StepStatuses};
