// Shipment model and the shared in-memory shipment board

pub mod board;
pub mod types;

pub use board::{CommentOverrideStore, RefreshOutcome, RefreshTicket, ShipmentBoard};
pub use types::{is_truthy, Shipment, ShipmentId};
