//! Shipment service boundary
//!
//! The shipment service is the source of truth for shipment records. The
//! engine only needs to list shipments and send partial updates, so the
//! boundary is a small async trait with an in-memory implementation for tests
//! and a JSON file implementation for the CLI.

pub mod errors;
pub mod file;
pub mod memory;
pub mod retry;
pub mod types;

use crate::shipment::ShipmentId;
use async_trait::async_trait;

pub use errors::ServiceError;
pub use file::JsonFileShipmentService;
pub use memory::InMemoryShipmentService;
pub use retry::{RetryConfig, RetryHandler};
pub use types::{records_for, ShipmentRecord, ShipmentUpdate, StepNote};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShipmentService: Send + Sync {
    /// Fetch every shipment record.
    async fn list_shipments(&self) -> Result<Vec<ShipmentRecord>, ServiceError>;

    /// Apply a partial update to one shipment.
    async fn update_shipment(
        &self,
        id: &ShipmentId,
        update: &ShipmentUpdate,
    ) -> Result<(), ServiceError>;
}
