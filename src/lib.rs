// Shipment Flow Library - workflow engine for shipment fulfillment
// This exposes the core components for testing and integration

pub mod cli;
pub mod config;
pub mod coordinator;
pub mod service;
pub mod settings;
pub mod shipment;
pub mod telemetry;
pub mod workflows;

// Re-export key types for easy access
pub use config::{config, init_config, ShipmentFlowConfig};
pub use coordinator::{
    AcceptedCompletion, CompletionCoordinator, CompletionKind, CompletionOutcome, Navigation,
    ShipmentOverview, WorkflowError,
};
pub use service::{
    InMemoryShipmentService, JsonFileShipmentService, ServiceError, ShipmentRecord,
    ShipmentService, ShipmentUpdate,
};
pub use settings::{LeadTimeSettings, SettingsStore, TomlSettingsStore};
pub use shipment::{Shipment, ShipmentBoard, ShipmentId};
pub use telemetry::{create_workflow_span, generate_correlation_id, init_telemetry};
pub use workflows::{derive_status, next_step, DisplayStatus, NextStep, ReentrancyGuard, Step};
