use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::shipment::ShipmentId;
use crate::workflows::Step;

/// Initialize structured JSON logging.
///
/// `RUST_LOG` takes precedence; otherwise `default_level` (e.g. "info") is used.
pub fn init_telemetry(default_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .try_init()?;

    tracing::debug!("Shipment flow telemetry initialized with structured logging");
    Ok(())
}

/// Generate a correlation ID for linking the log lines of one operation
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Create a span with the common workflow attributes
pub fn create_workflow_span(
    operation: &str,
    shipment_id: &ShipmentId,
    step: Option<Step>,
    correlation_id: &str,
) -> tracing::Span {
    tracing::info_span!(
        "shipment_workflow",
        operation = operation,
        shipment.id = %shipment_id,
        step = step.map(Step::pointer_key),
        correlation.id = correlation_id,
    )
}
