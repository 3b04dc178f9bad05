use anyhow::Result;

use crate::cli::commands::{with_coordinator, Command};
use crate::config::ShipmentFlowConfig;
use crate::shipment::ShipmentId;
use crate::workflows::NextStep;

pub struct RouteCommand {
    pub config: ShipmentFlowConfig,
    pub shipment_id: ShipmentId,
}

impl RouteCommand {
    pub fn new(config: ShipmentFlowConfig, shipment_id: impl Into<ShipmentId>) -> Self {
        Self {
            config,
            shipment_id: shipment_id.into(),
        }
    }
}

impl Command for RouteCommand {
    async fn execute(&self) -> Result<()> {
        with_coordinator(&self.config, |coordinator| async move {
            match coordinator.open_shipment(&self.shipment_id).await? {
                Some(NextStep::Step(step)) => {
                    println!("🧭 {} → {}", self.shipment_id, step);
                }
                Some(NextStep::Completed) => {
                    println!("✅ {} has completed every step", self.shipment_id);
                }
                None => {
                    println!("⏸️  {} was just updated, try again shortly", self.shipment_id);
                }
            }
            Ok(())
        })
        .await
    }
}
