use anyhow::Result;

use crate::cli::commands::Command;
use crate::config::ShipmentFlowConfig;
use crate::service::{JsonFileShipmentService, ShipmentRecord};

pub struct CreateCommand {
    pub config: ShipmentFlowConfig,
    pub shipment_id: String,
}

impl CreateCommand {
    pub fn new(config: ShipmentFlowConfig, shipment_id: impl Into<String>) -> Self {
        Self {
            config,
            shipment_id: shipment_id.into(),
        }
    }
}

impl Command for CreateCommand {
    async fn execute(&self) -> Result<()> {
        let service = JsonFileShipmentService::new(&self.config.service.data_file);
        service
            .create_shipment(ShipmentRecord::new(self.shipment_id.clone()))
            .await?;
        println!("📦 Created shipment {}", self.shipment_id);
        println!("   → Start with: shipment-flow route {}", self.shipment_id);
        Ok(())
    }
}
