use anyhow::Result;

use crate::cli::commands::Command;
use crate::config::ShipmentFlowConfig;
use crate::settings::{LeadTimeSettings, TomlSettingsStore};

pub struct LeadTimeCommand {
    pub config: ShipmentFlowConfig,
    pub production: Option<u32>,
    pub transit: Option<u32>,
    pub safety_stock: Option<u32>,
}

impl LeadTimeCommand {
    pub fn new(config: ShipmentFlowConfig) -> Self {
        Self {
            config,
            production: None,
            transit: None,
            safety_stock: None,
        }
    }

    pub fn with_production(mut self, days: Option<u32>) -> Self {
        self.production = days;
        self
    }

    pub fn with_transit(mut self, days: Option<u32>) -> Self {
        self.transit = days;
        self
    }

    pub fn with_safety_stock(mut self, days: Option<u32>) -> Self {
        self.safety_stock = days;
        self
    }

    fn has_changes(&self) -> bool {
        self.production.is_some() || self.transit.is_some() || self.safety_stock.is_some()
    }

    /// Overlay the requested values on `current`.
    pub fn apply_to(&self, current: LeadTimeSettings) -> LeadTimeSettings {
        LeadTimeSettings {
            production_days: self.production.unwrap_or(current.production_days),
            transit_days: self.transit.unwrap_or(current.transit_days),
            safety_stock_days: self.safety_stock.unwrap_or(current.safety_stock_days),
        }
    }
}

impl Command for LeadTimeCommand {
    async fn execute(&self) -> Result<()> {
        let mut store = TomlSettingsStore::open(&self.config.settings.file)?;
        let mut settings = LeadTimeSettings::load(&store)?;

        if self.has_changes() {
            settings = self.apply_to(settings);
            settings.save(&mut store)?;
            println!("💾 Lead times saved to {}", store.path().display());
        }

        println!("⏱️  LEAD TIMES");
        println!("   Production:   {} days", settings.production_days);
        println!("   Transit:      {} days", settings.transit_days);
        println!("   Safety stock: {} days", settings.safety_stock_days);
        println!("   Required inventory: {} days", settings.required_inventory_days());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_given_values_are_overridden() {
        let current = LeadTimeSettings {
            production_days: 30,
            transit_days: 20,
            safety_stock_days: 10,
        };
        let command = LeadTimeCommand::new(ShipmentFlowConfig::default()).with_transit(Some(5));

        let updated = command.apply_to(current);
        assert_eq!(updated.production_days, 30);
        assert_eq!(updated.transit_days, 5);
        assert_eq!(updated.required_inventory_days(), 45);
    }
}
