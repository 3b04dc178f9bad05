use anyhow::{Context, Result};

use crate::cli::commands::{with_coordinator, Command};
use crate::config::ShipmentFlowConfig;
use crate::coordinator::{CompletionOutcome, Navigation};
use crate::shipment::ShipmentId;
use crate::workflows::Step;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepAction {
    Confirm,
    Skip,
    Note(String),
}

pub struct StepCommand {
    pub config: ShipmentFlowConfig,
    pub shipment_id: ShipmentId,
    pub step: Step,
    pub action: StepAction,
}

impl StepCommand {
    pub fn new(
        config: ShipmentFlowConfig,
        shipment_id: impl Into<ShipmentId>,
        step: Step,
        action: StepAction,
    ) -> Self {
        Self {
            config,
            shipment_id: shipment_id.into(),
            step,
            action,
        }
    }
}

impl Command for StepCommand {
    async fn execute(&self) -> Result<()> {
        with_coordinator(&self.config, |coordinator| async move {
            let outcome = match &self.action {
                StepAction::Confirm => coordinator.confirm_step(&self.shipment_id, self.step).await?,
                StepAction::Skip => coordinator.skip_step(&self.shipment_id, self.step).await?,
                StepAction::Note(text) => {
                    coordinator
                        .mark_incomplete_with_note(&self.shipment_id, self.step, text)
                        .await?
                }
            };

            let accepted = match outcome {
                CompletionOutcome::Accepted(accepted) => accepted,
                CompletionOutcome::Rejected { shipment_id, step } => {
                    println!("⏸️  {step} on {shipment_id} is already being processed");
                    return Ok(());
                }
                CompletionOutcome::Unchanged { shipment_id, step } => {
                    println!("ℹ️  {step} on {shipment_id} is already past, nothing to change");
                    return Ok(());
                }
            };

            // A one-shot process has to wait for the write before exiting
            accepted
                .write
                .await
                .context("Shipment update task panicked")?
                .with_context(|| format!("Failed to save {} on {}", accepted.step, accepted.shipment_id))?;

            println!(
                "✅ {} on {} is now {}",
                accepted.step, accepted.shipment_id, accepted.status
            );
            println!("   → Next: {}", accepted.next);
            if let Navigation::ReturnToList { .. } = accepted.navigation {
                println!("   → Back to the list: shipment-flow status");
            }
            Ok(())
        })
        .await
    }
}
