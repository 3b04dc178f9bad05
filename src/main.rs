use anyhow::Result;
use clap::Parser;

use shipment_flow::cli::commands::{
    Command, CreateCommand, LeadTimeCommand, RouteCommand, StatusCommand, StepAction,
    StepCommand,
};
use shipment_flow::cli::{Cli, Commands};
use shipment_flow::config::{config, init_config};
use shipment_flow::telemetry::init_telemetry;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = config()?.clone();
    init_telemetry(&config.observability.log_level)?;
    init_config()?;

    let runtime = tokio::runtime::Runtime::new()?;
    match cli.command {
        // No subcommand: show where every shipment stands
        None => runtime.block_on(async { StatusCommand::new(config, false).execute().await }),
        Some(Commands::Status { json }) => {
            runtime.block_on(async { StatusCommand::new(config, json).execute().await })
        }
        Some(Commands::Route { shipment }) => {
            runtime.block_on(async { RouteCommand::new(config, shipment).execute().await })
        }
        Some(Commands::Confirm { shipment, step }) => runtime.block_on(async {
            StepCommand::new(config, shipment, step, StepAction::Confirm)
                .execute()
                .await
        }),
        Some(Commands::Skip { shipment, step }) => runtime.block_on(async {
            StepCommand::new(config, shipment, step, StepAction::Skip)
                .execute()
                .await
        }),
        Some(Commands::Note {
            shipment,
            step,
            text,
        }) => runtime.block_on(async {
            StepCommand::new(config, shipment, step, StepAction::Note(text))
                .execute()
                .await
        }),
        Some(Commands::Create { shipment }) => {
            runtime.block_on(async { CreateCommand::new(config, shipment).execute().await })
        }
        Some(Commands::LeadTime {
            production,
            transit,
            safety_stock,
        }) => runtime.block_on(async {
            LeadTimeCommand::new(config)
                .with_production(production)
                .with_transit(transit)
                .with_safety_stock(safety_stock)
                .execute()
                .await
        }),
    }
}
