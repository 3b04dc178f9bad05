use clap::{Parser, Subcommand};

use crate::workflows::Step;

pub mod commands;

#[derive(Parser)]
#[command(name = "shipment-flow")]
#[command(about = "Track shipments through the fulfillment pipeline")]
#[command(long_about = "Shipment Flow tracks packaged-goods shipments through a fixed pipeline \
                       (add products, label check, formula check, booking, sorting). Get started \
                       with 'shipment-flow status' to see where every shipment stands.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show every shipment with its per-step status and next step
    Status {
        /// Print machine-readable JSON instead of a table
        #[arg(long, help = "Emit the overview as JSON")]
        json: bool,
    },
    /// Show which step a shipment should be opened on
    Route {
        /// Shipment identifier
        shipment: String,
    },
    /// Mark a step as done
    Confirm {
        /// Shipment identifier
        shipment: String,
        /// Step, e.g. label-check
        step: Step,
    },
    /// Move past a step without marking it done
    Skip {
        /// Shipment identifier
        shipment: String,
        /// Step, e.g. add-products
        step: Step,
    },
    /// Attach a note to a review step, forcing it back to incomplete
    Note {
        /// Shipment identifier
        shipment: String,
        /// label-check or formula-check
        step: Step,
        /// Note text
        text: String,
    },
    /// Register a new shipment in the local store
    Create {
        /// Shipment identifier
        shipment: String,
    },
    /// Show or update the lead-time settings
    LeadTime {
        #[arg(long, help = "Production lead time in days")]
        production: Option<u32>,
        #[arg(long, help = "Transit lead time in days")]
        transit: Option<u32>,
        #[arg(long = "safety-stock", help = "Safety stock in days")]
        safety_stock: Option<u32>,
    },
}
