use crate::config::ShipmentFlowConfig;
use crate::coordinator::CompletionCoordinator;
use crate::service::JsonFileShipmentService;
use anyhow::Result;
use std::sync::Arc;

pub mod create;
pub mod lead_time;
pub mod route;
pub mod status;
pub mod step;

pub use create::CreateCommand;
pub use lead_time::LeadTimeCommand;
pub use route::RouteCommand;
pub use status::StatusCommand;
pub use step::{StepAction, StepCommand};

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}

/// Build a coordinator over the configured file store and load the list.
pub async fn with_coordinator<F, Fut, R>(config: &ShipmentFlowConfig, f: F) -> Result<R>
where
    F: FnOnce(CompletionCoordinator) -> Fut,
    Fut: std::future::Future<Output = Result<R>>,
{
    let service = JsonFileShipmentService::new(&config.service.data_file);
    let coordinator = CompletionCoordinator::new(Arc::new(service), &config.coordinator);
    coordinator.refresh().await?;
    f(coordinator).await
}
