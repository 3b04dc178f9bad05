use anyhow::Result;
use serde::Serialize;
use std::fmt::Write;

use crate::cli::commands::{with_coordinator, Command};
use crate::config::ShipmentFlowConfig;
use crate::coordinator::ShipmentOverview;
use crate::workflows::{DisplayStatus, NextStep, Step};

pub struct StatusCommand {
    pub config: ShipmentFlowConfig,
    pub json: bool,
}

impl StatusCommand {
    pub fn new(config: ShipmentFlowConfig, json: bool) -> Self {
        Self { config, json }
    }
}

#[derive(Debug, Serialize)]
struct StatusRow<'a> {
    id: &'a str,
    current_step: Option<&'static str>,
    steps: Vec<(&'static str, DisplayStatus)>,
    next: NextStep,
}

fn status_symbol(status: DisplayStatus) -> &'static str {
    match status {
        DisplayStatus::Completed => "✅",
        DisplayStatus::InProgress => "🔄",
        DisplayStatus::Incomplete => "⚠️",
        DisplayStatus::Pending => "⏳",
    }
}

/// Plain-text table, one row per shipment.
pub fn render_table(rows: &[ShipmentOverview]) -> String {
    let mut out = String::new();
    let _ = write!(out, "{:<16}", "SHIPMENT");
    for step in Step::ALL {
        let _ = write!(out, " {:<14}", step.display_name());
    }
    let _ = writeln!(out, " NEXT");

    for row in rows {
        let _ = write!(out, "{:<16}", row.shipment.id.as_str());
        for (_, status) in row.statuses.iter() {
            let _ = write!(out, " {:<14}", status.to_string());
        }
        let _ = writeln!(out, " {}", row.next);

        for (step, note) in row.shipment.comments() {
            let _ = writeln!(out, "    {} {}: {}", status_symbol(row.statuses.get(step)), step, note);
        }
    }
    out
}

pub fn render_json(rows: &[ShipmentOverview]) -> Result<String> {
    let rows: Vec<StatusRow<'_>> = rows
        .iter()
        .map(|row| StatusRow {
            id: row.shipment.id.as_str(),
            current_step: row.shipment.workflow_pointer.map(Step::pointer_key),
            steps: row
                .statuses
                .iter()
                .map(|(step, status)| (step.pointer_key(), status))
                .collect(),
            next: row.next,
        })
        .collect();
    Ok(serde_json::to_string_pretty(&rows)?)
}

impl Command for StatusCommand {
    async fn execute(&self) -> Result<()> {
        with_coordinator(&self.config, |coordinator| async move {
            let rows = coordinator.overview().await;
            if self.json {
                println!("{}", render_json(&rows)?);
            } else if rows.is_empty() {
                println!("📋 No shipments found");
                println!("   → Create one: shipment-flow create <id>");
            } else {
                println!("📦 SHIPMENT STATUS");
                println!("==================");
                print!("{}", render_table(&rows));
            }
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shipment::Shipment;
    use crate::workflows::{derive_all, next_step};

    fn overview(shipment: Shipment) -> ShipmentOverview {
        ShipmentOverview {
            statuses: derive_all(&shipment),
            next: next_step(&shipment),
            shipment,
        }
    }

    #[test]
    fn test_table_lists_statuses_and_notes() {
        let shipment = Shipment::new("SHP-42")
            .with_pointer(Some(Step::FormulaCheck))
            .with_comment(Step::LabelCheck, "label upside down");
        let table = render_table(&[overview(shipment)]);

        assert!(table.starts_with("SHIPMENT"));
        assert!(table.contains("SHP-42"));
        assert!(table.contains("in progress"));
        assert!(table.contains("incomplete"));
        assert!(table.contains("Label Check: label upside down"));
    }

    #[test]
    fn test_json_uses_backend_step_keys() {
        let json = render_json(&[overview(Shipment::new("SHP-1"))]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value[0]["id"], "SHP-1");
        assert_eq!(value[0]["current_step"], "add_products");
        assert_eq!(value[0]["steps"][0][0], "add_products");
        assert_eq!(value[0]["steps"][0][1], "in_progress");
        assert_eq!(value[0]["next"]["step"], "add_products");
    }
}
