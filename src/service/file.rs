// JSON file backed shipment service used by the CLI

use crate::service::{ServiceError, ShipmentRecord, ShipmentService, ShipmentUpdate};
use crate::shipment::ShipmentId;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

/// Stores all records as a JSON array in a single file.
///
/// A missing file is an empty store. Writes within one process are
/// serialized by an internal lock.
#[derive(Debug)]
pub struct JsonFileShipmentService {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileShipmentService {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<ShipmentRecord>, ServiceError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(Vec::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn store(&self, records: &[ShipmentRecord]) -> Result<(), ServiceError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let content = serde_json::to_string_pretty(records)?;
        tokio::fs::write(&self.path, content).await?;
        debug!(path = %self.path.display(), records = records.len(), "Shipment store written");
        Ok(())
    }

    /// Add a new record. Shipment creation is not part of the workflow engine;
    /// this exists so the CLI can seed a store.
    pub async fn create_shipment(&self, record: ShipmentRecord) -> Result<(), ServiceError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;
        if records.iter().any(|existing| existing.id == record.id) {
            return Err(ServiceError::AlreadyExists {
                id: record.shipment_id(),
            });
        }
        records.push(record);
        self.store(&records).await
    }
}

#[async_trait]
impl ShipmentService for JsonFileShipmentService {
    async fn list_shipments(&self) -> Result<Vec<ShipmentRecord>, ServiceError> {
        self.load().await
    }

    async fn update_shipment(
        &self,
        id: &ShipmentId,
        update: &ShipmentUpdate,
    ) -> Result<(), ServiceError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;
        let record = records
            .iter_mut()
            .find(|record| record.id == id.as_str())
            .ok_or_else(|| ServiceError::NotFound { id: id.clone() })?;
        record.apply_update(update);
        self.store(&records).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::Step;

    #[tokio::test]
    async fn test_missing_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let service = JsonFileShipmentService::new(dir.path().join("shipments.json"));
        assert!(service.list_shipments().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_and_update_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("shipments.json");
        let service = JsonFileShipmentService::new(&path);

        service.create_shipment(ShipmentRecord::new("SHP-1")).await.unwrap();
        service
            .update_shipment(
                &ShipmentId::new("SHP-1"),
                &ShipmentUpdate::new()
                    .flag(Step::AddProducts, true)
                    .pointer(Some(Step::LabelCheck)),
            )
            .await
            .unwrap();

        let reopened = JsonFileShipmentService::new(&path);
        let records = reopened.list_shipments().await.unwrap();
        assert_eq!(records.len(), 1);
        let shipment = records[0].to_shipment();
        assert!(shipment.is_completed(Step::AddProducts));
        assert_eq!(shipment.workflow_pointer, Some(Step::LabelCheck));
    }

    #[tokio::test]
    async fn test_duplicate_create_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let service = JsonFileShipmentService::new(dir.path().join("shipments.json"));

        service.create_shipment(ShipmentRecord::new("SHP-1")).await.unwrap();
        let result = service.create_shipment(ShipmentRecord::new("SHP-1")).await;
        assert!(matches!(result, Err(ServiceError::AlreadyExists { .. })));
    }
}
