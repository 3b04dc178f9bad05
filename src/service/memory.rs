// In-memory shipment service with failure injection

use crate::service::{ServiceError, ShipmentRecord, ShipmentService, ShipmentUpdate};
use crate::shipment::ShipmentId;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct MemoryState {
    records: BTreeMap<String, ShipmentRecord>,
    update_log: Vec<(ShipmentId, ShipmentUpdate)>,
    update_attempts: u32,
    failing_updates: u32,
    fail_all_updates: Option<String>,
}

/// Shared, cloneable in-memory store. Clones see the same records.
#[derive(Debug, Clone, Default)]
pub struct InMemoryShipmentService {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryShipmentService {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn with_records(records: Vec<ShipmentRecord>) -> Self {
        let service = Self::new();
        for record in records {
            service.insert(record).await;
        }
        service
    }

    /// Insert or replace a record.
    pub async fn insert(&self, record: ShipmentRecord) {
        let mut state = self.state.lock().await;
        state.records.insert(record.id.clone(), record);
    }

    pub async fn remove(&self, id: &ShipmentId) -> Option<ShipmentRecord> {
        self.state.lock().await.records.remove(id.as_str())
    }

    pub async fn record(&self, id: &ShipmentId) -> Option<ShipmentRecord> {
        self.state.lock().await.records.get(id.as_str()).cloned()
    }

    /// Updates that were applied, in order.
    pub async fn applied_updates(&self) -> Vec<(ShipmentId, ShipmentUpdate)> {
        self.state.lock().await.update_log.clone()
    }

    /// Every `update_shipment` call, including failed ones.
    pub async fn update_attempts(&self) -> u32 {
        self.state.lock().await.update_attempts
    }

    /// Fail the next `count` updates with a retryable network error.
    pub async fn fail_next_updates(&self, count: u32) {
        self.state.lock().await.failing_updates = count;
    }

    /// Fail every update until cleared with `None`.
    pub async fn fail_all_updates(&self, message: Option<&str>) {
        self.state.lock().await.fail_all_updates = message.map(str::to_string);
    }
}

#[async_trait]
impl ShipmentService for InMemoryShipmentService {
    async fn list_shipments(&self) -> Result<Vec<ShipmentRecord>, ServiceError> {
        Ok(self.state.lock().await.records.values().cloned().collect())
    }

    async fn update_shipment(
        &self,
        id: &ShipmentId,
        update: &ShipmentUpdate,
    ) -> Result<(), ServiceError> {
        let mut state = self.state.lock().await;
        state.update_attempts += 1;

        if let Some(message) = &state.fail_all_updates {
            return Err(ServiceError::Network {
                message: message.clone(),
            });
        }
        if state.failing_updates > 0 {
            state.failing_updates -= 1;
            return Err(ServiceError::Network {
                message: "injected failure".to_string(),
            });
        }

        let record = state
            .records
            .get_mut(id.as_str())
            .ok_or_else(|| ServiceError::NotFound { id: id.clone() })?;
        record.apply_update(update);
        state.update_log.push((id.clone(), update.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::Step;

    #[tokio::test]
    async fn test_update_applies_to_stored_record() {
        let service = InMemoryShipmentService::with_records(vec![ShipmentRecord::new("SHP-1")]).await;
        let id = ShipmentId::new("SHP-1");

        service
            .update_shipment(&id, &ShipmentUpdate::new().flag(Step::AddProducts, true))
            .await
            .unwrap();

        let shipment = service.record(&id).await.unwrap().to_shipment();
        assert!(shipment.is_completed(Step::AddProducts));
        assert_eq!(service.applied_updates().await.len(), 1);
    }

    #[test]
    fn test_injected_failures_are_counted() {
        tokio_test::block_on(async {
            let service =
                InMemoryShipmentService::with_records(vec![ShipmentRecord::new("SHP-1")]).await;
            service.fail_next_updates(1).await;

            let id = ShipmentId::new("SHP-1");
            let update = ShipmentUpdate::new().flag(Step::LabelCheck, true);
            assert!(service.update_shipment(&id, &update).await.is_err());
            assert!(service.update_shipment(&id, &update).await.is_ok());
            assert_eq!(service.update_attempts().await, 2);
        });
    }

    #[tokio::test]
    async fn test_unknown_shipment_is_not_found() {
        let service = InMemoryShipmentService::new();
        let result = service
            .update_shipment(&ShipmentId::new("missing"), &ShipmentUpdate::new())
            .await;
        assert!(matches!(result, Err(ServiceError::NotFound { .. })));
    }
}
