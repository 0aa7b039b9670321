//! In-memory item store.
//!
//! Process-local implementation backed by a `RwLock<HashMap>`. The write
//! lock makes every mutation a single-writer transaction over one item;
//! readers get point-in-time clones.

use async_trait::async_trait;
use rp_protocol::requirement_models::RequirementItem;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::state::item;
use crate::store::{ItemStore, StoreError, StoreResult};

/// In-memory [`ItemStore`] implementation.
#[derive(Default)]
pub struct MemoryStore {
    items: RwLock<HashMap<Uuid, RequirementItem>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored items.
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    /// Whether the store holds no items.
    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    async fn mutate<F>(&self, id: Uuid, f: F) -> StoreResult<RequirementItem>
    where
        F: FnOnce(&mut RequirementItem) -> Result<(), item::TransitionError>,
    {
        let mut items = self.items.write().await;
        let stored = items.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        f(stored)?;
        Ok(stored.clone())
    }
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn create(&self, item: RequirementItem) -> StoreResult<()> {
        let mut items = self.items.write().await;
        if items.contains_key(&item.id) {
            return Err(StoreError::Conflict(item.id));
        }
        items.insert(item.id, item);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> StoreResult<RequirementItem> {
        let items = self.items.read().await;
        items.get(&id).cloned().ok_or(StoreError::NotFound(id))
    }

    async fn list(&self) -> StoreResult<Vec<RequirementItem>> {
        let items = self.items.read().await;
        let mut all: Vec<RequirementItem> = items.values().cloned().collect();
        all.sort_by_key(|item| item.created_at);
        Ok(all)
    }

    async fn record_stage_started(&self, id: Uuid) -> StoreResult<RequirementItem> {
        self.mutate(id, |stored| item::begin_stage(stored).map(|_| ()))
            .await
    }

    async fn record_stage_succeeded(
        &self,
        id: Uuid,
        detail: Value,
        artifacts: BTreeMap<String, String>,
    ) -> StoreResult<RequirementItem> {
        self.mutate(id, |stored| item::succeed_stage(stored, detail, artifacts))
            .await
    }

    async fn record_stage_failed(
        &self,
        id: Uuid,
        reason: &str,
        terminal: bool,
    ) -> StoreResult<RequirementItem> {
        self.mutate(id, |stored| item::fail_stage(stored, reason, terminal))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rp_protocol::requirement_models::{RequirementInput, Stage, StageStatus};
    use serde_json::json;

    fn sample_input() -> RequirementInput {
        RequirementInput {
            business_need: "Add SSO login".to_string(),
            requirements: "Support SAML and OIDC identity providers".to_string(),
            business_impact: "Reduces onboarding friction".to_string(),
            delivery_date: "2025-01-01".to_string(),
            campaign_date: "2025-02-01".to_string(),
            definitions: vec![],
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = MemoryStore::new();
        let item = item::new_item(sample_input());
        let id = item.id;

        store.create(item).await.unwrap();

        let fetched = store.get(id).await.unwrap();
        assert_eq!(fetched.id, id);
        assert_eq!(fetched.stage, Stage::Validation);
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_id() {
        let store = MemoryStore::new();
        let item = item::new_item(sample_input());

        store.create(item.clone()).await.unwrap();
        let result = store.create(item).await;

        assert!(matches!(result, Err(StoreError::Conflict(_))));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_get_unknown_id_is_not_found() {
        let store = MemoryStore::new();
        let result = store.get(Uuid::new_v4()).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_stage_lifecycle_round_trip() {
        let store = MemoryStore::new();
        let item = item::new_item(sample_input());
        let id = item.id;
        store.create(item).await.unwrap();

        let started = store.record_stage_started(id).await.unwrap();
        assert_eq!(started.step_history.len(), 1);
        assert_eq!(started.step_history[0].status, StageStatus::Running);

        let succeeded = store
            .record_stage_succeeded(id, json!({"is_valid": true}), BTreeMap::new())
            .await
            .unwrap();
        assert_eq!(succeeded.stage, Stage::Generation);
        assert_eq!(succeeded.step_history[0].status, StageStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_second_start_violates_single_running_invariant() {
        let store = MemoryStore::new();
        let item = item::new_item(sample_input());
        let id = item.id;
        store.create(item).await.unwrap();

        store.record_stage_started(id).await.unwrap();
        let result = store.record_stage_started(id).await;

        assert!(matches!(result, Err(StoreError::Transition(_))));
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_creation() {
        let store = MemoryStore::new();
        let first = item::new_item(sample_input());
        let mut second = item::new_item(sample_input());
        second.created_at = first.created_at + chrono::Duration::seconds(1);

        store.create(second.clone()).await.unwrap();
        store.create(first.clone()).await.unwrap();

        let all = store.list().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, first.id);
        assert_eq!(all[1].id, second.id);
    }
}
