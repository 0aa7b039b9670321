//! Durable record of requirement items.
//!
//! The [`ItemStore`] trait is the single shared mutable resource of the
//! pipeline. Every mutation is a single-item transaction: create an item,
//! open a stage attempt, or close it with its outcome. The transition
//! logic itself lives in [`crate::state::item`]; implementations only add
//! locking and persistence.

pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use rp_protocol::requirement_models::RequirementItem;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

use crate::state::item::TransitionError;

/// Errors that can occur during store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No item with the given id exists.
    #[error("Requirement {0} not found")]
    NotFound(Uuid),

    /// An item with the given id already exists.
    #[error("Requirement {0} already exists")]
    Conflict(Uuid),

    /// The requested mutation would violate a state-machine invariant.
    #[error("Invalid transition: {0}")]
    Transition(#[from] TransitionError),
}

/// Type alias for Result with StoreError.
pub type StoreResult<T> = Result<T, StoreError>;

/// Durable store of requirement items.
///
/// Reads return clones of the persisted state, so callers never observe a
/// transition mid-flight. Each mutation touches exactly one item under a
/// single writer; items never reference each other, so no multi-item
/// transactions exist.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Persist a freshly created item.
    async fn create(&self, item: RequirementItem) -> StoreResult<()>;

    /// Fetch one item by id.
    async fn get(&self, id: Uuid) -> StoreResult<RequirementItem>;

    /// All stored items, oldest first.
    async fn list(&self) -> StoreResult<Vec<RequirementItem>>;

    /// Open an attempt at the item's current stage and return the updated
    /// item.
    async fn record_stage_started(&self, id: Uuid) -> StoreResult<RequirementItem>;

    /// Close the running attempt as succeeded, merge artifacts and advance
    /// the stage.
    async fn record_stage_succeeded(
        &self,
        id: Uuid,
        detail: Value,
        artifacts: BTreeMap<String, String>,
    ) -> StoreResult<RequirementItem>;

    /// Close the running attempt as failed; with `terminal` the item moves
    /// to the error stage.
    async fn record_stage_failed(
        &self,
        id: Uuid,
        reason: &str,
        terminal: bool,
    ) -> StoreResult<RequirementItem>;
}
