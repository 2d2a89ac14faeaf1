//! Chain store trait definition.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use activity_shared::StreamItem;

use crate::errors::ActivityError;
use crate::types::{ChainKey, ChainNode, LinkEdit};

/// Abstracts the store holding entities, stream items, follow relations and
/// the singly linked chains built over them.
///
/// A chain is addressed by a `ChainKey`. Its root is the owning entity or user
/// and its members are plain string ids. Every node has at most one successor
/// and every member at most one predecessor; `apply_edits` enforces this.
///
/// Implementations must be safe to share across tasks. They do not need to
/// serialize multi-edit operations on a chain themselves: callers hold a
/// per-chain lock from `ChainLocks` for that.
#[async_trait]
pub trait ChainStore: Send + Sync {
    /// Register an entity, creating it if it does not exist yet.
    async fn ensure_entity(&self, entity_id: &str) -> Result<(), ActivityError>;

    /// Check whether an entity has been registered.
    async fn contains_entity(&self, entity_id: &str) -> Result<bool, ActivityError>;

    /// Create a stream item with a store-assigned id.
    ///
    /// The item is not linked into any chain.
    async fn create_stream_item(
        &self,
        timestamp: DateTime<Utc>,
    ) -> Result<StreamItem, ActivityError>;

    /// Delete a stream item that was never linked into a chain.
    ///
    /// Deleting a missing item is not an error.
    async fn remove_stream_item(&self, item_id: &Uuid) -> Result<(), ActivityError>;

    /// Look up a stream item by id.
    async fn get_stream_item(&self, item_id: &Uuid) -> Result<Option<StreamItem>, ActivityError>;

    /// Record that `user_id` follows `entity_id`.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - If the follow relation was created
    /// * `Ok(false)` - If it already existed
    async fn add_follow(&self, user_id: &str, entity_id: &str) -> Result<bool, ActivityError>;

    /// Remove a follow relation. Removing a missing relation is not an error.
    async fn remove_follow(&self, user_id: &str, entity_id: &str) -> Result<(), ActivityError>;

    /// Check whether `user_id` follows `entity_id`.
    async fn is_following(&self, user_id: &str, entity_id: &str) -> Result<bool, ActivityError>;

    /// All users following `entity_id`, in the order the follows were created.
    async fn followers(&self, entity_id: &str) -> Result<Vec<String>, ActivityError>;

    /// The member `node` links to in `chain`, if any.
    async fn next(
        &self,
        chain: &ChainKey,
        node: &ChainNode,
    ) -> Result<Option<String>, ActivityError>;

    /// The node linking to `member` in `chain`, if any.
    async fn previous(
        &self,
        chain: &ChainKey,
        member: &str,
    ) -> Result<Option<ChainNode>, ActivityError>;

    /// Apply a batch of link edits to one chain, all or nothing.
    ///
    /// Edits are validated in order against the state left by the preceding
    /// edits of the same batch. If any edit is rejected the chain is left
    /// exactly as it was and `ActivityError::InvariantViolation` is returned.
    async fn apply_edits(&self, chain: &ChainKey, edits: &[LinkEdit])
        -> Result<(), ActivityError>;
}
