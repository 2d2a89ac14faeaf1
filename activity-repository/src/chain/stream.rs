//! Stream chains.
//!
//! Each entity's stream is a chain rooted at the entity whose members are
//! stream item ids, newest first. Placement depends only on publish order:
//! timestamps are stored as given and never compared here.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use activity_shared::{RecencyKey, StreamItem};

use super::item_id;
use crate::errors::ActivityError;
use crate::interfaces::ChainStore;
use crate::locks::ChainGuard;
use crate::types::{ChainKey, ChainNode, LinkEdit};

/// Maintains per-entity stream chains.
#[derive(Clone)]
pub struct StreamChains {
    store: Arc<dyn ChainStore>,
}

impl StreamChains {
    pub fn new(store: Arc<dyn ChainStore>) -> Self {
        Self { store }
    }

    /// Create a stream item and make it the head of `entity_id`'s stream.
    ///
    /// The entity is created if it does not exist. The caller must hold the
    /// stream lock of `entity_id`.
    pub async fn publish(
        &self,
        guard: &ChainGuard,
        entity_id: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<StreamItem, ActivityError> {
        let chain = ChainKey::stream(entity_id);
        debug_assert!(
            guard.covers(&chain),
            "holding lock on {} while publishing to {}",
            guard.key(),
            chain
        );

        self.store.ensure_entity(entity_id).await?;
        let item = self.store.create_stream_item(timestamp).await?;
        let member = item.id.to_string();

        let previous_head = self.store.next(&chain, &ChainNode::Root).await?;
        let edits = match &previous_head {
            Some(head) => vec![
                LinkEdit::unlink(ChainNode::Root),
                LinkEdit::link(ChainNode::Root, member.clone()),
                LinkEdit::link(ChainNode::Member(member), head.clone()),
            ],
            None => vec![LinkEdit::link(ChainNode::Root, member)],
        };
        if let Err(e) = self.store.apply_edits(&chain, &edits).await {
            warn!(
                entity_id = %entity_id,
                item_id = %item.id,
                error = %e,
                "Stream prepend rejected, removing item"
            );
            self.store.remove_stream_item(&item.id).await?;
            return Err(e);
        }

        debug!(
            entity_id = %entity_id,
            item_id = %item.id,
            previous_head = ?previous_head,
            "Prepended stream item"
        );
        Ok(item)
    }

    /// Walk `entity_id`'s stream from the head, skip `start_index` items and
    /// collect up to `count`.
    ///
    /// Unknown entities and windows past the end yield an empty result.
    pub async fn read(
        &self,
        entity_id: &str,
        start_index: usize,
        count: usize,
    ) -> Result<Vec<StreamItem>, ActivityError> {
        if count == 0 || !self.store.contains_entity(entity_id).await? {
            return Ok(Vec::new());
        }

        let chain = ChainKey::stream(entity_id);
        let mut items = Vec::with_capacity(count.min(64));
        let mut position = 0usize;
        let mut current = self.store.next(&chain, &ChainNode::Root).await?;

        while let Some(member) = current {
            if items.len() == count {
                break;
            }
            if position >= start_index {
                items.push(self.load(&chain, &member).await?);
            }
            current = self.store.next(&chain, &ChainNode::Member(member)).await?;
            position += 1;
        }

        Ok(items)
    }

    /// The newest item of `entity_id`'s stream, if any.
    pub async fn head(&self, entity_id: &str) -> Result<Option<StreamItem>, ActivityError> {
        let chain = ChainKey::stream(entity_id);
        match self.store.next(&chain, &ChainNode::Root).await? {
            Some(member) => Ok(Some(self.load(&chain, &member).await?)),
            None => Ok(None),
        }
    }

    /// The item following `item` in `entity_id`'s stream, if any.
    pub async fn after(
        &self,
        entity_id: &str,
        item: &StreamItem,
    ) -> Result<Option<StreamItem>, ActivityError> {
        let chain = ChainKey::stream(entity_id);
        let node = ChainNode::Member(item.id.to_string());
        match self.store.next(&chain, &node).await? {
            Some(member) => Ok(Some(self.load(&chain, &member).await?)),
            None => Ok(None),
        }
    }

    /// Timestamp of the newest item of `entity_id`, or `None` if it has never
    /// published.
    pub async fn recency_key(&self, entity_id: &str) -> Result<RecencyKey, ActivityError> {
        Ok(self.head(entity_id).await?.map(|item| item.timestamp))
    }

    async fn load(&self, chain: &ChainKey, member: &str) -> Result<StreamItem, ActivityError> {
        let id = item_id(chain, member)?;
        self.store.get_stream_item(&id).await?.ok_or_else(|| {
            ActivityError::invariant(format!("{}: linked stream item {} is missing", chain, id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locks::ChainLocks;
    use crate::memory::InMemoryChainStore;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    /// Delegates to an in-memory store but rejects every link edit.
    struct RejectingEdits {
        inner: InMemoryChainStore,
    }

    #[async_trait]
    impl ChainStore for RejectingEdits {
        async fn ensure_entity(&self, entity_id: &str) -> Result<(), ActivityError> {
            self.inner.ensure_entity(entity_id).await
        }

        async fn contains_entity(&self, entity_id: &str) -> Result<bool, ActivityError> {
            self.inner.contains_entity(entity_id).await
        }

        async fn create_stream_item(
            &self,
            timestamp: DateTime<Utc>,
        ) -> Result<StreamItem, ActivityError> {
            self.inner.create_stream_item(timestamp).await
        }

        async fn remove_stream_item(&self, item_id: &Uuid) -> Result<(), ActivityError> {
            self.inner.remove_stream_item(item_id).await
        }

        async fn get_stream_item(
            &self,
            item_id: &Uuid,
        ) -> Result<Option<StreamItem>, ActivityError> {
            self.inner.get_stream_item(item_id).await
        }

        async fn add_follow(&self, user_id: &str, entity_id: &str) -> Result<bool, ActivityError> {
            self.inner.add_follow(user_id, entity_id).await
        }

        async fn remove_follow(&self, user_id: &str, entity_id: &str) -> Result<(), ActivityError> {
            self.inner.remove_follow(user_id, entity_id).await
        }

        async fn is_following(&self, user_id: &str, entity_id: &str) -> Result<bool, ActivityError> {
            self.inner.is_following(user_id, entity_id).await
        }

        async fn followers(&self, entity_id: &str) -> Result<Vec<String>, ActivityError> {
            self.inner.followers(entity_id).await
        }

        async fn next(
            &self,
            chain: &ChainKey,
            node: &ChainNode,
        ) -> Result<Option<String>, ActivityError> {
            self.inner.next(chain, node).await
        }

        async fn previous(
            &self,
            chain: &ChainKey,
            member: &str,
        ) -> Result<Option<ChainNode>, ActivityError> {
            self.inner.previous(chain, member).await
        }

        async fn apply_edits(
            &self,
            chain: &ChainKey,
            _edits: &[LinkEdit],
        ) -> Result<(), ActivityError> {
            Err(ActivityError::invariant(format!("{}: edits disabled", chain)))
        }
    }

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    async fn publish_all(streams: &StreamChains, locks: &ChainLocks, entity: &str, times: &[i64]) {
        for t in times {
            let guard = locks.acquire(ChainKey::stream(entity)).await;
            streams.publish(&guard, entity, at(*t)).await.unwrap();
        }
    }

    fn timestamps(items: &[StreamItem]) -> Vec<DateTime<Utc>> {
        items.iter().map(|i| i.timestamp).collect()
    }

    #[tokio::test]
    async fn test_reads_in_reverse_publish_order() {
        let streams = StreamChains::new(Arc::new(InMemoryChainStore::new()));
        let locks = ChainLocks::new();

        // Timestamps deliberately out of order
        publish_all(&streams, &locks, "alice", &[5, 1, 9, 3]).await;

        let items = streams.read("alice", 0, 4).await.unwrap();
        assert_eq!(timestamps(&items), vec![at(3), at(9), at(1), at(5)]);
    }

    #[tokio::test]
    async fn test_read_window() {
        let streams = StreamChains::new(Arc::new(InMemoryChainStore::new()));
        let locks = ChainLocks::new();
        publish_all(&streams, &locks, "alice", &[1, 2, 3, 4, 5]).await;

        let middle = streams.read("alice", 1, 2).await.unwrap();
        assert_eq!(timestamps(&middle), vec![at(4), at(3)]);

        // Fewer than requested when the chain ends first
        let tail = streams.read("alice", 3, 10).await.unwrap();
        assert_eq!(timestamps(&tail), vec![at(2), at(1)]);
    }

    #[tokio::test]
    async fn test_empty_reads() {
        let streams = StreamChains::new(Arc::new(InMemoryChainStore::new()));
        let locks = ChainLocks::new();
        publish_all(&streams, &locks, "alice", &[1, 2]).await;

        assert!(streams.read("alice", 2, 5).await.unwrap().is_empty());
        assert!(streams.read("alice", 0, 0).await.unwrap().is_empty());
        assert!(streams.read("nobody", 0, 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_head_and_recency_key() {
        let streams = StreamChains::new(Arc::new(InMemoryChainStore::new()));
        let locks = ChainLocks::new();

        assert_eq!(streams.recency_key("alice").await.unwrap(), None);

        publish_all(&streams, &locks, "alice", &[7, 2]).await;

        // Head is the last published item even though its timestamp is older
        assert_eq!(streams.recency_key("alice").await.unwrap(), Some(at(2)));

        let head = streams.head("alice").await.unwrap().unwrap();
        let second = streams.after("alice", &head).await.unwrap().unwrap();
        assert_eq!(second.timestamp, at(7));
        assert_eq!(streams.after("alice", &second).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_rejected_prepend_removes_item() {
        let store = Arc::new(RejectingEdits {
            inner: InMemoryChainStore::new(),
        });
        let streams = StreamChains::new(store.clone());
        let locks = ChainLocks::new();

        let guard = locks.acquire(ChainKey::stream("alice")).await;
        let result = streams.publish(&guard, "alice", at(1)).await;

        assert!(matches!(result, Err(ActivityError::InvariantViolation(_))));
        assert_eq!(store.inner.stats().await.stream_item_count, 0);
        assert_eq!(streams.head("alice").await.unwrap(), None);
    }
}
