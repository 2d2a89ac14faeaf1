//! Activity service implementation.
//!
//! This module provides the reader/writer façade over the chain managers and
//! engines. Application code constructs one `ActivityService` around a
//! `ChainStore` at startup and shares it.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use activity_shared::{FeedItem, StreamItem};

use crate::chain::{FeedChains, FeedMerge, StreamChains};
use crate::config::ActivityServiceConfig;
use crate::engine::{InsertionEngine, PropagationEngine};
use crate::errors::ActivityError;
use crate::interfaces::{ActivityReader, ActivityWriter, ChainStore};
use crate::locks::ChainLocks;
use crate::types::{ChainKey, FollowOutcome, PublishReceipt};

/// The main service for publishing activity, following entities and reading
/// streams and feeds.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use activity_repository::{ActivityReader, ActivityService, ActivityWriter, InMemoryChainStore};
/// use chrono::Utc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let service = ActivityService::new(Arc::new(InMemoryChainStore::new()));
///
/// service.follow("bob", "alice").await?;
/// service.publish("alice", Utc::now()).await?;
///
/// let feed = service.read_feed("bob", 0, 10).await?;
/// assert_eq!(feed.len(), 1);
/// # Ok(())
/// # }
/// ```
pub struct ActivityService {
    store: Arc<dyn ChainStore>,
    locks: Arc<ChainLocks>,
    streams: StreamChains,
    feeds: FeedChains,
    merge: FeedMerge,
    propagation: PropagationEngine,
    insertion: InsertionEngine,
    config: ActivityServiceConfig,
}

impl ActivityService {
    /// Create a new ActivityService with default configuration.
    pub fn new(store: Arc<dyn ChainStore>) -> Self {
        Self::with_config(store, ActivityServiceConfig::default())
    }

    /// Create a new ActivityService with custom configuration.
    pub fn with_config(store: Arc<dyn ChainStore>, config: ActivityServiceConfig) -> Self {
        let locks = Arc::new(ChainLocks::new());
        let streams = StreamChains::new(store.clone());
        let feeds = FeedChains::new(store.clone(), streams.clone());
        let merge = FeedMerge::new(streams.clone(), feeds.clone());
        let propagation = PropagationEngine::new(store.clone(), feeds.clone(), locks.clone());
        let insertion = InsertionEngine::new(streams.clone(), feeds.clone());

        Self {
            store,
            locks,
            streams,
            feeds,
            merge,
            propagation,
            insertion,
            config,
        }
    }

    /// The configuration this service was built with.
    pub fn config(&self) -> &ActivityServiceConfig {
        &self.config
    }

    /// Validate that a required identifier is present.
    fn validate_id(field_name: &str, value: &str) -> Result<(), ActivityError> {
        if value.is_empty() {
            warn!(field = field_name, "Rejected empty identifier");
            return Err(ActivityError::invalid_argument(format!(
                "{} is required",
                field_name
            )));
        }
        Ok(())
    }

    /// Check a read window against the configured limits.
    fn validate_window(&self, start_index: usize, count: usize) -> Result<(), ActivityError> {
        if let Some(max) = self.config.max_read_count {
            if count > max {
                return Err(ActivityError::read_limit_exceeded(count, max));
            }
        }
        if let Some(max) = self.config.max_start_index {
            if start_index > max {
                return Err(ActivityError::read_limit_exceeded(start_index, max));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ActivityWriter for ActivityService {
    /// Prepend a stream item to `entity_id`'s stream, then propagate.
    ///
    /// The stream lock is released before propagation starts, so a slow
    /// fan-out never blocks the next publish of the same entity.
    async fn publish(
        &self,
        entity_id: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<PublishReceipt, ActivityError> {
        Self::validate_id("entity_id", entity_id)?;

        let item = {
            let guard = self.locks.acquire(ChainKey::stream(entity_id)).await;
            self.streams.publish(&guard, entity_id, timestamp).await?
        };

        let propagation = self.propagation.on_publish(entity_id).await?;

        info!(
            entity_id = %entity_id,
            item_id = %item.id,
            timestamp = %item.timestamp,
            followers = propagation.followers,
            moved = propagation.moved,
            "Published stream item"
        );
        Ok(PublishReceipt { item, propagation })
    }

    /// Follow `entity_id` on behalf of `user_id`.
    ///
    /// The user's feed lock is held from the duplicate check to the end of
    /// the insertion, so concurrent duplicate follows insert exactly once.
    /// If insertion fails the follow relation is removed again before the
    /// error is returned.
    async fn follow(&self, user_id: &str, entity_id: &str) -> Result<FollowOutcome, ActivityError> {
        Self::validate_id("user_id", user_id)?;
        Self::validate_id("entity_id", entity_id)?;

        let guard = self.locks.acquire(ChainKey::feed(user_id)).await;

        if self.store.is_following(user_id, entity_id).await? {
            info!(user_id = %user_id, entity_id = %entity_id, "Already following");
            return Ok(FollowOutcome::AlreadyFollowing);
        }

        self.store.ensure_entity(user_id).await?;
        self.store.ensure_entity(entity_id).await?;
        self.store.add_follow(user_id, entity_id).await?;

        let position = match self.insertion.on_follow(&guard, user_id, entity_id).await {
            Ok(position) => position,
            Err(e) => {
                warn!(
                    user_id = %user_id,
                    entity_id = %entity_id,
                    error = %e,
                    "Feed insertion failed, removing follow"
                );
                self.store.remove_follow(user_id, entity_id).await?;
                return Err(e);
            }
        };

        info!(
            user_id = %user_id,
            entity_id = %entity_id,
            position,
            "Followed entity"
        );
        Ok(FollowOutcome::Followed { position })
    }
}

#[async_trait]
impl ActivityReader for ActivityService {
    async fn read_stream(
        &self,
        entity_id: &str,
        start_index: usize,
        count: usize,
    ) -> Result<Vec<StreamItem>, ActivityError> {
        Self::validate_id("entity_id", entity_id)?;
        self.validate_window(start_index, count)?;
        self.streams.read(entity_id, start_index, count).await
    }

    async fn read_feed(
        &self,
        user_id: &str,
        start_index: usize,
        count: usize,
    ) -> Result<Vec<FeedItem>, ActivityError> {
        Self::validate_id("user_id", user_id)?;
        self.validate_window(start_index, count)?;
        self.merge.read(user_id, start_index, count).await
    }

    async fn read_feed_entities(&self, user_id: &str) -> Result<Vec<String>, ActivityError> {
        Self::validate_id("user_id", user_id)?;
        self.feeds.entities(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryChainStore;
    use crate::types::{ChainNode, LinkEdit};
    use chrono::{Duration, TimeZone};

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn service() -> ActivityService {
        ActivityService::new(Arc::new(InMemoryChainStore::new()))
    }

    #[tokio::test]
    async fn test_publish_validation() {
        let service = service();

        let result = service.publish("", at(1)).await;
        assert!(matches!(result, Err(ActivityError::InvalidArgument(_))));

    }

    #[tokio::test]
    async fn test_ids_are_opaque() {
        let service = service();

        // Only the empty string is rejected; whitespace is a valid id
        service.follow("  ", "   ").await.unwrap();
        service.publish("   ", at(1)).await.unwrap();

        assert_eq!(service.read_stream("   ", 0, 5).await.unwrap().len(), 1);
        assert_eq!(service.read_feed_entities("  ").await.unwrap(), vec!["   "]);
        assert!(service.read_feed_entities("   ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_follow_validation_mutates_nothing() {
        let store = Arc::new(InMemoryChainStore::new());
        let service = ActivityService::new(store.clone());

        assert!(matches!(
            service.follow("", "alice").await,
            Err(ActivityError::InvalidArgument(_))
        ));
        assert!(matches!(
            service.follow("bob", "").await,
            Err(ActivityError::InvalidArgument(_))
        ));
        assert_eq!(store.stats().await.entity_count, 0);
    }

    #[tokio::test]
    async fn test_read_validation_and_limits() {
        let config = ActivityServiceConfig::default()
            .with_max_read_count(5)
            .with_max_start_index(10);
        let service =
            ActivityService::with_config(Arc::new(InMemoryChainStore::new()), config);

        assert!(matches!(
            service.read_stream("", 0, 1).await,
            Err(ActivityError::InvalidArgument(_))
        ));
        assert!(matches!(
            service.read_feed("", 0, 1).await,
            Err(ActivityError::InvalidArgument(_))
        ));
        assert_eq!(
            service.read_stream("alice", 0, 6).await,
            Err(ActivityError::read_limit_exceeded(6, 5))
        );
        assert_eq!(
            service.read_feed("bob", 11, 1).await,
            Err(ActivityError::read_limit_exceeded(11, 10))
        );
        assert_eq!(service.read_stream("alice", 10, 5).await, Ok(vec![]));
    }

    #[tokio::test]
    async fn test_unlimited_config() {
        let service = ActivityService::with_config(
            Arc::new(InMemoryChainStore::new()),
            ActivityServiceConfig::unlimited(),
        );
        service.publish("alice", at(1)).await.unwrap();

        let items = service.read_stream("alice", 0, 1_000_000).await.unwrap();
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn test_publish_receipt() {
        let service = service();
        service.follow("bob", "alice").await.unwrap();
        service.follow("carol", "alice").await.unwrap();

        let receipt = service.publish("alice", at(3)).await.unwrap();

        assert_eq!(receipt.item.timestamp, at(3));
        assert_eq!(receipt.propagation.followers, 2);
        // alice is the only entry in both feeds
        assert_eq!(receipt.propagation.unchanged, 2);
        assert_eq!(receipt.propagation.moved, 0);
    }

    #[tokio::test]
    async fn test_duplicate_follow_is_noop() {
        let service = service();
        assert_eq!(
            service.follow("bob", "alice").await.unwrap(),
            FollowOutcome::Followed { position: 0 }
        );
        assert_eq!(
            service.follow("bob", "carol").await.unwrap(),
            FollowOutcome::Followed { position: 1 }
        );
        assert_eq!(
            service.follow("bob", "alice").await.unwrap(),
            FollowOutcome::AlreadyFollowing
        );

        assert_eq!(
            service.read_feed_entities("bob").await.unwrap(),
            vec!["alice", "carol"]
        );
    }

    #[tokio::test]
    async fn test_failed_insertion_rolls_back_follow() {
        let store = Arc::new(InMemoryChainStore::new());
        let service = ActivityService::new(store.clone());

        // Corrupt bob's feed: alice is linked although bob never followed her
        store
            .apply_edits(
                &ChainKey::feed("bob"),
                &[LinkEdit::link(ChainNode::Root, "alice")],
            )
            .await
            .unwrap();

        let result = service.follow("bob", "alice").await;

        assert!(matches!(result, Err(ActivityError::InvariantViolation(_))));
        assert!(!store.is_following("bob", "alice").await.unwrap());
        assert!(store.followers("alice").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reads_do_not_create_entities() {
        let store = Arc::new(InMemoryChainStore::new());
        let service = ActivityService::new(store.clone());

        assert!(service.read_stream("ghost", 0, 5).await.unwrap().is_empty());
        assert!(service.read_feed("ghost", 0, 5).await.unwrap().is_empty());
        assert!(service.read_feed_entities("ghost").await.unwrap().is_empty());
        assert_eq!(store.stats().await.entity_count, 0);
    }
}
