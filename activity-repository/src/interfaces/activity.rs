//! Reader and writer contracts of the activity service.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use activity_shared::{FeedItem, StreamItem};

use crate::errors::ActivityError;
use crate::types::{FollowOutcome, PublishReceipt};

/// Write side: publishing activity and following entities.
///
/// Both operations return only after every chain edit they trigger has
/// completed.
#[async_trait]
pub trait ActivityWriter: Send + Sync {
    /// Prepend a new stream item to `entity_id`'s stream and move the entity
    /// to the front of every follower's feed.
    async fn publish(
        &self,
        entity_id: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<PublishReceipt, ActivityError>;

    /// Make `user_id` follow `entity_id` and insert the entity into the
    /// user's feed at its recency position. Following twice is a no-op.
    async fn follow(&self, user_id: &str, entity_id: &str) -> Result<FollowOutcome, ActivityError>;
}

/// Read side: paginated walks over stream and feed chains.
///
/// Unknown entities and users yield empty results, not errors.
#[async_trait]
pub trait ActivityReader: Send + Sync {
    /// Up to `count` items of `entity_id`'s stream, most recent first,
    /// after skipping `start_index` items.
    async fn read_stream(
        &self,
        entity_id: &str,
        start_index: usize,
        count: usize,
    ) -> Result<Vec<StreamItem>, ActivityError>;

    /// Up to `count` items merged across everything `user_id` follows, after
    /// skipping `start_index` items.
    async fn read_feed(
        &self,
        user_id: &str,
        start_index: usize,
        count: usize,
    ) -> Result<Vec<FeedItem>, ActivityError>;

    /// The entities `user_id` follows, in feed order.
    async fn read_feed_entities(&self, user_id: &str) -> Result<Vec<String>, ActivityError>;
}
