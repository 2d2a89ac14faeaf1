//! Follow insertion.

use tracing::debug;

use crate::chain::{FeedChains, StreamChains};
use crate::errors::ActivityError;
use crate::locks::ChainGuard;

/// Places a newly followed entity in the follower's feed.
#[derive(Clone)]
pub struct InsertionEngine {
    streams: StreamChains,
    feeds: FeedChains,
}

impl InsertionEngine {
    pub fn new(streams: StreamChains, feeds: FeedChains) -> Self {
        Self { streams, feeds }
    }

    /// Merge-insert `entity_id` into `user_id`'s feed using the timestamp of
    /// the entity's newest stream item as its recency key.
    ///
    /// The caller must hold the feed lock of `user_id` and must already have
    /// recorded the follow relation.
    pub async fn on_follow(
        &self,
        guard: &ChainGuard,
        user_id: &str,
        entity_id: &str,
    ) -> Result<usize, ActivityError> {
        let recency = self.streams.recency_key(entity_id).await?;
        let position = self
            .feeds
            .merge_insert(guard, user_id, entity_id, recency)
            .await?;

        debug!(
            user_id = %user_id,
            entity_id = %entity_id,
            recency = ?recency,
            position,
            "Inserted followed entity"
        );
        Ok(position)
    }
}
