//! Merged feed reads.
//!
//! A feed read interleaves the streams of every followed entity. Each entity
//! contributes its items in its own stream order; at every step the pending
//! item with the latest timestamp is emitted, and equal timestamps go to the
//! entity that sits earlier in the feed.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use chrono::{DateTime, Utc};

use activity_shared::{FeedItem, StreamItem};

use super::{FeedChains, StreamChains};
use crate::errors::ActivityError;

/// The next unread item of one followed entity.
#[derive(Debug)]
struct Cursor {
    rank: usize,
    entity_id: String,
    item: StreamItem,
}

impl Cursor {
    fn timestamp(&self) -> DateTime<Utc> {
        self.item.timestamp
    }
}

impl Ord for Cursor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.timestamp()
            .cmp(&other.timestamp())
            .then_with(|| other.rank.cmp(&self.rank))
    }
}

impl PartialOrd for Cursor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Cursor {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Cursor {}

/// Reads a window of a user's merged feed.
#[derive(Clone)]
pub struct FeedMerge {
    streams: StreamChains,
    feeds: FeedChains,
}

impl FeedMerge {
    pub fn new(streams: StreamChains, feeds: FeedChains) -> Self {
        Self { streams, feeds }
    }

    /// Skip `start_index` merged items of `user_id`'s feed and collect up to
    /// `count`.
    pub async fn read(
        &self,
        user_id: &str,
        start_index: usize,
        count: usize,
    ) -> Result<Vec<FeedItem>, ActivityError> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let mut heap = BinaryHeap::new();
        for (rank, entity_id) in self.feeds.entities(user_id).await?.into_iter().enumerate() {
            if let Some(item) = self.streams.head(&entity_id).await? {
                heap.push(Cursor {
                    rank,
                    entity_id,
                    item,
                });
            }
        }

        let mut items = Vec::with_capacity(count.min(64));
        let mut position = 0usize;

        while let Some(cursor) = heap.pop() {
            if let Some(next) = self.streams.after(&cursor.entity_id, &cursor.item).await? {
                heap.push(Cursor {
                    rank: cursor.rank,
                    entity_id: cursor.entity_id.clone(),
                    item: next,
                });
            }

            if position >= start_index {
                items.push(FeedItem::new(cursor.entity_id, cursor.item));
                if items.len() == count {
                    break;
                }
            }
            position += 1;
        }

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::ChainStore;
    use crate::locks::ChainLocks;
    use crate::memory::InMemoryChainStore;
    use crate::types::ChainKey;
    use chrono::{Duration, TimeZone};
    use std::sync::Arc;

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    struct Fixture {
        streams: StreamChains,
        feeds: FeedChains,
        merge: FeedMerge,
        locks: ChainLocks,
    }

    impl Fixture {
        fn new() -> Self {
            let store: Arc<dyn ChainStore> = Arc::new(InMemoryChainStore::new());
            let streams = StreamChains::new(store.clone());
            let feeds = FeedChains::new(store, streams.clone());
            let merge = FeedMerge::new(streams.clone(), feeds.clone());
            Self {
                streams,
                feeds,
                merge,
                locks: ChainLocks::new(),
            }
        }

        async fn publish(&self, entity: &str, minutes: i64) {
            let guard = self.locks.acquire(ChainKey::stream(entity)).await;
            self.streams.publish(&guard, entity, at(minutes)).await.unwrap();
        }

        async fn insert(&self, user: &str, entity: &str) {
            let guard = self.locks.acquire(ChainKey::feed(user)).await;
            let recency = self.streams.recency_key(entity).await.unwrap();
            self.feeds
                .merge_insert(&guard, user, entity, recency)
                .await
                .unwrap();
        }
    }

    fn summary(items: &[FeedItem]) -> Vec<(String, DateTime<Utc>)> {
        items
            .iter()
            .map(|i| (i.entity_id.clone(), i.item.timestamp))
            .collect()
    }

    #[tokio::test]
    async fn test_interleaves_streams_by_timestamp() {
        let f = Fixture::new();
        f.publish("a", 1).await;
        f.publish("b", 2).await;
        f.publish("a", 3).await;
        f.publish("b", 4).await;
        f.insert("u", "a").await;
        f.insert("u", "b").await;

        let items = f.merge.read("u", 0, 10).await.unwrap();
        assert_eq!(
            summary(&items),
            vec![
                ("b".to_string(), at(4)),
                ("a".to_string(), at(3)),
                ("b".to_string(), at(2)),
                ("a".to_string(), at(1)),
            ]
        );
    }

    #[tokio::test]
    async fn test_window_and_ties() {
        let f = Fixture::new();
        f.publish("a", 5).await;
        f.publish("b", 5).await;
        f.publish("b", 6).await;
        f.insert("u", "b").await;
        f.insert("u", "a").await;

        // b is first in the feed, so it wins the tie at minute 5
        let all = f.merge.read("u", 0, 10).await.unwrap();
        assert_eq!(
            summary(&all),
            vec![
                ("b".to_string(), at(6)),
                ("b".to_string(), at(5)),
                ("a".to_string(), at(5)),
            ]
        );

        let window = f.merge.read("u", 1, 1).await.unwrap();
        assert_eq!(summary(&window), vec![("b".to_string(), at(5))]);
    }

    #[tokio::test]
    async fn test_each_stream_keeps_its_chain_order() {
        let f = Fixture::new();
        // a published out of timestamp order
        f.publish("a", 9).await;
        f.publish("a", 1).await;
        f.publish("b", 5).await;
        f.insert("u", "a").await;
        f.insert("u", "b").await;

        let items = f.merge.read("u", 0, 10).await.unwrap();
        assert_eq!(
            summary(&items),
            vec![
                ("b".to_string(), at(5)),
                ("a".to_string(), at(1)),
                ("a".to_string(), at(9)),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_feeds() {
        let f = Fixture::new();
        assert!(f.merge.read("nobody", 0, 10).await.unwrap().is_empty());

        f.insert("u", "quiet").await;
        assert!(f.merge.read("u", 0, 10).await.unwrap().is_empty());

        f.publish("quiet", 1).await;
        assert!(f.merge.read("u", 0, 0).await.unwrap().is_empty());
        assert!(f.merge.read("u", 1, 10).await.unwrap().is_empty());
    }
}
