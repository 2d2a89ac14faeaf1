//! Feed item type.

use serde::{Deserialize, Serialize};

use super::StreamItem;

/// A stream item as seen through a user's feed, tagged with the entity that
/// published it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    /// The followed entity that published the item.
    pub entity_id: String,
    /// The published item.
    pub item: StreamItem,
}

impl FeedItem {
    pub fn new(entity_id: impl Into<String>, item: StreamItem) -> Self {
        Self {
            entity_id: entity_id.into(),
            item,
        }
    }
}
