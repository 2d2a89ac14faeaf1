//! Stream item type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The timestamp of an entity's newest stream item, or `None` if the entity
/// has never published.
pub type RecencyKey = Option<DateTime<Utc>>;

/// One unit of published activity.
///
/// Stream items are created by the store on publish and are never mutated
/// afterwards. The timestamp is caller-supplied and is not validated against
/// earlier items of the same stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamItem {
    /// Store-assigned identifier.
    pub id: Uuid,
    /// When the activity happened, as reported by the publisher.
    pub timestamp: DateTime<Utc>,
}

impl StreamItem {
    /// Create a stream item with a fresh identifier.
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp,
        }
    }
}
