//! Chain managers.
//!
//! - `StreamChains`: per-entity, most-recent-first chains of stream items
//! - `FeedChains`: per-user, recency-ordered chains of followed entities
//! - `FeedMerge`: merged multi-entity reads over a feed

mod feed;
mod merge;
mod stream;

pub use feed::{supersedes, FeedChains};
pub use merge::FeedMerge;
pub use stream::StreamChains;

use uuid::Uuid;

use crate::errors::ActivityError;
use crate::types::ChainKey;

/// Parse a stream chain member back into a stream item id.
pub(crate) fn item_id(chain: &ChainKey, member: &str) -> Result<Uuid, ActivityError> {
    Uuid::parse_str(member).map_err(|e| {
        ActivityError::invariant(format!(
            "{}: member {} is not a stream item id: {}",
            chain, member, e
        ))
    })
}
