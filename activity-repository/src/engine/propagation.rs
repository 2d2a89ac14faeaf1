//! Publish propagation.
//!
//! The entity that just published is at least as recent as every other entity
//! from any follower's point of view, so propagation is a positional move to
//! the front and never compares timestamps.

use std::sync::Arc;

use tracing::{debug, error};

use crate::chain::FeedChains;
use crate::errors::ActivityError;
use crate::interfaces::ChainStore;
use crate::locks::ChainLocks;
use crate::types::{ChainKey, PropagationSummary, SpliceOutcome};

/// Fans a publish out to every follower's feed.
#[derive(Clone)]
pub struct PropagationEngine {
    store: Arc<dyn ChainStore>,
    feeds: FeedChains,
    locks: Arc<ChainLocks>,
}

impl PropagationEngine {
    pub fn new(store: Arc<dyn ChainStore>, feeds: FeedChains, locks: Arc<ChainLocks>) -> Self {
        Self {
            store,
            feeds,
            locks,
        }
    }

    /// Splice `entity_id` to the front of every follower's feed.
    ///
    /// Each follower's feed lock is taken and released on its own; there is
    /// no atomicity across followers. A failing follower does not stop the
    /// others: every follower is visited and the first error is returned.
    pub async fn on_publish(&self, entity_id: &str) -> Result<PropagationSummary, ActivityError> {
        let followers = self.store.followers(entity_id).await?;
        let mut summary = PropagationSummary {
            followers: followers.len(),
            ..PropagationSummary::default()
        };
        let mut first_error = None;

        for user_id in &followers {
            let guard = self.locks.acquire(ChainKey::feed(user_id.as_str())).await;
            match self.feeds.splice_to_front(&guard, user_id, entity_id).await {
                Ok(SpliceOutcome::Moved) => summary.moved += 1,
                Ok(SpliceOutcome::AlreadyFirst) => summary.unchanged += 1,
                Err(e) => {
                    error!(
                        user_id = %user_id,
                        entity_id = %entity_id,
                        error = %e,
                        "Failed to propagate publish to follower feed"
                    );
                    first_error.get_or_insert(e);
                }
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        debug!(
            entity_id = %entity_id,
            followers = summary.followers,
            moved = summary.moved,
            unchanged = summary.unchanged,
            "Propagated publish"
        );
        Ok(summary)
    }
}
