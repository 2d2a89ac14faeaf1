//! Feed chains.
//!
//! Each user's feed is a chain rooted at the user whose members are the
//! entities the user follows, ordered by the timestamp of each entity's newest
//! stream item, newest first. Entities with equal recency keep the order in
//! which they entered the feed.
//!
//! Two primitives keep the order without ever re-sorting:
//!
//! - `splice_to_front` moves an entity that just published to the head.
//! - `merge_insert` walks the chain once to place a newly followed entity.

use std::sync::Arc;

use tracing::debug;

use activity_shared::RecencyKey;

use super::StreamChains;
use crate::errors::ActivityError;
use crate::interfaces::ChainStore;
use crate::locks::ChainGuard;
use crate::types::{ChainKey, ChainNode, LinkEdit, SpliceOutcome};

/// Whether a chain node with recency `node` stays ahead of a candidate with
/// recency `candidate`.
///
/// - A node that has never published never stays ahead of a candidate that
///   has.
/// - A candidate that has never published never overtakes anything.
/// - Otherwise the node stays ahead unless it is strictly older, so on a tie
///   the node already in the chain keeps its place.
pub fn supersedes(node: RecencyKey, candidate: RecencyKey) -> bool {
    match (node, candidate) {
        (_, None) => true,
        (None, Some(_)) => false,
        (Some(node), Some(candidate)) => node >= candidate,
    }
}

/// Maintains per-user feed chains.
#[derive(Clone)]
pub struct FeedChains {
    store: Arc<dyn ChainStore>,
    streams: StreamChains,
}

impl FeedChains {
    pub fn new(store: Arc<dyn ChainStore>, streams: StreamChains) -> Self {
        Self { store, streams }
    }

    /// Find the neighbours of `entity_id` in `user_id`'s feed.
    ///
    /// # Returns
    ///
    /// * `Ok(Some((predecessor, successor)))` - The node linking to the entity
    ///   (possibly the root) and the entity it links to (`None` at the tail)
    /// * `Ok(None)` - If the entity is not in the feed
    pub async fn locate(
        &self,
        user_id: &str,
        entity_id: &str,
    ) -> Result<Option<(ChainNode, Option<String>)>, ActivityError> {
        let chain = ChainKey::feed(user_id);
        let Some(predecessor) = self.store.previous(&chain, entity_id).await? else {
            return Ok(None);
        };
        let successor = self
            .store
            .next(&chain, &ChainNode::member(entity_id))
            .await?;
        Ok(Some((predecessor, successor)))
    }

    /// Move `entity_id` to the front of `user_id`'s feed, keeping the relative
    /// order of every other entity.
    ///
    /// Removes the root's, the predecessor's and the entity's outgoing links
    /// and re-adds root -> entity, entity -> old head and predecessor ->
    /// successor, as one atomic batch. The entity must already be in the feed.
    pub async fn splice_to_front(
        &self,
        guard: &ChainGuard,
        user_id: &str,
        entity_id: &str,
    ) -> Result<SpliceOutcome, ActivityError> {
        let chain = ChainKey::feed(user_id);
        debug_assert!(
            guard.covers(&chain),
            "holding lock on {} while editing {}",
            guard.key(),
            chain
        );

        let Some((predecessor, successor)) = self.locate(user_id, entity_id).await? else {
            return Err(ActivityError::invariant(format!(
                "{}: followed entity {} is not linked",
                chain, entity_id
            )));
        };

        if predecessor == ChainNode::Root {
            return Ok(SpliceOutcome::AlreadyFirst);
        }

        let head = self
            .store
            .next(&chain, &ChainNode::Root)
            .await?
            .ok_or_else(|| {
                ActivityError::invariant(format!(
                    "{}: {} is linked but the feed has no head",
                    chain, entity_id
                ))
            })?;

        let entity = ChainNode::member(entity_id);
        let mut edits = vec![
            LinkEdit::unlink(ChainNode::Root),
            LinkEdit::unlink(predecessor.clone()),
        ];
        if successor.is_some() {
            edits.push(LinkEdit::unlink(entity.clone()));
        }
        edits.push(LinkEdit::link(ChainNode::Root, entity_id));
        edits.push(LinkEdit::link(entity, head.clone()));
        if let Some(successor) = &successor {
            edits.push(LinkEdit::link(predecessor.clone(), successor.clone()));
        }

        self.store.apply_edits(&chain, &edits).await?;

        debug!(
            user_id = %user_id,
            entity_id = %entity_id,
            previous_head = %head,
            predecessor = %predecessor,
            successor = ?successor,
            "Spliced entity to feed front"
        );
        Ok(SpliceOutcome::Moved)
    }

    /// Insert `entity_id` into `user_id`'s feed before the first entity that
    /// does not supersede `recency`, or at the tail.
    ///
    /// Returns the 0-based position the entity was inserted at. The entity
    /// must not already be in the feed.
    pub async fn merge_insert(
        &self,
        guard: &ChainGuard,
        user_id: &str,
        entity_id: &str,
        recency: RecencyKey,
    ) -> Result<usize, ActivityError> {
        let chain = ChainKey::feed(user_id);
        debug_assert!(
            guard.covers(&chain),
            "holding lock on {} while editing {}",
            guard.key(),
            chain
        );

        if let Some(predecessor) = self.store.previous(&chain, entity_id).await? {
            return Err(ActivityError::invariant(format!(
                "{}: {} is already linked after {}",
                chain, entity_id, predecessor
            )));
        }

        let mut previous = ChainNode::Root;
        let mut current = self.store.next(&chain, &previous).await?;
        let mut position = 0usize;

        while let Some(node) = &current {
            let node_recency = self.streams.recency_key(node).await?;
            if !supersedes(node_recency, recency) {
                break;
            }
            previous = ChainNode::member(node.as_str());
            current = self.store.next(&chain, &previous).await?;
            position += 1;
        }

        let edits = match &current {
            Some(next) => vec![
                LinkEdit::unlink(previous.clone()),
                LinkEdit::link(previous.clone(), entity_id),
                LinkEdit::link(ChainNode::member(entity_id), next.clone()),
            ],
            None => vec![LinkEdit::link(previous.clone(), entity_id)],
        };
        self.store.apply_edits(&chain, &edits).await?;

        debug!(
            user_id = %user_id,
            entity_id = %entity_id,
            recency = ?recency,
            after = %previous,
            before = ?current,
            position,
            "Merge-inserted entity into feed"
        );
        Ok(position)
    }

    /// The entities in `user_id`'s feed, in chain order.
    pub async fn entities(&self, user_id: &str) -> Result<Vec<String>, ActivityError> {
        let chain = ChainKey::feed(user_id);
        let mut entities = Vec::new();
        let mut current = self.store.next(&chain, &ChainNode::Root).await?;
        while let Some(entity) = current {
            current = self
                .store
                .next(&chain, &ChainNode::member(entity.as_str()))
                .await?;
            entities.push(entity);
        }
        Ok(entities)
    }
}
