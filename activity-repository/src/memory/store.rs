//! In-memory chain store.
//!
//! Chains are kept as a pair of maps per `ChainKey`: node to successor and
//! member to predecessor. Both directions are O(1), which is what makes
//! splice-to-front constant-size once its neighbours are known.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, error};
use uuid::Uuid;

use activity_shared::StreamItem;

use crate::errors::ActivityError;
use crate::interfaces::ChainStore;
use crate::types::{ChainKey, ChainNode, LinkEdit};

/// Links of a single chain.
#[derive(Debug, Default)]
struct ChainLinks {
    next: HashMap<ChainNode, String>,
    previous: HashMap<String, ChainNode>,
}

#[derive(Debug, Default)]
struct StoreState {
    entities: HashSet<String>,
    items: HashMap<Uuid, StreamItem>,
    /// entity -> users following it, in follow order
    followers: HashMap<String, Vec<String>>,
    /// user -> entities it follows
    following: HashMap<String, HashSet<String>>,
    chains: HashMap<ChainKey, ChainLinks>,
}

/// Store statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub entity_count: usize,
    pub stream_item_count: usize,
    pub follow_count: usize,
    pub chain_count: usize,
    pub link_count: usize,
}

/// A `ChainStore` held entirely in process memory.
#[derive(Debug, Default)]
pub struct InMemoryChainStore {
    state: RwLock<StoreState>,
}

impl InMemoryChainStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get store statistics.
    pub async fn stats(&self) -> StoreStats {
        let state = self.state.read().await;
        StoreStats {
            entity_count: state.entities.len(),
            stream_item_count: state.items.len(),
            follow_count: state.followers.values().map(Vec::len).sum(),
            chain_count: state.chains.len(),
            link_count: state.chains.values().map(|c| c.next.len()).sum(),
        }
    }
}

/// Pending link changes of one `apply_edits` batch.
///
/// Reads fall through to the committed links unless the batch already
/// changed the entry. `None` marks a link removed by the batch.
struct StagedLinks<'a> {
    base: Option<&'a ChainLinks>,
    next: HashMap<ChainNode, Option<String>>,
    previous: HashMap<String, Option<ChainNode>>,
}

impl<'a> StagedLinks<'a> {
    fn new(base: Option<&'a ChainLinks>) -> Self {
        Self {
            base,
            next: HashMap::new(),
            previous: HashMap::new(),
        }
    }

    fn next_of(&self, node: &ChainNode) -> Option<String> {
        match self.next.get(node) {
            Some(staged) => staged.clone(),
            None => self.base.and_then(|b| b.next.get(node).cloned()),
        }
    }

    fn previous_of(&self, member: &str) -> Option<ChainNode> {
        match self.previous.get(member) {
            Some(staged) => staged.clone(),
            None => self.base.and_then(|b| b.previous.get(member).cloned()),
        }
    }

    fn stage(&mut self, chain: &ChainKey, edit: &LinkEdit) -> Result<(), ActivityError> {
        match edit {
            LinkEdit::Link { from, to } => {
                if matches!(from, ChainNode::Member(id) if id == to) {
                    return Err(ActivityError::invariant(format!(
                        "{}: refusing self-link on {}",
                        chain, to
                    )));
                }
                if let Some(existing) = self.next_of(from) {
                    return Err(ActivityError::invariant(format!(
                        "{}: {} already links to {}, cannot link to {}",
                        chain, from, existing, to
                    )));
                }
                if let Some(existing) = self.previous_of(to) {
                    return Err(ActivityError::invariant(format!(
                        "{}: {} already has predecessor {}, cannot link from {}",
                        chain, to, existing, from
                    )));
                }
                self.next.insert(from.clone(), Some(to.clone()));
                self.previous.insert(to.clone(), Some(from.clone()));
            }
            LinkEdit::Unlink { from } => {
                let Some(target) = self.next_of(from) else {
                    return Err(ActivityError::invariant(format!(
                        "{}: {} has no outgoing link to remove",
                        chain, from
                    )));
                };
                self.next.insert(from.clone(), None);
                self.previous.insert(target, None);
            }
        }
        Ok(())
    }

    fn into_changes(
        self,
    ) -> (
        HashMap<ChainNode, Option<String>>,
        HashMap<String, Option<ChainNode>>,
    ) {
        (self.next, self.previous)
    }
}

#[async_trait]
impl ChainStore for InMemoryChainStore {
    async fn ensure_entity(&self, entity_id: &str) -> Result<(), ActivityError> {
        let mut state = self.state.write().await;
        if state.entities.insert(entity_id.to_string()) {
            debug!(entity_id = %entity_id, "Created entity");
        }
        Ok(())
    }

    async fn contains_entity(&self, entity_id: &str) -> Result<bool, ActivityError> {
        Ok(self.state.read().await.entities.contains(entity_id))
    }

    async fn create_stream_item(
        &self,
        timestamp: DateTime<Utc>,
    ) -> Result<StreamItem, ActivityError> {
        let item = StreamItem::new(timestamp);
        self.state.write().await.items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn remove_stream_item(&self, item_id: &Uuid) -> Result<(), ActivityError> {
        if self.state.write().await.items.remove(item_id).is_some() {
            debug!(item_id = %item_id, "Removed stream item");
        }
        Ok(())
    }

    async fn get_stream_item(&self, item_id: &Uuid) -> Result<Option<StreamItem>, ActivityError> {
        Ok(self.state.read().await.items.get(item_id).cloned())
    }

    async fn add_follow(&self, user_id: &str, entity_id: &str) -> Result<bool, ActivityError> {
        let mut state = self.state.write().await;
        let created = state
            .following
            .entry(user_id.to_string())
            .or_default()
            .insert(entity_id.to_string());
        if created {
            state
                .followers
                .entry(entity_id.to_string())
                .or_default()
                .push(user_id.to_string());
        }
        Ok(created)
    }

    async fn remove_follow(&self, user_id: &str, entity_id: &str) -> Result<(), ActivityError> {
        let mut state = self.state.write().await;
        let removed = state
            .following
            .get_mut(user_id)
            .is_some_and(|entities| entities.remove(entity_id));
        if removed {
            if let Some(users) = state.followers.get_mut(entity_id) {
                users.retain(|u| u != user_id);
            }
        }
        Ok(())
    }

    async fn is_following(&self, user_id: &str, entity_id: &str) -> Result<bool, ActivityError> {
        Ok(self
            .state
            .read()
            .await
            .following
            .get(user_id)
            .is_some_and(|entities| entities.contains(entity_id)))
    }

    async fn followers(&self, entity_id: &str) -> Result<Vec<String>, ActivityError> {
        Ok(self
            .state
            .read()
            .await
            .followers
            .get(entity_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn next(
        &self,
        chain: &ChainKey,
        node: &ChainNode,
    ) -> Result<Option<String>, ActivityError> {
        Ok(self
            .state
            .read()
            .await
            .chains
            .get(chain)
            .and_then(|links| links.next.get(node).cloned()))
    }

    async fn previous(
        &self,
        chain: &ChainKey,
        member: &str,
    ) -> Result<Option<ChainNode>, ActivityError> {
        Ok(self
            .state
            .read()
            .await
            .chains
            .get(chain)
            .and_then(|links| links.previous.get(member).cloned()))
    }

    async fn apply_edits(
        &self,
        chain: &ChainKey,
        edits: &[LinkEdit],
    ) -> Result<(), ActivityError> {
        let mut state = self.state.write().await;

        let (next_changes, previous_changes) = {
            let mut staged = StagedLinks::new(state.chains.get(chain));
            for edit in edits {
                if let Err(e) = staged.stage(chain, edit) {
                    error!(chain = %chain, error = %e, "Rejected chain edit batch");
                    return Err(e);
                }
            }
            staged.into_changes()
        };

        let links = state.chains.entry(chain.clone()).or_default();
        for (node, target) in next_changes {
            match target {
                Some(target) => {
                    links.next.insert(node, target);
                }
                None => {
                    links.next.remove(&node);
                }
            }
        }
        for (member, source) in previous_changes {
            match source {
                Some(source) => {
                    links.previous.insert(member, source);
                }
                None => {
                    links.previous.remove(&member);
                }
            }
        }

        debug!(chain = %chain, edits = edits.len(), "Applied chain edits");
        Ok(())
    }
}
