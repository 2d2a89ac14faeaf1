//! Chain addressing types and operation results.

use std::fmt;

use activity_shared::StreamItem;

/// Identifies one singly linked chain in the store.
///
/// Every entity owns one stream chain and every user owns one feed chain, so
/// the owner id alone namespaces the links.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChainKey {
    /// Most-recent-first chain of an entity's stream item ids.
    Stream(String),
    /// Recency-ordered chain of the entity ids a user follows.
    Feed(String),
}

impl ChainKey {
    pub fn stream(entity_id: impl Into<String>) -> Self {
        Self::Stream(entity_id.into())
    }

    pub fn feed(user_id: impl Into<String>) -> Self {
        Self::Feed(user_id.into())
    }
}

impl fmt::Display for ChainKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stream(id) => write!(f, "stream:{}", id),
            Self::Feed(id) => write!(f, "feed:{}", id),
        }
    }
}

/// A position in a chain: the owner's root, or a member.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChainNode {
    Root,
    Member(String),
}

impl ChainNode {
    pub fn member(id: impl Into<String>) -> Self {
        Self::Member(id.into())
    }
}

impl fmt::Display for ChainNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => write!(f, "<root>"),
            Self::Member(id) => write!(f, "{}", id),
        }
    }
}

/// A single link change inside one chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEdit {
    /// Add the link `from -> to`. Fails if `from` already has a successor or
    /// `to` already has a predecessor.
    Link { from: ChainNode, to: String },
    /// Remove the outgoing link of `from`. Fails if there is none.
    Unlink { from: ChainNode },
}

impl LinkEdit {
    pub fn link(from: ChainNode, to: impl Into<String>) -> Self {
        Self::Link {
            from,
            to: to.into(),
        }
    }

    pub fn unlink(from: ChainNode) -> Self {
        Self::Unlink { from }
    }
}

/// Result of moving an entity to the front of a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpliceOutcome {
    /// The entity was already first; no links changed.
    AlreadyFirst,
    /// The entity was moved to the front.
    Moved,
}

/// Result of a follow request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    /// The follow was created and the entity inserted at `position` (0-based)
    /// in the user's feed.
    Followed { position: usize },
    /// The user already followed the entity; nothing changed.
    AlreadyFollowing,
}

/// Summary of propagating one publish to the publisher's followers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropagationSummary {
    /// Number of followers visited.
    pub followers: usize,
    /// Feeds where the entity was moved to the front.
    pub moved: usize,
    /// Feeds where the entity was already first.
    pub unchanged: usize,
}

/// Result of a publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    /// The stream item that became the head of the entity's stream.
    pub item: StreamItem,
    /// How the publish fanned out to followers' feeds.
    pub propagation: PropagationSummary,
}
