//! # Activity Repository
//!
//! Per-entity activity streams and per-user feeds kept in recency order by
//! local, constant-size link edits.
//!
//! - `ChainStore` abstracts the backing store: entities, stream items, follow
//!   relations and singly linked chains addressed by `ChainKey`.
//! - `StreamChains` and `FeedChains` implement the chain primitives
//!   (prepend, splice-to-front, merge-insert).
//! - `PropagationEngine` and `InsertionEngine` apply those primitives on
//!   publish and on follow.
//! - `ActivityService` is the reader/writer façade handed to callers.

pub mod chain;
pub mod config;
pub mod engine;
pub mod errors;
pub mod interfaces;
pub mod locks;
pub mod memory;
pub mod service;
pub mod types;

pub use config::ActivityServiceConfig;
pub use errors::ActivityError;
pub use interfaces::{ActivityReader, ActivityWriter, ChainStore};
pub use locks::{ChainGuard, ChainLocks};
pub use memory::InMemoryChainStore;
pub use service::ActivityService;
pub use types::{
    ChainKey, ChainNode, FollowOutcome, LinkEdit, PropagationSummary, PublishReceipt,
    SpliceOutcome,
};
