//! Interface definitions for the activity repository.
//!
//! `ChainStore` is the storage seam: implementations are injected into
//! `ActivityService` so the chain algorithms can run over any backend.
//! `ActivityReader` and `ActivityWriter` are the two contracts the service
//! exposes to callers.

mod activity;
mod chain_store;

pub use activity::{ActivityReader, ActivityWriter};
pub use chain_store::ChainStore;
