//! In-memory implementation of the `ChainStore` trait.

mod store;

pub use store::{InMemoryChainStore, StoreStats};
