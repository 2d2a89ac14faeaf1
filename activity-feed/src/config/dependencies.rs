//! Dependency initialization and wiring.

use std::sync::Arc;

use activity_repository::{ActivityService, InMemoryChainStore};
use tracing::info;

use super::FeedConfig;
use crate::replay::Replayer;

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The backing store, kept for statistics.
    pub store: Arc<InMemoryChainStore>,
    /// The service shared by every consumer.
    pub service: Arc<ActivityService>,
    /// The replayer driving the service.
    pub replayer: Replayer,
}

impl Dependencies {
    /// Build the store, the service and the replayer.
    pub fn new(config: &FeedConfig) -> Self {
        info!(
            max_read_count = ?config.service.max_read_count,
            max_start_index = ?config.service.max_start_index,
            "Initializing dependencies"
        );

        let store = Arc::new(InMemoryChainStore::new());
        let service = Arc::new(ActivityService::with_config(
            store.clone(),
            config.service.clone(),
        ));
        let replayer = Replayer::new(service.clone(), service.clone());

        Self {
            store,
            service,
            replayer,
        }
    }
}
