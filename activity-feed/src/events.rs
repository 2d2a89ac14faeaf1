//! Input events and per-event results of a replay.

use activity_shared::{FeedItem, StreamItem};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One line of replay input, tagged by `op`.
///
/// ```json
/// {"op":"publish","entity_id":"alice","timestamp":"2024-05-01T12:00:00Z"}
/// {"op":"follow","user_id":"bob","entity_id":"alice"}
/// {"op":"read_feed","user_id":"bob","count":10}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ActivityEvent {
    Publish {
        entity_id: String,
        timestamp: DateTime<Utc>,
    },
    Follow {
        user_id: String,
        entity_id: String,
    },
    ReadStream {
        entity_id: String,
        #[serde(default)]
        start_index: usize,
        count: usize,
    },
    ReadFeed {
        user_id: String,
        #[serde(default)]
        start_index: usize,
        count: usize,
    },
}

impl ActivityEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Publish { .. } => "publish",
            Self::Follow { .. } => "follow",
            Self::ReadStream { .. } => "read_stream",
            Self::ReadFeed { .. } => "read_feed",
        }
    }
}

/// The result line written for one input line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EventOutcome {
    Published {
        line: usize,
        entity_id: String,
        item_id: Uuid,
        followers: usize,
        moved: usize,
    },
    Followed {
        line: usize,
        user_id: String,
        entity_id: String,
        /// Feed position the entity was inserted at; absent for a repeated
        /// follow.
        #[serde(skip_serializing_if = "Option::is_none")]
        position: Option<usize>,
    },
    Stream {
        line: usize,
        entity_id: String,
        items: Vec<StreamItem>,
    },
    Feed {
        line: usize,
        user_id: String,
        items: Vec<FeedItem>,
    },
    Rejected {
        line: usize,
        error: String,
    },
}

impl EventOutcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    pub fn is_read(&self) -> bool {
        matches!(self, Self::Stream { .. } | Self::Feed { .. })
    }
}
