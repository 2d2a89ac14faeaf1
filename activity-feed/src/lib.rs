//! # Activity Feed
//!
//! Drives an `ActivityService` from a JSON-lines stream of activity events:
//! publishes, follows and reads. Each event produces one JSON result line.

pub mod config;
pub mod errors;
pub mod events;
pub mod replay;

pub use config::{Dependencies, FeedConfig, LogFormat};
pub use errors::ReplayError;
pub use events::{ActivityEvent, EventOutcome};
pub use replay::{ReplaySummary, Replayer};
