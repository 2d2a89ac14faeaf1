//! # Activity Shared
//!
//! Plain data types shared between the activity repository and the binaries
//! that drive it.

pub mod types;

pub use types::{FeedItem, RecencyKey, StreamItem};
