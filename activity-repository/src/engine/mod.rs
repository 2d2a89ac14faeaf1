//! Engines applying chain primitives in response to writes.
//!
//! - `PropagationEngine`: on publish, moves the publisher to the front of
//!   each follower's feed
//! - `InsertionEngine`: on follow, places the followed entity at its recency
//!   position

mod insertion;
mod propagation;

pub use insertion::InsertionEngine;
pub use propagation::PropagationEngine;
