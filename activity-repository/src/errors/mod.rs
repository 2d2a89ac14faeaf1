//! Error types for the activity repository.

mod activity_error;

pub use activity_error::ActivityError;
