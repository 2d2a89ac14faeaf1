//! Configuration types for the ActivityService.

/// Configuration for the ActivityService.
///
/// Stream and feed reads walk their chains linearly, so the cost of a read
/// grows with `start_index + count`. These limits bound that walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityServiceConfig {
    /// Maximum number of items a single read may return.
    ///
    /// Set to `None` to disable the limit. Defaults to 1000.
    pub max_read_count: Option<usize>,

    /// Maximum number of items a single read may skip.
    ///
    /// Set to `None` to disable the limit. Defaults to 10 000.
    pub max_start_index: Option<usize>,
}

impl Default for ActivityServiceConfig {
    fn default() -> Self {
        Self {
            max_read_count: Some(1000),
            max_start_index: Some(10_000),
        }
    }
}

impl ActivityServiceConfig {
    /// Create a config with no read limits.
    pub fn unlimited() -> Self {
        Self {
            max_read_count: None,
            max_start_index: None,
        }
    }

    /// Replace the read count limit.
    pub fn with_max_read_count(mut self, max_read_count: usize) -> Self {
        self.max_read_count = Some(max_read_count);
        self
    }

    /// Replace the start index limit.
    pub fn with_max_start_index(mut self, max_start_index: usize) -> Self {
        self.max_start_index = Some(max_start_index);
        self
    }
}
