//! Configuration for the cross-folder feed.

use serde::{Deserialize, Serialize};

/// The max number of folders returned by the feed.
pub const MAX_TLFS: usize = 10;

/// Configuration for a [`UserHistory`](crate::UserHistory).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Folders returned by `get_all`, most recently edited first.
    #[serde(default = "default_max_tlfs")]
    pub max_tlfs: usize,
}

fn default_max_tlfs() -> usize {
    MAX_TLFS
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self { max_tlfs: MAX_TLFS }
    }
}

/// Builder for feed configuration.
pub struct FeedConfigBuilder {
    config: FeedConfig,
}

impl FeedConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: FeedConfig::default(),
        }
    }

    pub fn max_tlfs(mut self, max: usize) -> Self {
        self.config.max_tlfs = max;
        self
    }

    pub fn build(self) -> FeedConfig {
        self.config
    }
}

impl Default for FeedConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
