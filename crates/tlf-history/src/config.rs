//! Retention limits for a folder history.

use serde::{Deserialize, Serialize};

/// The max number of surviving edits kept for each writer.
pub const MAX_EDITS_PER_WRITER: usize = 10;
/// The max number of writers retained per folder.
pub const MAX_WRITERS_PER_HISTORY: usize = 10;

/// Retention limits for a [`TlfHistory`](crate::TlfHistory).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryLimits {
    /// Surviving edits per writer; once reached, older raw notifications
    /// for that writer are discarded.
    #[serde(default = "default_edits")]
    pub max_edits_per_writer: usize,
    /// Writers kept per folder, ranked by their most recent surviving edit.
    #[serde(default = "default_writers")]
    pub max_writers_per_history: usize,
}

fn default_edits() -> usize {
    MAX_EDITS_PER_WRITER
}

fn default_writers() -> usize {
    MAX_WRITERS_PER_HISTORY
}

impl Default for HistoryLimits {
    fn default() -> Self {
        Self {
            max_edits_per_writer: MAX_EDITS_PER_WRITER,
            max_writers_per_history: MAX_WRITERS_PER_HISTORY,
        }
    }
}

impl HistoryLimits {
    /// Zero limits would never let a writer fill up; raise them to one.
    pub fn normalized(self) -> Self {
        Self {
            max_edits_per_writer: self.max_edits_per_writer.max(1),
            max_writers_per_history: self.max_writers_per_history.max(1),
        }
    }
}

/// Builder for history limits.
pub struct HistoryLimitsBuilder {
    limits: HistoryLimits,
}

impl HistoryLimitsBuilder {
    pub fn new() -> Self {
        Self {
            limits: HistoryLimits::default(),
        }
    }

    pub fn max_edits_per_writer(mut self, max: usize) -> Self {
        self.limits.max_edits_per_writer = max;
        self
    }

    pub fn max_writers_per_history(mut self, max: usize) -> Self {
        self.limits.max_writers_per_history = max;
        self
    }

    pub fn build(self) -> HistoryLimits {
        self.limits.normalized()
    }
}

impl Default for HistoryLimitsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
