//! Per-writer notification lists.

use serde::{Deserialize, Serialize};
use tlf_notify::NotificationMessage;

/// The raw notifications known for one writer in one folder.
///
/// Always sorted newest first by `(revision, within_revision_index)` and
/// free of duplicate keys.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WriterNotifications {
    writer_name: String,
    notifications: Vec<NotificationMessage>,
}

impl WriterNotifications {
    pub fn new(writer_name: impl Into<String>) -> Self {
        Self {
            writer_name: writer_name.into(),
            notifications: Vec::new(),
        }
    }

    pub fn writer_name(&self) -> &str {
        &self.writer_name
    }

    /// Merge new notifications in, returning whether anything new was added.
    pub fn merge(&mut self, new: Vec<NotificationMessage>) -> bool {
        let old_len = self.notifications.len();
        // Existing entries go first so the stable sort keeps them over
        // re-delivered copies.
        self.notifications.extend(new);
        self.notifications
            .sort_by(NotificationMessage::cmp_newest_first);
        self.notifications.dedup_by_key(|n| n.sort_key());
        self.notifications.len() != old_len
    }

    /// Drop everything older than the first `len` notifications.
    pub fn truncate(&mut self, len: usize) {
        self.notifications.truncate(len);
    }

    /// Drop notifications matching `pred`, returning how many were removed.
    pub fn remove_where(&mut self, pred: impl Fn(&NotificationMessage) -> bool) -> usize {
        let old_len = self.notifications.len();
        self.notifications.retain(|n| !pred(n));
        old_len - self.notifications.len()
    }

    /// Drop the notifications at `positions`, which must be ascending.
    pub fn remove_positions(&mut self, positions: &[usize]) -> usize {
        let old_len = self.notifications.len();
        let mut pos = 0;
        self.notifications.retain(|_| {
            let keep = positions.binary_search(&pos).is_err();
            pos += 1;
            keep
        });
        old_len - self.notifications.len()
    }

    /// The most recent notification.
    pub fn head(&self) -> Option<&NotificationMessage> {
        self.notifications.first()
    }

    /// The oldest notification.
    pub fn tail(&self) -> Option<&NotificationMessage> {
        self.notifications.last()
    }

    pub fn notifications(&self) -> &[NotificationMessage] {
        &self.notifications
    }

    pub fn len(&self) -> usize {
        self.notifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }
}

/// The surviving edits of one writer, newest first, with filenames already
/// resolved through any later renames.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriterEdits {
    pub writer_name: String,
    pub edits: Vec<NotificationMessage>,
}

impl WriterEdits {
    pub fn newest(&self) -> Option<&NotificationMessage> {
        self.edits.first()
    }
}
