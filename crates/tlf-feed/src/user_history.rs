//! Cross-folder aggregation of edit histories.

use crate::config::FeedConfig;
use crate::display::{newest_time, FolderEditHistory};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tlf_history::{History, TlfHistory};
use tlf_notify::FolderRef;
use tracing::{debug, info};

struct FolderEntry {
    folder: FolderRef,
    history: History,
    newest: Option<DateTime<Utc>>,
}

/// The edit histories of all folders a user participates in, ranked by
/// each folder's most recent surviving edit.
///
/// Created once per user session and cleared on logout.
pub struct UserHistory {
    config: FeedConfig,
    folders: RwLock<Vec<FolderEntry>>,
}

impl UserHistory {
    pub fn new() -> Self {
        Self::with_config(FeedConfig::default())
    }

    pub fn with_config(config: FeedConfig) -> Self {
        Self {
            config,
            folders: RwLock::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Pull the current merged history of `tlf_history` (recomputing it if
    /// stale) and re-rank all folders. Folders with no edits sort last.
    pub fn update_history(&self, folder: FolderRef, tlf_history: &TlfHistory) {
        // Lock order is feed then folder; snapshots of one folder are
        // applied in the order they were taken.
        let mut folders = self.folders.write();
        let history = tlf_history.get_history();
        let newest = newest_time(&history);

        match folders.iter_mut().find(|entry| entry.folder == folder) {
            Some(entry) => {
                entry.history = history;
                entry.newest = newest;
            }
            None => folders.push(FolderEntry {
                folder: folder.clone(),
                history,
                newest,
            }),
        }
        folders.sort_by(|a, b| b.newest.cmp(&a.newest));
        debug!(folder = %folder, ?newest, folders = folders.len(), "updated folder history");
    }

    /// The display history of one folder; empty if the folder is unknown.
    pub fn get_folder_history(&self, folder: &FolderRef) -> FolderEditHistory {
        self.folders
            .read()
            .iter()
            .find(|entry| &entry.folder == folder)
            .map(|entry| FolderEditHistory::from_history(&entry.folder, &entry.history))
            .unwrap_or_default()
    }

    /// The most recently edited folders, up to `max_tlfs`, newest first.
    pub fn get_all(&self) -> Vec<FolderEditHistory> {
        self.folders
            .read()
            .iter()
            .take(self.config.max_tlfs)
            .map(|entry| FolderEditHistory::from_history(&entry.folder, &entry.history))
            .collect()
    }

    /// Every tracked folder in ranked order, including those beyond the cap.
    pub fn folder_keys(&self) -> Vec<FolderRef> {
        self.folders
            .read()
            .iter()
            .map(|entry| entry.folder.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.folders.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.folders.read().is_empty()
    }

    /// Forget every folder, e.g. on logout or account switch.
    pub fn clear(&self) {
        let mut folders = self.folders.write();
        info!(folders = folders.len(), "clearing user edit history");
        folders.clear();
    }
}

impl Default for UserHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tlf_notify::{codec, FolderType, NotificationMessage, NotificationOpType};

    fn folder_with_edit(rev: i64, minute: u32) -> TlfHistory {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, minute, 0).unwrap();
        let history = TlfHistory::new();
        let msg = NotificationMessage::new(rev, "f", NotificationOpType::Create, "t", "alice", ts);
        history.ingest("alice", &[codec::encode(&[msg]).unwrap()]).unwrap();
        history
    }

    #[test]
    fn test_unknown_folder_is_empty() {
        let feed = UserHistory::new();
        let result = feed.get_folder_history(&FolderRef::new("nobody", FolderType::Public));
        assert_eq!(result, FolderEditHistory::default());
    }

    #[test]
    fn test_update_replaces_entry() {
        let feed = UserHistory::new();
        let key = FolderRef::new("alice", FolderType::Private);
        feed.update_history(key.clone(), &folder_with_edit(1, 1));
        feed.update_history(key.clone(), &folder_with_edit(2, 5));
        assert_eq!(feed.len(), 1);
        assert_eq!(
            feed.get_folder_history(&key).server_time,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 5, 0).unwrap())
        );
    }

    #[test]
    fn test_same_name_different_type() {
        let feed = UserHistory::new();
        feed.update_history(FolderRef::new("alice", FolderType::Private), &folder_with_edit(1, 1));
        feed.update_history(FolderRef::new("alice", FolderType::Public), &folder_with_edit(1, 2));
        assert_eq!(feed.len(), 2);
        assert_eq!(feed.folder_keys()[0].folder_type, FolderType::Public);
    }

    #[test]
    fn test_concurrent_updates_keep_latest_snapshot() {
        let feed = UserHistory::new();
        let folder = TlfHistory::new();
        let key = FolderRef::new("shared", FolderType::Private);
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        std::thread::scope(|s| {
            for i in 0..8 {
                let (feed, folder, key) = (&feed, &folder, &key);
                s.spawn(move || {
                    let writer = format!("user{}", i);
                    let msg = NotificationMessage::new(i + 1, format!("f{}", i), NotificationOpType::Create, "t", writer.as_str(), ts);
                    folder.ingest(&writer, &[codec::encode(&[msg]).unwrap()]).unwrap();
                    feed.update_history(key.clone(), folder);
                });
            }
        });

        // Every ingest happened before the last update took its snapshot.
        assert_eq!(feed.get_folder_history(&key).history.len(), 8);
    }

    #[test]
    fn test_clear() {
        let feed = UserHistory::new();
        feed.update_history(FolderRef::new("alice", FolderType::Private), &folder_with_edit(1, 1));
        feed.clear();
        assert!(feed.is_empty());
        assert!(feed.get_all().is_empty());
    }
}
