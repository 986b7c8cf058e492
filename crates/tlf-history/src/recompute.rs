//! The newest-first merge over all writers of a folder.
//!
//! Renames and deletes are filename-scoped and can come from any writer, so
//! notifications must be visited in revision order across the whole folder.
//! A `BinaryHeap` keyed by each writer's next pending notification yields
//! that order without materializing a combined list.

use crate::config::HistoryLimits;
use crate::writer::WriterNotifications;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tlf_notify::{EntryType, NotificationMessage, NotificationOpType, Revision};
use tracing::warn;

/// What later revisions did to a name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum FileEvent {
    /// The name was deleted or overwritten.
    Deleted,
    /// The entry was renamed; this is its final name.
    RenamedTo(String),
}

/// Result of processing one notification for a writer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Progress {
    Continue,
    /// The notification is a create or modify that can never surface, such
    /// as an older duplicate of a kept edit. Its raw entry can be dropped.
    Redundant,
    /// The writer has all the edits it can keep; older notifications for it
    /// are irrelevant.
    WriterFull,
}

const FILES_TO_IGNORE: [&str; 3] = [".Trashes", ".fseventsd", ".DS_Store"];

/// macOS metadata files, and conflict copies of them, never show up.
pub(crate) fn ignore_file(filename: &str) -> bool {
    let base = filename.rsplit('/').next().unwrap_or(filename);
    base.starts_with("._")
        || FILES_TO_IGNORE
            .iter()
            .any(|prefix| base.starts_with(prefix))
}

/// One writer's position in the merge.
#[derive(Debug)]
pub(crate) struct Cursor<'a> {
    key: (Revision, usize),
    pub(crate) writer: &'a WriterNotifications,
    pub(crate) pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn at(writer: &'a WriterNotifications, pos: usize) -> Option<Self> {
        writer.notifications().get(pos).map(|n| Cursor {
            key: n.sort_key(),
            writer,
            pos,
        })
    }

    pub(crate) fn current(&self) -> &'a NotificationMessage {
        &self.writer.notifications()[self.pos]
    }
}

impl Ord for Cursor<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key
            .cmp(&other.key)
            .then_with(|| other.writer.writer_name().cmp(self.writer.writer_name()))
    }
}

impl PartialEq for Cursor<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Cursor<'_> {}

impl PartialOrd for Cursor<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Scratch state for a single recompute pass.
pub(crate) struct Recomputer {
    max_edits: usize,
    merged: HashMap<String, Vec<NotificationMessage>>,
    modified_files: HashMap<String, HashSet<String>>,
    file_events: HashMap<String, FileEvent>,
    /// Flushed notifications at or past this revision are shadowed by the
    /// local user's unflushed ones.
    pub(crate) min_unflushed: Option<Revision>,
}

impl Recomputer {
    pub(crate) fn new(limits: &HistoryLimits) -> Self {
        Self {
            max_edits: limits.max_edits_per_writer,
            merged: HashMap::new(),
            modified_files: HashMap::new(),
            file_events: HashMap::new(),
            min_unflushed: None,
        }
    }

    /// Take the surviving edits for `writer`, newest first.
    pub(crate) fn take_merged(&mut self, writer: &str) -> Vec<NotificationMessage> {
        self.merged.remove(writer).unwrap_or_default()
    }

    /// Process one notification. Must be called newest first.
    pub(crate) fn process(&mut self, writer: &str, notification: &NotificationMessage) -> Progress {
        if let Some(min) = self.min_unflushed {
            if notification.revision >= min {
                return Progress::Continue;
            }
        }

        let event_name = notification.filename.as_str();
        let event = self.file_events.get(event_name).cloned();

        match notification.op_type {
            NotificationOpType::Create | NotificationOpType::Modify => {
                if notification.file_type != EntryType::File {
                    return Progress::Redundant;
                }
                if event == Some(FileEvent::Deleted) {
                    return Progress::Continue;
                }
                let filename = match event {
                    Some(FileEvent::RenamedTo(new_name)) => new_name,
                    _ => notification.filename.clone(),
                };
                if ignore_file(&filename) {
                    return Progress::Redundant;
                }
                if self.merged.get(writer).map_or(0, Vec::len) >= self.max_edits {
                    return Progress::Continue;
                }

                let filename = self.resolve_ancestors(&filename);
                let modified = self.modified_files.entry(writer.to_string()).or_default();
                if !modified.insert(filename.clone()) {
                    // Only the newest edit per writer per file survives.
                    return Progress::Redundant;
                }

                let mut edit = notification.clone();
                edit.filename = filename;
                let merged = self.merged.entry(writer.to_string()).or_default();
                merged.push(edit);
                if merged.len() >= self.max_edits {
                    return Progress::WriterFull;
                }
            }
            NotificationOpType::Rename => {
                let Some(old_name) = notification.old_filename() else {
                    warn!(
                        writer,
                        revision = notification.revision,
                        filename = event_name,
                        "rename notification without an old filename"
                    );
                    return Progress::Continue;
                };

                // Whatever later happened to the new name happened to the
                // old one; otherwise the new name is the final one.
                let fate = match event {
                    Some(fate) => fate,
                    None => FileEvent::RenamedTo(event_name.to_string()),
                };
                self.file_events.remove(event_name);
                self.file_events.insert(old_name.to_string(), fate);

                if notification.file_type == EntryType::Dir {
                    self.move_children(event_name, old_name);
                }

                // The rename overwrote anything that used to have the new name.
                self.file_events
                    .insert(event_name.to_string(), FileEvent::Deleted);
            }
            NotificationOpType::Delete => {
                self.file_events
                    .insert(event_name.to_string(), FileEvent::Deleted);
            }
            NotificationOpType::Unknown => {
                warn!(
                    writer,
                    revision = notification.revision,
                    filename = event_name,
                    "skipping notification with unknown operation type"
                );
            }
        }
        Progress::Continue
    }

    /// Re-key pending events for entries under `new_dir` to live under
    /// `old_dir`, so older notifications using the old paths find them.
    fn move_children(&mut self, new_dir: &str, old_dir: &str) {
        let prefix = format!("{}/", new_dir);
        let children: Vec<String> = self
            .file_events
            .keys()
            .filter(|name| name.starts_with(&prefix))
            .cloned()
            .collect();
        for child in children {
            if let Some(fate) = self.file_events.remove(&child) {
                let moved = format!("{}/{}", old_dir, &child[prefix.len()..]);
                self.file_events.insert(moved, fate);
            }
        }
    }

    /// Apply renames of any ancestor directory to `filename`.
    fn resolve_ancestors(&self, filename: &str) -> String {
        let mut prefix = filename.to_string();
        let mut suffix: Vec<String> = Vec::new();
        while let Some(idx) = prefix.rfind('/').filter(|&idx| idx > 0) {
            suffix.push(prefix[idx + 1..].to_string());
            prefix.truncate(idx);
            if let Some(FileEvent::RenamedTo(new_name)) = self.file_events.get(&prefix) {
                prefix = new_name.clone();
            }
        }
        for elem in suffix.iter().rev() {
            prefix.push('/');
            prefix.push_str(elem);
        }
        prefix
    }
}
