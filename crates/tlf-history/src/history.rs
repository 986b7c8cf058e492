//! The per-folder history engine.

use crate::config::HistoryLimits;
use crate::error::{HistoryError, Result};
use crate::recompute::{Cursor, Progress, Recomputer};
use crate::writer::{WriterEdits, WriterNotifications};
use parking_lot::RwLock;
use std::collections::{BTreeSet, BinaryHeap, HashMap, HashSet};
use std::sync::Arc;
use tlf_notify::{codec, NotificationMessage, Revision};
use tracing::debug;

/// A merged folder history: writers ranked by their newest surviving edit.
pub type History = Arc<Vec<WriterEdits>>;

#[derive(Default)]
struct HistoryState {
    by_writer: HashMap<String, WriterNotifications>,
    /// Kept in the last writer slot regardless of activity.
    logged_in: Option<String>,
    /// Local edits not yet flushed to the server, owned by the logged-in user.
    unflushed: Option<WriterNotifications>,
    computed: bool,
    cached: History,
}

/// Maintains the last few surviving file edits of each writer in one folder.
///
/// Two kinds of callers share an instance. The ingestion side adds batches
/// with [`ingest`](Self::ingest), then calls [`recompute`](Self::recompute)
/// and fetches older notifications for every writer it returns. Readers call
/// [`get_history`](Self::get_history), which recomputes lazily only when new
/// notifications arrived since the last merge.
pub struct TlfHistory {
    limits: HistoryLimits,
    state: RwLock<HistoryState>,
}

impl TlfHistory {
    pub fn new() -> Self {
        Self::with_limits(HistoryLimits::default())
    }

    pub fn with_limits(limits: HistoryLimits) -> Self {
        Self {
            limits: limits.normalized(),
            state: RwLock::new(HistoryState::default()),
        }
    }

    pub fn limits(&self) -> &HistoryLimits {
        &self.limits
    }

    /// Add encoded notification batches written by `writer_name`.
    ///
    /// Returns the newest revision known for that writer. A batch that fails
    /// to decode aborts the call before anything is stored. Re-delivering
    /// known notifications leaves the cached history untouched.
    pub fn ingest<S: AsRef<str>>(&self, writer_name: &str, batches: &[S]) -> Result<Option<Revision>> {
        let mut new_edits = Vec::new();
        for (batch, encoded) in batches.iter().enumerate() {
            let decoded =
                codec::decode_batch(encoded.as_ref()).map_err(|source| HistoryError::Decode {
                    writer: writer_name.to_string(),
                    batch,
                    source,
                })?;
            new_edits.extend(decoded);
        }

        let mut state = self.state.write();
        let existed = state.by_writer.contains_key(writer_name);
        let writer = state
            .by_writer
            .entry(writer_name.to_string())
            .or_insert_with(|| WriterNotifications::new(writer_name));
        let changed = writer.merge(new_edits);
        let max_rev = writer.head().map(|n| n.revision);

        if !changed {
            if !existed {
                state.by_writer.remove(writer_name);
            }
            return Ok(max_rev);
        }
        state.computed = false;
        debug!(writer = writer_name, ?max_rev, "ingested new notifications");
        Ok(max_rev)
    }

    /// Record which writer is the local user. That writer is never evicted
    /// by the writer cap, whether or not it has unflushed edits.
    ///
    /// Fails if unflushed edits belong to someone else.
    pub fn set_logged_in_user(&self, user: Option<&str>) -> Result<()> {
        let mut state = self.state.write();
        if let Some(unflushed) = &state.unflushed {
            if Some(unflushed.writer_name()) != user {
                return Err(HistoryError::UnflushedUserMismatch {
                    expected: unflushed.writer_name().to_string(),
                    actual: user.unwrap_or_default().to_string(),
                });
            }
        }
        if state.logged_in.as_deref() != user {
            state.logged_in = user.map(str::to_string);
            state.computed = false;
        }
        Ok(())
    }

    pub fn logged_in_user(&self) -> Option<String> {
        self.state.read().logged_in.clone()
    }

    /// Add edits made locally by `logged_in_user` that the server has not
    /// assigned to a flushed revision yet. They take precedence over flushed
    /// notifications at or after the oldest unflushed revision.
    ///
    /// The first call also records `logged_in_user` as the local user.
    pub fn add_unflushed(&self, logged_in_user: &str, notifications: Vec<NotificationMessage>) -> Result<()> {
        let mut state = self.state.write();
        match state.logged_in.clone() {
            Some(expected) if expected != logged_in_user => {
                return Err(HistoryError::UnflushedUserMismatch {
                    expected,
                    actual: logged_in_user.to_string(),
                });
            }
            Some(_) => {}
            None => {
                state.logged_in = Some(logged_in_user.to_string());
                state.computed = false;
            }
        }
        let unflushed = state
            .unflushed
            .get_or_insert_with(|| WriterNotifications::new(logged_in_user));
        if unflushed.merge(notifications) {
            state.computed = false;
        }
        Ok(())
    }

    /// Drop unflushed edits at or below `rev`, which the server now has.
    pub fn flush_revision(&self, rev: Revision) {
        let mut state = self.state.write();
        let Some(unflushed) = state.unflushed.as_mut() else {
            return;
        };
        if unflushed.remove_where(|n| n.revision <= rev) > 0 {
            if unflushed.is_empty() {
                state.unflushed = None;
            }
            state.computed = false;
        }
    }

    pub fn clear_all_unflushed(&self) {
        let mut state = self.state.write();
        if state.unflushed.take().is_some() {
            state.computed = false;
        }
    }

    /// Merge all known notifications and cache the result.
    ///
    /// Returns the writers that have fewer surviving edits than the limit,
    /// for whom older notifications should be fetched.
    pub fn recompute(&self) -> BTreeSet<String> {
        let mut state = self.state.write();
        state.recompute(&self.limits)
    }

    /// The merged history, recomputed only if new notifications arrived.
    pub fn get_history(&self) -> History {
        {
            let state = self.state.read();
            if state.computed {
                return Arc::clone(&state.cached);
            }
        }

        let mut state = self.state.write();
        if !state.computed {
            // Nobody else refreshed it while we waited for the write lock.
            state.recompute(&self.limits);
        }
        Arc::clone(&state.cached)
    }

    /// Writers that currently have raw notifications stored.
    pub fn retained_writers(&self) -> Vec<String> {
        let state = self.state.read();
        let mut writers: Vec<String> = state.by_writer.keys().cloned().collect();
        writers.sort();
        writers
    }

    /// How many raw notifications are stored for `writer_name`.
    pub fn retained_len(&self, writer_name: &str) -> usize {
        self.state
            .read()
            .by_writer
            .get(writer_name)
            .map_or(0, WriterNotifications::len)
    }
}

impl Default for TlfHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryState {
    fn recompute(&mut self, limits: &HistoryLimits) -> BTreeSet<String> {
        let mut r = Recomputer::new(limits);

        // The local user's unflushed edits are newer than anything flushed.
        let logged_in = self.logged_in.clone();
        let mut skip_logged_in = false;
        if let Some(unflushed) = &self.unflushed {
            for notification in unflushed.notifications() {
                if r.process(unflushed.writer_name(), notification) == Progress::WriterFull {
                    skip_logged_in = true;
                    break;
                }
            }
            r.min_unflushed = unflushed.tail().map(|n| n.revision);
        }

        // Pop whichever writer holds the folder-wide newest pending
        // notification, so later renames and deletes are always known before
        // the older edits they affect.
        let mut heap: BinaryHeap<Cursor<'_>> = self
            .by_writer
            .values()
            .filter(|wn| !(skip_logged_in && Some(wn.writer_name()) == logged_in.as_deref()))
            .filter_map(|wn| Cursor::at(wn, 0))
            .collect();
        // Unflushed edits may still be discarded, so flushed edits they
        // shadow for their owner must stay.
        let unflushed_owner = self.unflushed.as_ref().map(WriterNotifications::writer_name);
        let mut trims: Vec<(String, usize)> = Vec::new();
        let mut redundant: HashMap<String, Vec<usize>> = HashMap::new();
        while let Some(cursor) = heap.pop() {
            let writer = cursor.writer.writer_name();
            match r.process(writer, cursor.current()) {
                Progress::WriterFull => {
                    // Older notifications can never surface for this writer.
                    trims.push((writer.to_string(), cursor.pos + 1));
                    continue;
                }
                Progress::Redundant if unflushed_owner != Some(writer) => {
                    redundant.entry(writer.to_string()).or_default().push(cursor.pos);
                }
                Progress::Redundant | Progress::Continue => {}
            }
            if let Some(next) = Cursor::at(cursor.writer, cursor.pos + 1) {
                heap.push(next);
            }
        }
        drop(heap);

        for (writer, keep) in trims {
            if let Some(wn) = self.by_writer.get_mut(&writer) {
                if wn.len() > keep {
                    debug!(writer = %writer, dropped = wn.len() - keep, "trimming old notifications");
                    wn.truncate(keep);
                }
            }
        }
        for (writer, positions) in redundant {
            if let Some(wn) = self.by_writer.get_mut(&writer) {
                let dropped = wn.remove_positions(&positions);
                debug!(writer = %writer, dropped, "dropping edits that can never surface");
            }
        }

        let max_edits = limits.max_edits_per_writer;
        let mut needs_more = BTreeSet::new();
        let mut history = Vec::new();
        let writers = self
            .by_writer
            .keys()
            .cloned()
            .chain(logged_in.iter().filter(|w| !self.by_writer.contains_key(*w)).cloned());
        for writer_name in writers {
            let edits = r.take_merged(&writer_name);
            if edits.len() < max_edits {
                needs_more.insert(writer_name.clone());
            }
            if !edits.is_empty() {
                history.push(WriterEdits { writer_name, edits });
            }
        }
        history.sort_by(|a, b| {
            let a_key = a.newest().map(NotificationMessage::sort_key);
            let b_key = b.newest().map(NotificationMessage::sort_key);
            b_key
                .cmp(&a_key)
                .then_with(|| a.writer_name.cmp(&b.writer_name))
        });

        self.collect_writers(&mut history, &mut needs_more, logged_in.as_deref(), limits);

        debug!(
            writers = history.len(),
            needs_more = needs_more.len(),
            "recomputed folder history"
        );
        self.computed = true;
        self.cached = Arc::new(history);
        needs_more
    }

    /// Evict every writer outside the top `max_writers_per_history` from raw
    /// storage. Writers without surviving edits rank last, by their newest
    /// raw notification. The logged-in user always keeps the last slot.
    fn collect_writers(
        &mut self,
        history: &mut Vec<WriterEdits>,
        needs_more: &mut BTreeSet<String>,
        logged_in: Option<&str>,
        limits: &HistoryLimits,
    ) {
        let max_writers = limits.max_writers_per_history;
        let in_history: HashSet<&str> = history.iter().map(|w| w.writer_name.as_str()).collect();
        let mut idle: Vec<&WriterNotifications> = self
            .by_writer
            .values()
            .filter(|wn| !in_history.contains(wn.writer_name()))
            .collect();
        idle.sort_by(|a, b| {
            b.head()
                .map(NotificationMessage::sort_key)
                .cmp(&a.head().map(NotificationMessage::sort_key))
                .then_with(|| a.writer_name().cmp(b.writer_name()))
        });

        let mut ranking: Vec<String> = history
            .iter()
            .map(|w| w.writer_name.clone())
            .chain(idle.iter().map(|wn| wn.writer_name().to_string()))
            .collect();
        if ranking.len() <= max_writers {
            return;
        }

        if let Some(user) = logged_in {
            if let Some(pos) = ranking.iter().position(|w| w == user) {
                if pos >= max_writers {
                    ranking.swap(max_writers - 1, pos);
                }
            }
        }
        for evicted in ranking.drain(max_writers..) {
            debug!(writer = %evicted, "evicting writer from folder history");
            self.by_writer.remove(&evicted);
            needs_more.remove(&evicted);
        }

        let kept: HashSet<&str> = ranking.iter().map(String::as_str).collect();
        history.retain(|w| kept.contains(w.writer_name.as_str()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tlf_notify::NotificationOpType;

    fn batch(rev: Revision, name: &str, writer: &str) -> String {
        let msg = NotificationMessage::new(rev, name, NotificationOpType::Create, "tlf", writer, Utc::now());
        codec::encode(&[msg]).unwrap()
    }

    #[test]
    fn test_redundant_ingest_keeps_cache() {
        let history = TlfHistory::new();
        history.ingest("alice", &[batch(1, "a", "alice")]).unwrap();
        history.recompute();
        let first = history.get_history();

        let rev = history.ingest("alice", &[batch(1, "a", "alice")]).unwrap();
        assert_eq!(rev, Some(1));
        assert!(Arc::ptr_eq(&first, &history.get_history()));
    }

    #[test]
    fn test_ingest_marks_dirty() {
        let history = TlfHistory::new();
        history.ingest("alice", &[batch(1, "a", "alice")]).unwrap();
        assert_eq!(history.get_history()[0].edits.len(), 1);

        history.ingest("alice", &[batch(2, "b", "alice")]).unwrap();
        assert_eq!(history.get_history()[0].edits.len(), 2);
    }

    #[test]
    fn test_empty_ingest_stores_nothing() {
        let history = TlfHistory::new();
        let rev = history.ingest::<&str>("alice", &[]).unwrap();
        assert_eq!(rev, None);
        assert!(history.retained_writers().is_empty());
    }

    #[test]
    fn test_decode_error_names_batch() {
        let history = TlfHistory::new();
        let err = history
            .ingest("alice", &[batch(1, "a", "alice"), "garbage".to_string()])
            .unwrap_err();
        assert!(matches!(err, HistoryError::Decode { batch: 1, .. }));
        assert!(history.retained_writers().is_empty());
    }

    #[test]
    fn test_logged_in_user_outlives_unflushed() {
        let history = TlfHistory::new();
        assert_eq!(history.logged_in_user(), None);
        history.add_unflushed("alice", Vec::new()).unwrap();
        history.clear_all_unflushed();
        assert_eq!(history.logged_in_user(), Some("alice".to_string()));

        history.set_logged_in_user(Some("bob")).unwrap();
        assert!(history.add_unflushed("alice", Vec::new()).is_err());
        history.add_unflushed("bob", Vec::new()).unwrap();
        assert!(history.set_logged_in_user(None).is_err());
        assert_eq!(history.logged_in_user(), Some("bob".to_string()));
    }

    #[test]
    fn test_unflushed_user_mismatch() {
        let history = TlfHistory::new();
        history.add_unflushed("alice", Vec::new()).unwrap();
        let err = history.add_unflushed("bob", Vec::new()).unwrap_err();
        assert_eq!(
            err,
            HistoryError::UnflushedUserMismatch {
                expected: "alice".to_string(),
                actual: "bob".to_string(),
            }
        );
    }
}
