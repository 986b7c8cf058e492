//! # tlf-history
//!
//! Per-folder edit history for shared folders (TLFs).
//!
//! A [`TlfHistory`] ingests encoded notification batches from any number of
//! writers and merges them, newest first across the whole folder, into a
//! small per-writer list of surviving file edits:
//! - deletes by any writer hide older creates and modifies of that file
//! - renames (of files and of directories) relabel older edits with the
//!   final name
//! - each writer keeps at most one entry per file, and at most
//!   `max_edits_per_writer` entries
//! - at most `max_writers_per_history` writers are retained at all
//!
//! [`TlfHistory::recompute`] returns the writers that still have room for
//! more edits; the caller is expected to fetch older notifications for them
//! and ingest those too.
//!
//! ## Example
//!
//! ```rust
//! use chrono::Utc;
//! use tlf_history::TlfHistory;
//! use tlf_notify::{codec, NotificationMessage, NotificationOpType};
//!
//! let history = TlfHistory::new();
//! let create = NotificationMessage::new(1, "a", NotificationOpType::Create, "tlf", "alice", Utc::now());
//! history.ingest("alice", &[codec::encode(&[create]).unwrap()]).unwrap();
//!
//! let needs_more = history.recompute();
//! assert!(needs_more.contains("alice"));
//! assert_eq!(history.get_history()[0].edits[0].filename, "a");
//! ```

pub mod config;
pub mod error;
pub mod history;
mod recompute;
pub mod writer;

pub use config::{HistoryLimits, HistoryLimitsBuilder, MAX_EDITS_PER_WRITER, MAX_WRITERS_PER_HISTORY};
pub use error::{HistoryError, Result};
pub use history::{History, TlfHistory};
pub use writer::{WriterEdits, WriterNotifications};
