//! # tlf-feed
//!
//! Collects the merged edit histories of every folder a user participates
//! in, ranks folders by their most recent surviving edit, and renders them
//! into a display-ready shape for an activity feed.
//!
//! ## Example
//!
//! ```rust
//! use chrono::Utc;
//! use tlf_feed::UserHistory;
//! use tlf_history::TlfHistory;
//! use tlf_notify::{codec, FolderRef, FolderType, NotificationMessage, NotificationOpType};
//!
//! let folder = FolderRef::new("alice,bob", FolderType::Private);
//! let history = TlfHistory::new();
//! let create = NotificationMessage::new(1, "notes.txt", NotificationOpType::Create, "tlf", "bob", Utc::now());
//! history.ingest("bob", &[codec::encode(&[create]).unwrap()]).unwrap();
//!
//! let feed = UserHistory::new();
//! feed.update_history(folder.clone(), &history);
//! let all = feed.get_all();
//! assert_eq!(all[0].folder.name, "alice,bob");
//! assert_eq!(all[0].history[0].edits[0].filename, "notes.txt");
//! ```

pub mod config;
pub mod display;
pub mod user_history;

pub use config::{FeedConfig, FeedConfigBuilder, MAX_TLFS};
pub use display::{EditNotificationType, FileEdit, FolderEditHistory, FolderInfo, WriterEditHistory};
pub use user_history::UserHistory;
