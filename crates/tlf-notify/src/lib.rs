//! # tlf-notify
//!
//! Edit notifications for shared folders (TLFs) and their wire format.
//!
//! This crate provides:
//! - [`NotificationMessage`]: one create/modify/rename/delete event
//! - [`SelfWriteMessage`]: the envelope for locally authored edits
//! - A JSON codec shared by producers and the history engine
//!
//! ## Example
//!
//! ```rust
//! use chrono::Utc;
//! use tlf_notify::{codec, NotificationMessage, NotificationOpType};
//!
//! let create = NotificationMessage::new(1, "a", NotificationOpType::Create, "tlf", "alice", Utc::now());
//! let wire = codec::encode(&[create.clone()]).unwrap();
//! let decoded = codec::decode_batch(&wire).unwrap();
//! assert_eq!(decoded, vec![create]);
//! ```

pub mod codec;
pub mod error;
pub mod message;

pub use codec::{decode_batch, encode, encode_self_write};
pub use error::{CodecError, Result};
pub use message::{
    EntryType, FolderRef, FolderType, NotificationMessage, NotificationOpType, RenameParams,
    Revision, SelfWriteMessage, NOTIFICATION_V1, NOTIFICATION_V2,
};
