//! Notification data model.
//!
//! A notification records one filesystem mutation inside a shared folder.
//! Every notification carries the folder revision it happened in; several
//! notifications can share a revision, in which case their position within
//! the delivering batch orders them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Server-assigned folder revision, monotonically increasing per folder.
pub type Revision = i64;

/// First notification schema; no longer understood by the history engine.
pub const NOTIFICATION_V1: u32 = 1;
/// Current notification schema.
pub const NOTIFICATION_V2: u32 = 2;

/// The kind of mutation a notification describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationOpType {
    Create,
    Modify,
    Rename,
    Delete,
    /// An operation added by a newer writer that this build does not know.
    #[serde(other)]
    Unknown,
}

/// The kind of directory entry a notification refers to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    #[default]
    File,
    Dir,
    Symlink,
}

/// Extra parameters carried by rename notifications.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameParams {
    /// The name of the entry before the rename.
    pub old_filename: String,
}

/// A single edit notification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationMessage {
    /// Schema version this message was written with.
    pub version: u32,
    /// Folder revision that contains this mutation.
    pub revision: Revision,
    /// Full path of the affected entry (the new path, for renames).
    pub filename: String,
    #[serde(rename = "type")]
    pub op_type: NotificationOpType,
    #[serde(rename = "folderID")]
    pub folder_id: String,
    #[serde(rename = "writerID")]
    pub writer_id: String,
    pub file_type: EntryType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rename_params: Option<RenameParams>,
    /// Server time at which the revision was written.
    pub timestamp: DateTime<Utc>,
    /// Position of this notification inside its batch. Not on the wire; it
    /// is assigned on decode so same-revision notifications sort totally.
    #[serde(skip)]
    pub within_revision_index: usize,
}

impl NotificationMessage {
    /// Create a current-version notification about a plain file.
    pub fn new(
        revision: Revision,
        filename: impl Into<String>,
        op_type: NotificationOpType,
        folder_id: impl Into<String>,
        writer_id: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            version: NOTIFICATION_V2,
            revision,
            filename: filename.into(),
            op_type,
            folder_id: folder_id.into(),
            writer_id: writer_id.into(),
            file_type: EntryType::File,
            rename_params: None,
            timestamp,
            within_revision_index: 0,
        }
    }

    pub fn with_file_type(mut self, file_type: EntryType) -> Self {
        self.file_type = file_type;
        self
    }

    /// Attach rename parameters; `filename` is the destination.
    pub fn with_rename_from(mut self, old_filename: impl Into<String>) -> Self {
        self.rename_params = Some(RenameParams {
            old_filename: old_filename.into(),
        });
        self
    }

    pub fn with_within_revision_index(mut self, index: usize) -> Self {
        self.within_revision_index = index;
        self
    }

    /// The total-order key: revision first, then position within revision.
    pub fn sort_key(&self) -> (Revision, usize) {
        (self.revision, self.within_revision_index)
    }

    /// Compare two notifications so that the most recent sorts first.
    pub fn cmp_newest_first(&self, other: &Self) -> Ordering {
        other.sort_key().cmp(&self.sort_key())
    }

    /// The source name of a rename, if this is one.
    pub fn old_filename(&self) -> Option<&str> {
        self.rename_params
            .as_ref()
            .map(|params| params.old_filename.as_str())
    }
}

/// Folder visibility class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FolderType {
    #[default]
    Private,
    Public,
    Team,
}

impl FolderType {
    /// Whether folder contents are visible only to its members.
    pub fn is_private(&self) -> bool {
        !matches!(self, FolderType::Public)
    }
}

impl std::fmt::Display for FolderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FolderType::Private => write!(f, "private"),
            FolderType::Public => write!(f, "public"),
            FolderType::Team => write!(f, "team"),
        }
    }
}

/// Identifies a folder by its canonical name and type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderRef {
    pub name: String,
    #[serde(rename = "type")]
    pub folder_type: FolderType,
}

impl FolderRef {
    pub fn new(name: impl Into<String>, folder_type: FolderType) -> Self {
        Self {
            name: name.into(),
            folder_type,
        }
    }
}

impl std::fmt::Display for FolderRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "/{}/{}", self.folder_type, self.name)
    }
}

/// Envelope for edits made by the local user, broadcast before the server
/// has assigned them to a flushed revision.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelfWriteMessage {
    pub version: u32,
    pub folder: FolderRef,
    pub notifications: Vec<NotificationMessage>,
}

impl SelfWriteMessage {
    pub fn new(folder: FolderRef, notifications: Vec<NotificationMessage>) -> Self {
        Self {
            version: NOTIFICATION_V2,
            folder,
            notifications,
        }
    }
}
