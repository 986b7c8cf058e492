//! Display-ready folder histories, as consumed by an activity feed UI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tlf_history::History;
use tlf_notify::{FolderRef, FolderType, NotificationOpType};
use tracing::warn;

/// The kind of edit shown to the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EditNotificationType {
    FileCreated,
    FileModified,
}

impl EditNotificationType {
    /// Map an internal operation. Merged histories only hold creates and
    /// modifies, so everything else has no display form.
    pub fn from_op(op: NotificationOpType) -> Option<Self> {
        match op {
            NotificationOpType::Create => Some(Self::FileCreated),
            NotificationOpType::Modify => Some(Self::FileModified),
            NotificationOpType::Rename | NotificationOpType::Delete | NotificationOpType::Unknown => None,
        }
    }
}

/// Folder metadata.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub folder_type: FolderType,
    pub private: bool,
}

impl From<&FolderRef> for FolderInfo {
    fn from(folder: &FolderRef) -> Self {
        Self {
            name: folder.name.clone(),
            folder_type: folder.folder_type,
            private: folder.folder_type.is_private(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEdit {
    pub filename: String,
    pub server_time: DateTime<Utc>,
    pub notification_type: EditNotificationType,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriterEditHistory {
    pub writer_name: String,
    pub edits: Vec<FileEdit>,
}

/// One folder's edit history, ready for display.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderEditHistory {
    pub folder: FolderInfo,
    /// Server time of the folder's most recent surviving edit.
    pub server_time: Option<DateTime<Utc>>,
    pub history: Vec<WriterEditHistory>,
}

/// Time of the most recent surviving edit in a merged history.
pub(crate) fn newest_time(history: &History) -> Option<DateTime<Utc>> {
    history
        .iter()
        .filter_map(|writer| writer.newest())
        .map(|n| n.timestamp)
        .max()
}

impl FolderEditHistory {
    pub fn from_history(folder: &FolderRef, history: &History) -> Self {
        let writers = history
            .iter()
            .map(|writer| WriterEditHistory {
                writer_name: writer.writer_name.clone(),
                edits: writer
                    .edits
                    .iter()
                    .filter_map(|n| match EditNotificationType::from_op(n.op_type) {
                        Some(notification_type) => Some(FileEdit {
                            filename: n.filename.clone(),
                            server_time: n.timestamp,
                            notification_type,
                        }),
                        None => {
                            warn!(folder = %folder, filename = %n.filename, "dropping edit with no display type");
                            None
                        }
                    })
                    .collect(),
            })
            .collect();

        Self {
            folder: FolderInfo::from(folder),
            server_time: newest_time(history),
            history: writers,
        }
    }
}
