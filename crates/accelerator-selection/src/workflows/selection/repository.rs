use serde::{Deserialize, Serialize};

use super::domain::{AdditionalData, EntityKind, EventId, SelectionStatus, Submission, SubmissionId};

/// Fields written alongside a status change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub additional_data: AdditionalData,
}

/// Hosted persistence for submission records.
///
/// `update_status` must merge `additional_data` into the stored mapping rather than replace it.
pub trait SubmissionStore: Send + Sync {
    fn list(
        &self,
        event_id: &EventId,
        entity_kind: &EntityKind,
        status: Option<SelectionStatus>,
    ) -> Result<Vec<Submission>, StoreError>;
    fn fetch(&self, id: &SubmissionId) -> Result<Option<Submission>, StoreError>;
    fn update_status(
        &self,
        id: &SubmissionId,
        status: SelectionStatus,
        update: StatusUpdate,
    ) -> Result<Submission, StoreError>;
    /// Remember the spreadsheet an event's submissions are synced from.
    fn save_sheet_url(&self, event_id: &EventId, sheet_url: &str) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Operator-facing outcome message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Wherever feedback is surfaced (toast, log, chat hook).
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Row counts reported by a sheet sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStats {
    pub inserted: usize,
    pub deleted: usize,
}

impl SyncStats {
    pub fn has_changes(&self) -> bool {
        self.inserted > 0 || self.deleted > 0
    }

    pub fn summary(&self) -> String {
        if self.has_changes() {
            format!(
                "Sync complete: Added {}, Removed {}",
                self.inserted, self.deleted
            )
        } else {
            "Sync complete: No changes detected.".to_string()
        }
    }
}

/// External importer that inserts and deletes raw submission rows for an event.
pub trait ImportSource: Send + Sync {
    fn sync(&self, event_id: &EventId, sheet_url: &str) -> Result<SyncStats, ImportError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("import source unavailable: {0}")]
    Unavailable(String),
    #[error("no sheet found at {0}")]
    UnknownSheet(String),
}
