//! Applicant selection pipeline: status transitions, decision notes, and stage views.
//!
//! Submissions move `screening -> interview -> approved -> displayed`, with `holding` and
//! `rejected` reachable along the way. Persistence, notifications, and sheet imports are
//! collaborators behind the traits in [`repository`].

pub mod domain;
pub mod format;
pub mod repository;
pub mod router;
pub mod service;
pub mod transitions;
pub mod view;

#[cfg(test)]
mod tests;

pub use domain::{
    AdditionalData, EntityKind, EventId, SelectionStatus, Submission, SubmissionId,
    UnknownStatus, COLUMN_ORDER_KEY, ORIGIN_STAGE_KEY, TECH_STATUS_KEY,
};
pub use format::{
    format_value, InvalidDateFormat, SpreadsheetFormatter, ValueFormatter, DEFAULT_DATE_FORMAT,
    EMPTY_PLACEHOLDER,
};
pub use repository::{
    ImportError, ImportSource, NoticeLevel, Notification, NotificationSink, NotifyError,
    StatusUpdate, StoreError, SubmissionStore, SyncStats,
};
pub use router::selection_router;
pub use service::{SelectionService, SelectionServiceError, TransitionOutcome};
pub use transitions::{
    allowed_targets, PendingDecision, StatusChange, TransitionEngine, TransitionError,
    TransitionPlan, TransitionRequest,
};
pub use view::{
    derive_columns, resolve_cell, stage_board, stage_counts, submission_detail, AttributeEntry,
    BoardRow, DecisionNote, StageBoard, StageCount, StageFilter, StageTab, SubmissionDetail,
    DEFAULT_COLUMNS,
};
