use std::sync::Arc;

use tracing::{debug, info, warn};

use super::domain::{EntityKind, EventId, SelectionStatus, Submission, SubmissionId};
use super::format::{SpreadsheetFormatter, ValueFormatter};
use super::repository::{
    ImportError, ImportSource, Notification, NotificationSink, StatusUpdate, StoreError,
    SubmissionStore, SyncStats,
};
use super::transitions::{
    PendingDecision, StatusChange, TransitionEngine, TransitionError, TransitionPlan,
    TransitionRequest,
};
use super::view::{stage_board, submission_detail, StageBoard, StageFilter, SubmissionDetail};

const UPDATE_FAILED_MESSAGE: &str = "Failed to update status.";
const MISSING_SHEET_MESSAGE: &str = "Please provide a Google Sheets URL";
const SYNC_FAILED_MESSAGE: &str = "Sync failed. Please check the URL and permissions.";

/// Result of a transition request.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    /// The change was written; holds the stored record.
    Applied(Submission),
    /// Nothing was written; the operator must answer the reason prompt first.
    ReasonRequired(PendingDecision),
}

/// Service composing the transition engine, submission store, importer, and notifications.
pub struct SelectionService<S, I, N> {
    store: Arc<S>,
    importer: Arc<I>,
    notifications: Arc<N>,
    entity_kind: EntityKind,
    formatter: Arc<dyn ValueFormatter>,
}

impl<S, I, N> SelectionService<S, I, N>
where
    S: SubmissionStore + 'static,
    I: ImportSource + 'static,
    N: NotificationSink + 'static,
{
    pub fn new(
        store: Arc<S>,
        importer: Arc<I>,
        notifications: Arc<N>,
        entity_kind: EntityKind,
    ) -> Self {
        Self {
            store,
            importer,
            notifications,
            entity_kind,
            formatter: Arc::new(SpreadsheetFormatter::default()),
        }
    }

    pub fn with_formatter(mut self, formatter: Arc<dyn ValueFormatter>) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn entity_kind(&self) -> &EntityKind {
        &self.entity_kind
    }

    pub fn formatter(&self) -> &dyn ValueFormatter {
        self.formatter.as_ref()
    }

    /// Fetch a submission, mapping a missing record to [`SelectionServiceError::NotFound`].
    pub fn get(&self, id: &SubmissionId) -> Result<Submission, SelectionServiceError> {
        self.store
            .fetch(id)?
            .ok_or_else(|| SelectionServiceError::NotFound(id.clone()))
    }

    pub fn list(
        &self,
        event_id: &EventId,
        status: Option<SelectionStatus>,
    ) -> Result<Vec<Submission>, SelectionServiceError> {
        Ok(self.store.list(event_id, &self.entity_kind, status)?)
    }

    pub fn board(
        &self,
        event_id: &EventId,
        filter: &StageFilter,
    ) -> Result<StageBoard, SelectionServiceError> {
        let submissions = self.list(event_id, None)?;
        Ok(stage_board(&submissions, filter, self.formatter()))
    }

    pub fn detail(&self, id: &SubmissionId) -> Result<SubmissionDetail, SelectionServiceError> {
        let submission = self.get(id)?;
        Ok(submission_detail(&submission, self.formatter()))
    }

    /// Validate and apply a status change, or hand back a pending decision when a note is
    /// still needed. Failures are reported to the notification sink before being returned.
    pub fn request_transition(
        &self,
        id: &SubmissionId,
        request: TransitionRequest,
    ) -> Result<TransitionOutcome, SelectionServiceError> {
        let result = self
            .get(id)
            .and_then(|submission| self.plan_and_commit(&submission, request));
        self.report(result)
    }

    /// Second phase of a prompted transition.
    pub fn confirm(
        &self,
        decision: PendingDecision,
        reason: impl Into<String>,
    ) -> Result<TransitionOutcome, SelectionServiceError> {
        let id = decision.submission_id().clone();
        self.request_transition(&id, decision.confirm(reason))
    }

    /// Move a submission to `holding`, recording its current stage as the origin.
    pub fn place_on_hold(
        &self,
        id: &SubmissionId,
        reason: Option<String>,
    ) -> Result<TransitionOutcome, SelectionServiceError> {
        let result = self.get(id).and_then(|submission| {
            let request = with_optional_reason(TransitionEngine::hold_request(&submission), reason);
            self.plan_and_commit(&submission, request)
        });
        self.report(result)
    }

    /// Return a held submission to the stage it was held from.
    pub fn restore_from_hold(
        &self,
        id: &SubmissionId,
        reason: Option<String>,
    ) -> Result<TransitionOutcome, SelectionServiceError> {
        let result = self.get(id).and_then(|submission| {
            let request = TransitionEngine::restore_request(&submission)?;
            self.plan_and_commit(&submission, with_optional_reason(request, reason))
        });
        self.report(result)
    }

    /// Manually return a rejected submission to screening.
    pub fn restore_from_rejection(
        &self,
        id: &SubmissionId,
    ) -> Result<TransitionOutcome, SelectionServiceError> {
        let result = self.get(id).and_then(|submission| {
            let request = TransitionEngine::reconsider_request(&submission)?;
            self.plan_and_commit(&submission, request)
        });
        self.report(result)
    }

    /// Remember the sheet on the event, then reconcile its submissions with it.
    pub fn sync_from_sheet(
        &self,
        event_id: &EventId,
        sheet_url: &str,
    ) -> Result<SyncStats, SelectionServiceError> {
        let sheet_url = sheet_url.trim();
        if sheet_url.is_empty() {
            self.notify(Notification::error(MISSING_SHEET_MESSAGE));
            return Err(SelectionServiceError::MissingSheetUrl);
        }

        let result = self
            .store
            .save_sheet_url(event_id, sheet_url)
            .map_err(SelectionServiceError::from)
            .and_then(|()| {
                self.importer
                    .sync(event_id, sheet_url)
                    .map_err(SelectionServiceError::from)
            });

        match result {
            Ok(stats) => {
                info!(
                    event_id = %event_id,
                    inserted = stats.inserted,
                    deleted = stats.deleted,
                    "sheet sync complete"
                );
                self.notify(Notification::success(stats.summary()));
                Ok(stats)
            }
            Err(err) => {
                warn!(event_id = %event_id, error = %err, "sheet sync failed");
                self.notify(Notification::error(SYNC_FAILED_MESSAGE));
                Err(err)
            }
        }
    }

    fn plan_and_commit(
        &self,
        submission: &Submission,
        request: TransitionRequest,
    ) -> Result<TransitionOutcome, SelectionServiceError> {
        match TransitionEngine::plan(submission, request)? {
            TransitionPlan::ReasonRequired(decision) => {
                debug!(
                    submission_id = %submission.submission_id,
                    target = %decision.target,
                    "transition awaiting decision note"
                );
                Ok(TransitionOutcome::ReasonRequired(decision))
            }
            TransitionPlan::Commit(change) => self.commit(change),
        }
    }

    fn commit(&self, change: StatusChange) -> Result<TransitionOutcome, SelectionServiceError> {
        let StatusChange {
            submission_id,
            from,
            to,
            additional_data,
        } = change;

        let stored =
            self.store
                .update_status(&submission_id, to, StatusUpdate { additional_data })?;

        info!(submission_id = %submission_id, %from, %to, "submission status updated");
        self.notify(Notification::success(format!("Submission moved to {to}")));
        Ok(TransitionOutcome::Applied(stored))
    }

    fn report(
        &self,
        result: Result<TransitionOutcome, SelectionServiceError>,
    ) -> Result<TransitionOutcome, SelectionServiceError> {
        if let Err(err) = &result {
            warn!(error = %err, "status update failed");
            let message = match err {
                SelectionServiceError::Sync(_) => UPDATE_FAILED_MESSAGE.to_string(),
                other => other.to_string(),
            };
            self.notify(Notification::error(message));
        }
        result
    }

    fn notify(&self, notification: Notification) {
        if let Err(err) = self.notifications.notify(notification) {
            warn!(error = %err, "notification dropped");
        }
    }
}

fn with_optional_reason(request: TransitionRequest, reason: Option<String>) -> TransitionRequest {
    match reason {
        Some(reason) => request.with_reason(reason),
        None => request,
    }
}

/// Error raised by the selection service.
#[derive(Debug, thiserror::Error)]
pub enum SelectionServiceError {
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("submission {0} not found")]
    NotFound(SubmissionId),
    #[error("submission store error: {0}")]
    Sync(#[from] StoreError),
    #[error("sheet import error: {0}")]
    Import(#[from] ImportError),
    #[error("a sheet URL is required to sync submissions")]
    MissingSheetUrl,
}
