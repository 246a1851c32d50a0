use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{EventId, SelectionStatus, Submission, SubmissionId};
use super::repository::{ImportSource, NotificationSink, SubmissionStore};
use super::service::{SelectionService, SelectionServiceError, TransitionOutcome};
use super::transitions::{TransitionEngine, TransitionRequest};
use super::view::StageFilter;

/// Router builder exposing the selection board and transition endpoints.
pub fn selection_router<S, I, N>(service: Arc<SelectionService<S, I, N>>) -> Router
where
    S: SubmissionStore + 'static,
    I: ImportSource + 'static,
    N: NotificationSink + 'static,
{
    Router::new()
        .route(
            "/api/v1/events/:event_id/submissions",
            get(board_handler::<S, I, N>),
        )
        .route("/api/v1/events/:event_id/sync", post(sync_handler::<S, I, N>))
        .route(
            "/api/v1/submissions/:submission_id",
            get(detail_handler::<S, I, N>),
        )
        .route(
            "/api/v1/submissions/:submission_id/transitions",
            post(transition_handler::<S, I, N>),
        )
        .route(
            "/api/v1/submissions/:submission_id/hold",
            post(hold_handler::<S, I, N>),
        )
        .route(
            "/api/v1/submissions/:submission_id/restore",
            post(restore_handler::<S, I, N>),
        )
        .with_state(service)
}

/// Optional operator note for hold and restore actions.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ReasonBody {
    #[serde(default)]
    pub(crate) reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SyncBody {
    #[serde(default)]
    pub(crate) sheet_url: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
enum TransitionView {
    Applied {
        submission: Submission,
        allowed_targets: Vec<SelectionStatus>,
    },
    ReasonRequired {
        submission_id: SubmissionId,
        current_status: SelectionStatus,
        target: SelectionStatus,
        default_reason: String,
        prompt: String,
        confirm_label: &'static str,
    },
}

fn outcome_response(outcome: TransitionOutcome) -> Response {
    match outcome {
        TransitionOutcome::Applied(submission) => {
            let view = TransitionView::Applied {
                allowed_targets: TransitionEngine::allowed_targets(&submission),
                submission,
            };
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        TransitionOutcome::ReasonRequired(decision) => {
            let view = TransitionView::ReasonRequired {
                submission_id: decision.submission_id().clone(),
                current_status: decision.submission.status,
                target: decision.target,
                prompt: decision.prompt_label(),
                confirm_label: decision.confirm_label(),
                default_reason: decision.default_reason,
            };
            (StatusCode::PRECONDITION_REQUIRED, axum::Json(view)).into_response()
        }
    }
}

fn error_response(error: SelectionServiceError) -> Response {
    let status = match &error {
        SelectionServiceError::Transition(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SelectionServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        SelectionServiceError::MissingSheetUrl => StatusCode::BAD_REQUEST,
        SelectionServiceError::Import(_) => StatusCode::BAD_GATEWAY,
        SelectionServiceError::Sync(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}

fn transition_response(result: Result<TransitionOutcome, SelectionServiceError>) -> Response {
    match result {
        Ok(outcome) => outcome_response(outcome),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn board_handler<S, I, N>(
    State(service): State<Arc<SelectionService<S, I, N>>>,
    Path(event_id): Path<String>,
    Query(filter): Query<StageFilter>,
) -> Response
where
    S: SubmissionStore + 'static,
    I: ImportSource + 'static,
    N: NotificationSink + 'static,
{
    match service.board(&EventId(event_id), &filter) {
        Ok(board) => (StatusCode::OK, axum::Json(board)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn detail_handler<S, I, N>(
    State(service): State<Arc<SelectionService<S, I, N>>>,
    Path(submission_id): Path<String>,
) -> Response
where
    S: SubmissionStore + 'static,
    I: ImportSource + 'static,
    N: NotificationSink + 'static,
{
    match service.detail(&SubmissionId(submission_id)) {
        Ok(detail) => (StatusCode::OK, axum::Json(detail)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn transition_handler<S, I, N>(
    State(service): State<Arc<SelectionService<S, I, N>>>,
    Path(submission_id): Path<String>,
    axum::Json(request): axum::Json<TransitionRequest>,
) -> Response
where
    S: SubmissionStore + 'static,
    I: ImportSource + 'static,
    N: NotificationSink + 'static,
{
    transition_response(service.request_transition(&SubmissionId(submission_id), request))
}

pub(crate) async fn hold_handler<S, I, N>(
    State(service): State<Arc<SelectionService<S, I, N>>>,
    Path(submission_id): Path<String>,
    axum::Json(body): axum::Json<ReasonBody>,
) -> Response
where
    S: SubmissionStore + 'static,
    I: ImportSource + 'static,
    N: NotificationSink + 'static,
{
    transition_response(service.place_on_hold(&SubmissionId(submission_id), body.reason))
}

pub(crate) async fn restore_handler<S, I, N>(
    State(service): State<Arc<SelectionService<S, I, N>>>,
    Path(submission_id): Path<String>,
    axum::Json(body): axum::Json<ReasonBody>,
) -> Response
where
    S: SubmissionStore + 'static,
    I: ImportSource + 'static,
    N: NotificationSink + 'static,
{
    let id = SubmissionId(submission_id);
    let result = match service.get(&id) {
        Ok(submission) if submission.status == SelectionStatus::Rejected => {
            service.restore_from_rejection(&id)
        }
        Ok(_) => service.restore_from_hold(&id, body.reason),
        Err(error) => Err(error),
    };
    transition_response(result)
}

pub(crate) async fn sync_handler<S, I, N>(
    State(service): State<Arc<SelectionService<S, I, N>>>,
    Path(event_id): Path<String>,
    axum::Json(body): axum::Json<SyncBody>,
) -> Response
where
    S: SubmissionStore + 'static,
    I: ImportSource + 'static,
    N: NotificationSink + 'static,
{
    match service.sync_from_sheet(&EventId(event_id), &body.sheet_url) {
        Ok(stats) => {
            let payload = json!({
                "inserted": stats.inserted,
                "deleted": stats.deleted,
                "message": stats.summary(),
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}
