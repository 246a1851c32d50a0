use serde::{Deserialize, Serialize};

use super::domain::{AdditionalData, SelectionStatus, Submission, SubmissionId};

/// Legal targets from `status`. A held submission may only return to `origin`.
pub fn allowed_targets(status: SelectionStatus, origin: SelectionStatus) -> Vec<SelectionStatus> {
    use SelectionStatus::*;

    match status {
        Screening => vec![Interview, Holding, Rejected],
        Interview => vec![Approved, Holding, Rejected],
        Approved => vec![Displayed, Rejected],
        Displayed => vec![Rejected],
        Holding => vec![origin],
        Rejected => vec![Screening],
    }
}

/// A requested move of one submission into `target`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub target: SelectionStatus,
    /// `None` until the operator has answered the reason prompt. An empty string still counts
    /// as an answer.
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub additional_data: AdditionalData,
}

impl TransitionRequest {
    pub fn new(target: SelectionStatus) -> Self {
        Self {
            target,
            reason: None,
            additional_data: AdditionalData::default(),
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_additional_data(mut self, patch: AdditionalData) -> Self {
        self.additional_data = patch;
        self
    }
}

/// Decision waiting on an operator note before anything is written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingDecision {
    pub submission: Submission,
    pub target: SelectionStatus,
    pub default_reason: String,
    /// Patch from the first request, replayed when the decision is confirmed.
    pub additional_data: AdditionalData,
}

impl PendingDecision {
    pub fn submission_id(&self) -> &SubmissionId {
        &self.submission.submission_id
    }

    pub fn prompt_label(&self) -> String {
        match self.target {
            SelectionStatus::Interview => "Company Technology Status/Notes".to_string(),
            target => format!("Why is this company being {target}?"),
        }
    }

    pub fn confirm_label(&self) -> &'static str {
        match self.target {
            SelectionStatus::Interview => "Proceed to Interview",
            _ => "Confirm Decision",
        }
    }

    /// Second-phase request carrying the operator's note.
    pub fn confirm(self, reason: impl Into<String>) -> TransitionRequest {
        TransitionRequest {
            target: self.target,
            reason: Some(reason.into()),
            additional_data: self.additional_data,
        }
    }

    /// Confirm with the pre-filled note left as is.
    pub fn confirm_default(self) -> TransitionRequest {
        let reason = self.default_reason.clone();
        self.confirm(reason)
    }
}

/// Fully merged change ready to be written to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub submission_id: SubmissionId,
    pub from: SelectionStatus,
    pub to: SelectionStatus,
    pub additional_data: AdditionalData,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransitionPlan {
    Commit(StatusChange),
    ReasonRequired(PendingDecision),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("cannot move submission from {from} to {to}")]
    Illegal {
        from: SelectionStatus,
        to: SelectionStatus,
    },
    #[error("submission is {status}, not holding")]
    NotOnHold { status: SelectionStatus },
    #[error("submission is {status}, not rejected")]
    NotRejected { status: SelectionStatus },
    #[error("cannot record {origin} as the hold origin of a {status} submission moving to {target}")]
    InvalidOrigin {
        status: SelectionStatus,
        target: SelectionStatus,
        origin: SelectionStatus,
    },
}

/// Validates and plans selection status changes. Holds no state of its own.
pub struct TransitionEngine;

impl TransitionEngine {
    pub fn allowed_targets(submission: &Submission) -> Vec<SelectionStatus> {
        allowed_targets(submission.status, submission.origin_stage())
    }

    pub fn validate(submission: &Submission, target: SelectionStatus) -> Result<(), TransitionError> {
        if Self::allowed_targets(submission).contains(&target) {
            Ok(())
        } else {
            Err(TransitionError::Illegal {
                from: submission.status,
                to: target,
            })
        }
    }

    /// Plan a transition.
    ///
    /// Targets that need a note come back as [`TransitionPlan::ReasonRequired`] until the
    /// request carries one. Committed changes start from the stored `additional_data`, overlay
    /// the request's patch, then record the note under `tech_status` (for `interview`) or
    /// `<target>_reason`. A patch may only carry `origin_stage` when holding, and then only
    /// the submission's current status.
    pub fn plan(
        submission: &Submission,
        request: TransitionRequest,
    ) -> Result<TransitionPlan, TransitionError> {
        let TransitionRequest {
            target,
            reason,
            additional_data: patch,
        } = request;

        Self::validate(submission, target)?;
        Self::validate_origin(submission, target, &patch)?;

        let reason = match reason {
            Some(reason) => Some(reason),
            None if target.requires_reason() => {
                return Ok(TransitionPlan::ReasonRequired(PendingDecision {
                    submission: submission.clone(),
                    target,
                    default_reason: default_reason(submission, target),
                    additional_data: patch,
                }));
            }
            None => None,
        };

        let mut additional_data = submission.additional_data.clone();
        additional_data.merge(patch);
        if let Some(reason) = reason {
            let note = match target {
                SelectionStatus::Interview => AdditionalData::new().with_tech_status(reason),
                other => AdditionalData::new().with_reason(other, reason),
            };
            additional_data.merge(note);
        }
        debug_assert!(additional_data.is_superset_of(&submission.additional_data));

        Ok(TransitionPlan::Commit(StatusChange {
            submission_id: submission.submission_id.clone(),
            from: submission.status,
            to: target,
            additional_data,
        }))
    }

    fn validate_origin(
        submission: &Submission,
        target: SelectionStatus,
        patch: &AdditionalData,
    ) -> Result<(), TransitionError> {
        match patch.origin_stage() {
            Some(origin) if target != SelectionStatus::Holding || origin != submission.status => {
                Err(TransitionError::InvalidOrigin {
                    status: submission.status,
                    target,
                    origin,
                })
            }
            _ => Ok(()),
        }
    }

    /// Request placing the submission on hold, remembering the stage it leaves.
    pub fn hold_request(submission: &Submission) -> TransitionRequest {
        TransitionRequest::new(SelectionStatus::Holding)
            .with_additional_data(AdditionalData::new().with_origin_stage(submission.status))
    }

    /// Request returning a held submission to the stage it was held from.
    pub fn restore_request(submission: &Submission) -> Result<TransitionRequest, TransitionError> {
        if submission.status != SelectionStatus::Holding {
            return Err(TransitionError::NotOnHold {
                status: submission.status,
            });
        }
        Ok(TransitionRequest::new(submission.origin_stage()))
    }

    /// Request a manual restore of a rejected submission back into screening.
    pub fn reconsider_request(
        submission: &Submission,
    ) -> Result<TransitionRequest, TransitionError> {
        if submission.status != SelectionStatus::Rejected {
            return Err(TransitionError::NotRejected {
                status: submission.status,
            });
        }
        Ok(TransitionRequest::new(SelectionStatus::Screening))
    }
}

fn default_reason(submission: &Submission, target: SelectionStatus) -> String {
    let data = &submission.additional_data;
    let existing = match target {
        SelectionStatus::Interview => data.tech_status(),
        other => data.reason(other),
    };
    existing.unwrap_or_default().to_string()
}
