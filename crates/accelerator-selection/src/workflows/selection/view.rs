//! Read-only projections of submissions for the selection board and detail pane.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::domain::{
    SelectionStatus, Submission, SubmissionId, COLUMN_ORDER_KEY, ORIGIN_STAGE_KEY,
    REASON_SUFFIX, TECH_STATUS_KEY,
};
use super::format::ValueFormatter;
use super::transitions::TransitionEngine;

/// Columns shown first when no submission carries an explicit column order.
pub const DEFAULT_COLUMNS: [&str; 3] = ["Startup Name", "Industry", "Location"];

/// Statuses whose decision notes are listed in the detail pane, in display order.
const NOTE_STATUSES: [SelectionStatus; 4] = [
    SelectionStatus::Approved,
    SelectionStatus::Rejected,
    SelectionStatus::Holding,
    SelectionStatus::Displayed,
];

/// Board tabs. `displayed` submissions are grouped under `approved`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageTab {
    #[default]
    Screening,
    Interview,
    Approved,
    Holding,
    Rejected,
}

impl StageTab {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Screening,
            Self::Interview,
            Self::Approved,
            Self::Holding,
            Self::Rejected,
        ]
    }

    pub const fn title(self) -> &'static str {
        match self {
            Self::Screening => "Screening",
            Self::Interview => "Interviews",
            Self::Approved => "Approved",
            Self::Holding => "Holding",
            Self::Rejected => "Rejected",
        }
    }

    pub const fn for_status(status: SelectionStatus) -> Self {
        match status {
            SelectionStatus::Screening => Self::Screening,
            SelectionStatus::Interview => Self::Interview,
            SelectionStatus::Approved | SelectionStatus::Displayed => Self::Approved,
            SelectionStatus::Holding => Self::Holding,
            SelectionStatus::Rejected => Self::Rejected,
        }
    }

    pub fn contains(self, status: SelectionStatus) -> bool {
        Self::for_status(status) == self
    }
}

/// Tab plus free-text search over startup name and industry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageFilter {
    #[serde(default)]
    pub stage: StageTab,
    #[serde(default)]
    pub search: String,
}

impl StageFilter {
    pub fn new(stage: StageTab) -> Self {
        Self {
            stage,
            search: String::new(),
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    /// True when the submission sits in the tab and its name or industry contains the search,
    /// ignoring case. A blank search keeps every submission in the tab, including ones with
    /// neither a startup name nor an industry.
    pub fn matches(&self, submission: &Submission) -> bool {
        if !self.stage.contains(submission.status) {
            return false;
        }
        let needle = self.search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [&submission.startup_name, &submission.industry]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&needle))
    }

    pub fn apply<'a>(&self, submissions: &'a [Submission]) -> Vec<&'a Submission> {
        submissions
            .iter()
            .filter(|submission| self.matches(submission))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageCount {
    pub stage: StageTab,
    pub title: &'static str,
    pub count: usize,
}

/// Per-tab totals, ignoring any search term.
pub fn stage_counts(submissions: &[Submission]) -> Vec<StageCount> {
    StageTab::ordered()
        .into_iter()
        .map(|stage| StageCount {
            stage,
            title: stage.title(),
            count: submissions
                .iter()
                .filter(|submission| stage.contains(submission.status))
                .count(),
        })
        .collect()
}

/// Column headers for a set of submissions.
///
/// The first submission carrying `_column_order` decides the order outright. Otherwise the
/// defaults come first, followed by every other key in order of first appearance.
pub fn derive_columns<'a, I>(submissions: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Submission> + Clone,
{
    if let Some(order) = submissions
        .clone()
        .into_iter()
        .find_map(|submission| submission.additional_data.column_order())
    {
        return order.to_vec();
    }

    let mut columns: Vec<String> = DEFAULT_COLUMNS.iter().map(|c| c.to_string()).collect();
    for submission in submissions {
        for key in submission.additional_data.keys() {
            if key != COLUMN_ORDER_KEY && !columns.contains(&key) {
                columns.push(key);
            }
        }
    }
    columns
}

/// Value shown under `column`. Name, industry, and location style headers read the core
/// fields; anything else reads `additional_data`.
pub fn resolve_cell(submission: &Submission, column: &str) -> Option<Value> {
    let lowered = column.to_lowercase();
    let core_field = if lowered.contains("name") {
        Some(&submission.startup_name)
    } else if lowered.contains("industry") || lowered.contains("sector") {
        Some(&submission.industry)
    } else if ["location", "city", "governorate"]
        .iter()
        .any(|needle| lowered.contains(needle))
    {
        Some(&submission.location)
    } else {
        None
    };

    match core_field {
        Some(field) => field.clone().map(Value::String),
        None => submission.additional_data.get(column),
    }
}

fn is_reserved_key(key: &str) -> bool {
    key == COLUMN_ORDER_KEY
        || key == TECH_STATUS_KEY
        || key == ORIGIN_STAGE_KEY
        || key.ends_with(REASON_SUFFIX)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardRow {
    pub submission_id: SubmissionId,
    pub status: SelectionStatus,
    pub cells: Vec<String>,
    pub allowed_targets: Vec<SelectionStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageBoard {
    pub stage: StageTab,
    pub search: String,
    pub columns: Vec<String>,
    pub rows: Vec<BoardRow>,
    pub counts: Vec<StageCount>,
}

/// Build the board for one tab. Columns are derived from the filtered rows only.
pub fn stage_board(
    submissions: &[Submission],
    filter: &StageFilter,
    formatter: &dyn ValueFormatter,
) -> StageBoard {
    let visible = filter.apply(submissions);
    let columns = derive_columns(visible.iter().copied());

    let rows = visible
        .iter()
        .map(|submission| BoardRow {
            submission_id: submission.submission_id.clone(),
            status: submission.status,
            cells: columns
                .iter()
                .map(|column| {
                    let value = resolve_cell(submission, column).unwrap_or(Value::Null);
                    formatter.format(&value)
                })
                .collect(),
            allowed_targets: TransitionEngine::allowed_targets(submission),
        })
        .collect();

    StageBoard {
        stage: filter.stage,
        search: filter.search.clone(),
        columns,
        rows,
        counts: stage_counts(submissions),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecisionNote {
    pub status: SelectionStatus,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeEntry {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionDetail {
    pub submission_id: SubmissionId,
    pub status: SelectionStatus,
    pub stage: StageTab,
    pub startup_name: Option<String>,
    pub industry: Option<String>,
    pub location: Option<String>,
    pub submitted_on: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tech_status: Option<String>,
    pub decision_notes: Vec<DecisionNote>,
    pub attributes: Vec<AttributeEntry>,
    pub allowed_targets: Vec<SelectionStatus>,
}

pub fn submission_detail(
    submission: &Submission,
    formatter: &dyn ValueFormatter,
) -> SubmissionDetail {
    let data = &submission.additional_data;

    let decision_notes = NOTE_STATUSES
        .into_iter()
        .filter_map(|status| {
            data.reason(status)
                .filter(|note| !note.is_empty())
                .map(|note| DecisionNote {
                    status,
                    note: note.to_string(),
                })
        })
        .collect();

    let order = match data.column_order() {
        Some(order) => order.to_vec(),
        None => data.keys(),
    };
    let attributes = order
        .into_iter()
        .filter(|key| !is_reserved_key(key))
        .filter_map(|key| {
            let value = data.get(&key)?;
            if value == Value::String(String::new()) {
                return None;
            }
            Some(AttributeEntry {
                value: formatter.format(&value),
                key,
            })
        })
        .collect();

    SubmissionDetail {
        submission_id: submission.submission_id.clone(),
        status: submission.status,
        stage: StageTab::for_status(submission.status),
        startup_name: submission.startup_name.clone(),
        industry: submission.industry.clone(),
        location: submission.location.clone(),
        submitted_on: formatter.format(&Value::String(submission.submitted_at.to_rfc3339())),
        tech_status: data
            .tech_status()
            .filter(|note| !note.is_empty())
            .map(str::to_string),
        decision_notes,
        attributes,
        allowed_targets: TransitionEngine::allowed_targets(submission),
    }
}
