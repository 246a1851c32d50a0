use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key holding the display order of imported columns.
pub const COLUMN_ORDER_KEY: &str = "_column_order";
/// Key holding the technology note captured when a submission enters `interview`.
pub const TECH_STATUS_KEY: &str = "tech_status";
/// Key holding the stage a submission occupied before it was put on hold.
pub const ORIGIN_STAGE_KEY: &str = "origin_stage";
pub(crate) const REASON_SUFFIX: &str = "_reason";

/// Identifier wrapper for applicant submissions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(pub String);

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for accelerator events.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub String);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Provider-defined label for the kind of applicant record (startups are `company`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityKind(pub String);

impl EntityKind {
    pub fn company() -> Self {
        Self("company".to_string())
    }
}

/// Stages an applicant moves through during selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStatus {
    Screening,
    Interview,
    Approved,
    Holding,
    Rejected,
    Displayed,
}

impl SelectionStatus {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::Screening,
            Self::Interview,
            Self::Approved,
            Self::Holding,
            Self::Rejected,
            Self::Displayed,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Screening => "screening",
            Self::Interview => "interview",
            Self::Approved => "approved",
            Self::Holding => "holding",
            Self::Rejected => "rejected",
            Self::Displayed => "displayed",
        }
    }

    /// Entering these stages always prompts the operator for a note first.
    pub const fn requires_reason(self) -> bool {
        matches!(
            self,
            Self::Interview | Self::Approved | Self::Holding | Self::Rejected
        )
    }

    /// The `additional_data` key a decision note for this stage is stored under.
    pub fn reason_key(self) -> String {
        format!("{}{}", self.label(), REASON_SUFFIX)
    }

    pub fn from_label(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ordered()
            .into_iter()
            .find(|status| status.label() == normalized)
    }
}

impl fmt::Display for SelectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown selection status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for SelectionStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::from_label(value).ok_or_else(|| UnknownStatus(value.to_string()))
    }
}

/// Free-form submission attributes plus the keys the selection workflow manages itself.
///
/// Serialized as one flat JSON object. Values under a reserved key that do not have the
/// expected shape are kept as plain attributes so imported data is never lost. The only way
/// to change an existing value is [`AdditionalData::merge`], which overlays keys and never
/// removes one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct AdditionalData {
    column_order: Option<Vec<String>>,
    tech_status: Option<String>,
    reasons: BTreeMap<SelectionStatus, String>,
    origin_stage: Option<SelectionStatus>,
    attributes: Map<String, Value>,
}

impl AdditionalData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        let value = value.into();
        let mut single = Map::new();
        single.insert(key, value);
        self.merge(Self::from(single));
        self
    }

    pub fn with_column_order<I, K>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.attributes.shift_remove(COLUMN_ORDER_KEY);
        self.column_order = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_tech_status(mut self, note: impl Into<String>) -> Self {
        self.attributes.shift_remove(TECH_STATUS_KEY);
        self.tech_status = Some(note.into());
        self
    }

    pub fn with_reason(mut self, status: SelectionStatus, note: impl Into<String>) -> Self {
        self.attributes.shift_remove(&status.reason_key());
        self.reasons.insert(status, note.into());
        self
    }

    pub fn with_origin_stage(mut self, status: SelectionStatus) -> Self {
        self.attributes.shift_remove(ORIGIN_STAGE_KEY);
        self.origin_stage = Some(status);
        self
    }

    pub fn column_order(&self) -> Option<&[String]> {
        self.column_order.as_deref()
    }

    pub fn tech_status(&self) -> Option<&str> {
        self.tech_status.as_deref()
    }

    pub fn reason(&self, status: SelectionStatus) -> Option<&str> {
        self.reasons.get(&status).map(String::as_str)
    }

    pub fn origin_stage(&self) -> Option<SelectionStatus> {
        self.origin_stage
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn is_empty(&self) -> bool {
        self.column_order.is_none()
            && self.tech_status.is_none()
            && self.reasons.is_empty()
            && self.origin_stage.is_none()
            && self.attributes.is_empty()
    }

    /// Look up any key, reserved or not, in its JSON form.
    pub fn get(&self, key: &str) -> Option<Value> {
        match key {
            COLUMN_ORDER_KEY if self.column_order.is_some() => self
                .column_order
                .as_ref()
                .map(|columns| Value::from(columns.clone())),
            TECH_STATUS_KEY if self.tech_status.is_some() => {
                self.tech_status.clone().map(Value::String)
            }
            ORIGIN_STAGE_KEY if self.origin_stage.is_some() => self
                .origin_stage
                .map(|status| Value::String(status.label().to_string())),
            _ => {
                if let Some(status) = reason_status(key) {
                    if let Some(note) = self.reasons.get(&status) {
                        return Some(Value::String(note.clone()));
                    }
                }
                self.attributes.get(key).cloned()
            }
        }
    }

    /// Every key present except the column order, imported attributes first.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .attributes
            .keys()
            .filter(|key| key.as_str() != COLUMN_ORDER_KEY)
            .cloned()
            .collect();
        if self.tech_status.is_some() {
            keys.push(TECH_STATUS_KEY.to_string());
        }
        keys.extend(self.reasons.keys().map(|status| status.reason_key()));
        if self.origin_stage.is_some() {
            keys.push(ORIGIN_STAGE_KEY.to_string());
        }
        keys
    }

    /// True when every key of `other` is also present here.
    pub fn is_superset_of(&self, other: &AdditionalData) -> bool {
        let mine = self.keys();
        let covers_order = other.column_order.is_none()
            || self.column_order.is_some()
            || self.attributes.contains_key(COLUMN_ORDER_KEY);
        covers_order && other.keys().iter().all(|key| mine.contains(key))
    }

    /// Overlay `patch` onto this mapping. Keys absent from the patch are left untouched.
    pub fn merge(&mut self, patch: AdditionalData) {
        let AdditionalData {
            column_order,
            tech_status,
            reasons,
            origin_stage,
            attributes,
        } = patch;

        for (key, value) in attributes {
            self.attributes.insert(key, value);
        }
        if let Some(columns) = column_order {
            self.attributes.shift_remove(COLUMN_ORDER_KEY);
            self.column_order = Some(columns);
        }
        if let Some(note) = tech_status {
            self.attributes.shift_remove(TECH_STATUS_KEY);
            self.tech_status = Some(note);
        }
        for (status, note) in reasons {
            self.attributes.shift_remove(&status.reason_key());
            self.reasons.insert(status, note);
        }
        if let Some(status) = origin_stage {
            self.attributes.shift_remove(ORIGIN_STAGE_KEY);
            self.origin_stage = Some(status);
        }
    }
}

fn reason_status(key: &str) -> Option<SelectionStatus> {
    key.strip_suffix(REASON_SUFFIX)
        .and_then(|prefix| SelectionStatus::ordered().into_iter().find(|s| s.label() == prefix))
}

impl From<Map<String, Value>> for AdditionalData {
    fn from(map: Map<String, Value>) -> Self {
        let mut data = AdditionalData::default();

        for (key, value) in map {
            if key == COLUMN_ORDER_KEY {
                if let Some(columns) = string_list(&value) {
                    data.column_order = Some(columns);
                    continue;
                }
            } else if key == TECH_STATUS_KEY {
                if let Value::String(note) = &value {
                    data.tech_status = Some(note.clone());
                    continue;
                }
            } else if key == ORIGIN_STAGE_KEY {
                if let Some(status) = value.as_str().and_then(SelectionStatus::from_label) {
                    data.origin_stage = Some(status);
                    continue;
                }
            } else if let (Some(status), Value::String(note)) = (reason_status(&key), &value) {
                data.reasons.insert(status, note.clone());
                continue;
            }

            data.attributes.insert(key, value);
        }

        data
    }
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    value.as_array()?
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect()
}

impl From<AdditionalData> for Map<String, Value> {
    fn from(data: AdditionalData) -> Self {
        let mut map = data.attributes;
        if let Some(columns) = data.column_order {
            map.insert(COLUMN_ORDER_KEY.to_string(), Value::from(columns));
        }
        if let Some(note) = data.tech_status {
            map.insert(TECH_STATUS_KEY.to_string(), Value::String(note));
        }
        for (status, note) in data.reasons {
            map.insert(status.reason_key(), Value::String(note));
        }
        if let Some(status) = data.origin_stage {
            map.insert(
                ORIGIN_STAGE_KEY.to_string(),
                Value::String(status.label().to_string()),
            );
        }
        map
    }
}

/// One applicant's record in the selection pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub submission_id: SubmissionId,
    pub event_id: EventId,
    pub entity_kind: EntityKind,
    pub status: SelectionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub startup_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub additional_data: AdditionalData,
    pub submitted_at: DateTime<Utc>,
}

impl Submission {
    /// Stage a held submission returns to; `screening` when none was recorded.
    pub fn origin_stage(&self) -> SelectionStatus {
        self.additional_data
            .origin_stage()
            .filter(|origin| *origin != SelectionStatus::Holding)
            .unwrap_or(SelectionStatus::Screening)
    }

    pub fn display_name(&self) -> &str {
        self.startup_name.as_deref().unwrap_or(&self.submission_id.0)
    }
}
