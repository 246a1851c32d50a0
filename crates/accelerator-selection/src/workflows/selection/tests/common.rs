use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};

use crate::workflows::selection::domain::{
    AdditionalData, EntityKind, EventId, SelectionStatus, Submission, SubmissionId,
};
use crate::workflows::selection::repository::{
    ImportError, ImportSource, NoticeLevel, Notification, NotificationSink, NotifyError,
    StatusUpdate, StoreError, SubmissionStore, SyncStats,
};
use crate::workflows::selection::{selection_router, SelectionService};

pub(super) const EVENT: &str = "evt-cairo-2025";

pub(super) fn event_id() -> EventId {
    EventId(EVENT.to_string())
}

pub(super) fn startup(id: &str, name: &str, industry: &str, status: SelectionStatus) -> Submission {
    Submission {
        submission_id: SubmissionId(id.to_string()),
        event_id: event_id(),
        entity_kind: EntityKind::company(),
        status,
        startup_name: Some(name.to_string()),
        industry: Some(industry.to_string()),
        location: Some("Cairo".to_string()),
        additional_data: AdditionalData::new()
            .with_attribute("Founder", "Lina Hassan")
            .with_attribute("Founded", json!(43831)),
        submitted_at: Utc
            .with_ymd_and_hms(2025, 2, 14, 10, 30, 0)
            .single()
            .expect("valid timestamp"),
    }
}

pub(super) fn screening(id: &str) -> Submission {
    startup(id, "Nile Robotics", "Robotics", SelectionStatus::Screening)
}

pub(super) fn pipeline() -> Vec<Submission> {
    vec![
        startup("sub-1", "Nile Robotics", "Robotics", SelectionStatus::Screening),
        startup("sub-2", "Delta Pay", "Fintech", SelectionStatus::Screening),
        startup("sub-3", "Sinai Solar", "Energy", SelectionStatus::Interview),
        startup("sub-4", "Giza Health", "Healthtech", SelectionStatus::Approved),
        startup("sub-5", "Luxor Learn", "Edtech", SelectionStatus::Displayed),
        startup("sub-6", "Aswan Agri", "Agritech", SelectionStatus::Holding),
        startup("sub-7", "Red Sea Freight", "Logistics", SelectionStatus::Rejected),
    ]
}

pub(super) type TestService = SelectionService<MemoryStore, MemoryImports, MemoryNotifications>;

pub(super) fn build_service(
    submissions: Vec<Submission>,
) -> (TestService, Arc<MemoryStore>, Arc<MemoryNotifications>) {
    let store = Arc::new(MemoryStore::with(submissions));
    let notifications = Arc::new(MemoryNotifications::default());
    let service = SelectionService::new(
        store.clone(),
        Arc::new(MemoryImports::default()),
        notifications.clone(),
        EntityKind::company(),
    );
    (service, store, notifications)
}

pub(super) fn router_with(submissions: Vec<Submission>) -> axum::Router {
    let (service, _, _) = build_service(submissions);
    selection_router(Arc::new(service))
}

#[derive(Default)]
pub(super) struct MemoryStore {
    records: Mutex<Vec<Submission>>,
    sheet_urls: Mutex<HashMap<EventId, String>>,
}

impl MemoryStore {
    pub(super) fn with(submissions: Vec<Submission>) -> Self {
        Self {
            records: Mutex::new(submissions),
            sheet_urls: Mutex::new(HashMap::new()),
        }
    }

    pub(super) fn stored(&self, id: &str) -> Submission {
        self.records
            .lock()
            .expect("store mutex poisoned")
            .iter()
            .find(|record| record.submission_id.0 == id)
            .cloned()
            .expect("record present")
    }

    pub(super) fn sheet_url(&self, event_id: &EventId) -> Option<String> {
        self.sheet_urls
            .lock()
            .expect("store mutex poisoned")
            .get(event_id)
            .cloned()
    }
}

impl SubmissionStore for MemoryStore {
    fn list(
        &self,
        event_id: &EventId,
        entity_kind: &EntityKind,
        status: Option<SelectionStatus>,
    ) -> Result<Vec<Submission>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard
            .iter()
            .filter(|record| &record.event_id == event_id && &record.entity_kind == entity_kind)
            .filter(|record| status.map_or(true, |status| record.status == status))
            .cloned()
            .collect())
    }

    fn fetch(&self, id: &SubmissionId) -> Result<Option<Submission>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard.iter().find(|record| &record.submission_id == id).cloned())
    }

    fn update_status(
        &self,
        id: &SubmissionId,
        status: SelectionStatus,
        update: StatusUpdate,
    ) -> Result<Submission, StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        let record = guard
            .iter_mut()
            .find(|record| &record.submission_id == id)
            .ok_or(StoreError::NotFound)?;
        record.status = status;
        record.additional_data.merge(update.additional_data);
        Ok(record.clone())
    }

    fn save_sheet_url(&self, event_id: &EventId, sheet_url: &str) -> Result<(), StoreError> {
        self.sheet_urls
            .lock()
            .expect("store mutex poisoned")
            .insert(event_id.clone(), sheet_url.to_string());
        Ok(())
    }
}

/// Reads succeed from a fixed snapshot; every write fails.
pub(super) struct ReadOnlyStore {
    records: Vec<Submission>,
}

impl ReadOnlyStore {
    pub(super) fn new(records: Vec<Submission>) -> Self {
        Self { records }
    }
}

impl SubmissionStore for ReadOnlyStore {
    fn list(
        &self,
        _event_id: &EventId,
        _entity_kind: &EntityKind,
        _status: Option<SelectionStatus>,
    ) -> Result<Vec<Submission>, StoreError> {
        Ok(self.records.clone())
    }

    fn fetch(&self, id: &SubmissionId) -> Result<Option<Submission>, StoreError> {
        Ok(self
            .records
            .iter()
            .find(|record| &record.submission_id == id)
            .cloned())
    }

    fn update_status(
        &self,
        _id: &SubmissionId,
        _status: SelectionStatus,
        _update: StatusUpdate,
    ) -> Result<Submission, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn save_sheet_url(&self, _event_id: &EventId, _sheet_url: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default)]
pub(super) struct MemoryNotifications {
    events: Mutex<Vec<Notification>>,
}

impl MemoryNotifications {
    pub(super) fn events(&self) -> Vec<Notification> {
        self.events.lock().expect("notification mutex poisoned").clone()
    }

    pub(super) fn last(&self) -> Notification {
        self.events().pop().expect("at least one notification")
    }

    pub(super) fn errors(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|event| event.level == NoticeLevel::Error)
            .map(|event| event.message)
            .collect()
    }
}

impl NotificationSink for MemoryNotifications {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .push(notification);
        Ok(())
    }
}

pub(super) struct BrokenNotifications;

impl NotificationSink for BrokenNotifications {
    fn notify(&self, _notification: Notification) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("webhook offline".to_string()))
    }
}

/// Sheet importer that answers from a fixed table of URLs.
#[derive(Default)]
pub(super) struct MemoryImports {
    sheets: HashMap<String, SyncStats>,
    calls: Mutex<Vec<(EventId, String)>>,
}

impl MemoryImports {
    pub(super) fn with_sheet(mut self, url: &str, stats: SyncStats) -> Self {
        self.sheets.insert(url.to_string(), stats);
        self
    }

    pub(super) fn calls(&self) -> Vec<(EventId, String)> {
        self.calls.lock().expect("import mutex poisoned").clone()
    }
}

impl ImportSource for MemoryImports {
    fn sync(&self, event_id: &EventId, sheet_url: &str) -> Result<SyncStats, ImportError> {
        self.calls
            .lock()
            .expect("import mutex poisoned")
            .push((event_id.clone(), sheet_url.to_string()));
        self.sheets
            .get(sheet_url)
            .copied()
            .ok_or_else(|| ImportError::UnknownSheet(sheet_url.to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
