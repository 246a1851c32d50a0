use accelerator_selection::error::AppError;
use accelerator_selection::workflows::selection::{
    EntityKind, EventId, ImportError, ImportSource, NoticeLevel, Notification, NotificationSink,
    NotifyError, SelectionService, SelectionStatus, StatusUpdate, StoreError, Submission,
    SubmissionId, SubmissionStore, SyncStats,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, warn};

pub(crate) type ConsoleService =
    SelectionService<InMemorySubmissionStore, InMemoryImportSource, TracingNotificationSink>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

fn lock<'a, T>(mutex: &'a Mutex<T>, name: &str) -> Result<MutexGuard<'a, T>, String> {
    mutex.lock().map_err(|_| format!("{name} mutex poisoned"))
}

#[derive(Default)]
pub(crate) struct InMemorySubmissionStore {
    records: Mutex<Vec<Submission>>,
    sheet_urls: Mutex<HashMap<EventId, String>>,
}

impl InMemorySubmissionStore {
    pub(crate) fn insert(&self, submission: Submission) -> Result<(), StoreError> {
        let mut guard = lock(&self.records, "submission").map_err(StoreError::Unavailable)?;
        guard.retain(|record| record.submission_id != submission.submission_id);
        guard.push(submission);
        Ok(())
    }

    /// Make the event's rows match `rows`: unknown ids are inserted into screening, ids no
    /// longer present are removed, and existing records keep their status and notes. Rows whose
    /// id is already held by another event are skipped with a warning.
    pub(crate) fn reconcile(
        &self,
        event_id: &EventId,
        rows: Vec<Submission>,
    ) -> Result<SyncStats, StoreError> {
        let mut guard = lock(&self.records, "submission").map_err(StoreError::Unavailable)?;
        let incoming: HashSet<SubmissionId> =
            rows.iter().map(|row| row.submission_id.clone()).collect();

        let before = guard.len();
        guard.retain(|record| {
            &record.event_id != event_id || incoming.contains(&record.submission_id)
        });
        let deleted = before - guard.len();

        let mut inserted = 0;
        for mut row in rows {
            match guard
                .iter()
                .find(|record| record.submission_id == row.submission_id)
            {
                Some(record) if &record.event_id != event_id => {
                    warn!(
                        submission_id = %row.submission_id,
                        event_id = %event_id,
                        owner = %record.event_id,
                        "sheet row already belongs to another event; skipped"
                    );
                    continue;
                }
                Some(_) => continue,
                None => {}
            }
            row.event_id = event_id.clone();
            row.status = SelectionStatus::Screening;
            guard.push(row);
            inserted += 1;
        }

        Ok(SyncStats { inserted, deleted })
    }
}

impl SubmissionStore for InMemorySubmissionStore {
    fn list(
        &self,
        event_id: &EventId,
        entity_kind: &EntityKind,
        status: Option<SelectionStatus>,
    ) -> Result<Vec<Submission>, StoreError> {
        let guard = lock(&self.records, "submission").map_err(StoreError::Unavailable)?;
        let mut records: Vec<Submission> = guard
            .iter()
            .filter(|record| &record.event_id == event_id && &record.entity_kind == entity_kind)
            .filter(|record| status.map_or(true, |status| record.status == status))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(records)
    }

    fn fetch(&self, id: &SubmissionId) -> Result<Option<Submission>, StoreError> {
        let guard = lock(&self.records, "submission").map_err(StoreError::Unavailable)?;
        Ok(guard.iter().find(|record| &record.submission_id == id).cloned())
    }

    fn update_status(
        &self,
        id: &SubmissionId,
        status: SelectionStatus,
        update: StatusUpdate,
    ) -> Result<Submission, StoreError> {
        let mut guard = lock(&self.records, "submission").map_err(StoreError::Unavailable)?;
        let record = guard
            .iter_mut()
            .find(|record| &record.submission_id == id)
            .ok_or(StoreError::NotFound)?;
        record.status = status;
        record.additional_data.merge(update.additional_data);
        Ok(record.clone())
    }

    fn save_sheet_url(&self, event_id: &EventId, sheet_url: &str) -> Result<(), StoreError> {
        lock(&self.sheet_urls, "sheet url")
            .map_err(StoreError::Unavailable)?
            .insert(event_id.clone(), sheet_url.to_string());
        Ok(())
    }
}

/// Stands in for the hosted sheet importer: rows are registered per URL up front.
pub(crate) struct InMemoryImportSource {
    store: Arc<InMemorySubmissionStore>,
    sheets: Mutex<HashMap<String, Vec<Submission>>>,
}

impl InMemoryImportSource {
    pub(crate) fn new(store: Arc<InMemorySubmissionStore>) -> Self {
        Self {
            store,
            sheets: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn register(&self, url: impl Into<String>, rows: Vec<Submission>) {
        match lock(&self.sheets, "sheet") {
            Ok(mut guard) => {
                guard.insert(url.into(), rows);
            }
            Err(err) => warn!(error = %err, "sheet registration dropped"),
        }
    }
}

impl ImportSource for InMemoryImportSource {
    fn sync(&self, event_id: &EventId, sheet_url: &str) -> Result<SyncStats, ImportError> {
        let rows = lock(&self.sheets, "sheet")
            .map_err(ImportError::Unavailable)?
            .get(sheet_url)
            .cloned()
            .ok_or_else(|| ImportError::UnknownSheet(sheet_url.to_string()))?;

        self.store
            .reconcile(event_id, rows)
            .map_err(|err| ImportError::Unavailable(err.to_string()))
    }
}

/// Surfaces operator notices in the service log.
#[derive(Default)]
pub(crate) struct TracingNotificationSink;

impl NotificationSink for TracingNotificationSink {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        match notification.level {
            NoticeLevel::Success => info!(notice = %notification.message, "operator notice"),
            NoticeLevel::Error => warn!(notice = %notification.message, "operator notice"),
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SeedSheet {
    pub(crate) url: String,
    #[serde(default)]
    pub(crate) rows: Vec<Submission>,
}

/// Submissions and sheets loaded into the in-memory adapters at startup.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct SeedData {
    #[serde(default)]
    pub(crate) submissions: Vec<Submission>,
    #[serde(default)]
    pub(crate) sheets: Vec<SeedSheet>,
}

impl SeedData {
    pub(crate) fn from_path(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read(path)?;
        Ok(serde_json::from_slice(&raw)?)
    }
}

pub(crate) struct Adapters {
    pub(crate) store: Arc<InMemorySubmissionStore>,
    pub(crate) importer: Arc<InMemoryImportSource>,
}

pub(crate) fn seeded_adapters(seed: SeedData) -> Result<Adapters, AppError> {
    let store = Arc::new(InMemorySubmissionStore::default());
    for submission in seed.submissions {
        store
            .insert(submission)
            .map_err(|err| AppError::Selection(err.into()))?;
    }

    let importer = Arc::new(InMemoryImportSource::new(store.clone()));
    for sheet in seed.sheets {
        importer.register(sheet.url, sheet.rows);
    }

    Ok(Adapters { store, importer })
}
