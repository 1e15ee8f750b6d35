//! Scripted in-memory device for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::models::{
    DeleteOutcome, HistoryEntry, MonitorSettings, RecordingSet, RecordingStatus,
};

use super::{ApiError, AudioUpload, MonitorApi};

/// Queue of replies for one endpoint. When the queue runs dry the fallback is
/// returned immediately.
pub(crate) struct Scripted<T> {
    queue: Mutex<VecDeque<(Duration, Result<T, ApiError>)>>,
    fallback: Mutex<Result<T, ApiError>>,
    calls: AtomicUsize,
}

impl<T: Clone> Scripted<T> {
    fn new(fallback: Result<T, ApiError>) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(fallback),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn push(&self, reply: Result<T, ApiError>) {
        self.push_delayed(Duration::ZERO, reply);
    }

    /// Reply that resolves only after `delay` of (possibly paused) tokio time.
    pub(crate) fn push_delayed(&self, delay: Duration, reply: Result<T, ApiError>) {
        self.queue.lock().unwrap().push_back((delay, reply));
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn next(&self) -> Result<T, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let queued = self.queue.lock().unwrap().pop_front();
        let (delay, reply) =
            queued.unwrap_or_else(|| (Duration::ZERO, self.fallback.lock().unwrap().clone()));
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        reply
    }
}

pub(crate) struct FakeApi {
    pub settings: Scripted<MonitorSettings>,
    pub history: Scripted<Vec<HistoryEntry>>,
    pub recordings: Scripted<RecordingSet>,
    pub status: Scripted<RecordingStatus>,
    pub save: Scripted<()>,
    pub toggle: Scripted<RecordingStatus>,
    pub delete: Scripted<DeleteOutcome>,
    pub download: Scripted<Vec<u8>>,
    pub upload: Scripted<String>,
    pub saved: Mutex<Vec<MonitorSettings>>,
    pub deleted: Mutex<Vec<String>>,
    pub uploaded: Mutex<Vec<String>>,
}

impl Default for FakeApi {
    fn default() -> Self {
        Self {
            settings: Scripted::new(Ok(MonitorSettings::default())),
            history: Scripted::new(Ok(Vec::new())),
            recordings: Scripted::new(Ok(RecordingSet::new())),
            status: Scripted::new(Ok(RecordingStatus::paused(false))),
            save: Scripted::new(Ok(())),
            toggle: Scripted::new(Err(ApiError::Transport("toggle not scripted".into()))),
            delete: Scripted::new(Err(ApiError::NotFound("File not found".into()))),
            download: Scripted::new(Err(ApiError::NotFound("File not found".into()))),
            upload: Scripted::new(Ok("WAV updated.".into())),
            saved: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            uploaded: Mutex::new(Vec::new()),
        }
    }
}

impl FakeApi {
    pub(crate) fn read_calls(&self) -> usize {
        self.settings.calls()
    }
}

#[async_trait]
impl MonitorApi for FakeApi {
    async fn get_settings(&self) -> Result<MonitorSettings, ApiError> {
        self.settings.next().await
    }

    async fn get_history(&self) -> Result<Vec<HistoryEntry>, ApiError> {
        self.history.next().await
    }

    async fn list_recordings(&self) -> Result<RecordingSet, ApiError> {
        self.recordings.next().await
    }

    async fn get_recording_status(&self) -> Result<RecordingStatus, ApiError> {
        self.status.next().await
    }

    async fn save_settings(&self, settings: &MonitorSettings) -> Result<(), ApiError> {
        self.saved.lock().unwrap().push(settings.clone());
        self.save.next().await
    }

    async fn toggle_recording(&self) -> Result<RecordingStatus, ApiError> {
        self.toggle.next().await
    }

    async fn delete_recording(&self, filename: &str) -> Result<DeleteOutcome, ApiError> {
        self.deleted.lock().unwrap().push(filename.to_string());
        self.delete.next().await
    }

    async fn download_recording(&self, _filename: &str) -> Result<Vec<u8>, ApiError> {
        self.download.next().await
    }

    async fn upload_alert_audio(&self, upload: AudioUpload) -> Result<String, ApiError> {
        self.uploaded.lock().unwrap().push(upload.file_name);
        self.upload.next().await
    }
}
