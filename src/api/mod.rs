mod error;
mod http;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;

use crate::models::{DeleteOutcome, HistoryEntry, MonitorSettings, RecordingSet, RecordingStatus};

pub use error::ApiError;
pub use http::HttpMonitorApi;

/// Audio file picked by the operator for the alert sound.
#[derive(Debug, Clone)]
pub struct AudioUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// MIME type reported by the picker, if any.
    pub mime_hint: Option<String>,
}

/// Typed access to the device endpoints.
///
/// Implementations are pure request/response: they never cache, never retry and
/// never touch the store. Everything that reconciles local state lives in
/// [`crate::sync`] and [`crate::commands`].
#[async_trait]
pub trait MonitorApi: Send + Sync {
    async fn get_settings(&self) -> Result<MonitorSettings, ApiError>;

    /// Most recent days first, as ordered by the device.
    async fn get_history(&self) -> Result<Vec<HistoryEntry>, ApiError>;

    async fn list_recordings(&self) -> Result<RecordingSet, ApiError>;

    async fn get_recording_status(&self) -> Result<RecordingStatus, ApiError>;

    async fn save_settings(&self, settings: &MonitorSettings) -> Result<(), ApiError>;

    /// Flips manual pause on the device and returns the new state.
    async fn toggle_recording(&self) -> Result<RecordingStatus, ApiError>;

    /// Not idempotent: deleting a file that is already gone yields `NotFound`.
    async fn delete_recording(&self, filename: &str) -> Result<DeleteOutcome, ApiError>;

    async fn download_recording(&self, filename: &str) -> Result<Vec<u8>, ApiError>;

    /// Returns the device's status message on success.
    async fn upload_alert_audio(&self, upload: AudioUpload) -> Result<String, ApiError>;
}
