mod notify;

use std::sync::Arc;

use serde::Serialize;

use crate::api::{ApiError, AudioUpload, MonitorApi};
use crate::models::MonitorSettings;
use crate::sync::MonitorStore;

pub use notify::{
    ConfirmationGate, FixedAnswer, LogSink, Notice, NoticeLevel, NotificationSink, Operation,
};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

const CONNECTION_ERROR: &str = "Connection Error";
const ACTIVE_RECORDING_REMOVED: &str = "Active recording was deleted. Recording is now PAUSED. \
     Click 'Resume Rec' to start a new file.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DeleteResult {
    /// The operator declined the confirmation; nothing was sent.
    Declined,
    Deleted { paused_as_side_effect: bool },
    /// The device answered but reported the file as not deleted.
    Kept,
}

/// The four mutating operations. Each is one round trip with no retry, and the
/// store is updated only from what the device confirmed.
#[derive(Clone)]
pub struct MonitorCommands {
    api: Arc<dyn MonitorApi>,
    store: MonitorStore,
    sink: Arc<dyn NotificationSink>,
    gate: Arc<dyn ConfirmationGate>,
}

impl MonitorCommands {
    pub fn new(
        api: Arc<dyn MonitorApi>,
        store: MonitorStore,
        sink: Arc<dyn NotificationSink>,
        gate: Arc<dyn ConfirmationGate>,
    ) -> Self {
        Self {
            api,
            store,
            sink,
            gate,
        }
    }

    /// Flips manual pause. The store changes only once the device answers.
    pub async fn toggle_pause(&self) -> Result<bool, ApiError> {
        match self.api.toggle_recording().await {
            Ok(status) => {
                self.store.apply_status(status).await;
                Ok(status.is_paused)
            }
            Err(err) => {
                log_warn!("toggle failed: {err}");
                let message = match &err {
                    ApiError::Transport(_) => CONNECTION_ERROR.to_string(),
                    other => format!("Failed: {}", other.reason()),
                };
                self.sink
                    .notify(Notice::error(Operation::TogglePause, message));
                Err(err)
            }
        }
    }

    /// Deletes a recording after the operator confirms. If the device paused
    /// recording because the file was the active one, the store is paused too
    /// and a warning is raised.
    pub async fn delete_recording(&self, filename: &str) -> Result<DeleteResult, ApiError> {
        if !self.gate.confirm(&format!("Delete \"{filename}\"?")) {
            return Ok(DeleteResult::Declined);
        }

        let outcome = match self.api.delete_recording(filename).await {
            Ok(outcome) => outcome,
            Err(err) => {
                log_warn!("delete of {filename} failed: {err}");
                let message = match &err {
                    ApiError::Transport(_) => "Server Error".to_string(),
                    other => format!("Failed: {}", other.reason()),
                };
                self.sink
                    .notify(Notice::error(Operation::DeleteRecording, message));
                return Err(err);
            }
        };

        if !outcome.deleted {
            self.sink.notify(Notice::error(
                Operation::DeleteRecording,
                format!("Failed: device kept \"{filename}\""),
            ));
            return Ok(DeleteResult::Kept);
        }

        self.store.apply_delete(filename, outcome).await;
        log_info!("deleted recording {filename}");

        if outcome.paused_as_side_effect {
            self.sink.notify(Notice::warning(
                Operation::DeleteRecording,
                ACTIVE_RECORDING_REMOVED,
            ));
        }

        Ok(DeleteResult::Deleted {
            paused_as_side_effect: outcome.paused_as_side_effect,
        })
    }

    /// Local edit to the settings form. Never sent until [`Self::save_settings`].
    pub async fn edit_settings(&self, edit: impl FnOnce(&mut MonitorSettings)) {
        self.store.edit_settings(edit).await;
    }

    pub async fn discard_settings_edits(&self) {
        self.store.discard_edits().await;
    }

    /// Sends the full edited settings. On failure the draft stays for a retry.
    pub async fn save_settings(&self) -> Result<MonitorSettings, ApiError> {
        let outgoing = self.store.snapshot().await.effective_settings().clone();

        self.store.set_saving(true).await;
        let result = self.api.save_settings(&outgoing).await;
        self.store.set_saving(false).await;

        match result {
            Ok(()) => {
                self.store.apply_saved_settings(outgoing.clone()).await;
                self.sink
                    .notify(Notice::info(Operation::SaveSettings, "Configuration Saved!"));
                Ok(outgoing)
            }
            Err(err) => {
                log_warn!("saving settings failed: {err}");
                let message = match &err {
                    ApiError::Transport(_) => CONNECTION_ERROR.to_string(),
                    other => format!("Save failed: {}", other.reason()),
                };
                self.sink
                    .notify(Notice::error(Operation::SaveSettings, message));
                Err(err)
            }
        }
    }

    /// Replaces the device's alert sound. Has no effect on the store beyond
    /// the busy flag.
    pub async fn upload_alert_audio(&self, upload: AudioUpload) -> Result<String, ApiError> {
        if let Err(err) = precheck_audio(&upload) {
            self.sink
                .notify(Notice::error(Operation::UploadAlertAudio, err.reason()));
            return Err(err);
        }

        self.store.set_uploading(true).await;
        let result = self.api.upload_alert_audio(upload).await;
        self.store.set_uploading(false).await;

        match result {
            Ok(status) => {
                self.sink
                    .notify(Notice::info(Operation::UploadAlertAudio, status.clone()));
                Ok(status)
            }
            Err(err) => {
                log_warn!("alert audio upload failed: {err}");
                let message = match &err {
                    ApiError::Transport(_) => "Upload failed.".to_string(),
                    other => other.reason().to_string(),
                };
                self.sink
                    .notify(Notice::error(Operation::UploadAlertAudio, message));
                Err(err)
            }
        }
    }
}

/// Mirrors the picker's `audio/*` filter so obviously wrong files never leave
/// the client.
fn precheck_audio(upload: &AudioUpload) -> Result<(), ApiError> {
    if upload.bytes.is_empty() {
        return Err(ApiError::Validation("No file".to_string()));
    }
    match upload.mime_hint.as_deref() {
        Some(mime) if !mime.trim().to_ascii_lowercase().starts_with("audio/") => Err(
            ApiError::Validation(format!("unsupported audio type '{mime}'")),
        ),
        _ => Ok(()),
    }
}
