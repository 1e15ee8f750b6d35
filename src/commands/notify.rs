use serde::Serialize;

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    TogglePause,
    DeleteRecording,
    SaveSettings,
    UploadAlertAudio,
}

impl Operation {
    pub fn label(&self) -> &'static str {
        match self {
            Operation::TogglePause => "toggle recording",
            Operation::DeleteRecording => "delete recording",
            Operation::SaveSettings => "save settings",
            Operation::UploadAlertAudio => "upload alert audio",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NoticeLevel {
    Info,
    /// The device did something the operator did not ask for.
    Warning,
    Error,
}

/// A blocking, user-visible message produced by a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub operation: Operation,
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(operation: Operation, message: impl Into<String>) -> Self {
        Self {
            operation,
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(operation: Operation, message: impl Into<String>) -> Self {
        Self {
            operation,
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(operation: Operation, message: impl Into<String>) -> Self {
        Self {
            operation,
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Where command outcomes are shown to the operator (a dialog, a toast, a log).
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Asks the operator before an irreversible action.
pub trait ConfirmationGate: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Sink for headless use: notices go to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&self, notice: Notice) {
        let label = notice.operation.label();
        match notice.level {
            NoticeLevel::Info => log_info!("[{label}] {}", notice.message),
            NoticeLevel::Warning => log_warn!("[{label}] {}", notice.message),
            NoticeLevel::Error => log_error!("[{label}] {}", notice.message),
        }
    }
}

/// Gate with a fixed answer, for unattended callers that already confirmed.
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl ConfirmationGate for FixedAnswer {
    fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}
