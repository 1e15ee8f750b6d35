use reqwest::StatusCode;
use thiserror::Error;

/// Failures the device client can report. No retries happen below this type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Network failure or an undecodable body; the device never answered usefully.
    #[error("transport error: {0}")]
    Transport(String),

    /// The device answered with an unexpected failure status and its own reason.
    #[error("device error (HTTP {code}): {reason}")]
    Server { code: u16, reason: String },

    /// The device rejected the payload (bad settings or unsupported audio).
    #[error("rejected by device: {0}")]
    Validation(String),

    /// The target recording does not exist on the device.
    #[error("not found: {0}")]
    NotFound(String),
}

impl ApiError {
    /// Server-reported reason, without the kind prefix.
    pub fn reason(&self) -> &str {
        match self {
            ApiError::Transport(reason)
            | ApiError::Validation(reason)
            | ApiError::NotFound(reason)
            | ApiError::Server { reason, .. } => reason,
        }
    }

    /// Connectivity-class failures: no response, or a failure status that is
    /// neither a rejection nor a missing file.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_) | ApiError::Server { .. })
    }

    /// Maps a non-success status to an error kind. `rejects_payload` marks
    /// endpoints where any failure status means the device refused the input.
    pub(crate) fn from_status(status: StatusCode, reason: String, rejects_payload: bool) -> Self {
        match status {
            StatusCode::NOT_FOUND => ApiError::NotFound(reason),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ApiError::Validation(reason)
            }
            _ if rejects_payload => ApiError::Validation(reason),
            _ => ApiError::Server {
                code: status.as_u16(),
                reason,
            },
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}
