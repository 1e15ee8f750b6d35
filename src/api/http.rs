use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, Response, Url,
};
use serde::{de::DeserializeOwned, Deserialize};

use crate::config::ClientConfig;
use crate::models::{DeleteOutcome, HistoryEntry, MonitorSettings, RecordingSet, RecordingStatus};

use super::{ApiError, AudioUpload, MonitorApi};

const ENABLE_LOGS: bool = true;

use crate::log_debug;

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Deserialize)]
struct StatusBody {
    status: String,
}

#[derive(Deserialize)]
struct DeleteBody {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    paused: bool,
}

/// [`MonitorApi`] over the device's REST endpoints.
#[derive(Clone)]
pub struct HttpMonitorApi {
    http: Client,
    base_url: Url,
}

impl HttpMonitorApi {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("invalid device url '{}'", config.base_url))?;
        if base_url.cannot_be_a_base() {
            bail!("device url '{}' cannot carry a path", config.base_url);
        }

        let mut builder = Client::builder();
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let http = builder.build().context("failed to build HTTP client")?;

        Ok(Self { http, base_url })
    }

    /// Link for downloading a recording directly, e.g. from a browser.
    pub fn recording_url(&self, filename: &str) -> Url {
        self.endpoint(&["api", "recordings", filename])
    }

    /// MJPEG stream of the camera; consumed by the view, not by the client.
    pub fn video_feed_url(&self) -> Url {
        self.endpoint(&["video_feed"])
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in `new`: the base URL always accepts path segments.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        let url = self.endpoint(segments);
        log_debug!("GET {url}");
        let response = self.http.get(url).send().await?;
        let response = ensure_success(response, false).await?;
        Ok(response.json::<T>().await?)
    }
}

/// Passes successful responses through and turns the rest into [`ApiError`],
/// preferring the device's `{"error": ...}` message as the reason.
async fn ensure_success(response: Response, rejects_payload: bool) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let reason = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(parsed) => parsed.error,
        Err(_) if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
        Err(_) => body.chars().take(200).collect(),
    };

    Err(ApiError::from_status(status, reason, rejects_payload))
}

#[async_trait]
impl MonitorApi for HttpMonitorApi {
    async fn get_settings(&self) -> Result<MonitorSettings, ApiError> {
        self.get_json(&["api", "settings"]).await
    }

    async fn get_history(&self) -> Result<Vec<HistoryEntry>, ApiError> {
        self.get_json(&["api", "history"]).await
    }

    async fn list_recordings(&self) -> Result<RecordingSet, ApiError> {
        self.get_json(&["api", "recordings"]).await
    }

    async fn get_recording_status(&self) -> Result<RecordingStatus, ApiError> {
        self.get_json(&["api", "recording", "status"]).await
    }

    async fn save_settings(&self, settings: &MonitorSettings) -> Result<(), ApiError> {
        let response = self
            .http
            .post(self.endpoint(&["api", "settings"]))
            .json(settings)
            .send()
            .await?;
        ensure_success(response, false).await?;
        Ok(())
    }

    async fn toggle_recording(&self) -> Result<RecordingStatus, ApiError> {
        let response = self
            .http
            .post(self.endpoint(&["api", "recording", "toggle"]))
            .send()
            .await?;
        let response = ensure_success(response, false).await?;
        Ok(response.json::<RecordingStatus>().await?)
    }

    async fn delete_recording(&self, filename: &str) -> Result<DeleteOutcome, ApiError> {
        let response = self
            .http
            .delete(self.endpoint(&["api", "recordings", filename]))
            .send()
            .await?;
        let response = ensure_success(response, false).await?;
        let body = response.json::<DeleteBody>().await?;

        Ok(DeleteOutcome {
            deleted: body.status.as_deref().map_or(true, |s| s == "deleted"),
            paused_as_side_effect: body.paused,
        })
    }

    async fn download_recording(&self, filename: &str) -> Result<Vec<u8>, ApiError> {
        let response = self.http.get(self.recording_url(filename)).send().await?;
        let response = ensure_success(response, false).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn upload_alert_audio(&self, upload: AudioUpload) -> Result<String, ApiError> {
        let mut part = Part::bytes(upload.bytes).file_name(upload.file_name);
        if let Some(mime) = upload.mime_hint.as_deref() {
            part = part
                .mime_str(mime)
                .map_err(|err| ApiError::Validation(format!("invalid mime type '{mime}': {err}")))?;
        }
        let form = Form::new().part("file", part);

        let response = self
            .http
            .post(self.endpoint(&["api", "upload_audio"]))
            .multipart(form)
            .send()
            .await?;
        let response = ensure_success(response, true).await?;
        Ok(response.json::<StatusBody>().await?.status)
    }
}
