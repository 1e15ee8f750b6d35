use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingStatus {
    pub is_paused: bool,
    /// Only reported by the status endpoint; toggle responses omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_recording: Option<bool>,
}

impl RecordingStatus {
    pub fn paused(is_paused: bool) -> Self {
        Self {
            is_paused,
            is_recording: None,
        }
    }
}

/// Result of a confirmed delete on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    pub deleted: bool,
    /// The device stopped and paused recording because the file was the active one.
    pub paused_as_side_effect: bool,
}

/// Filenames of recordings on the device, in server order, without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RecordingSet {
    files: Vec<String>,
}

impl RecordingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.files.iter().any(|f| f == filename)
    }

    /// Returns whether `filename` was present.
    pub fn remove(&mut self, filename: &str) -> bool {
        let before = self.files.len();
        self.files.retain(|f| f != filename);
        self.files.len() != before
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for RecordingSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut files: Vec<String> = Vec::new();
        for name in iter {
            let name = name.into();
            if !files.contains(&name) {
                files.push(name);
            }
        }
        Self { files }
    }
}

impl<'de> Deserialize<'de> for RecordingSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let files = Vec::<String>::deserialize(deserializer)?;
        Ok(files.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_without_recording_flag() {
        let status: RecordingStatus = serde_json::from_str(r#"{"is_paused":true}"#).unwrap();
        assert_eq!(status, RecordingStatus::paused(true));

        let full: RecordingStatus =
            serde_json::from_str(r#"{"is_paused":false,"is_recording":true}"#).unwrap();
        assert_eq!(full.is_recording, Some(true));
    }

    #[test]
    fn set_keeps_server_order_and_drops_duplicates() {
        let set: RecordingSet =
            serde_json::from_str(r#"["b.avi","a.avi","b.avi"]"#).unwrap();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["b.avi", "a.avi"]);
    }

    #[test]
    fn remove_reports_membership() {
        let mut set: RecordingSet = ["a.mp4", "b.mp4"].into_iter().collect();
        assert!(set.remove("a.mp4"));
        assert!(!set.remove("a.mp4"));
        assert_eq!(set.len(), 1);
        assert!(set.contains("b.mp4"));
    }
}
