use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// More than this many detections in a day marks the day as distracted.
const DISTRACTED_THRESHOLD: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: NaiveDate,
    pub detections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FocusStatus {
    Focused,
    Distracted,
}

impl HistoryEntry {
    pub fn focus_status(&self) -> FocusStatus {
        if self.detections > DISTRACTED_THRESHOLD {
            FocusStatus::Distracted
        } else {
            FocusStatus::Focused
        }
    }
}

/// Detections logged on `day`, or zero when the device has no row for it yet.
pub fn violations_on(history: &[HistoryEntry], day: NaiveDate) -> u32 {
    history
        .iter()
        .find(|entry| entry.date == day)
        .map(|entry| entry.detections)
        .unwrap_or(0)
}
