mod history;
mod recording;
mod settings;

pub use history::{violations_on, FocusStatus, HistoryEntry};
pub use recording::{DeleteOutcome, RecordingSet, RecordingStatus};
pub use settings::MonitorSettings;
