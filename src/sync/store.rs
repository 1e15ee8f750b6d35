use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::{watch, Mutex};

use crate::models::{
    violations_on, DeleteOutcome, HistoryEntry, MonitorSettings, RecordingSet, RecordingStatus,
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

/// Everything one poll tick fetched; applied as a single unit or not at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSnapshot {
    pub settings: MonitorSettings,
    pub history: Vec<HistoryEntry>,
    pub recordings: RecordingSet,
    pub status: RecordingStatus,
}

/// Commands whose round trip is still open, for busy indicators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingCommands {
    pub saving: bool,
    pub uploading: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// A newer tick or command response was already applied.
    Stale,
}

/// Read-only view of the store handed to presentation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    /// Last value confirmed by the device.
    pub settings: MonitorSettings,
    /// Local edits not yet saved. Polls never touch this.
    pub draft: Option<MonitorSettings>,
    pub history: Vec<HistoryEntry>,
    pub recordings: RecordingSet,
    pub status: RecordingStatus,
    /// False until the first complete poll lands.
    pub synced: bool,
    pub pending: PendingCommands,
    /// Sequence number of the last server-derived write.
    pub applied_seq: u64,
}

impl StoreSnapshot {
    pub fn is_paused(&self) -> bool {
        self.status.is_paused
    }

    /// What the settings form should show: the draft if any, else the device value.
    pub fn effective_settings(&self) -> &MonitorSettings {
        self.draft.as_ref().unwrap_or(&self.settings)
    }

    pub fn has_unsaved_edits(&self) -> bool {
        self.draft.is_some()
    }

    pub fn today_violations(&self, today: NaiveDate) -> u32 {
        violations_on(&self.history, today)
    }
}

struct StoreState {
    snapshot: StoreSnapshot,
    next_seq: u64,
}

impl StoreState {
    fn take_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    /// Command responses are the freshest server view at the moment they
    /// resolve, so they get a new number and always win.
    fn mark_command_applied(&mut self) -> u64 {
        let seq = self.take_seq();
        self.snapshot.applied_seq = seq;
        seq
    }
}

/// Single owner of the local view of device state.
///
/// Server-derived writes carry a sequence number from one shared counter. Poll
/// ticks take theirs when issued, command responses take theirs when they
/// resolve, and anything older than the last applied number is dropped whole.
/// Every change is published on a watch channel.
#[derive(Clone)]
pub struct MonitorStore {
    state: Arc<Mutex<StoreState>>,
    changes: Arc<watch::Sender<StoreSnapshot>>,
}

impl Default for MonitorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorStore {
    pub fn new() -> Self {
        let snapshot = StoreSnapshot::default();
        let (changes, _) = watch::channel(snapshot.clone());
        Self {
            state: Arc::new(Mutex::new(StoreState {
                snapshot,
                next_seq: 0,
            })),
            changes: Arc::new(changes),
        }
    }

    pub async fn snapshot(&self) -> StoreSnapshot {
        self.state.lock().await.snapshot.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<StoreSnapshot> {
        self.changes.subscribe()
    }

    /// Reserves the sequence number for a poll tick about to be issued.
    pub(crate) async fn issue_sequence(&self) -> u64 {
        self.state.lock().await.take_seq()
    }

    /// Replaces history, recordings, status and the confirmed settings from one
    /// tick. Unsaved drafts survive.
    pub(crate) async fn apply_snapshot(&self, seq: u64, fetched: PollSnapshot) -> ApplyOutcome {
        let mut state = self.state.lock().await;
        if seq <= state.snapshot.applied_seq {
            log_debug!(
                "dropping stale poll tick {seq} (last applied {})",
                state.snapshot.applied_seq
            );
            return ApplyOutcome::Stale;
        }

        let snapshot = &mut state.snapshot;
        snapshot.settings = fetched.settings;
        snapshot.history = fetched.history;
        snapshot.recordings = fetched.recordings;
        snapshot.status = fetched.status;
        snapshot.synced = true;
        snapshot.applied_seq = seq;

        self.publish(&state);
        ApplyOutcome::Applied
    }

    /// Applies the state returned by a confirmed toggle.
    pub(crate) async fn apply_status(&self, status: RecordingStatus) {
        let mut state = self.state.lock().await;
        let seq = state.mark_command_applied();
        let current = &mut state.snapshot.status;
        current.is_paused = status.is_paused;
        if status.is_recording.is_some() {
            current.is_recording = status.is_recording;
        }
        log_info!("recording {} (seq {seq})", if status.is_paused { "paused" } else { "active" });
        self.publish(&state);
    }

    /// Removes a confirmed-deleted file and applies the pause side effect if
    /// the device reported one. `is_recording` is left for the next poll.
    pub(crate) async fn apply_delete(&self, filename: &str, outcome: DeleteOutcome) {
        let mut state = self.state.lock().await;
        state.mark_command_applied();
        state.snapshot.recordings.remove(filename);
        if outcome.paused_as_side_effect {
            state.snapshot.status.is_paused = true;
        }
        self.publish(&state);
    }

    /// Promotes a saved settings value to the confirmed snapshot. The draft is
    /// cleared only when it still equals what was sent.
    pub(crate) async fn apply_saved_settings(&self, saved: MonitorSettings) {
        let mut state = self.state.lock().await;
        state.mark_command_applied();
        if state.snapshot.draft.as_ref() == Some(&saved) {
            state.snapshot.draft = None;
        }
        state.snapshot.settings = saved;
        self.publish(&state);
    }

    /// Applies a local edit to the settings draft, creating it from the
    /// confirmed value on first edit. An edit that lands back on the confirmed
    /// value drops the draft.
    pub(crate) async fn edit_settings(&self, edit: impl FnOnce(&mut MonitorSettings)) {
        let mut state = self.state.lock().await;
        let snapshot = &mut state.snapshot;
        let mut draft = snapshot
            .draft
            .take()
            .unwrap_or_else(|| snapshot.settings.clone());
        edit(&mut draft);
        if draft != snapshot.settings {
            snapshot.draft = Some(draft);
        }
        self.publish(&state);
    }

    pub(crate) async fn discard_edits(&self) {
        let mut state = self.state.lock().await;
        if state.snapshot.draft.take().is_some() {
            self.publish(&state);
        }
    }

    pub(crate) async fn set_saving(&self, saving: bool) {
        let mut state = self.state.lock().await;
        state.snapshot.pending.saving = saving;
        self.publish(&state);
    }

    pub(crate) async fn set_uploading(&self, uploading: bool) {
        let mut state = self.state.lock().await;
        state.snapshot.pending.uploading = uploading;
        self.publish(&state);
    }

    fn publish(&self, state: &StoreState) {
        self.changes.send_replace(state.snapshot.clone());
    }
}
