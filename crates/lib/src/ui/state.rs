//! UI state owned by the coordinator.

use super::render::MessageNode;
use crate::session::{SessionId, SessionSummary};

/// Which screen is active. Exactly one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Menu,
    LiveRun,
    HistoryView,
}

/// Realtime transport state, tracked apart from what the session is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Connecting,
    Online,
    Offline,
}

/// What the user is looking at or waiting for.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Activity {
    #[default]
    Idle,
    Running { mode: String },
    AwaitingInput,
    Processing,
    Finished,
    ViewingHistory,
}

/// Set between a server input request and the next submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingInput {
    pub prompt: String,
}

pub const DEFAULT_PROMPT: &str = ">";

/// Status line text. Losing the transport wins over any activity.
pub fn status_text(connection: ConnectionState, activity: &Activity) -> String {
    match (connection, activity) {
        (ConnectionState::Offline, _) => "Offline".to_string(),
        (ConnectionState::Connecting, Activity::Idle) => "Connecting...".to_string(),
        (_, Activity::Idle) => "Online".to_string(),
        (_, Activity::Running { mode }) => format!("Running mode {}", mode),
        (_, Activity::AwaitingInput) => "Awaiting Input".to_string(),
        (_, Activity::Processing) => "Processing...".to_string(),
        (_, Activity::Finished) => "Finished".to_string(),
        (_, Activity::ViewingHistory) => "Viewing History".to_string(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct UiState {
    pub view: ViewMode,
    pub connection: ConnectionState,
    pub activity: Activity,
    /// Invariant: `Some` only while `view == LiveRun`.
    pub pending_input: Option<PendingInput>,
    /// Current contents of the input box.
    pub input: String,
    /// The single displayed transcript (live run or history).
    pub transcript: Vec<MessageNode>,
    /// Last successfully fetched session list.
    pub sessions: Vec<SessionSummary>,
    /// Session whose contextual menu is open; at most one.
    pub open_menu: Option<SessionId>,
    pub sidebar_collapsed: bool,
    /// Transcript fetch in flight; responses for any other id are stale.
    pub requested_transcript: Option<SessionId>,
    /// User-visible error from the last rename/delete.
    pub notice: Option<String>,
}

impl UiState {
    pub fn status(&self) -> String {
        status_text(self.connection, &self.activity)
    }

    /// A live run that has not finished yet.
    pub fn run_in_progress(&self) -> bool {
        self.view == ViewMode::LiveRun && self.activity != Activity::Finished
    }

    pub fn session(&self, id: &str) -> Option<&SessionSummary> {
        self.sessions.iter().find(|s| s.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_overrides_activity() {
        let running = Activity::Running {
            mode: "interview".into(),
        };
        assert_eq!(status_text(ConnectionState::Offline, &running), "Offline");
        assert_eq!(
            status_text(ConnectionState::Online, &running),
            "Running mode interview"
        );
    }

    #[test]
    fn idle_status_follows_connection() {
        assert_eq!(
            status_text(ConnectionState::Connecting, &Activity::Idle),
            "Connecting..."
        );
        assert_eq!(status_text(ConnectionState::Online, &Activity::Idle), "Online");
        assert_eq!(
            status_text(ConnectionState::Connecting, &Activity::ViewingHistory),
            "Viewing History"
        );
    }
}
