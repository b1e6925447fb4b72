//! Inputs to the state machine: user actions, realtime events and REST results.

use crate::channel::{ChannelEvent, ServerEvent};
use crate::session::{SessionId, SessionSummary, TranscriptMessage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Rename,
    Delete,
}

impl Mutation {
    pub fn verb(self) -> &'static str {
        match self {
            Mutation::Rename => "rename",
            Mutation::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    // Realtime channel
    Channel(ChannelEvent),

    // Live run
    StartMode(String),
    InputChanged(String),
    SubmitInput,
    ReturnToMenu,

    // Session list
    RefreshSessions,
    SessionsLoaded(Vec<SessionSummary>),
    SessionsFailed(String),
    ToggleSidebar,
    ToggleMenu(SessionId),
    /// A click that landed on no contextual menu.
    ClickOutside,
    RenameRequested(SessionId),
    /// Host answer to `PromptRename`; `None` when the prompt was cancelled.
    RenameEntered { id: SessionId, name: Option<String> },
    DeleteRequested(SessionId),
    /// Host answer to `ConfirmDelete`.
    DeleteConfirmed { id: SessionId, confirmed: bool },
    DownloadRequested(SessionId),
    MutationFinished {
        mutation: Mutation,
        id: SessionId,
        error: Option<String>,
    },
    DismissNotice,

    // History viewer
    OpenSession(SessionId),
    TranscriptLoaded {
        id: SessionId,
        messages: Vec<TranscriptMessage>,
    },
    TranscriptFailed { id: SessionId, error: String },
}

impl From<ChannelEvent> for UiEvent {
    fn from(event: ChannelEvent) -> Self {
        UiEvent::Channel(event)
    }
}

impl From<ServerEvent> for UiEvent {
    fn from(event: ServerEvent) -> Self {
        UiEvent::Channel(ChannelEvent::Server(event))
    }
}
