//! Side effects requested by a transition.

use crate::channel::ClientEvent;
use crate::session::SessionId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send an event over the realtime channel.
    Emit(ClientEvent),
    FetchSessions,
    FetchTranscript(SessionId),
    RenameSession { id: SessionId, name: String },
    DeleteSession(SessionId),

    /// Ask the user for a new name; answer with `UiEvent::RenameEntered`.
    PromptRename { id: SessionId, current_name: String },
    /// Ask the user to confirm; answer with `UiEvent::DeleteConfirmed`.
    ConfirmDelete { id: SessionId, name: String },
    /// Hand the download endpoint for this session to the host.
    Download(SessionId),
    FocusInput,
    ScrollToBottom,
}

impl Effect {
    /// Effects only the front end can carry out (dialogs, focus, scrolling, navigation).
    pub fn is_host(&self) -> bool {
        matches!(
            self,
            Effect::PromptRename { .. }
                | Effect::ConfirmDelete { .. }
                | Effect::Download(_)
                | Effect::FocusInput
                | Effect::ScrollToBottom
        )
    }
}
