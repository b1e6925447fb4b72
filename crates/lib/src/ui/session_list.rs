//! Session list: refresh, contextual menus, rename/delete/download.

use super::effect::Effect;
use super::event::Mutation;
use super::state::UiState;
use crate::session::{SessionId, SessionSummary};

impl UiState {
    pub(super) fn sessions_loaded(&mut self, sessions: Vec<SessionSummary>) {
        if let Some(open) = &self.open_menu {
            if !sessions.iter().any(|s| &s.id == open) {
                self.open_menu = None;
            }
        }
        self.sessions = sessions;
    }

    /// Stale-but-available: keep showing the last list.
    pub(super) fn sessions_failed(&mut self, error: &str) {
        log::warn!("failed to fetch history: {}", error);
    }

    pub(super) fn toggle_menu(&mut self, id: SessionId) {
        self.open_menu = if self.open_menu.as_deref() == Some(id.as_str()) {
            None
        } else {
            Some(id)
        };
    }

    pub(super) fn close_menus(&mut self) {
        self.open_menu = None;
    }

    pub(super) fn request_rename(&mut self, id: SessionId, fx: &mut Vec<Effect>) {
        self.close_menus();
        let current_name = self.session(&id).map(|s| s.name.clone()).unwrap_or_default();
        fx.push(Effect::PromptRename { id, current_name });
    }

    /// Empty or cancelled input issues no request; any other name is sent as typed.
    pub(super) fn rename_entered(&mut self, id: SessionId, name: Option<String>, fx: &mut Vec<Effect>) {
        let Some(name) = name.filter(|n| !n.is_empty()) else {
            return;
        };
        fx.push(Effect::RenameSession { id, name });
    }

    pub(super) fn request_delete(&mut self, id: SessionId, fx: &mut Vec<Effect>) {
        self.close_menus();
        let name = self.session(&id).map(|s| s.name.clone()).unwrap_or_default();
        fx.push(Effect::ConfirmDelete { id, name });
    }

    pub(super) fn delete_confirmed(&mut self, id: SessionId, confirmed: bool, fx: &mut Vec<Effect>) {
        if confirmed {
            fx.push(Effect::DeleteSession(id));
        }
    }

    pub(super) fn request_download(&mut self, id: SessionId, fx: &mut Vec<Effect>) {
        self.close_menus();
        fx.push(Effect::Download(id));
    }

    /// The list is refreshed whatever the outcome; failures become a notice.
    pub(super) fn mutation_finished(
        &mut self,
        mutation: Mutation,
        id: &str,
        error: Option<String>,
        fx: &mut Vec<Effect>,
    ) {
        if let Some(error) = error {
            log::warn!("failed to {} session {}: {}", mutation.verb(), id, error);
            self.notice = Some(format!("Could not {} session: {}", mutation.verb(), error));
        }
        fx.push(Effect::FetchSessions);
    }
}
