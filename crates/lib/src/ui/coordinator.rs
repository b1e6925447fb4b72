//! View-mode coordinator: owns the UI state and routes every event through it.
//!
//! Transitions are pure: `UiState::apply(event)` returns the next state and the
//! effects to perform. Nothing here touches the network or a widget toolkit.

use super::effect::Effect;
use super::event::UiEvent;
use super::state::{Activity, ConnectionState, UiState, ViewMode};
use super::view::{self, View};

impl UiState {
    /// One transition: `(state, event) -> (state, effects)`.
    pub fn apply(mut self, event: UiEvent) -> (Self, Vec<Effect>) {
        let mut fx = Vec::new();
        match event {
            UiEvent::Channel(event) => self.on_channel(event, &mut fx),
            UiEvent::StartMode(mode) => self.start_mode(mode, &mut fx),
            UiEvent::InputChanged(text) => self.input = text,
            UiEvent::SubmitInput => self.submit_input(&mut fx),
            UiEvent::ReturnToMenu => self.return_to_menu(),

            UiEvent::RefreshSessions => fx.push(Effect::FetchSessions),
            UiEvent::SessionsLoaded(sessions) => self.sessions_loaded(sessions),
            UiEvent::SessionsFailed(error) => self.sessions_failed(&error),
            UiEvent::ToggleSidebar => self.sidebar_collapsed = !self.sidebar_collapsed,
            UiEvent::ToggleMenu(id) => self.toggle_menu(id),
            UiEvent::ClickOutside => self.close_menus(),
            UiEvent::RenameRequested(id) => self.request_rename(id, &mut fx),
            UiEvent::RenameEntered { id, name } => self.rename_entered(id, name, &mut fx),
            UiEvent::DeleteRequested(id) => self.request_delete(id, &mut fx),
            UiEvent::DeleteConfirmed { id, confirmed } => {
                self.delete_confirmed(id, confirmed, &mut fx)
            }
            UiEvent::DownloadRequested(id) => self.request_download(id, &mut fx),
            UiEvent::MutationFinished {
                mutation,
                id,
                error,
            } => self.mutation_finished(mutation, &id, error, &mut fx),
            UiEvent::DismissNotice => self.notice = None,

            UiEvent::OpenSession(id) => self.open_session(id, &mut fx),
            UiEvent::TranscriptLoaded { id, messages } => {
                self.transcript_loaded(id, messages, &mut fx)
            }
            UiEvent::TranscriptFailed { id, error } => self.transcript_failed(id, &error),
        }
        (self, fx)
    }

    /// Back affordance. A live run can only be left once it finished, or when the
    /// transport is gone and no `session_ended` will ever arrive.
    fn return_to_menu(&mut self) {
        if self.view == ViewMode::Menu {
            return;
        }
        if self.run_in_progress() && self.connection != ConnectionState::Offline {
            log::debug!("ignoring return to menu while the run is in progress");
            return;
        }
        self.view = ViewMode::Menu;
        self.activity = Activity::Idle;
        self.pending_input = None;
        self.input.clear();
        self.requested_transcript = None;
        self.close_menus();
    }
}

/// Single owner of [`UiState`].
#[derive(Debug, Default)]
pub struct Coordinator {
    state: UiState,
}

impl Coordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Effects for the initial load: the session list is fetched right away.
    pub fn init(&self) -> Vec<Effect> {
        vec![Effect::FetchSessions]
    }

    pub fn dispatch(&mut self, event: UiEvent) -> Vec<Effect> {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = state.apply(event);
        self.state = state;
        effects
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    pub fn view(&self) -> View<'_> {
        view::render(&self.state)
    }
}
