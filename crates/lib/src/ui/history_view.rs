//! History viewer: read-only display of a past session's transcript.

use super::effect::Effect;
use super::render::render_transcript_message;
use super::state::{Activity, UiState, ViewMode};
use crate::session::{SessionId, TranscriptMessage};

impl UiState {
    pub(super) fn open_session(&mut self, id: SessionId, fx: &mut Vec<Effect>) {
        self.close_menus();
        if self.run_in_progress() {
            log::debug!("not opening session {} during a live run", id);
            return;
        }
        self.requested_transcript = Some(id.clone());
        fx.push(Effect::FetchTranscript(id));
    }

    pub(super) fn transcript_loaded(
        &mut self,
        id: SessionId,
        messages: Vec<TranscriptMessage>,
        fx: &mut Vec<Effect>,
    ) {
        if self.requested_transcript.as_deref() != Some(id.as_str()) {
            log::debug!("discarding stale transcript for session {}", id);
            return;
        }
        self.requested_transcript = None;
        self.view = ViewMode::HistoryView;
        self.activity = Activity::ViewingHistory;
        self.pending_input = None;
        self.input.clear();
        self.transcript = messages.iter().map(render_transcript_message).collect();
        fx.push(Effect::ScrollToBottom);
    }

    pub(super) fn transcript_failed(&mut self, id: SessionId, error: &str) {
        if self.requested_transcript.as_deref() == Some(id.as_str()) {
            self.requested_transcript = None;
        }
        log::error!("failed to load session {}: {}", id, error);
    }
}
