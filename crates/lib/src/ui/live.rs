//! Live session controller: start a mode, stream output, answer input requests.

use super::effect::Effect;
use super::render::render_message;
use super::state::{Activity, ConnectionState, PendingInput, UiState, ViewMode, DEFAULT_PROMPT};
use crate::channel::{ChannelEvent, ClientEvent, ServerEvent};
use crate::session::Sender;

impl UiState {
    pub(super) fn start_mode(&mut self, mode: String, fx: &mut Vec<Effect>) {
        if self.view != ViewMode::Menu {
            log::debug!("ignoring start of mode {} outside the menu", mode);
            return;
        }
        self.transcript.clear();
        self.pending_input = None;
        self.input.clear();
        self.requested_transcript = None;
        self.open_menu = None;
        self.view = ViewMode::LiveRun;
        self.activity = Activity::Running { mode: mode.clone() };
        log::info!("starting mode {}", mode);
        fx.push(Effect::Emit(ClientEvent::StartMode { mode }));
    }

    pub(super) fn on_channel(&mut self, event: ChannelEvent, fx: &mut Vec<Effect>) {
        match event {
            ChannelEvent::Connected => self.connection = ConnectionState::Online,
            ChannelEvent::Disconnected => self.connection = ConnectionState::Offline,
            ChannelEvent::Server(event) => self.on_server(event, fx),
        }
    }

    fn on_server(&mut self, event: ServerEvent, fx: &mut Vec<Effect>) {
        if let ServerEvent::SessionEnded = event {
            if self.view == ViewMode::LiveRun {
                self.pending_input = None;
                self.activity = Activity::Finished;
                fx.push(Effect::ScrollToBottom);
            }
            fx.push(Effect::FetchSessions);
            return;
        }
        if self.view != ViewMode::LiveRun {
            log::debug!("dropping realtime event outside a live run: {:?}", event);
            return;
        }
        match event {
            ServerEvent::ServerOutput { data } => {
                self.transcript.push(render_message(&data, Sender::Agent));
                fx.push(Effect::ScrollToBottom);
            }
            ServerEvent::RequestInput { prompt } => {
                let prompt = prompt
                    .filter(|p| !p.is_empty())
                    .unwrap_or_else(|| DEFAULT_PROMPT.to_string());
                self.pending_input = Some(PendingInput { prompt });
                self.activity = Activity::AwaitingInput;
                fx.push(Effect::FocusInput);
                fx.push(Effect::ScrollToBottom);
            }
            ServerEvent::SessionEnded => {}
        }
    }

    pub(super) fn submit_input(&mut self, fx: &mut Vec<Effect>) {
        let Some(pending) = self.pending_input.take() else {
            return;
        };
        let text = std::mem::take(&mut self.input);
        let echoed = format!("{} {}", pending.prompt, text);
        self.transcript.push(render_message(&echoed, Sender::User));
        self.activity = Activity::Processing;
        fx.push(Effect::ScrollToBottom);
        fx.push(Effect::Emit(ClientEvent::UserInput { message: text }));
    }
}
