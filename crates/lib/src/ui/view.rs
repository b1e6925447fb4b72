//! Declarative view model derived from [`UiState`]. Front ends draw this and nothing else.

use super::render::MessageNode;
use super::state::{Activity, UiState, ViewMode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View<'a> {
    pub status: String,
    /// Mode selection is shown.
    pub menu_overlay: bool,
    pub back_visible: bool,
    /// Present only while the server is waiting for an answer.
    pub input: Option<InputView<'a>>,
    pub transcript: &'a [MessageNode],
    pub sidebar: SidebarView<'a>,
    pub notice: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputView<'a> {
    pub prompt: &'a str,
    pub text: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarView<'a> {
    pub collapsed: bool,
    /// Opening a past session is disabled while a live run is in progress.
    pub selectable: bool,
    pub items: Vec<SessionItemView<'a>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionItemView<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub time_label: String,
    pub menu_open: bool,
    /// Its transcript is being fetched.
    pub loading: bool,
}

pub fn render(state: &UiState) -> View<'_> {
    let back_visible = match state.view {
        ViewMode::Menu => false,
        ViewMode::LiveRun => state.activity == Activity::Finished,
        ViewMode::HistoryView => true,
    };
    let input = match (state.view, &state.pending_input) {
        (ViewMode::LiveRun, Some(pending)) => Some(InputView {
            prompt: pending.prompt.as_str(),
            text: state.input.as_str(),
        }),
        _ => None,
    };
    let items = state
        .sessions
        .iter()
        .map(|s| SessionItemView {
            id: s.id.as_str(),
            name: s.name.as_str(),
            time_label: s.time_label(),
            menu_open: state.open_menu.as_deref() == Some(s.id.as_str()),
            loading: state.requested_transcript.as_deref() == Some(s.id.as_str()),
        })
        .collect();
    View {
        status: state.status(),
        menu_overlay: state.view == ViewMode::Menu,
        back_visible,
        input,
        transcript: &state.transcript,
        sidebar: SidebarView {
            collapsed: state.sidebar_collapsed,
            selectable: !state.run_in_progress(),
            items,
        },
        notice: state.notice.as_deref(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionSummary;
    use crate::ui::state::PendingInput;

    #[test]
    fn menu_view() {
        let state = UiState::default();
        let view = render(&state);
        assert!(view.menu_overlay);
        assert!(!view.back_visible);
        assert!(view.input.is_none());
        assert!(view.sidebar.selectable);
        assert!(view.transcript.is_empty());
    }

    #[test]
    fn input_hidden_outside_live_run() {
        let mut state = UiState {
            view: ViewMode::LiveRun,
            activity: Activity::AwaitingInput,
            pending_input: Some(PendingInput {
                prompt: "Name?".into(),
            }),
            input: "Ad".into(),
            ..Default::default()
        };
        assert_eq!(
            render(&state).input,
            Some(InputView {
                prompt: "Name?",
                text: "Ad"
            })
        );
        state.view = ViewMode::HistoryView;
        assert!(render(&state).input.is_none());
    }

    #[test]
    fn session_items() {
        let state = UiState {
            sessions: vec![
                SessionSummary::new("s1", "Planning", "2024-05-01T10:00:00"),
                SessionSummary::new("s2", "", "not a date"),
            ],
            open_menu: Some("s2".into()),
            requested_transcript: Some("s1".into()),
            ..Default::default()
        };
        let view = render(&state);
        let items = &view.sidebar.items;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "Planning");
        assert!(items[0].loading);
        assert!(!items[0].menu_open);
        assert!(items[1].menu_open);
        assert_eq!(items[1].time_label, "not a date");
    }
}
