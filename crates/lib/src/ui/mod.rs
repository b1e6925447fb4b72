//! Front-end core: state machine, markdown rendering and effect execution.
//!
//! Every input (a click, a realtime frame, a REST result) becomes a [`UiEvent`].
//! The [`Coordinator`] applies it to [`UiState`] and hands back [`Effect`]s. The
//! [`EffectRunner`] performs the network ones; front ends perform the rest and
//! draw [`View`].

mod coordinator;
mod effect;
mod event;
mod history_view;
mod live;
pub mod render;
mod runner;
mod session_list;
mod state;
mod view;

pub use coordinator::Coordinator;
pub use effect::Effect;
pub use event::{Mutation, UiEvent};
pub use render::{render_message, Block, CodeToken, MessageNode, Span, SpanStyle};
pub use runner::EffectRunner;
pub use state::{status_text, Activity, ConnectionState, PendingInput, UiState, ViewMode, DEFAULT_PROMPT};
pub use view::{render, InputView, SessionItemView, SidebarView, View};
