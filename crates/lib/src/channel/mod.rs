//! Realtime channel: a Socket.IO connection carrying JSON event payloads.
//!
//! Outbound: `start_mode`, `user_input`. Inbound: `server_output`, `request_input`,
//! `session_ended`, plus connect/disconnect reported by the transport itself.

mod client;
mod protocol;

pub use client::{spawn, ChannelError, ChannelEvent, RealtimeSender};
pub use protocol::{ClientEvent, ServerEvent, SERVER_EVENTS};
