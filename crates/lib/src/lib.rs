//! Parley core library: configuration, history API client, realtime channel
//! and the UI state machine shared by the CLI and desktop front ends.

pub mod channel;
pub mod config;
pub mod history;
pub mod session;
pub mod ui;
