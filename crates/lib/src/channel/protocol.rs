//! Realtime channel event names and payloads (start_mode, user_input, server_output, etc.).

use serde::Deserialize;
use serde_json::{json, Value};

/// Server events the client subscribes to.
pub const SERVER_EVENTS: [&str; 3] = ["server_output", "request_input", "session_ended"];

/// Events the client sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// Ask the server to begin running a mode.
    StartMode { mode: String },
    /// Answer to the last `request_input`.
    UserInput { message: String },
}

/// Events the server sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// A chunk of agent output (markdown).
    ServerOutput { data: String },
    /// The running mode is blocked on user input.
    RequestInput { prompt: Option<String> },
    /// The running mode finished.
    SessionEnded,
}

#[derive(Deserialize)]
struct OutputPayload {
    data: String,
}

#[derive(Default, Deserialize)]
struct InputRequestPayload {
    #[serde(default)]
    prompt: Option<String>,
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::StartMode { .. } => "start_mode",
            ClientEvent::UserInput { .. } => "user_input",
        }
    }

    /// The JSON object emitted with [`ClientEvent::name`].
    pub fn payload(&self) -> Value {
        match self {
            ClientEvent::StartMode { mode } => json!({ "mode": mode }),
            ClientEvent::UserInput { message } => json!({ "message": message }),
        }
    }
}

impl ServerEvent {
    /// Interpret an event and its first argument (`Null` when sent without one).
    /// Unknown event names yield `Ok(None)`; known events with a bad payload are errors.
    pub fn decode(event: &str, data: Value) -> Result<Option<Self>, serde_json::Error> {
        let event = match event {
            "server_output" => {
                let payload: OutputPayload = serde_json::from_value(data)?;
                ServerEvent::ServerOutput { data: payload.data }
            }
            "request_input" => {
                let payload: InputRequestPayload = if data.is_null() {
                    InputRequestPayload::default()
                } else {
                    serde_json::from_value(data)?
                };
                ServerEvent::RequestInput {
                    prompt: payload.prompt,
                }
            }
            "session_ended" => ServerEvent::SessionEnded,
            _ => return Ok(None),
        };
        Ok(Some(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_payloads() {
        let start = ClientEvent::StartMode {
            mode: "interview".into(),
        };
        assert_eq!(start.name(), "start_mode");
        assert_eq!(start.payload(), json!({ "mode": "interview" }));
        let answer = ClientEvent::UserInput {
            message: "Ada".into(),
        };
        assert_eq!(answer.name(), "user_input");
        assert_eq!(answer.payload(), json!({ "message": "Ada" }));
    }

    #[test]
    fn request_input_prompt_is_optional() {
        assert_eq!(
            ServerEvent::decode("request_input", json!({ "prompt": "Name?" })).unwrap(),
            Some(ServerEvent::RequestInput {
                prompt: Some("Name?".into())
            })
        );
        assert_eq!(
            ServerEvent::decode("request_input", json!({})).unwrap(),
            Some(ServerEvent::RequestInput { prompt: None })
        );
        assert_eq!(
            ServerEvent::decode("request_input", Value::Null).unwrap(),
            Some(ServerEvent::RequestInput { prompt: None })
        );
    }

    #[test]
    fn session_ended_ignores_payload() {
        assert_eq!(
            ServerEvent::decode("session_ended", Value::Null).unwrap(),
            Some(ServerEvent::SessionEnded)
        );
        assert_eq!(
            ServerEvent::decode("session_ended", json!({})).unwrap(),
            Some(ServerEvent::SessionEnded)
        );
    }

    #[test]
    fn unknown_events_and_bad_payloads() {
        assert_eq!(ServerEvent::decode("tick", json!(1)).unwrap(), None);
        assert!(ServerEvent::decode("server_output", json!({})).is_err());
        assert!(ServerEvent::decode("server_output", Value::Null).is_err());
        assert!(SERVER_EVENTS.iter().all(|name| *name != "tick"));
    }
}
