//! In-process stand-in for the Parley server: history REST API plus the
//! realtime Socket.IO namespace, bound to a free local port.
#![allow(dead_code)]

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use lib::session::{SessionSummary, TranscriptMessage};
use serde_json::{json, Value};
use socketioxide::extract::{Data, SocketRef};
use socketioxide::SocketIo;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct Store {
    pub sessions: Vec<SessionSummary>,
    pub transcripts: HashMap<String, Vec<TranscriptMessage>>,
}

pub type Shared = Arc<Mutex<Store>>;

pub struct StubServer {
    pub base_url: String,
    pub store: Shared,
}

/// Two stored sessions, `s1` with a short transcript.
pub fn seeded_store() -> Store {
    let mut store = Store::default();
    store.sessions.push(SessionSummary::new("s1", "Planning", "2024-05-01T10:00:00"));
    store.sessions.push(SessionSummary::new("s2", "Review", "2024-05-02T09:30:00.123456"));
    store.transcripts.insert(
        "s1".into(),
        vec![
            TranscriptMessage::agent("Enter your prompt:"),
            TranscriptMessage::user("> write a **sort**"),
            TranscriptMessage::agent("```python\nsorted(xs)\n```"),
        ],
    );
    store.transcripts.insert("s2".into(), Vec::new());
    store
}

pub async fn spawn_stub(store: Store) -> StubServer {
    let store: Shared = Arc::new(Mutex::new(store));
    let (realtime, io) = SocketIo::new_layer();
    let script_store = Arc::clone(&store);
    io.ns("/", move |socket: SocketRef| interview(socket, Arc::clone(&script_store)));

    let app = Router::new()
        .route("/api/history", get(list_sessions))
        .route("/api/history/:id", get(transcript).delete(delete_session))
        .route("/api/history/:id/rename", put(rename_session))
        .route("/api/history/:id/download", get(download))
        .with_state(Arc::clone(&store))
        .layer(realtime);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub server");
    let addr = listener.local_addr().expect("local_addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    StubServer {
        base_url: format!("http://{}", addr),
        store,
    }
}

async fn list_sessions(State(store): State<Shared>) -> Json<Vec<SessionSummary>> {
    Json(store.lock().unwrap().sessions.clone())
}

async fn transcript(State(store): State<Shared>, Path(id): Path<String>) -> Response {
    match store.lock().unwrap().transcripts.get(&id) {
        Some(messages) => Json(messages.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, "Session not found").into_response(),
    }
}

async fn rename_session(
    State(store): State<Shared>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let Some(name) = body.get("name").and_then(Value::as_str) else {
        return (StatusCode::BAD_REQUEST, "Missing name").into_response();
    };
    let mut store = store.lock().unwrap();
    match store.sessions.iter_mut().find(|s| s.id == id) {
        Some(session) => {
            session.name = name.to_string();
            Json(json!({"status": "success"})).into_response()
        }
        None => (StatusCode::NOT_FOUND, "Session not found").into_response(),
    }
}

async fn delete_session(State(store): State<Shared>, Path(id): Path<String>) -> Response {
    let mut store = store.lock().unwrap();
    let before = store.sessions.len();
    store.sessions.retain(|s| s.id != id);
    store.transcripts.remove(&id);
    if store.sessions.len() == before {
        return (StatusCode::NOT_FOUND, "Session not found").into_response();
    }
    Json(json!({"status": "success"})).into_response()
}

async fn download(State(store): State<Shared>, Path(id): Path<String>) -> Response {
    let store = store.lock().unwrap();
    let (Some(session), Some(messages)) = (
        store.sessions.iter().find(|s| s.id == id),
        store.transcripts.get(&id),
    ) else {
        return (StatusCode::NOT_FOUND, "Session not found").into_response();
    };
    let body: String = messages
        .iter()
        .map(|m| format!("[{:?}]\n{}\n\n", m.sender, m.content))
        .collect();
    let disposition = format!("attachment; filename=\"{}.txt\"", session.name);
    (
        [
            (header::CONTENT_TYPE, "text/plain".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response()
}

/// Scripted run: on `start_mode`, greet and ask for a name; on `user_input`, echo
/// it, record the run in the store as `live-1` and end the session. The
/// connection stays open until the client leaves.
fn interview(socket: SocketRef, store: Shared) {
    let mode: Arc<Mutex<Option<String>>> = Arc::default();

    let started = Arc::clone(&mode);
    socket.on("start_mode", move |socket: SocketRef, Data(data): Data<Value>| {
        let requested = data["mode"].as_str().unwrap_or_default().to_string();
        *started.lock().unwrap() = Some(requested.clone());
        let _ = socket.emit("server_output", json!({"data": format!("Starting **{}**", requested)}));
        let _ = socket.emit("request_input", json!({"prompt": "Name?"}));
    });

    socket.on("user_input", move |socket: SocketRef, Data(data): Data<Value>| {
        let Some(mode) = mode.lock().unwrap().clone() else {
            return;
        };
        let message = data["message"].as_str().unwrap_or_default().to_string();
        let _ = socket.emit("server_output", json!({"data": format!("got: {}", message)}));
        {
            let mut store = store.lock().unwrap();
            let mut session = SessionSummary::new("live-1", format!("Mode {}", mode), "2024-05-03T12:00:00");
            session.mode = Some(mode.clone());
            store.sessions.push(session);
            store.transcripts.insert(
                "live-1".into(),
                vec![
                    TranscriptMessage::agent(format!("Starting **{}**", mode)),
                    TranscriptMessage::user(format!("Name? {}", message)),
                    TranscriptMessage::agent(format!("got: {}", message)),
                ],
            );
        }
        let _ = socket.emit("session_ended", json!({}));
    });
}
