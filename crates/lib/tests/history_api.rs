//! Integration test: the history client against a local stub of the REST API.

mod common;

use common::{seeded_store, spawn_stub};
use lib::history::{HistoryApi, HistoryClient, HistoryError};
use lib::session::Sender;

#[tokio::test]
async fn lists_and_reads_sessions() {
    let server = spawn_stub(seeded_store()).await;
    let client = HistoryClient::new(&server.base_url).expect("client");

    let sessions = client.list_sessions().await.expect("list sessions");
    let ids: Vec<&str> = sessions.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, ["s1", "s2"]);
    assert!(sessions[1].created_at().is_some());

    let transcript = client.transcript("s1").await.expect("transcript");
    assert_eq!(transcript.len(), 3);
    assert_eq!(transcript[1].sender, Sender::User);
    assert_eq!(transcript[1].content, "> write a **sort**");

    assert!(client.transcript("s2").await.expect("empty transcript").is_empty());
}

#[tokio::test]
async fn missing_session_is_an_api_error() {
    let server = spawn_stub(seeded_store()).await;
    let client = HistoryClient::new(&server.base_url).expect("client");
    match client.transcript("nope").await {
        Err(HistoryError::Api(msg)) => assert!(msg.starts_with("404"), "{}", msg),
        other => panic!("expected api error, got {:?}", other),
    }
    assert!(matches!(
        client.delete_session("nope").await,
        Err(HistoryError::Api(_))
    ));
}

#[tokio::test]
async fn rename_and_delete() {
    let server = spawn_stub(seeded_store()).await;
    let client = HistoryClient::new(&server.base_url).expect("client");

    client.rename_session("s1", "Sprint planning").await.expect("rename");
    client.delete_session("s2").await.expect("delete");

    let sessions = client.list_sessions().await.expect("list sessions");
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].name, "Sprint planning");
    assert_eq!(server.store.lock().unwrap().transcripts.len(), 1);
}

#[tokio::test]
async fn download_uses_server_file_name() {
    let server = spawn_stub(seeded_store()).await;
    let client = HistoryClient::new(&server.base_url).expect("client");

    let file = client.download("s1").await.expect("download");
    assert_eq!(file.file_name.as_deref(), Some("Planning.txt"));
    let text = String::from_utf8(file.bytes).expect("utf-8");
    assert!(text.contains("sorted(xs)"));
}
