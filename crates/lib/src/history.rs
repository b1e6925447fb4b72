//! History REST client: list, read, rename, delete and download past sessions.

use crate::session::{SessionSummary, TranscriptMessage};
use async_trait::async_trait;
use reqwest::Url;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("history request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("history api error: {0}")]
    Api(String),
    #[error("invalid server url: {0}")]
    Url(String),
}

/// The calls the UI makes against the session store.
#[async_trait]
pub trait HistoryApi: Send + Sync {
    /// GET /api/history
    async fn list_sessions(&self) -> Result<Vec<SessionSummary>, HistoryError>;
    /// GET /api/history/{id}
    async fn transcript(&self, id: &str) -> Result<Vec<TranscriptMessage>, HistoryError>;
    /// PUT /api/history/{id}/rename
    async fn rename_session(&self, id: &str, name: &str) -> Result<(), HistoryError>;
    /// DELETE /api/history/{id}
    async fn delete_session(&self, id: &str) -> Result<(), HistoryError>;
}

/// A downloaded transcript file.
#[derive(Debug, Clone)]
pub struct Download {
    /// File name suggested by the server (Content-Disposition), if any.
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

/// Client for the history HTTP API.
#[derive(Clone)]
pub struct HistoryClient {
    base_url: Url,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct RenameBody<'a> {
    name: &'a str,
}

impl HistoryClient {
    pub fn new(base_url: &str) -> Result<Self, HistoryError> {
        let base_url =
            Url::parse(base_url.trim()).map_err(|e| HistoryError::Url(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(HistoryError::Url(base_url.to_string()));
        }
        Ok(Self {
            base_url,
            client: reqwest::Client::new(),
        })
    }

    /// `{base}/api/history/{segments...}` with each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(["api", "history"]).extend(segments);
        }
        url
    }

    /// Where a browser would navigate to download a session.
    pub fn download_url(&self, id: &str) -> Url {
        self.endpoint(&[id, "download"])
    }

    /// GET /api/history/{id}/download — fetch the transcript file.
    pub async fn download(&self, id: &str) -> Result<Download, HistoryError> {
        let res = check(self.client.get(self.download_url(id)).send().await?).await?;
        let file_name = res
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(attachment_file_name);
        let bytes = res.bytes().await?.to_vec();
        Ok(Download { file_name, bytes })
    }
}

#[async_trait]
impl HistoryApi for HistoryClient {
    async fn list_sessions(&self) -> Result<Vec<SessionSummary>, HistoryError> {
        let res = check(self.client.get(self.endpoint(&[])).send().await?).await?;
        Ok(res.json().await?)
    }

    async fn transcript(&self, id: &str) -> Result<Vec<TranscriptMessage>, HistoryError> {
        let res = check(self.client.get(self.endpoint(&[id])).send().await?).await?;
        Ok(res.json().await?)
    }

    async fn rename_session(&self, id: &str, name: &str) -> Result<(), HistoryError> {
        let url = self.endpoint(&[id, "rename"]);
        check(self.client.put(url).json(&RenameBody { name }).send().await?).await?;
        Ok(())
    }

    async fn delete_session(&self, id: &str) -> Result<(), HistoryError> {
        check(self.client.delete(self.endpoint(&[id])).send().await?).await?;
        Ok(())
    }
}

async fn check(res: reqwest::Response) -> Result<reqwest::Response, HistoryError> {
    if !res.status().is_success() {
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        return Err(HistoryError::Api(format!("{} {}", status, body)));
    }
    Ok(res)
}

/// Extract `filename` from a Content-Disposition value (quoted or bare).
fn attachment_file_name(header: &str) -> Option<String> {
    header.split(';').map(str::trim).find_map(|part| {
        let (key, value) = part.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("filename") {
            return None;
        }
        let value = value.trim().trim_matches('"');
        (!value.is_empty()).then(|| value.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_encode_ids() {
        let client = HistoryClient::new("http://127.0.0.1:5000/").unwrap();
        assert_eq!(
            client.endpoint(&[]).as_str(),
            "http://127.0.0.1:5000/api/history"
        );
        assert_eq!(
            client.endpoint(&["a b", "rename"]).as_str(),
            "http://127.0.0.1:5000/api/history/a%20b/rename"
        );
        assert_eq!(
            client.download_url("s/1").as_str(),
            "http://127.0.0.1:5000/api/history/s%2F1/download"
        );
    }

    #[test]
    fn base_path_is_kept() {
        let client = HistoryClient::new("https://example.com/agents").unwrap();
        assert_eq!(
            client.endpoint(&["s1"]).as_str(),
            "https://example.com/agents/api/history/s1"
        );
    }

    #[test]
    fn rejects_bad_base_url() {
        assert!(matches!(
            HistoryClient::new("not a url"),
            Err(HistoryError::Url(_))
        ));
    }

    #[test]
    fn content_disposition_file_name() {
        assert_eq!(
            attachment_file_name(r#"attachment; filename="Mode 1 - 10:42.txt""#),
            Some("Mode 1 - 10:42.txt".to_string())
        );
        assert_eq!(
            attachment_file_name("attachment; filename=session.txt"),
            Some("session.txt".to_string())
        );
        assert_eq!(attachment_file_name("inline"), None);
    }
}
