//! Past sessions and their transcripts, as served by the history API.
//!
//! A session is one run of an agent mode. Its transcript is an ordered list of
//! sender-tagged messages: agent output is markdown, user input is plain text.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Unique session identifier (opaque string).
pub type SessionId = String;

/// Who produced a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Agent,
}

/// One entry of the session list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: SessionId,
    /// Display name; the server fills in a fallback when the session was never renamed.
    #[serde(default)]
    pub name: String,
    /// Creation time as sent by the server (ISO 8601, with or without offset).
    #[serde(default)]
    pub timestamp: String,
    /// Mode the session was started with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

impl SessionSummary {
    pub fn new(id: impl Into<SessionId>, name: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            timestamp: timestamp.into(),
            mode: None,
        }
    }

    /// Creation time, if the server timestamp parses.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.timestamp)
    }

    /// Creation time in local time for display; the raw string when it does not parse.
    pub fn time_label(&self) -> String {
        match self.created_at() {
            Some(t) => t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
            None => self.timestamp.clone(),
        }
    }
}

/// A single message in a transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub sender: Sender,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl TranscriptMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            content: content.into(),
            timestamp: None,
        }
    }

    pub fn agent(content: impl Into<String>) -> Self {
        Self {
            sender: Sender::Agent,
            content: content.into(),
            timestamp: None,
        }
    }
}

/// Parse a server timestamp. Values without an offset are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn summary_from_wire_without_mode() {
        let s: SessionSummary = serde_json::from_str(
            r#"{ "id": "s1", "name": "Mode 1 - 10:42", "timestamp": "2024-05-01T10:42:07.123456" }"#,
        )
        .unwrap();
        assert_eq!(s.id, "s1");
        assert_eq!(s.mode, None);
        let t = s.created_at().unwrap();
        assert_eq!((t.year(), t.month(), t.day()), (2024, 5, 1));
        assert_eq!((t.hour(), t.minute(), t.second()), (10, 42, 7));
    }

    #[test]
    fn rfc3339_offsets_are_normalised() {
        let t = parse_timestamp("2024-05-01T12:00:00+02:00").unwrap();
        assert_eq!(t.hour(), 10);
    }

    #[test]
    fn unparseable_timestamp_is_shown_raw() {
        let s = SessionSummary::new("s1", "x", "yesterday");
        assert_eq!(s.created_at(), None);
        assert_eq!(s.time_label(), "yesterday");
    }

    #[test]
    fn transcript_sender_tags() {
        let m: TranscriptMessage =
            serde_json::from_str(r#"{ "sender": "agent", "content": "**hi**" }"#).unwrap();
        assert_eq!(m, TranscriptMessage::agent("**hi**"));
        let json = serde_json::to_value(TranscriptMessage::user("yes")).unwrap();
        assert_eq!(json, serde_json::json!({ "sender": "user", "content": "yes" }));
    }
}
