use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::timer::TimerMode;

/// Optional labels the front end attaches to new sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// `POST /sessions` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSession {
    pub start_time: DateTime<Utc>,
    #[serde(rename = "type")]
    pub session_type: TimerMode,
    #[serde(flatten)]
    pub metadata: SessionMetadata,
    pub interruptions: u32,
}

/// `PATCH /sessions/{id}` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUpdate {
    pub end_time: DateTime<Utc>,
    pub completed: bool,
    pub interruptions: u32,
}

/// Session object as returned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSession {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, rename = "type")]
    pub session_type: Option<TimerMode>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub interruptions: u32,
}

// Servers hand out either numeric or string ids.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Str(String),
        Num(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Str(s) => s,
        Id::Num(n) => n.to_string(),
    })
}
