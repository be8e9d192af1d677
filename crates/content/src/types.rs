use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use storage::BodyReader;

/// Workflow state of a content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Draft,
    Pending,
    Live,
}

impl State {
    pub fn as_str(&self) -> &'static str {
        match self {
            State::Draft => "draft",
            State::Pending => "pending",
            State::Live => "live",
        }
    }

    /// Parse a state string; `None` for anything unrecognized.
    pub fn parse(s: &str) -> Option<State> {
        match s {
            "draft" => Some(State::Draft),
            "pending" => Some(State::Pending),
            "live" => Some(State::Live),
            _ => None,
        }
    }

    /// An absent state on the wire means live.
    pub fn parse_or_default(s: &str) -> Option<State> {
        if s.is_empty() {
            Some(State::Live)
        } else {
            State::parse(s)
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, State::Live)
    }
}

impl Default for State {
    fn default() -> Self {
        State::Live
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully-buffered content item.
#[derive(Debug, Clone)]
pub struct ContentItem {
    pub key: String,
    /// Only populated for buffered reads; listings leave it empty.
    pub content: Bytes,
    pub content_type: String,
    /// Backend version identifier; empty for non-live states and
    /// non-versioning backends.
    pub version_id: String,
    pub last_modified: Option<DateTime<Utc>>,
    pub size: i64,
    pub etag: String,
    pub metadata: HashMap<String, String>,
}

/// A content item whose payload is a lazy byte stream. The caller owns
/// the body; dropping it on any exit path releases the connection.
pub struct ContentStream {
    pub key: String,
    pub body: BodyReader,
    pub content_type: String,
    pub version_id: String,
    pub last_modified: Option<DateTime<Utc>>,
    pub size: i64,
    pub etag: String,
    pub metadata: HashMap<String, String>,
}

impl std::fmt::Debug for ContentStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentStream")
            .field("key", &self.key)
            .field("content_type", &self.content_type)
            .field("version_id", &self.version_id)
            .field("last_modified", &self.last_modified)
            .field("size", &self.size)
            .field("etag", &self.etag)
            .field("metadata", &self.metadata)
            .finish()
    }
}

/// One stored version of a live content item.
#[derive(Debug, Clone)]
pub struct ContentVersion {
    pub version_id: String,
    pub last_modified: Option<DateTime<Utc>>,
    pub size: i64,
    pub is_latest: bool,
}

/// Publish-event record kept under `_history/<id>/<version>.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub parent: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub author: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub size: i64,
}

/// Review comment on draft or pending content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub author: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resolved_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Comment {
    pub fn new(author: &str, message: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            author: author.to_string(),
            message: message.to_string(),
            created_at: Utc::now(),
            resolved: false,
            resolved_by: String::new(),
            resolved_at: None,
        }
    }

    /// Mark the comment as addressed.
    pub fn resolve(&mut self, resolver: &str) {
        self.resolved = true;
        self.resolved_by = resolver.to_string();
        self.resolved_at = Some(Utc::now());
    }
}

/// Mutation kinds delivered to webhook subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Create,
    Update,
    Delete,
    Publish,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Create => "create",
            EventKind::Update => "update",
            EventKind::Delete => "delete",
            EventKind::Publish => "publish",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-tenant webhook registration, stored as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Webhook {
    pub id: String,
    pub url: String,
    /// Subset of `create`, `update`, `delete`, `publish`.
    pub events: Vec<String>,
}

impl Webhook {
    pub fn subscribes_to(&self, event: EventKind) -> bool {
        self.events.iter().any(|e| e == event.as_str())
    }
}

/// Payload POSTed to webhook sinks.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookEvent {
    pub event: String,
    pub tenant: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub id: String,
    #[serde(rename = "content-type", skip_serializing_if = "String::is_empty")]
    pub content_type: String,
    pub timestamp: String,
}

/// A content-type schema. The engine treats the content as an opaque
/// JSON blob.
#[derive(Debug, Clone)]
pub struct Schema {
    pub name: String,
    pub content: Bytes,
    /// True when resolved from the global namespace rather than the
    /// tenant override.
    pub is_global: bool,
}
