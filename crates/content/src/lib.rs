//! Storage and workflow engine for the content service.
//!
//! Content items are addressed by `(tenant, type, id, ext, state)` and
//! stored against a pluggable object backend. The engine provides the
//! workflow state machine (draft → pending → live) with comment gating,
//! version history with pruning and restore, per-item review comments,
//! a schema registry with tenant overrides, object metadata operations
//! and webhook fan-out on mutations.

pub mod comments;
pub mod config;
pub mod history;
pub mod keys;
pub mod metadata;
pub mod resolver;
pub mod schemas;
pub mod service;
pub mod store;
pub mod types;
pub mod versions;
pub mod webhooks;
pub mod workflow;

pub use comments::CommentStore;
pub use config::{EngineConfig, Environment};
pub use history::HistoryLog;
pub use keys::KeyNamer;
pub use metadata::MetadataController;
pub use schemas::SchemaRegistry;
pub use service::ContentService;
pub use store::ContentStore;
pub use types::{
    Comment, ContentItem, ContentStream, ContentVersion, EventKind, HistoryRecord, Schema, State,
    Webhook, WebhookEvent,
};
pub use versions::VersionManager;
pub use webhooks::WebhookStore;
pub use workflow::WorkflowEngine;

pub use storage::{Result, StorageError};
