use std::sync::Arc;
use tracing::info;

use dispatch::{DispatcherConfig, WebhookDispatcher};
use storage::{ObjectBackend, Result};

use crate::comments::CommentStore;
use crate::config::EngineConfig;
use crate::history::HistoryLog;
use crate::keys::KeyNamer;
use crate::metadata::MetadataController;
use crate::schemas::SchemaRegistry;
use crate::store::ContentStore;
use crate::types::EventKind;
use crate::versions::{spawn_pruner, VersionManager};
use crate::webhooks::{EventEmitter, WebhookStore};
use crate::workflow::WorkflowEngine;

/// Wires a backend and configuration into the full component set.
///
/// Construction spawns the prune worker and the webhook worker pool, so
/// it must happen inside a tokio runtime. All components share the
/// backend client and are individually cheap to clone.
pub struct ContentService {
    backend: Arc<dyn ObjectBackend>,
    store: ContentStore,
    versions: VersionManager,
    history: HistoryLog,
    comments: CommentStore,
    schemas: SchemaRegistry,
    webhooks: WebhookStore,
    metadata: MetadataController,
    workflow: WorkflowEngine,
    emitter: EventEmitter,
}

impl ContentService {
    pub fn new(backend: Arc<dyn ObjectBackend>, config: EngineConfig) -> Self {
        let keys = Arc::new(KeyNamer::new(&config.root));

        let pruner = if backend.is_versioning() && config.max_versions > 0 {
            Some(spawn_pruner(backend.clone(), config.max_versions))
        } else {
            None
        };

        let dispatcher = Arc::new(WebhookDispatcher::new(DispatcherConfig {
            request_timeout: config.webhook_timeout,
            dispatch_timeout: config.webhook_dispatch_timeout,
            ..DispatcherConfig::default()
        }));

        let store = ContentStore::new(backend.clone(), keys.clone(), pruner);
        let versions = VersionManager::new(backend.clone(), keys.clone(), config.max_versions);
        let history = HistoryLog::new(backend.clone(), keys.clone());
        let comments = CommentStore::new(backend.clone(), keys.clone());
        let schemas = SchemaRegistry::new(backend.clone(), keys.clone());
        let webhooks = WebhookStore::new(backend.clone(), keys.clone());
        let metadata = MetadataController::new(backend.clone(), keys.clone());
        let emitter = EventEmitter::new(webhooks.clone(), dispatcher);
        let workflow = WorkflowEngine::new(
            store.clone(),
            comments.clone(),
            history.clone(),
            emitter.clone(),
        );

        info!(
            "content service ready (root: '{}', max versions: {})",
            keys.root(),
            config.max_versions
        );

        Self {
            backend,
            store,
            versions,
            history,
            comments,
            schemas,
            webhooks,
            metadata,
            workflow,
            emitter,
        }
    }

    /// Verify the backend is reachable.
    pub async fn check_connection(&self) -> Result<()> {
        self.backend.check_connection().await
    }

    /// Fire a mutation event for the embedding layer (create, update,
    /// delete); publish events are emitted by the workflow engine
    /// itself.
    pub fn emit_event(
        &self,
        tenant: &str,
        event: EventKind,
        type_name: &str,
        id: &str,
        mime_type: &str,
    ) {
        self.emitter.emit(tenant, event, type_name, id, mime_type);
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    pub fn versions(&self) -> &VersionManager {
        &self.versions
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn comments(&self) -> &CommentStore {
        &self.comments
    }

    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    pub fn webhooks(&self) -> &WebhookStore {
        &self.webhooks
    }

    pub fn metadata(&self) -> &MetadataController {
        &self.metadata
    }

    pub fn workflow(&self) -> &WorkflowEngine {
        &self.workflow
    }
}
