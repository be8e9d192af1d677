use chrono::{SecondsFormat, Utc};
use std::sync::Arc;
use tracing::{debug, error, warn};

use dispatch::WebhookDispatcher;
use storage::{ObjectBackend, PutPayload, Result, StorageError};

use crate::keys::KeyNamer;
use crate::store::fetch_item;
use crate::types::{EventKind, Webhook, WebhookEvent};

/// CRUD over per-tenant webhook registrations, stored as JSON blobs
/// under `webhooks/<id>.json`.
#[derive(Clone)]
pub struct WebhookStore {
    backend: Arc<dyn ObjectBackend>,
    keys: Arc<KeyNamer>,
}

impl WebhookStore {
    pub(crate) fn new(backend: Arc<dyn ObjectBackend>, keys: Arc<KeyNamer>) -> Self {
        Self { backend, keys }
    }

    /// All registrations for a tenant; corrupt entries are skipped.
    pub async fn list_webhooks(&self, tenant: &str) -> Result<Vec<Webhook>> {
        let prefix = self.keys.webhooks_prefix(tenant);
        let entries = self.backend.list(&prefix, None).await?;

        let mut webhooks = Vec::with_capacity(entries.len());
        for entry in entries {
            let item = match fetch_item(self.backend.as_ref(), &entry.key, None).await {
                Ok(item) => item,
                Err(e) => {
                    warn!("skipping unreadable webhook {}: {}", entry.key, e);
                    continue;
                }
            };
            match serde_json::from_slice::<Webhook>(&item.content) {
                Ok(webhook) => webhooks.push(webhook),
                Err(e) => warn!("skipping corrupt webhook {}: {}", entry.key, e),
            }
        }
        Ok(webhooks)
    }

    pub async fn get_webhook(&self, tenant: &str, id: &str) -> Result<Webhook> {
        let key = self.keys.webhook_key(tenant, id);
        let item = fetch_item(self.backend.as_ref(), &key, None).await?;
        serde_json::from_slice(&item.content).map_err(|e| StorageError::Corrupt {
            key,
            reason: e.to_string(),
        })
    }

    pub async fn put_webhook(&self, tenant: &str, webhook: &Webhook) -> Result<()> {
        let key = self.keys.webhook_key(tenant, &webhook.id);
        let data = serde_json::to_vec(webhook).map_err(|e| StorageError::Corrupt {
            key: key.clone(),
            reason: format!("failed to serialize webhook: {e}"),
        })?;
        self.backend
            .put(&key, PutPayload::from(data), "application/json", None)
            .await?;
        Ok(())
    }

    pub async fn delete_webhook(&self, tenant: &str, id: &str) -> Result<()> {
        let key = self.keys.webhook_key(tenant, id);
        self.backend.delete(&key, None).await
    }
}

/// Turns mutations into webhook deliveries.
///
/// `emit` is fire-and-forget: it spawns a task that looks up the
/// tenant's registrations, filters by subscription, serializes the
/// payload once and hands the fan-out to the dispatcher. Nothing here
/// can fail the mutation that triggered it.
#[derive(Clone)]
pub struct EventEmitter {
    store: WebhookStore,
    dispatcher: Arc<WebhookDispatcher>,
}

impl EventEmitter {
    pub(crate) fn new(store: WebhookStore, dispatcher: Arc<WebhookDispatcher>) -> Self {
        Self { store, dispatcher }
    }

    pub fn emit(&self, tenant: &str, event: EventKind, type_name: &str, id: &str, mime_type: &str) {
        let store = self.store.clone();
        let dispatcher = self.dispatcher.clone();
        let payload = WebhookEvent {
            event: event.as_str().to_string(),
            tenant: tenant.to_string(),
            type_name: type_name.to_string(),
            id: id.to_string(),
            content_type: mime_type.to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        };

        tokio::spawn(async move {
            let webhooks = match store.list_webhooks(&payload.tenant).await {
                Ok(webhooks) => webhooks,
                Err(e) => {
                    error!("failed to list webhooks for {}: {}", payload.tenant, e);
                    return;
                }
            };

            let targets: Vec<String> = webhooks
                .iter()
                .filter(|w| w.subscribes_to(event))
                .map(|w| w.url.clone())
                .collect();
            if targets.is_empty() {
                return;
            }

            let body = match serde_json::to_vec(&payload) {
                Ok(body) => body,
                Err(e) => {
                    error!("failed to serialize webhook payload: {}", e);
                    return;
                }
            };

            debug!(
                "dispatching {} event for {}/{}/{} to {} sinks",
                payload.event,
                payload.tenant,
                payload.type_name,
                payload.id,
                targets.len()
            );
            dispatcher.enqueue(targets, body.into());
        });
    }
}
