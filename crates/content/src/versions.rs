use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use storage::{MetadataDirective, ObjectBackend, Result};

use crate::keys::KeyNamer;
use crate::store::{fetch_item, fetch_stream};
use crate::types::{ContentItem, ContentStream, ContentVersion, State};

const PRUNE_QUEUE_CAPACITY: usize = 1024;

/// Lists, retrieves, restores and prunes versions of live content.
///
/// Only live content is versioned; non-live states are overwritten in
/// place. On a non-versioning backend every operation here degrades to
/// an empty result.
#[derive(Clone)]
pub struct VersionManager {
    backend: Arc<dyn ObjectBackend>,
    keys: Arc<KeyNamer>,
    max_versions: i32,
}

impl VersionManager {
    pub(crate) fn new(
        backend: Arc<dyn ObjectBackend>,
        keys: Arc<KeyNamer>,
        max_versions: i32,
    ) -> Self {
        Self { backend, keys, max_versions }
    }

    /// All stored versions of a live item, newest first. The backend
    /// listing is prefix-based, so sibling keys (`logo.png` vs
    /// `logo.png.bak`) are filtered to exact matches here.
    pub async fn list_versions(
        &self,
        tenant: &str,
        type_name: &str,
        id: &str,
        ext: &str,
    ) -> Result<Vec<ContentVersion>> {
        let key = self
            .keys
            .content_key(tenant, type_name, id, ext, State::Live);
        let entries = self.backend.list_versions(&key).await?;
        Ok(entries
            .into_iter()
            .filter(|v| v.key == key)
            .map(|v| ContentVersion {
                version_id: v.version_id,
                last_modified: v.last_modified,
                size: v.size,
                is_latest: v.is_latest,
            })
            .collect())
    }

    /// Buffered read of a specific version.
    pub async fn get_version(
        &self,
        tenant: &str,
        type_name: &str,
        id: &str,
        ext: &str,
        version_id: &str,
    ) -> Result<ContentItem> {
        let key = self
            .keys
            .content_key(tenant, type_name, id, ext, State::Live);
        fetch_item(self.backend.as_ref(), &key, Some(version_id)).await
    }

    /// Streaming read of a specific version.
    pub async fn get_version_stream(
        &self,
        tenant: &str,
        type_name: &str,
        id: &str,
        ext: &str,
        version_id: &str,
    ) -> Result<ContentStream> {
        let key = self
            .keys
            .content_key(tenant, type_name, id, ext, State::Live);
        fetch_stream(self.backend.as_ref(), &key, Some(version_id)).await
    }

    /// Make a historical version the newest one again via a server-side
    /// copy onto the live key. The pinned version stays in the list; the
    /// copy becomes a new latest version with identical bytes.
    pub async fn restore_version(
        &self,
        tenant: &str,
        type_name: &str,
        id: &str,
        ext: &str,
        version_id: &str,
    ) -> Result<ContentItem> {
        let key = self
            .keys
            .content_key(tenant, type_name, id, ext, State::Live);

        let pinned = fetch_item(self.backend.as_ref(), &key, Some(version_id)).await?;
        let copied = self
            .backend
            .copy(&key, Some(version_id), &key, MetadataDirective::Copy, None)
            .await?;

        debug!("restored {} to version {} (new version {})", key, version_id, copied.version_id);

        Ok(ContentItem {
            version_id: copied.version_id,
            etag: copied.etag,
            ..pinned
        })
    }

    /// Delete versions beyond the retention cap, oldest first. Best
    /// effort: failures are logged and the walk continues.
    pub async fn prune(
        &self,
        tenant: &str,
        type_name: &str,
        id: &str,
        ext: &str,
    ) -> Result<usize> {
        let key = self
            .keys
            .content_key(tenant, type_name, id, ext, State::Live);
        prune_key(self.backend.as_ref(), &key, self.max_versions).await
    }
}

/// Delete every version of `key` beyond the newest `max_versions`.
/// Listings come back newest first, so everything past the cap goes.
pub(crate) async fn prune_key(
    backend: &dyn ObjectBackend,
    key: &str,
    max_versions: i32,
) -> Result<usize> {
    if max_versions <= 0 {
        return Ok(0);
    }

    let versions = backend.list_versions(key).await?;
    let mut pruned = 0;
    for v in versions
        .into_iter()
        .filter(|v| v.key == key)
        .skip(max_versions as usize)
    {
        debug!("pruning version {} of {}", v.version_id, key);
        match backend.delete(key, Some(&v.version_id)).await {
            Ok(()) => pruned += 1,
            Err(e) => warn!("failed to prune version {} of {}: {}", v.version_id, key, e),
        }
    }
    Ok(pruned)
}

/// Handle for scheduling background prunes after live writes.
///
/// Requests funnel through a bounded queue into a single worker, which
/// serializes prunes and keeps a burst of writes from fanning out into
/// unbounded concurrent deletes. A key already queued is not queued
/// again; a full queue drops the request (the next write re-triggers).
#[derive(Clone)]
pub struct PruneQueue {
    sender: mpsc::Sender<String>,
    pending: Arc<Mutex<HashSet<String>>>,
}

impl PruneQueue {
    pub fn schedule(&self, key: String) {
        let mut pending = self.pending.lock().expect("prune queue lock poisoned");
        if pending.contains(&key) {
            return;
        }
        match self.sender.try_send(key.clone()) {
            Ok(()) => {
                pending.insert(key);
            }
            Err(_) => warn!("prune queue full, skipping prune for {}", key),
        }
    }
}

/// Spawn the prune worker. Dropping every handle shuts it down.
pub(crate) fn spawn_pruner(backend: Arc<dyn ObjectBackend>, max_versions: i32) -> PruneQueue {
    let (sender, mut receiver) = mpsc::channel::<String>(PRUNE_QUEUE_CAPACITY);
    let pending = Arc::new(Mutex::new(HashSet::new()));
    let worker_pending = pending.clone();

    tokio::spawn(async move {
        while let Some(key) = receiver.recv().await {
            // Unregister before pruning so a write landing mid-prune can
            // queue the key again.
            worker_pending
                .lock()
                .expect("prune queue lock poisoned")
                .remove(&key);
            if let Err(e) = prune_key(backend.as_ref(), &key, max_versions).await {
                error!("version prune failed for {}: {}", key, e);
            }
        }
    });

    PruneQueue { sender, pending }
}
