use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use storage::{BodyReader, ObjectBackend, ObjectStream, PutPayload, Result};

use crate::keys::KeyNamer;
use crate::types::{ContentItem, ContentStream, State};
use crate::versions::PruneQueue;

/// Put, get, stream, delete, list and existence checks for content at a
/// given workflow state.
///
/// Live-state writes on a versioning backend enqueue an asynchronous
/// version prune after the put returns.
#[derive(Clone)]
pub struct ContentStore {
    backend: Arc<dyn ObjectBackend>,
    keys: Arc<KeyNamer>,
    pruner: Option<PruneQueue>,
}

impl ContentStore {
    pub(crate) fn new(
        backend: Arc<dyn ObjectBackend>,
        keys: Arc<KeyNamer>,
        pruner: Option<PruneQueue>,
    ) -> Self {
        Self { backend, keys, pruner }
    }

    pub(crate) fn backend(&self) -> &Arc<dyn ObjectBackend> {
        &self.backend
    }

    pub(crate) fn keys(&self) -> &KeyNamer {
        &self.keys
    }

    /// Store a buffered payload.
    pub async fn put(
        &self,
        tenant: &str,
        type_name: &str,
        id: &str,
        ext: &str,
        content: Bytes,
        mime_type: &str,
        state: State,
        metadata: Option<&HashMap<String, String>>,
    ) -> Result<ContentItem> {
        let key = self.keys.content_key(tenant, type_name, id, ext, state);
        debug!("putting {} bytes at {}", content.len(), key);

        let size = content.len() as i64;
        let result = self
            .backend
            .put(&key, content.clone().into(), mime_type, metadata)
            .await?;

        if state.is_live() {
            self.schedule_prune(&key);
        }

        Ok(ContentItem {
            key,
            content,
            content_type: mime_type.to_string(),
            version_id: result.version_id,
            last_modified: result.last_modified,
            size,
            etag: result.etag,
            metadata: metadata.cloned().unwrap_or_default(),
        })
    }

    /// Store from a reader without buffering at this layer.
    #[allow(clippy::too_many_arguments)]
    pub async fn put_stream(
        &self,
        tenant: &str,
        type_name: &str,
        id: &str,
        ext: &str,
        body: BodyReader,
        content_length: i64,
        mime_type: &str,
        state: State,
        metadata: Option<&HashMap<String, String>>,
    ) -> Result<ContentItem> {
        let key = self.keys.content_key(tenant, type_name, id, ext, state);
        debug!("streaming {} bytes to {}", content_length, key);

        let result = self
            .backend
            .put(
                &key,
                PutPayload::Reader {
                    body,
                    length: content_length,
                },
                mime_type,
                metadata,
            )
            .await?;

        if state.is_live() {
            self.schedule_prune(&key);
        }

        Ok(ContentItem {
            key,
            content: Bytes::new(),
            content_type: mime_type.to_string(),
            version_id: result.version_id,
            last_modified: result.last_modified,
            size: content_length,
            etag: result.etag,
            metadata: metadata.cloned().unwrap_or_default(),
        })
    }

    /// Retrieve a fully-buffered item.
    pub async fn get(
        &self,
        tenant: &str,
        type_name: &str,
        id: &str,
        ext: &str,
        state: State,
    ) -> Result<ContentItem> {
        let key = self.keys.content_key(tenant, type_name, id, ext, state);
        fetch_item(self.backend.as_ref(), &key, None).await
    }

    /// Retrieve an item as a stream. Ownership of the body moves to the
    /// caller; dropping it releases the underlying connection.
    pub async fn get_stream(
        &self,
        tenant: &str,
        type_name: &str,
        id: &str,
        ext: &str,
        state: State,
    ) -> Result<ContentStream> {
        let key = self.keys.content_key(tenant, type_name, id, ext, state);
        fetch_stream(self.backend.as_ref(), &key, None).await
    }

    /// Remove the object at the given state. On a versioning backend a
    /// live delete records a delete marker, so historical versions stay
    /// reachable by version id; non-live deletes are hard.
    pub async fn delete(
        &self,
        tenant: &str,
        type_name: &str,
        id: &str,
        ext: &str,
        state: State,
    ) -> Result<()> {
        let key = self.keys.content_key(tenant, type_name, id, ext, state);
        self.backend.delete(&key, None).await
    }

    /// Enumerate content of a type at a state. The live listing excludes
    /// the bookkeeping subtrees (`_draft/`, `_pending/`, `_history/`,
    /// `_comments`) that share the type directory.
    pub async fn list(
        &self,
        tenant: &str,
        type_name: &str,
        state: State,
    ) -> Result<Vec<ContentItem>> {
        let prefix = self.keys.content_prefix(tenant, type_name, state);
        let entries = self.backend.list(&prefix, None).await?;

        let mut items = Vec::with_capacity(entries.len());
        for entry in entries {
            if state.is_live() {
                let relative = entry.key.strip_prefix(&prefix).unwrap_or(&entry.key);
                if relative.starts_with("_draft/")
                    || relative.starts_with("_pending/")
                    || relative.starts_with("_history/")
                    || relative.starts_with("_comments")
                {
                    continue;
                }
            }
            items.push(ContentItem {
                key: entry.key,
                content: Bytes::new(),
                content_type: String::new(),
                version_id: String::new(),
                last_modified: entry.last_modified,
                size: entry.size,
                etag: entry.etag,
                metadata: HashMap::new(),
            });
        }
        Ok(items)
    }

    /// HEAD on the key; absent maps to `false`, other failures surface.
    pub async fn exists(
        &self,
        tenant: &str,
        type_name: &str,
        id: &str,
        ext: &str,
        state: State,
    ) -> Result<bool> {
        let key = self.keys.content_key(tenant, type_name, id, ext, state);
        match self.backend.head(&key).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn schedule_prune(&self, key: &str) {
        if let Some(pruner) = &self.pruner {
            pruner.schedule(key.to_string());
        }
    }
}

/// Buffered read of a key, optionally pinned to a version.
pub(crate) async fn fetch_item(
    backend: &dyn ObjectBackend,
    key: &str,
    version_id: Option<&str>,
) -> Result<ContentItem> {
    let stream = backend.get(key, version_id).await?;
    let (info, content) = stream.collect().await?;
    Ok(ContentItem {
        key: info.key,
        size: content.len() as i64,
        content,
        content_type: info.content_type,
        version_id: info.version_id,
        last_modified: info.last_modified,
        etag: info.etag,
        metadata: info.metadata,
    })
}

/// Streaming read of a key, optionally pinned to a version.
pub(crate) async fn fetch_stream(
    backend: &dyn ObjectBackend,
    key: &str,
    version_id: Option<&str>,
) -> Result<ContentStream> {
    let ObjectStream { info, body } = backend.get(key, version_id).await?;
    Ok(ContentStream {
        key: info.key,
        body,
        content_type: info.content_type,
        version_id: info.version_id,
        last_modified: info.last_modified,
        size: info.size,
        etag: info.etag,
        metadata: info.metadata,
    })
}

