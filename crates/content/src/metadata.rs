use std::collections::HashMap;
use std::sync::Arc;

use storage::{MetadataDirective, ObjectBackend, Result};

use crate::keys::KeyNamer;
use crate::types::State;

/// Object-level metadata operations.
///
/// Metadata lives on the backend object itself, not in a sidecar, so
/// reads are a HEAD and writes are a server-side copy onto the same key
/// with the Replace directive. An empty map is a meaningful write (it
/// clears the metadata); "don't touch" is expressed by passing no map to
/// the content put, not by an empty one here.
#[derive(Clone)]
pub struct MetadataController {
    backend: Arc<dyn ObjectBackend>,
    keys: Arc<KeyNamer>,
}

impl MetadataController {
    pub(crate) fn new(backend: Arc<dyn ObjectBackend>, keys: Arc<KeyNamer>) -> Self {
        Self { backend, keys }
    }

    pub async fn get_metadata(
        &self,
        tenant: &str,
        type_name: &str,
        id: &str,
        ext: &str,
        state: State,
    ) -> Result<HashMap<String, String>> {
        let key = self.keys.content_key(tenant, type_name, id, ext, state);
        Ok(self.backend.head(&key).await?.metadata)
    }

    /// Replace the whole metadata map.
    pub async fn set_metadata(
        &self,
        tenant: &str,
        type_name: &str,
        id: &str,
        ext: &str,
        state: State,
        metadata: &HashMap<String, String>,
    ) -> Result<()> {
        let key = self.keys.content_key(tenant, type_name, id, ext, state);
        self.backend
            .copy(&key, None, &key, MetadataDirective::Replace, Some(metadata))
            .await?;
        Ok(())
    }

    /// Merge keys into the existing map; new values win on collision.
    #[allow(clippy::too_many_arguments)]
    pub async fn update_metadata(
        &self,
        tenant: &str,
        type_name: &str,
        id: &str,
        ext: &str,
        state: State,
        updates: &HashMap<String, String>,
    ) -> Result<()> {
        let mut current = self.get_metadata(tenant, type_name, id, ext, state).await?;
        for (k, v) in updates {
            current.insert(k.clone(), v.clone());
        }
        self.set_metadata(tenant, type_name, id, ext, state, &current)
            .await
    }

    /// Remove the listed keys; absent keys are ignored.
    #[allow(clippy::too_many_arguments)]
    pub async fn delete_metadata_keys(
        &self,
        tenant: &str,
        type_name: &str,
        id: &str,
        ext: &str,
        state: State,
        keys_to_remove: &[String],
    ) -> Result<()> {
        let mut current = self.get_metadata(tenant, type_name, id, ext, state).await?;
        for k in keys_to_remove {
            current.remove(k);
        }
        self.set_metadata(tenant, type_name, id, ext, state, &current)
            .await
    }
}
