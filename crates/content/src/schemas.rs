use bytes::Bytes;
use std::collections::BTreeSet;
use std::sync::Arc;

use storage::{ObjectBackend, PutPayload, Result, StorageError};

use crate::keys::KeyNamer;
use crate::store::fetch_item;
use crate::types::Schema;

/// JSON-Schema registry with a global namespace and per-tenant
/// overrides. A tenant schema with the same name shadows the global one
/// entirely; the layers never merge. Schema content is an opaque blob
/// here; nothing in the engine parses it.
#[derive(Clone)]
pub struct SchemaRegistry {
    backend: Arc<dyn ObjectBackend>,
    keys: Arc<KeyNamer>,
}

impl SchemaRegistry {
    pub(crate) fn new(backend: Arc<dyn ObjectBackend>, keys: Arc<KeyNamer>) -> Self {
        Self { backend, keys }
    }

    /// Resolve a schema for a tenant: tenant layer first, then global.
    /// The `is_global` flag on the result names the layer that answered.
    pub async fn get_schema(&self, tenant: &str, name: &str) -> Result<Schema> {
        match self.get_tenant_schema(tenant, name).await {
            Ok(schema) => return Ok(schema),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }
        self.get_global_schema(name)
            .await
            .map_err(|e| match e {
                StorageError::NotFound(_) => {
                    StorageError::NotFound(format!("schema not found: {name}"))
                }
                other => other,
            })
    }

    pub async fn get_global_schema(&self, name: &str) -> Result<Schema> {
        let key = self.keys.global_schema_key(name);
        let item = fetch_item(self.backend.as_ref(), &key, None).await?;
        Ok(Schema {
            name: name.to_string(),
            content: item.content,
            is_global: true,
        })
    }

    /// Tenant layer only; does not fall back to global.
    pub async fn get_tenant_schema(&self, tenant: &str, name: &str) -> Result<Schema> {
        let key = self.keys.tenant_schema_key(tenant, name);
        let item = fetch_item(self.backend.as_ref(), &key, None).await?;
        Ok(Schema {
            name: name.to_string(),
            content: item.content,
            is_global: false,
        })
    }

    pub async fn put_global_schema(&self, name: &str, content: Bytes) -> Result<()> {
        let key = self.keys.global_schema_key(name);
        self.backend
            .put(&key, PutPayload::Bytes(content), "application/json", None)
            .await?;
        Ok(())
    }

    pub async fn put_tenant_schema(&self, tenant: &str, name: &str, content: Bytes) -> Result<()> {
        let key = self.keys.tenant_schema_key(tenant, name);
        self.backend
            .put(&key, PutPayload::Bytes(content), "application/json", None)
            .await?;
        Ok(())
    }

    pub async fn delete_global_schema(&self, name: &str) -> Result<()> {
        let key = self.keys.global_schema_key(name);
        self.backend.delete(&key, None).await
    }

    pub async fn delete_tenant_schema(&self, tenant: &str, name: &str) -> Result<()> {
        let key = self.keys.tenant_schema_key(tenant, name);
        self.backend.delete(&key, None).await
    }

    pub async fn list_global_schemas(&self) -> Result<Vec<String>> {
        self.list_names(&self.keys.global_schemas_prefix()).await
    }

    pub async fn list_tenant_schemas(&self, tenant: &str) -> Result<Vec<String>> {
        self.list_names(&self.keys.tenant_schemas_prefix(tenant)).await
    }

    /// Union of both layers as a deduplicated, sorted name set. The
    /// result does not say which layer owns a name; use `get_schema` for
    /// that.
    pub async fn list_all(&self, tenant: &str) -> Result<Vec<String>> {
        let mut names = BTreeSet::new();
        names.extend(self.list_global_schemas().await.unwrap_or_default());
        names.extend(self.list_tenant_schemas(tenant).await.unwrap_or_default());
        Ok(names.into_iter().collect())
    }

    /// True when either layer can answer for the name. A HEAD per
    /// layer; absent maps to `false`, other failures surface.
    pub async fn schema_exists(&self, tenant: &str, name: &str) -> Result<bool> {
        let keys = [
            self.keys.tenant_schema_key(tenant, name),
            self.keys.global_schema_key(name),
        ];
        for key in &keys {
            match self.backend.head(key).await {
                Ok(_) => return Ok(true),
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
        }
        Ok(false)
    }

    async fn list_names(&self, prefix: &str) -> Result<Vec<String>> {
        let entries = self.backend.list(prefix, None).await?;
        Ok(entries
            .into_iter()
            .filter_map(|entry| {
                let name = entry
                    .key
                    .strip_prefix(prefix)?
                    .strip_suffix(".json")?
                    .to_string();
                (!name.is_empty()).then_some(name)
            })
            .collect())
    }
}
