use std::sync::Arc;
use tracing::warn;

use storage::{ObjectBackend, PutPayload, Result, StorageError};

use crate::keys::KeyNamer;
use crate::store::fetch_item;
use crate::types::HistoryRecord;

/// Append-only log of publish events under `_history/<id>/`.
///
/// History records why a version exists (author, message, parent);
/// the version list holds the bytes themselves. Records are never
/// mutated after creation.
#[derive(Clone)]
pub struct HistoryLog {
    backend: Arc<dyn ObjectBackend>,
    keys: Arc<KeyNamer>,
}

impl HistoryLog {
    pub(crate) fn new(backend: Arc<dyn ObjectBackend>, keys: Arc<KeyNamer>) -> Self {
        Self { backend, keys }
    }

    pub async fn put_record(
        &self,
        tenant: &str,
        type_name: &str,
        id: &str,
        record: &HistoryRecord,
    ) -> Result<()> {
        let key = self.keys.history_key(tenant, type_name, id, &record.version);
        let data = serde_json::to_vec(record).map_err(|e| StorageError::Corrupt {
            key: key.clone(),
            reason: format!("failed to serialize history record: {e}"),
        })?;
        self.backend
            .put(&key, PutPayload::from(data), "application/json", None)
            .await?;
        Ok(())
    }

    pub async fn get_record(
        &self,
        tenant: &str,
        type_name: &str,
        id: &str,
        version: &str,
    ) -> Result<HistoryRecord> {
        let key = self.keys.history_key(tenant, type_name, id, version);
        let item = fetch_item(self.backend.as_ref(), &key, None).await?;
        serde_json::from_slice(&item.content).map_err(|e| StorageError::Corrupt {
            key,
            reason: e.to_string(),
        })
    }

    /// All records for an item. Unreadable or corrupt entries are
    /// skipped with a warning so one bad record cannot hide the rest.
    pub async fn list_records(
        &self,
        tenant: &str,
        type_name: &str,
        id: &str,
    ) -> Result<Vec<HistoryRecord>> {
        let prefix = self.keys.history_prefix(tenant, type_name, id);
        let entries = self.backend.list(&prefix, None).await?;

        let mut records = Vec::with_capacity(entries.len());
        for entry in entries {
            let item = match fetch_item(self.backend.as_ref(), &entry.key, None).await {
                Ok(item) => item,
                Err(e) => {
                    warn!("skipping unreadable history record {}: {}", entry.key, e);
                    continue;
                }
            };
            match serde_json::from_slice::<HistoryRecord>(&item.content) {
                Ok(record) => records.push(record),
                Err(e) => warn!("skipping corrupt history record {}: {}", entry.key, e),
            }
        }
        Ok(records)
    }

    /// Version of the most recent publish, by record timestamp. Version
    /// identifiers are opaque and cannot be ordered, so the timestamp is
    /// authoritative. An empty history yields an empty string.
    pub async fn latest_version(&self, tenant: &str, type_name: &str, id: &str) -> Result<String> {
        let records = self.list_records(tenant, type_name, id).await?;
        Ok(records
            .into_iter()
            .max_by_key(|r| r.timestamp)
            .map(|r| r.version)
            .unwrap_or_default())
    }
}
