use bytes::Bytes;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use crate::backend::{
    CopyResult, MetadataDirective, ObjectBackend, ObjectEntry, ObjectInfo, ObjectStream,
    PutPayload, PutResult, VersionEntry,
};
use crate::error::{Result, StorageError};

#[derive(Debug, Clone)]
struct StoredVersion {
    version_id: String,
    data: Bytes,
    content_type: String,
    metadata: HashMap<String, String>,
    last_modified: DateTime<Utc>,
    etag: String,
    delete_marker: bool,
}

/// Versions newest first; index 0 is the current object.
#[derive(Debug, Default)]
struct StoredObject {
    versions: Vec<StoredVersion>,
}

/// In-memory object store mirroring the S3 versioning model.
///
/// Used by engine tests and embedded setups. Version identifiers are
/// opaque monotonic strings; a plain delete on the versioning variant
/// records a delete marker rather than dropping history, matching what
/// the real backend does.
pub struct MemoryBackend {
    objects: RwLock<BTreeMap<String, StoredObject>>,
    versioning: bool,
    next_version: AtomicU64,
}

impl MemoryBackend {
    /// Versioning store (the default, like a bucket with versioning on).
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(BTreeMap::new()),
            versioning: true,
            next_version: AtomicU64::new(1),
        }
    }

    /// Non-versioning variant: puts overwrite, version ids stay empty.
    pub fn unversioned() -> Self {
        Self {
            versioning: false,
            ..Self::new()
        }
    }

    fn next_version_id(&self) -> String {
        if !self.versioning {
            return String::new();
        }
        format!("mv{:012x}", self.next_version.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn etag_of(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let digest = hasher.finalize();
    format!("\"{:x}\"", digest)
}

fn info_of(key: &str, v: &StoredVersion) -> ObjectInfo {
    ObjectInfo {
        key: key.to_string(),
        content_type: v.content_type.clone(),
        version_id: v.version_id.clone(),
        size: v.data.len() as i64,
        etag: v.etag.clone(),
        last_modified: Some(v.last_modified),
        metadata: v.metadata.clone(),
    }
}

#[async_trait::async_trait]
impl ObjectBackend for MemoryBackend {
    async fn check_connection(&self) -> Result<()> {
        Ok(())
    }

    async fn put(
        &self,
        key: &str,
        payload: PutPayload,
        content_type: &str,
        metadata: Option<&HashMap<String, String>>,
    ) -> Result<PutResult> {
        let data = payload.into_bytes().await?;
        let version = StoredVersion {
            version_id: self.next_version_id(),
            etag: etag_of(&data),
            data,
            content_type: content_type.to_string(),
            metadata: metadata.cloned().unwrap_or_default(),
            last_modified: Utc::now(),
            delete_marker: false,
        };

        let result = PutResult {
            version_id: version.version_id.clone(),
            etag: version.etag.clone(),
            last_modified: Some(version.last_modified),
        };

        let mut objects = self.objects.write().expect("memory backend lock poisoned");
        let entry = objects.entry(key.to_string()).or_default();
        if self.versioning {
            entry.versions.insert(0, version);
        } else {
            entry.versions = vec![version];
        }
        Ok(result)
    }

    async fn get(&self, key: &str, version_id: Option<&str>) -> Result<ObjectStream> {
        let objects = self.objects.read().expect("memory backend lock poisoned");
        let obj = objects
            .get(key)
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;

        let version = match version_id {
            Some(vid) => obj
                .versions
                .iter()
                .find(|v| v.version_id == vid && !v.delete_marker),
            None => obj.versions.first().filter(|v| !v.delete_marker),
        }
        .ok_or_else(|| StorageError::NotFound(key.to_string()))?;

        let info = info_of(key, version);
        let data = version.data.to_vec();
        Ok(ObjectStream {
            info,
            body: Box::pin(std::io::Cursor::new(data)),
        })
    }

    async fn head(&self, key: &str) -> Result<ObjectInfo> {
        let objects = self.objects.read().expect("memory backend lock poisoned");
        let version = objects
            .get(key)
            .and_then(|o| o.versions.first())
            .filter(|v| !v.delete_marker)
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;
        Ok(info_of(key, version))
    }

    async fn delete(&self, key: &str, version_id: Option<&str>) -> Result<()> {
        let mut objects = self.objects.write().expect("memory backend lock poisoned");
        match version_id {
            None => {
                if self.versioning {
                    if let Some(obj) = objects.get_mut(key) {
                        obj.versions.insert(
                            0,
                            StoredVersion {
                                version_id: self.next_version_id(),
                                data: Bytes::new(),
                                content_type: String::new(),
                                metadata: HashMap::new(),
                                last_modified: Utc::now(),
                                etag: String::new(),
                                delete_marker: true,
                            },
                        );
                    }
                } else {
                    objects.remove(key);
                }
            }
            Some(vid) => {
                if let Some(obj) = objects.get_mut(key) {
                    obj.versions.retain(|v| v.version_id != vid);
                    if obj.versions.is_empty() {
                        objects.remove(key);
                    }
                }
            }
        }
        Ok(())
    }

    async fn list(&self, prefix: &str, limit: Option<usize>) -> Result<Vec<ObjectEntry>> {
        let objects = self.objects.read().expect("memory backend lock poisoned");
        let mut entries = Vec::new();
        for (key, obj) in objects.range(prefix.to_string()..) {
            if !key.starts_with(prefix) {
                break;
            }
            let Some(current) = obj.versions.first().filter(|v| !v.delete_marker) else {
                continue;
            };
            entries.push(ObjectEntry {
                key: key.clone(),
                size: current.data.len() as i64,
                last_modified: Some(current.last_modified),
                etag: current.etag.clone(),
            });
            if let Some(limit) = limit {
                if entries.len() >= limit {
                    break;
                }
            }
        }
        Ok(entries)
    }

    async fn copy(
        &self,
        src_key: &str,
        src_version: Option<&str>,
        dst_key: &str,
        directive: MetadataDirective,
        metadata: Option<&HashMap<String, String>>,
    ) -> Result<CopyResult> {
        let source = {
            let objects = self.objects.read().expect("memory backend lock poisoned");
            let obj = objects
                .get(src_key)
                .ok_or_else(|| StorageError::NotFound(src_key.to_string()))?;
            match src_version {
                Some(vid) => obj
                    .versions
                    .iter()
                    .find(|v| v.version_id == vid && !v.delete_marker),
                None => obj.versions.first().filter(|v| !v.delete_marker),
            }
            .cloned()
            .ok_or_else(|| StorageError::NotFound(src_key.to_string()))?
        };

        let new_metadata = match directive {
            MetadataDirective::Copy => source.metadata.clone(),
            MetadataDirective::Replace => metadata.cloned().unwrap_or_default(),
        };

        let version = StoredVersion {
            version_id: self.next_version_id(),
            etag: source.etag.clone(),
            data: source.data.clone(),
            content_type: source.content_type.clone(),
            metadata: new_metadata,
            last_modified: Utc::now(),
            delete_marker: false,
        };

        let result = CopyResult {
            version_id: version.version_id.clone(),
            etag: version.etag.clone(),
        };

        let mut objects = self.objects.write().expect("memory backend lock poisoned");
        let entry = objects.entry(dst_key.to_string()).or_default();
        if self.versioning {
            entry.versions.insert(0, version);
        } else {
            entry.versions = vec![version];
        }
        Ok(result)
    }

    async fn list_versions(&self, key_prefix: &str) -> Result<Vec<VersionEntry>> {
        let objects = self.objects.read().expect("memory backend lock poisoned");
        let mut entries = Vec::new();
        for (key, obj) in objects.range(key_prefix.to_string()..) {
            if !key.starts_with(key_prefix) {
                break;
            }
            for (idx, v) in obj.versions.iter().enumerate() {
                if v.delete_marker {
                    continue;
                }
                entries.push(VersionEntry {
                    key: key.clone(),
                    version_id: v.version_id.clone(),
                    size: v.data.len() as i64,
                    last_modified: Some(v.last_modified),
                    is_latest: idx == 0,
                });
            }
        }
        Ok(entries)
    }

    fn is_versioning(&self) -> bool {
        self.versioning
    }
}
