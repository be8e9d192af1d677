use std::collections::HashMap;

use crate::backend::{
    CopyResult, MetadataDirective, ObjectBackend, ObjectEntry, ObjectInfo, ObjectStream,
    PutPayload, PutResult, VersionEntry,
};
use crate::error::{Result, StorageError};

/// Backend used when no object store is configured.
///
/// `check_connection` succeeds so a host can boot without credentials;
/// every data operation fails with [`StorageError::NotConfigured`].
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopBackend;

impl NoopBackend {
    pub fn new() -> Self {
        NoopBackend
    }
}

#[async_trait::async_trait]
impl ObjectBackend for NoopBackend {
    async fn check_connection(&self) -> Result<()> {
        Ok(())
    }

    async fn put(
        &self,
        _key: &str,
        _payload: PutPayload,
        _content_type: &str,
        _metadata: Option<&HashMap<String, String>>,
    ) -> Result<PutResult> {
        Err(StorageError::NotConfigured)
    }

    async fn get(&self, _key: &str, _version_id: Option<&str>) -> Result<ObjectStream> {
        Err(StorageError::NotConfigured)
    }

    async fn head(&self, _key: &str) -> Result<ObjectInfo> {
        Err(StorageError::NotConfigured)
    }

    async fn delete(&self, _key: &str, _version_id: Option<&str>) -> Result<()> {
        Err(StorageError::NotConfigured)
    }

    async fn list(&self, _prefix: &str, _limit: Option<usize>) -> Result<Vec<ObjectEntry>> {
        Err(StorageError::NotConfigured)
    }

    async fn copy(
        &self,
        _src_key: &str,
        _src_version: Option<&str>,
        _dst_key: &str,
        _directive: MetadataDirective,
        _metadata: Option<&HashMap<String, String>>,
    ) -> Result<CopyResult> {
        Err(StorageError::NotConfigured)
    }

    async fn list_versions(&self, _key_prefix: &str) -> Result<Vec<VersionEntry>> {
        Err(StorageError::NotConfigured)
    }

    fn is_versioning(&self) -> bool {
        false
    }
}
