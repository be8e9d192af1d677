use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::pin::Pin;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{Result, StorageError};

/// Boxed byte stream handed to/from a backend. The receiver owns it and
/// is responsible for reading it to completion or dropping it.
pub type BodyReader = Pin<Box<dyn AsyncRead + Send>>;

/// Payload for a put: either fully buffered bytes or a reader with a
/// known length.
pub enum PutPayload {
    Bytes(Bytes),
    Reader { body: BodyReader, length: i64 },
}

impl PutPayload {
    pub fn len(&self) -> i64 {
        match self {
            PutPayload::Bytes(b) => b.len() as i64,
            PutPayload::Reader { length, .. } => *length,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Buffer the payload into memory regardless of variant.
    pub async fn into_bytes(self) -> Result<Bytes> {
        match self {
            PutPayload::Bytes(b) => Ok(b),
            PutPayload::Reader { mut body, length } => {
                let mut buf = Vec::with_capacity(length.max(0) as usize);
                body.read_to_end(&mut buf)
                    .await
                    .map_err(|e| StorageError::BackendUnavailable(format!("failed to read payload: {e}")))?;
                Ok(Bytes::from(buf))
            }
        }
    }
}

impl From<Bytes> for PutPayload {
    fn from(b: Bytes) -> Self {
        PutPayload::Bytes(b)
    }
}

impl From<Vec<u8>> for PutPayload {
    fn from(v: Vec<u8>) -> Self {
        PutPayload::Bytes(Bytes::from(v))
    }
}

/// Whether a server-side copy carries the source object's metadata or
/// replaces it with the supplied map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataDirective {
    Copy,
    Replace,
}

/// Outcome of a successful put.
#[derive(Debug, Clone, Default)]
pub struct PutResult {
    /// Backend-assigned version identifier; empty on non-versioning
    /// backends.
    pub version_id: String,
    pub etag: String,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Header-level attributes of a stored object.
#[derive(Debug, Clone, Default)]
pub struct ObjectInfo {
    pub key: String,
    pub content_type: String,
    pub version_id: String,
    pub size: i64,
    pub etag: String,
    pub last_modified: Option<DateTime<Utc>>,
    pub metadata: HashMap<String, String>,
}

/// A retrieved object with a lazily-read body.
pub struct ObjectStream {
    pub info: ObjectInfo,
    pub body: BodyReader,
}

impl std::fmt::Debug for ObjectStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStream").field("info", &self.info).finish()
    }
}

impl ObjectStream {
    /// Drain the body into memory, consuming the stream.
    pub async fn collect(self) -> Result<(ObjectInfo, Bytes)> {
        let ObjectStream { info, mut body } = self;
        let mut buf = Vec::with_capacity(info.size.max(0) as usize);
        body.read_to_end(&mut buf)
            .await
            .map_err(|e| StorageError::BackendUnavailable(format!("failed to read object body: {e}")))?;
        Ok((info, Bytes::from(buf)))
    }
}

/// One entry of a prefix listing.
#[derive(Debug, Clone)]
pub struct ObjectEntry {
    pub key: String,
    pub size: i64,
    pub last_modified: Option<DateTime<Utc>>,
    pub etag: String,
}

/// One entry of a version listing, newest first.
#[derive(Debug, Clone)]
pub struct VersionEntry {
    pub key: String,
    pub version_id: String,
    pub size: i64,
    pub last_modified: Option<DateTime<Utc>>,
    pub is_latest: bool,
}

/// Outcome of a successful server-side copy.
#[derive(Debug, Clone, Default)]
pub struct CopyResult {
    pub version_id: String,
    pub etag: String,
}

/// Capability surface the content engine requires of any object store.
///
/// A backend is either *versioning* (puts on the same key return distinct
/// version identifiers and `list_versions` is meaningful) or
/// *non-versioning* (`version_id` is always empty and version-level
/// features degrade to history only). Implementations must be safe for
/// concurrent use.
#[async_trait]
pub trait ObjectBackend: Send + Sync {
    /// Verify the backend is reachable.
    async fn check_connection(&self) -> Result<()>;

    async fn put(
        &self,
        key: &str,
        payload: PutPayload,
        content_type: &str,
        metadata: Option<&HashMap<String, String>>,
    ) -> Result<PutResult>;

    /// Retrieve an object, optionally pinned to a version.
    async fn get(&self, key: &str, version_id: Option<&str>) -> Result<ObjectStream>;

    /// Header attributes only, no body.
    async fn head(&self, key: &str) -> Result<ObjectInfo>;

    /// Delete an object. Without a version this is a plain delete (on a
    /// versioning backend the store records a delete marker); with a
    /// version it removes that version permanently.
    async fn delete(&self, key: &str, version_id: Option<&str>) -> Result<()>;

    /// Enumerate keys under a prefix, in key order. `limit` caps the
    /// number of entries returned.
    async fn list(&self, prefix: &str, limit: Option<usize>) -> Result<Vec<ObjectEntry>>;

    /// Server-side copy. `src_key == dst_key` with `Replace` is the
    /// canonical way to rewrite object metadata in place.
    async fn copy(
        &self,
        src_key: &str,
        src_version: Option<&str>,
        dst_key: &str,
        directive: MetadataDirective,
        metadata: Option<&HashMap<String, String>>,
    ) -> Result<CopyResult>;

    /// Enumerate stored versions of keys under a prefix, newest first.
    /// Callers filter for exact key matches; prefix siblings may appear.
    async fn list_versions(&self, key_prefix: &str) -> Result<Vec<VersionEntry>>;

    fn is_versioning(&self) -> bool;
}
