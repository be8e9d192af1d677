use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::{ByteStream, DateTime as SmithyDateTime};
use aws_sdk_s3::types::MetadataDirective as S3MetadataDirective;
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::env;
use tracing::{debug, error};

use crate::backend::{
    CopyResult, MetadataDirective, ObjectBackend, ObjectEntry, ObjectInfo, ObjectStream,
    PutPayload, PutResult, VersionEntry,
};
use crate::error::{Result, StorageError};

/// S3-compatible endpoint configuration.
#[derive(Debug, Clone)]
pub struct S3Config {
    /// Endpoint host (e.g. `s3.wasabisys.com`). Empty uses the stock AWS
    /// endpoint for the region.
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl S3Config {
    /// Read the configuration from `S3_*` environment variables with the
    /// standard defaults.
    pub fn from_env() -> Self {
        Self {
            endpoint: env::var("S3_ENDPOINT").unwrap_or_else(|_| "s3.wasabisys.com".to_string()),
            region: env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            bucket: env::var("S3_BUCKET").unwrap_or_default(),
            access_key_id: env::var("S3_ACCESS_KEY_ID").unwrap_or_default(),
            secret_access_key: env::var("S3_SECRET_ACCESS_KEY").unwrap_or_default(),
        }
    }
}

/// Object backend over any S3-API-compatible store.
///
/// Uses path-style addressing so buckets on Wasabi/MinIO-style endpoints
/// resolve without DNS wildcards. The bucket is expected to have
/// versioning enabled; on an unversioned bucket puts return an empty
/// version id and version-level features degrade gracefully.
pub struct S3Backend {
    client: Client,
    bucket: String,
}

impl S3Backend {
    pub async fn new(cfg: S3Config) -> Result<Self> {
        let credentials = Credentials::new(
            cfg.access_key_id.clone(),
            cfg.secret_access_key.clone(),
            None,
            None,
            "static",
        );

        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(cfg.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared).force_path_style(true);
        if !cfg.endpoint.is_empty() {
            builder = builder.endpoint_url(format!("https://{}", cfg.endpoint));
        }

        Ok(Self {
            client: Client::from_conf(builder.build()),
            bucket: cfg.bucket,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

fn to_chrono(dt: &SmithyDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
}

#[async_trait::async_trait]
impl ObjectBackend for S3Backend {
    async fn check_connection(&self) -> Result<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| {
                StorageError::BackendUnavailable(format!(
                    "cannot connect to bucket '{}': {}",
                    self.bucket,
                    e.into_service_error()
                ))
            })?;
        Ok(())
    }

    async fn put(
        &self,
        key: &str,
        payload: PutPayload,
        content_type: &str,
        metadata: Option<&HashMap<String, String>>,
    ) -> Result<PutResult> {
        debug!("S3 PUT {} ({} bytes)", key, payload.len());

        // The SDK needs a retryable body, so reader payloads are buffered
        // before upload.
        let bytes = payload.into_bytes().await?;

        let mut req = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type);
        if let Some(meta) = metadata {
            for (k, v) in meta {
                req = req.metadata(k, v);
            }
        }

        let out = req.send().await.map_err(|e| {
            error!("S3 PUT failed - bucket: {}, key: {}, error: {:?}", self.bucket, key, e);
            StorageError::BackendUnavailable(format!(
                "failed to put object: {}",
                e.into_service_error()
            ))
        })?;

        Ok(PutResult {
            version_id: out.version_id().unwrap_or_default().to_string(),
            etag: out.e_tag().unwrap_or_default().to_string(),
            last_modified: Some(Utc::now()),
        })
    }

    async fn get(&self, key: &str, version_id: Option<&str>) -> Result<ObjectStream> {
        debug!("S3 GET {} (version: {:?})", key, version_id);

        let mut req = self.client.get_object().bucket(&self.bucket).key(key);
        if let Some(v) = version_id {
            req = req.version_id(v);
        }

        let out = req.send().await.map_err(|e| {
            let svc = e.into_service_error();
            if svc.is_no_such_key() {
                StorageError::NotFound(key.to_string())
            } else {
                error!("S3 GET failed - bucket: {}, key: {}, error: {}", self.bucket, key, svc);
                StorageError::BackendUnavailable(format!("failed to get object: {svc}"))
            }
        })?;

        let info = ObjectInfo {
            key: key.to_string(),
            content_type: out
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string(),
            version_id: out.version_id().unwrap_or_default().to_string(),
            size: out.content_length().unwrap_or(0),
            etag: out.e_tag().unwrap_or_default().to_string(),
            last_modified: out.last_modified().and_then(to_chrono),
            metadata: out.metadata().cloned().unwrap_or_default(),
        };

        Ok(ObjectStream {
            info,
            body: Box::pin(out.body.into_async_read()),
        })
    }

    async fn head(&self, key: &str) -> Result<ObjectInfo> {
        debug!("S3 HEAD {}", key);

        let out = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let svc = e.into_service_error();
                if svc.is_not_found() {
                    StorageError::NotFound(key.to_string())
                } else {
                    StorageError::BackendUnavailable(format!("failed to head object: {svc}"))
                }
            })?;

        Ok(ObjectInfo {
            key: key.to_string(),
            content_type: out
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string(),
            version_id: out.version_id().unwrap_or_default().to_string(),
            size: out.content_length().unwrap_or(0),
            etag: out.e_tag().unwrap_or_default().to_string(),
            last_modified: out.last_modified().and_then(to_chrono),
            metadata: out.metadata().cloned().unwrap_or_default(),
        })
    }

    async fn delete(&self, key: &str, version_id: Option<&str>) -> Result<()> {
        debug!("S3 DELETE {} (version: {:?})", key, version_id);

        let mut req = self.client.delete_object().bucket(&self.bucket).key(key);
        if let Some(v) = version_id {
            req = req.version_id(v);
        }

        req.send().await.map_err(|e| {
            error!("S3 DELETE failed - bucket: {}, key: {}, error: {:?}", self.bucket, key, e);
            StorageError::BackendUnavailable(format!(
                "failed to delete object: {}",
                e.into_service_error()
            ))
        })?;

        Ok(())
    }

    async fn list(&self, prefix: &str, limit: Option<usize>) -> Result<Vec<ObjectEntry>> {
        debug!("S3 LIST prefix: {} (limit: {:?})", prefix, limit);

        let mut entries = Vec::new();

        if let Some(limit) = limit {
            // Small capped listings skip the paginator.
            let out = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .max_keys(limit as i32)
                .send()
                .await
                .map_err(|e| {
                    StorageError::BackendUnavailable(format!(
                        "failed to list objects: {}",
                        e.into_service_error()
                    ))
                })?;
            for obj in out.contents() {
                entries.push(ObjectEntry {
                    key: obj.key().unwrap_or_default().to_string(),
                    size: obj.size().unwrap_or(0),
                    last_modified: obj.last_modified().and_then(to_chrono),
                    etag: obj.e_tag().unwrap_or_default().to_string(),
                });
                if entries.len() >= limit {
                    break;
                }
            }
            return Ok(entries);
        }

        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| {
                StorageError::BackendUnavailable(format!(
                    "failed to list objects: {}",
                    e.into_service_error()
                ))
            })?;
            for obj in page.contents() {
                entries.push(ObjectEntry {
                    key: obj.key().unwrap_or_default().to_string(),
                    size: obj.size().unwrap_or(0),
                    last_modified: obj.last_modified().and_then(to_chrono),
                    etag: obj.e_tag().unwrap_or_default().to_string(),
                });
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
        debug!("S3 COPY {} -> {} (version: {:?})", src_key, dst_key, src_version);

        let mut source = format!("{}/{}", self.bucket, src_key);
        if let Some(v) = src_version {
            source.push_str("?versionId=");
            source.push_str(v);
        }

        let mut req = self
            .client
            .copy_object()
            .bucket(&self.bucket)
            .copy_source(source)
            .key(dst_key)
            .metadata_directive(match directive {
                MetadataDirective::Copy => S3MetadataDirective::Copy,
                MetadataDirective::Replace => S3MetadataDirective::Replace,
            });
        if let Some(meta) = metadata {
            for (k, v) in meta {
                req = req.metadata(k, v);
            }
        }

        let out = req.send().await.map_err(|e| {
            error!(
                "S3 COPY failed - bucket: {}, src: {}, dst: {}, error: {:?}",
                self.bucket, src_key, dst_key, e
            );
            StorageError::BackendUnavailable(format!(
                "failed to copy object: {}",
                e.into_service_error()
            ))
        })?;

        Ok(CopyResult {
            version_id: out.version_id().unwrap_or_default().to_string(),
            etag: out
                .copy_object_result()
                .and_then(|r| r.e_tag())
                .unwrap_or_default()
                .to_string(),
        })
    }

    async fn list_versions(&self, key_prefix: &str) -> Result<Vec<VersionEntry>> {
        debug!("S3 LIST VERSIONS prefix: {}", key_prefix);

        let out = self
            .client
            .list_object_versions()
            .bucket(&self.bucket)
            .prefix(key_prefix)
            .send()
            .await
            .map_err(|e| {
                StorageError::BackendUnavailable(format!(
                    "failed to list versions: {}",
                    e.into_service_error()
                ))
            })?;

        Ok(out
            .versions()
            .iter()
            .map(|v| VersionEntry {
                key: v.key().unwrap_or_default().to_string(),
                version_id: v.version_id().unwrap_or_default().to_string(),
                size: v.size().unwrap_or(0),
                last_modified: v.last_modified().and_then(to_chrono),
                is_latest: v.is_latest().unwrap_or(false),
            })
            .collect())
    }

    fn is_versioning(&self) -> bool {
        true
    }
}
