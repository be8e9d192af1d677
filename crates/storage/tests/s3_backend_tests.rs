// S3 backend integration tests.
//
// These run against a real bucket and are skipped unless S3_TEST_BUCKET
// is set (credentials come from the usual S3_* variables or a .env
// file). The bucket should have versioning enabled.
//
//   S3_TEST_BUCKET=stanza-test cargo test -p storage --test s3_backend_tests

use bytes::Bytes;
use std::collections::HashMap;

use storage::{MetadataDirective, ObjectBackend, S3Backend, S3Config};

async fn test_backend() -> Option<S3Backend> {
    dotenvy::dotenv().ok();
    let _ = monitoring::init_logging();

    let bucket = match std::env::var("S3_TEST_BUCKET") {
        Ok(bucket) => bucket,
        Err(_) => {
            println!("S3_TEST_BUCKET not set, skipping S3 integration tests");
            return None;
        }
    };

    let config = S3Config {
        bucket,
        ..S3Config::from_env()
    };
    let backend = S3Backend::new(config).await.expect("failed to build S3 backend");
    if let Err(e) = backend.check_connection().await {
        println!("cannot reach bucket '{}', skipping: {}", backend.bucket(), e);
        return None;
    }
    Some(backend)
}

#[tokio::test]
async fn roundtrip_with_metadata_and_versions() {
    let Some(backend) = test_backend().await else {
        return;
    };

    let key = "integration/roundtrip.json";
    let mut metadata = HashMap::new();
    metadata.insert("suite".to_string(), "integration".to_string());

    let first = backend
        .put(
            key,
            Bytes::from_static(br#"{"rev":1}"#).into(),
            "application/json",
            Some(&metadata),
        )
        .await
        .unwrap();
    let second = backend
        .put(
            key,
            Bytes::from_static(br#"{"rev":2}"#).into(),
            "application/json",
            Some(&metadata),
        )
        .await
        .unwrap();

    let (info, body) = backend.get(key, None).await.unwrap().collect().await.unwrap();
    assert_eq!(&body[..], br#"{"rev":2}"#);
    assert_eq!(info.content_type, "application/json");
    assert_eq!(info.metadata.get("suite"), Some(&"integration".to_string()));

    if backend.is_versioning() && !first.version_id.is_empty() {
        let (_, body) = backend
            .get(key, Some(&first.version_id))
            .await
            .unwrap()
            .collect()
            .await
            .unwrap();
        assert_eq!(&body[..], br#"{"rev":1}"#);

        let versions = backend.list_versions(key).await.unwrap();
        assert!(versions.iter().any(|v| v.version_id == second.version_id));
    }

    // Metadata rewrite via copy-onto-self.
    let mut replaced = HashMap::new();
    replaced.insert("suite".to_string(), "rewritten".to_string());
    backend
        .copy(key, None, key, MetadataDirective::Replace, Some(&replaced))
        .await
        .unwrap();
    let info = backend.head(key).await.unwrap();
    assert_eq!(info.metadata.get("suite"), Some(&"rewritten".to_string()));

    backend.delete(key, None).await.unwrap();
    assert!(backend.get(key, None).await.unwrap_err().is_not_found());
}
