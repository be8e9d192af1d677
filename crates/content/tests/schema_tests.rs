use bytes::Bytes;
use std::sync::Arc;

use content::{ContentService, EngineConfig};
use storage::MemoryBackend;

fn service() -> ContentService {
    ContentService::new(Arc::new(MemoryBackend::new()), EngineConfig::default())
}

#[tokio::test]
async fn tenant_schema_shadows_global() {
    let svc = service();
    svc.schemas()
        .put_global_schema("article", Bytes::from_static(br#"{"global":true}"#))
        .await
        .unwrap();
    svc.schemas()
        .put_tenant_schema("acme", "article", Bytes::from_static(br#"{"tenant":true}"#))
        .await
        .unwrap();

    let schema = svc.schemas().get_schema("acme", "article").await.unwrap();
    assert!(!schema.is_global);
    assert_eq!(&schema.content[..], br#"{"tenant":true}"#);

    // Another tenant still resolves the global layer.
    let schema = svc.schemas().get_schema("other", "article").await.unwrap();
    assert!(schema.is_global);
    assert_eq!(&schema.content[..], br#"{"global":true}"#);
}

#[tokio::test]
async fn global_fallback_and_missing() {
    let svc = service();
    svc.schemas()
        .put_global_schema("page", Bytes::from_static(b"{}"))
        .await
        .unwrap();

    let schema = svc.schemas().get_schema("acme", "page").await.unwrap();
    assert!(schema.is_global);
    assert_eq!(schema.name, "page");

    let err = svc.schemas().get_schema("acme", "unknown").await.unwrap_err();
    assert!(err.is_not_found());

    // The tenant-only accessor never falls back.
    let err = svc.schemas().get_tenant_schema("acme", "page").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn list_all_unions_and_deduplicates() {
    let svc = service();
    svc.schemas()
        .put_global_schema("article", Bytes::from_static(b"{}"))
        .await
        .unwrap();
    svc.schemas()
        .put_global_schema("page", Bytes::from_static(b"{}"))
        .await
        .unwrap();
    svc.schemas()
        .put_tenant_schema("acme", "article", Bytes::from_static(b"{}"))
        .await
        .unwrap();
    svc.schemas()
        .put_tenant_schema("acme", "product", Bytes::from_static(b"{}"))
        .await
        .unwrap();

    let names = svc.schemas().list_all("acme").await.unwrap();
    assert_eq!(names, vec!["article", "page", "product"]);

    assert_eq!(svc.schemas().list_global_schemas().await.unwrap().len(), 2);
    assert_eq!(svc.schemas().list_tenant_schemas("acme").await.unwrap().len(), 2);
    assert_eq!(svc.schemas().list_tenant_schemas("other").await.unwrap().len(), 0);
}

#[tokio::test]
async fn delete_restores_the_lower_layer() {
    let svc = service();
    svc.schemas()
        .put_global_schema("article", Bytes::from_static(br#"{"v":1}"#))
        .await
        .unwrap();
    svc.schemas()
        .put_tenant_schema("acme", "article", Bytes::from_static(br#"{"v":2}"#))
        .await
        .unwrap();

    svc.schemas().delete_tenant_schema("acme", "article").await.unwrap();
    let schema = svc.schemas().get_schema("acme", "article").await.unwrap();
    assert!(schema.is_global);

    svc.schemas().delete_global_schema("article").await.unwrap();
    assert!(!svc.schemas().schema_exists("acme", "article").await.unwrap());
}

#[tokio::test]
async fn schema_exists_checks_both_layers() {
    let svc = service();
    assert!(!svc.schemas().schema_exists("acme", "article").await.unwrap());

    svc.schemas()
        .put_global_schema("article", Bytes::from_static(b"{}"))
        .await
        .unwrap();
    assert!(svc.schemas().schema_exists("acme", "article").await.unwrap());
}
