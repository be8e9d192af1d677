use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;

use content::{ContentService, EngineConfig, State};
use storage::MemoryBackend;

const TENANT: &str = "acme";
const TYPE: &str = "articles";

fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

async fn service_with_item(initial: &HashMap<String, String>) -> ContentService {
    let svc = ContentService::new(Arc::new(MemoryBackend::new()), EngineConfig::default());
    svc.store()
        .put(
            TENANT,
            TYPE,
            "doc",
            "json",
            Bytes::from_static(b"{}"),
            "application/json",
            State::Live,
            Some(initial),
        )
        .await
        .unwrap();
    svc
}

#[tokio::test]
async fn get_reads_object_metadata() {
    let svc = service_with_item(&map(&[("author", "alice"), ("lang", "en")])).await;
    let metadata = svc
        .metadata()
        .get_metadata(TENANT, TYPE, "doc", "json", State::Live)
        .await
        .unwrap();
    assert_eq!(metadata, map(&[("author", "alice"), ("lang", "en")]));
}

#[tokio::test]
async fn set_replaces_the_whole_map() {
    let svc = service_with_item(&map(&[("author", "alice"), ("lang", "en")])).await;
    svc.metadata()
        .set_metadata(TENANT, TYPE, "doc", "json", State::Live, &map(&[("owner", "bob")]))
        .await
        .unwrap();

    let metadata = svc
        .metadata()
        .get_metadata(TENANT, TYPE, "doc", "json", State::Live)
        .await
        .unwrap();
    assert_eq!(metadata, map(&[("owner", "bob")]));

    // The payload is untouched by metadata writes.
    let item = svc.store().get(TENANT, TYPE, "doc", "json", State::Live).await.unwrap();
    assert_eq!(&item.content[..], b"{}");
}

#[tokio::test]
async fn set_with_empty_map_clears() {
    let svc = service_with_item(&map(&[("author", "alice")])).await;
    svc.metadata()
        .set_metadata(TENANT, TYPE, "doc", "json", State::Live, &HashMap::new())
        .await
        .unwrap();

    let metadata = svc
        .metadata()
        .get_metadata(TENANT, TYPE, "doc", "json", State::Live)
        .await
        .unwrap();
    assert!(metadata.is_empty());
}

#[tokio::test]
async fn update_merges_with_new_values_winning() {
    let svc = service_with_item(&map(&[("author", "alice"), ("lang", "en")])).await;
    svc.metadata()
        .update_metadata(
            TENANT,
            TYPE,
            "doc",
            "json",
            State::Live,
            &map(&[("lang", "de"), ("reviewed", "yes")]),
        )
        .await
        .unwrap();

    let metadata = svc
        .metadata()
        .get_metadata(TENANT, TYPE, "doc", "json", State::Live)
        .await
        .unwrap();
    assert_eq!(
        metadata,
        map(&[("author", "alice"), ("lang", "de"), ("reviewed", "yes")])
    );
}

#[tokio::test]
async fn delete_keys_removes_only_the_listed_ones() {
    let svc = service_with_item(&map(&[("a", "1"), ("b", "2"), ("c", "3")])).await;
    svc.metadata()
        .delete_metadata_keys(
            TENANT,
            TYPE,
            "doc",
            "json",
            State::Live,
            &["a".to_string(), "missing".to_string()],
        )
        .await
        .unwrap();

    let metadata = svc
        .metadata()
        .get_metadata(TENANT, TYPE, "doc", "json", State::Live)
        .await
        .unwrap();
    assert_eq!(metadata, map(&[("b", "2"), ("c", "3")]));
}

#[tokio::test]
async fn metadata_on_missing_content_is_not_found() {
    let svc = ContentService::new(Arc::new(MemoryBackend::new()), EngineConfig::default());
    let err = svc
        .metadata()
        .get_metadata(TENANT, TYPE, "ghost", "json", State::Live)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn metadata_works_on_draft_state_too() {
    let svc = ContentService::new(Arc::new(MemoryBackend::new()), EngineConfig::default());
    svc.store()
        .put(
            TENANT,
            TYPE,
            "wip",
            "json",
            Bytes::from_static(b"{}"),
            "application/json",
            State::Draft,
            Some(&map(&[("stage", "draft")])),
        )
        .await
        .unwrap();

    let metadata = svc
        .metadata()
        .get_metadata(TENANT, TYPE, "wip", "json", State::Draft)
        .await
        .unwrap();
    assert_eq!(metadata, map(&[("stage", "draft")]));
}
