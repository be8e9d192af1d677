use bytes::Bytes;
use std::sync::Arc;

use content::{Comment, ContentService, EngineConfig, State, StorageError};
use storage::{MemoryBackend, ObjectBackend, PutPayload};

const TENANT: &str = "acme";
const TYPE: &str = "articles";

fn backend_and_service() -> (Arc<MemoryBackend>, ContentService) {
    let backend = Arc::new(MemoryBackend::new());
    let svc = ContentService::new(backend.clone(), EngineConfig::default());
    (backend, svc)
}

#[tokio::test]
async fn comment_crud() {
    let (_, svc) = backend_and_service();
    let comment = Comment::new("reviewer", "tighten the intro");

    svc.comments()
        .put_comment(TENANT, TYPE, "post", State::Draft, &comment)
        .await
        .unwrap();

    let fetched = svc
        .comments()
        .get_comment(TENANT, TYPE, "post", State::Draft, &comment.id)
        .await
        .unwrap();
    assert_eq!(fetched.author, "reviewer");
    assert_eq!(fetched.message, "tighten the intro");
    assert!(!fetched.resolved);

    svc.comments()
        .delete_comment(TENANT, TYPE, "post", State::Draft, &comment.id)
        .await
        .unwrap();
    let err = svc
        .comments()
        .get_comment(TENANT, TYPE, "post", State::Draft, &comment.id)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn comments_on_live_content_are_rejected() {
    let (_, svc) = backend_and_service();
    let comment = Comment::new("reviewer", "too late");
    let err = svc
        .comments()
        .put_comment(TENANT, TYPE, "post", State::Live, &comment)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::InvalidState(_)));
}

#[tokio::test]
async fn has_unresolved_tracks_resolution() {
    let (_, svc) = backend_and_service();

    assert!(!svc
        .comments()
        .has_unresolved(TENANT, TYPE, "post", State::Draft)
        .await
        .unwrap());

    let mut comment = Comment::new("reviewer", "check the numbers");
    svc.comments()
        .put_comment(TENANT, TYPE, "post", State::Draft, &comment)
        .await
        .unwrap();
    assert!(svc
        .comments()
        .has_unresolved(TENANT, TYPE, "post", State::Draft)
        .await
        .unwrap());

    comment.resolve("author");
    svc.comments()
        .put_comment(TENANT, TYPE, "post", State::Draft, &comment)
        .await
        .unwrap();
    assert!(!svc
        .comments()
        .has_unresolved(TENANT, TYPE, "post", State::Draft)
        .await
        .unwrap());
}

#[tokio::test]
async fn delete_all_empties_the_state() {
    let (_, svc) = backend_and_service();
    for i in 0..3 {
        let comment = Comment::new("reviewer", &format!("note {i}"));
        svc.comments()
            .put_comment(TENANT, TYPE, "post", State::Pending, &comment)
            .await
            .unwrap();
    }
    assert_eq!(
        svc.comments()
            .list_comments(TENANT, TYPE, "post", State::Pending)
            .await
            .unwrap()
            .len(),
        3
    );

    svc.comments()
        .delete_all(TENANT, TYPE, "post", State::Pending)
        .await
        .unwrap();
    assert!(svc
        .comments()
        .list_comments(TENANT, TYPE, "post", State::Pending)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn draft_and_pending_comments_are_separate() {
    let (_, svc) = backend_and_service();
    let draft_comment = Comment::new("a", "draft note");
    let pending_comment = Comment::new("b", "pending note");

    svc.comments()
        .put_comment(TENANT, TYPE, "post", State::Draft, &draft_comment)
        .await
        .unwrap();
    svc.comments()
        .put_comment(TENANT, TYPE, "post", State::Pending, &pending_comment)
        .await
        .unwrap();

    let drafts = svc
        .comments()
        .list_comments(TENANT, TYPE, "post", State::Draft)
        .await
        .unwrap();
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].message, "draft note");

    let pendings = svc
        .comments()
        .list_comments(TENANT, TYPE, "post", State::Pending)
        .await
        .unwrap();
    assert_eq!(pendings.len(), 1);
    assert_eq!(pendings[0].message, "pending note");
}

#[tokio::test]
async fn corrupt_comment_is_skipped_in_lists_but_surfaced_on_get() {
    let (backend, svc) = backend_and_service();

    let mut good = Comment::new("reviewer", "fine");
    good.resolve("author");
    svc.comments()
        .put_comment(TENANT, TYPE, "post", State::Draft, &good)
        .await
        .unwrap();

    // Write garbage straight at a comment key, bypassing the store.
    let corrupt_key = format!(
        "tenants/{TENANT}/content/{TYPE}/_draft/_comments/post/broken.json"
    );
    backend
        .put(
            &corrupt_key,
            PutPayload::from(b"not json".to_vec()),
            "application/json",
            None,
        )
        .await
        .unwrap();

    let comments = svc
        .comments()
        .list_comments(TENANT, TYPE, "post", State::Draft)
        .await
        .unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].id, good.id);

    let err = svc
        .comments()
        .get_comment(TENANT, TYPE, "post", State::Draft, "broken")
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Corrupt { .. }));

    // An unresolved-but-corrupt record cannot gate a transition either.
    assert!(!svc
        .comments()
        .has_unresolved(TENANT, TYPE, "post", State::Draft)
        .await
        .unwrap());
}
