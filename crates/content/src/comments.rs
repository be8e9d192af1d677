use std::sync::Arc;
use tracing::{error, warn};

use storage::{ObjectBackend, PutPayload, Result, StorageError};

use crate::keys::KeyNamer;
use crate::store::fetch_item;
use crate::types::{Comment, State};

/// Review comments on draft and pending content, one JSON blob per
/// comment under the state's `_comments/<id>/` subtree.
#[derive(Clone)]
pub struct CommentStore {
    backend: Arc<dyn ObjectBackend>,
    keys: Arc<KeyNamer>,
}

impl CommentStore {
    pub(crate) fn new(backend: Arc<dyn ObjectBackend>, keys: Arc<KeyNamer>) -> Self {
        Self { backend, keys }
    }

    /// Store a comment. Live content cannot carry comments.
    pub async fn put_comment(
        &self,
        tenant: &str,
        type_name: &str,
        content_id: &str,
        state: State,
        comment: &Comment,
    ) -> Result<()> {
        if state.is_live() {
            return Err(StorageError::InvalidState(
                "comments are only allowed on draft or pending content".to_string(),
            ));
        }

        let key = self
            .keys
            .comment_key(tenant, type_name, content_id, state, &comment.id);
        let data = serde_json::to_vec(comment).map_err(|e| StorageError::Corrupt {
            key: key.clone(),
            reason: format!("failed to serialize comment: {e}"),
        })?;
        self.backend
            .put(&key, PutPayload::from(data), "application/json", None)
            .await?;
        Ok(())
    }

    pub async fn get_comment(
        &self,
        tenant: &str,
        type_name: &str,
        content_id: &str,
        state: State,
        id: &str,
    ) -> Result<Comment> {
        let key = self.keys.comment_key(tenant, type_name, content_id, state, id);
        let item = fetch_item(self.backend.as_ref(), &key, None).await?;
        serde_json::from_slice(&item.content).map_err(|e| StorageError::Corrupt {
            key,
            reason: e.to_string(),
        })
    }

    /// All comments on an item in a state; corrupt entries are skipped.
    pub async fn list_comments(
        &self,
        tenant: &str,
        type_name: &str,
        content_id: &str,
        state: State,
    ) -> Result<Vec<Comment>> {
        let prefix = self.keys.comment_prefix(tenant, type_name, content_id, state);
        let entries = self.backend.list(&prefix, None).await?;

        let mut comments = Vec::with_capacity(entries.len());
        for entry in entries {
            let item = match fetch_item(self.backend.as_ref(), &entry.key, None).await {
                Ok(item) => item,
                Err(e) => {
                    warn!("skipping unreadable comment {}: {}", entry.key, e);
                    continue;
                }
            };
            match serde_json::from_slice::<Comment>(&item.content) {
                Ok(comment) => comments.push(comment),
                Err(e) => warn!("skipping corrupt comment {}: {}", entry.key, e),
            }
        }
        Ok(comments)
    }

    pub async fn delete_comment(
        &self,
        tenant: &str,
        type_name: &str,
        content_id: &str,
        state: State,
        id: &str,
    ) -> Result<()> {
        let key = self.keys.comment_key(tenant, type_name, content_id, state, id);
        self.backend.delete(&key, None).await
    }

    /// Delete every comment on an item in a state. Sequential and best
    /// effort: individual delete failures are logged, and the call
    /// succeeds as long as the listing did.
    pub async fn delete_all(
        &self,
        tenant: &str,
        type_name: &str,
        content_id: &str,
        state: State,
    ) -> Result<()> {
        let comments = self
            .list_comments(tenant, type_name, content_id, state)
            .await?;
        for comment in comments {
            if let Err(e) = self
                .delete_comment(tenant, type_name, content_id, state, &comment.id)
                .await
            {
                error!("failed to delete comment {}: {}", comment.id, e);
            }
        }
        Ok(())
    }

    /// True when any comment on the item in the state is unresolved.
    pub async fn has_unresolved(
        &self,
        tenant: &str,
        type_name: &str,
        content_id: &str,
        state: State,
    ) -> Result<bool> {
        let comments = self
            .list_comments(tenant, type_name, content_id, state)
            .await?;
        Ok(comments.iter().any(|c| !c.resolved))
    }
}
