use chrono::Utc;
use tracing::error;

use storage::{Result, StorageError};

use crate::comments::CommentStore;
use crate::history::HistoryLog;
use crate::store::ContentStore;
use crate::types::{ContentItem, EventKind, HistoryRecord, State};
use crate::webhooks::EventEmitter;

/// Legal workflow edges. Live is only ever a target; taking content out
/// of live is delete-and-recreate, not a transition.
const EDGES: &[(State, State)] = &[
    (State::Draft, State::Pending),
    (State::Draft, State::Live),
    (State::Pending, State::Live),
    (State::Pending, State::Draft),
];

fn edge_allowed(from: State, to: State) -> bool {
    EDGES.contains(&(from, to))
}

/// Executes state transitions: the only legitimate way to move content
/// bytes between workflow states.
///
/// A transition is copy-then-delete: once the target write has
/// succeeded, every later step (source delete, comment cleanup, history
/// record, webhook) is best effort, so a partial failure always leaves
/// the item visible in the target state rather than the source.
#[derive(Clone)]
pub struct WorkflowEngine {
    store: ContentStore,
    comments: CommentStore,
    history: HistoryLog,
    emitter: EventEmitter,
}

impl WorkflowEngine {
    pub(crate) fn new(
        store: ContentStore,
        comments: CommentStore,
        history: HistoryLog,
        emitter: EventEmitter,
    ) -> Self {
        Self { store, comments, history, emitter }
    }

    /// Move an item from `from` to `to`.
    ///
    /// Fails with `InvalidTransition` for an illegal edge, `Gated` when
    /// the source state carries unresolved comments, and `NotFound` when
    /// the item does not exist in the source state. On a publish
    /// (`to == live`) the returned item carries the new version id, a
    /// history record is written with `author`/`message`, and a publish
    /// event is emitted.
    #[allow(clippy::too_many_arguments)]
    pub async fn transition(
        &self,
        tenant: &str,
        type_name: &str,
        id: &str,
        ext: &str,
        from: State,
        to: State,
        author: &str,
        message: &str,
    ) -> Result<ContentItem> {
        if from == to {
            return Err(StorageError::InvalidTransition(
                "source and target states are the same".to_string(),
            ));
        }
        if !edge_allowed(from, to) {
            return Err(StorageError::InvalidTransition(format!(
                "{from} -> {to} is not a permitted transition"
            )));
        }

        // Unresolved review comments block the item from leaving the
        // state they were written against.
        if self.comments.has_unresolved(tenant, type_name, id, from).await? {
            return Err(StorageError::Gated(from.to_string()));
        }

        // Transitions are buffered, not streamed; they are not a
        // large-blob fast path.
        let source = self.store.get(tenant, type_name, id, ext, from).await?;

        // Parent version for the history record, read before the target
        // write lands. Failures degrade to an empty parent.
        let parent = if to.is_live() {
            self.history
                .latest_version(tenant, type_name, id)
                .await
                .unwrap_or_default()
        } else {
            String::new()
        };

        let target = self
            .store
            .put(
                tenant,
                type_name,
                id,
                ext,
                source.content,
                &source.content_type,
                to,
                None,
            )
            .await?;

        // The target state is already visible; from here on nothing may
        // fail the transition.
        if let Err(e) = self.store.delete(tenant, type_name, id, ext, from).await {
            error!("failed to delete content from {} state: {}", from, e);
        }

        if let Err(e) = self.comments.delete_all(tenant, type_name, id, from).await {
            error!("failed to delete comments from {} state: {}", from, e);
        }

        if to.is_live() {
            let record = HistoryRecord {
                version: target.version_id.clone(),
                parent,
                author: author.to_string(),
                message: message.to_string(),
                timestamp: target.last_modified.unwrap_or_else(Utc::now),
                size: target.size,
            };
            if let Err(e) = self.history.put_record(tenant, type_name, id, &record).await {
                error!("failed to write history record for {}/{}: {}", type_name, id, e);
            }

            self.emitter
                .emit(tenant, EventKind::Publish, type_name, id, &target.content_type);
        }

        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_table() {
        assert!(edge_allowed(State::Draft, State::Pending));
        assert!(edge_allowed(State::Draft, State::Live));
        assert!(edge_allowed(State::Pending, State::Live));
        assert!(edge_allowed(State::Pending, State::Draft));

        assert!(!edge_allowed(State::Live, State::Draft));
        assert!(!edge_allowed(State::Live, State::Pending));
        assert!(!edge_allowed(State::Draft, State::Draft));
        assert!(!edge_allowed(State::Live, State::Live));
    }
}
