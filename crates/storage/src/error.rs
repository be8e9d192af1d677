use thiserror::Error;

/// Error kinds shared by every storage-facing component.
///
/// The variants are deliberately coarse: callers branch on the kind, not
/// on backend-specific detail, so alternate backends map their own
/// failures onto the same set.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    #[error("cannot transition: unresolved comments on {0} content")]
    Gated(String),

    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("storage backend not configured")]
    NotConfigured,

    #[error("corrupt record at {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

impl StorageError {
    /// True when the error means "the key or record is absent".
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;
