// file: src/error.rs
// description: Error taxonomy for local edits, remote calls and session state
// reference: https://docs.rs/thiserror

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Repository already present: {url}")]
    DuplicateEntry { url: String },

    #[error("Repository is protected and cannot be removed: {url}")]
    ProtectedEntry { url: String },

    #[error("Repository not found: {url}")]
    NotFound { url: String },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("A sync operation is already in progress for connection {connection_id}")]
    SyncInProgress { connection_id: String },

    #[error("Failed to fetch template sources: {cause}")]
    Fetch { cause: String },

    #[error("Failed to update template sources: {cause}")]
    Update { cause: String },

    #[error("Gateway error: {cause}")]
    Gateway { cause: String },

    #[error("Remote call timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SyncError {
    pub fn gateway(cause: impl Into<String>) -> Self {
        SyncError::Gateway {
            cause: cause.into(),
        }
    }

    /// Local model violations never reach the remote layer.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            SyncError::DuplicateEntry { .. }
                | SyncError::ProtectedEntry { .. }
                | SyncError::NotFound { .. }
        )
    }

    /// Underlying message of a remote failure, without the variant prefix.
    fn remote_cause(self) -> std::result::Result<String, Self> {
        match self {
            SyncError::Timeout { .. } | SyncError::Cancelled => Err(self),
            SyncError::Gateway { cause }
            | SyncError::Fetch { cause }
            | SyncError::Update { cause } => Ok(cause),
            other => Ok(other.to_string()),
        }
    }

    /// Re-labels any failure observed while listing, except timeouts and
    /// cancellation.
    pub(crate) fn into_fetch(self) -> Self {
        self.remote_cause()
            .map(|cause| SyncError::Fetch { cause })
            .unwrap_or_else(|kept| kept)
    }

    /// Re-labels any failure observed while submitting, except timeouts and
    /// cancellation.
    pub(crate) fn into_update(self) -> Self {
        self.remote_cause()
            .map(|cause| SyncError::Update { cause })
            .unwrap_or_else(|kept| kept)
    }
}
