// file: src/sync/controller.rs
// description: single-flight fetch, edit and submit workflow per connection
// reference: orchestrates asynchronous registry synchronization

use crate::error::{Result, SyncError};
use crate::gateway::RemoteRepositoryGateway;
use crate::store::RepositoryStore;
use crate::sync::submission::{SubmissionHandle, SubmitOutcome};
use crate::utils::OperationTimer;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Fetching,
    Editing,
    Submitting,
}

impl SessionState {
    fn is_busy(self) -> bool {
        matches!(self, SessionState::Fetching | SessionState::Submitting)
    }
}

type SessionMap = Arc<Mutex<HashMap<String, SessionState>>>;

fn lock_sessions(sessions: &SessionMap) -> MutexGuard<'_, HashMap<String, SessionState>> {
    sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn set_state(sessions: &SessionMap, connection_id: &str, state: SessionState) {
    let mut map = lock_sessions(sessions);
    if state == SessionState::Idle {
        map.remove(connection_id);
    } else {
        map.insert(connection_id.to_string(), state);
    }
}

/// Returns a connection to `Idle` when a remote call ends without reaching
/// its success transition, including when the owning future is dropped.
struct SessionGuard {
    sessions: SessionMap,
    connection_id: String,
    submitting: Option<Arc<AtomicBool>>,
    settled: bool,
}

impl SessionGuard {
    fn new(sessions: SessionMap, connection_id: &str) -> Self {
        Self {
            sessions,
            connection_id: connection_id.to_string(),
            submitting: None,
            settled: false,
        }
    }

    fn with_submission_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        flag.store(true, Ordering::SeqCst);
        self.submitting = Some(flag);
        self
    }

    fn settle(mut self, state: SessionState) {
        self.release(state);
    }

    fn release(&mut self, state: SessionState) {
        if self.settled {
            return;
        }
        self.settled = true;
        if let Some(flag) = &self.submitting {
            flag.store(false, Ordering::SeqCst);
        }
        set_state(&self.sessions, &self.connection_id, state);
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.release(SessionState::Idle);
    }
}

async fn with_timeout<T>(timeout: Duration, call: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::time::timeout(timeout, call)
        .await
        .map_err(|_| SyncError::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        })?
}

#[derive(Clone)]
pub struct SyncController {
    gateway: Arc<dyn RemoteRepositoryGateway>,
    remote_call_timeout: Duration,
    sessions: SessionMap,
}

impl SyncController {
    pub fn new(gateway: Arc<dyn RemoteRepositoryGateway>, remote_call_timeout: Duration) -> Self {
        Self {
            gateway,
            remote_call_timeout,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn state(&self, connection_id: &str) -> SessionState {
        lock_sessions(&self.sessions)
            .get(connection_id)
            .copied()
            .unwrap_or(SessionState::Idle)
    }

    pub async fn begin_sync(&self, connection_id: &str) -> Result<RepositoryStore> {
        self.begin_sync_with_cancel(connection_id, CancellationToken::new())
            .await
    }

    /// Fetches the repository list and opens an edit session on it.
    ///
    /// No store is produced on failure, and the connection returns to `Idle`
    /// on failure, timeout, cancellation or if this future is dropped.
    pub async fn begin_sync_with_cancel(
        &self,
        connection_id: &str,
        cancel: CancellationToken,
    ) -> Result<RepositoryStore> {
        self.enter(connection_id, SessionState::Fetching)?;
        let guard = SessionGuard::new(Arc::clone(&self.sessions), connection_id);

        info!("Fetching template sources for connection {}", connection_id);
        let timer = OperationTimer::new("list template sources");

        let listed = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(SyncError::Cancelled),
            listed = with_timeout(self.remote_call_timeout, self.gateway.list(connection_id)) => listed,
        };

        let repositories = match listed {
            Ok(repositories) => repositories,
            Err(e) => {
                warn!(
                    "Fetching template sources for {} failed: {}",
                    connection_id, e
                );
                return Err(e.into_fetch());
            }
        };
        timer.warn_if_slow(self.remote_call_timeout / 2);
        timer.finish_with_count(repositories.len());

        let mut store = RepositoryStore::new(connection_id);
        store.load(repositories).map_err(|e| SyncError::Fetch {
            cause: e.to_string(),
        })?;

        guard.settle(SessionState::Editing);
        Ok(store)
    }

    /// Submits the store's pending changes in a background task.
    ///
    /// An empty diff resolves immediately to `NoChanges`. A failed submission
    /// leaves the store untouched so the same edits can be committed again; a
    /// successful one marks it committed, and it must be reloaded before the
    /// next commit.
    pub fn commit(&self, connection_id: &str, store: &RepositoryStore) -> Result<SubmissionHandle> {
        if store.connection_id() != connection_id {
            return Err(SyncError::InvalidState(format!(
                "store belongs to connection {}, not {}",
                store.connection_id(),
                connection_id
            )));
        }

        if store.is_committed() {
            return Err(SyncError::InvalidState(format!(
                "changes for {} were already committed; begin a new sync first",
                connection_id
            )));
        }

        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            SyncError::InvalidState("commit requires a running tokio runtime".to_string())
        })?;

        let changes = store.diff();
        {
            let mut map = lock_sessions(&self.sessions);
            let current = map
                .get(connection_id)
                .copied()
                .unwrap_or(SessionState::Idle);
            if current.is_busy() {
                return Err(SyncError::SyncInProgress {
                    connection_id: connection_id.to_string(),
                });
            }

            if changes.is_empty() {
                map.remove(connection_id);
                info!("No template source changes to submit for {}", connection_id);
                return Ok(SubmissionHandle::ready(
                    connection_id,
                    Ok(SubmitOutcome::NoChanges),
                ));
            }

            map.insert(connection_id.to_string(), SessionState::Submitting);
        }

        let guard = SessionGuard::new(Arc::clone(&self.sessions), connection_id)
            .with_submission_flag(store.submission_flag());

        let submission_id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        let gateway = Arc::clone(&self.gateway);
        let timeout = self.remote_call_timeout;
        let task_cancel = cancel.clone();
        let task_connection = connection_id.to_string();
        let committed = store.commit_flag();

        info!(
            "Submitting template source changes for {} ({}) [{}]",
            connection_id,
            changes.summary(),
            submission_id
        );

        let task = runtime.spawn(async move {
            let timer = OperationTimer::new("update template sources");

            let updated = tokio::select! {
                biased;
                _ = task_cancel.cancelled() => Err(SyncError::Cancelled),
                updated = with_timeout(timeout, gateway.update(&task_connection, &changes)) => updated,
            };

            timer.warn_if_slow(timeout / 2);
            if updated.is_ok() {
                committed.store(true, Ordering::SeqCst);
            }
            // the session is idle again before the handle observes the outcome
            guard.settle(SessionState::Idle);

            match updated {
                Ok(()) => {
                    timer.finish_with_count(changes.len());
                    info!(
                        "Template sources updated for {} [{}]",
                        task_connection, submission_id
                    );
                    Ok(SubmitOutcome::applied(&changes))
                }
                Err(e) => {
                    warn!(
                        "Updating template sources for {} failed [{}]: {}",
                        task_connection, submission_id, e
                    );
                    Err(e.into_update())
                }
            }
        });

        Ok(SubmissionHandle::running(
            submission_id,
            connection_id,
            cancel,
            task,
        ))
    }

    fn enter(&self, connection_id: &str, next: SessionState) -> Result<()> {
        let mut map = lock_sessions(&self.sessions);
        let current = map
            .get(connection_id)
            .copied()
            .unwrap_or(SessionState::Idle);
        if current.is_busy() {
            return Err(SyncError::SyncInProgress {
                connection_id: connection_id.to_string(),
            });
        }
        map.insert(connection_id.to_string(), next);
        Ok(())
    }
}
