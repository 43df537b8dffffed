// file: src/sync/submission.rs
// description: handle to an asynchronous change set submission
// reference: https://docs.rs/tokio/latest/tokio/task

use crate::error::{Result, SyncError};
use crate::models::ChangeSet;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmitOutcome {
    NoChanges,
    Applied {
        additions: usize,
        removals: usize,
        toggles: usize,
    },
}

impl SubmitOutcome {
    pub fn applied(changes: &ChangeSet) -> Self {
        SubmitOutcome::Applied {
            additions: changes.additions.len(),
            removals: changes.removals.len(),
            toggles: changes.toggles.len(),
        }
    }
}

enum Pending {
    Ready(Result<SubmitOutcome>),
    Running(JoinHandle<Result<SubmitOutcome>>),
}

pub struct SubmissionHandle {
    id: Uuid,
    connection_id: String,
    cancel: CancellationToken,
    pending: Pending,
}

impl SubmissionHandle {
    pub(crate) fn ready(connection_id: &str, outcome: Result<SubmitOutcome>) -> Self {
        Self {
            id: Uuid::new_v4(),
            connection_id: connection_id.to_string(),
            cancel: CancellationToken::new(),
            pending: Pending::Ready(outcome),
        }
    }

    pub(crate) fn running(
        id: Uuid,
        connection_id: &str,
        cancel: CancellationToken,
        task: JoinHandle<Result<SubmitOutcome>>,
    ) -> Self {
        Self {
            id,
            connection_id: connection_id.to_string(),
            cancel,
            pending: Pending::Running(task),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    /// Requests cancellation of the in-flight update. The handle still
    /// resolves, to `Cancelled` unless the update already finished.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        match &self.pending {
            Pending::Ready(_) => true,
            Pending::Running(task) => task.is_finished(),
        }
    }

    pub async fn wait(self) -> Result<SubmitOutcome> {
        match self.pending {
            Pending::Ready(outcome) => outcome,
            Pending::Running(task) => match task.await {
                Ok(outcome) => outcome,
                Err(e) if e.is_cancelled() => Err(SyncError::Cancelled),
                Err(e) => Err(SyncError::Update {
                    cause: format!("submission task failed: {}", e),
                }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ready_handle_resolves_immediately() {
        let handle = SubmissionHandle::ready("local", Ok(SubmitOutcome::NoChanges));
        assert!(handle.is_finished());
        assert_eq!(handle.connection_id(), "local");
        assert_eq!(handle.wait().await.unwrap(), SubmitOutcome::NoChanges);
    }

    #[tokio::test]
    async fn test_aborted_task_resolves_to_cancelled() {
        let task = tokio::spawn(async {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
            Ok(SubmitOutcome::NoChanges)
        });
        task.abort();

        let handle =
            SubmissionHandle::running(Uuid::new_v4(), "local", CancellationToken::new(), task);
        assert!(matches!(handle.wait().await, Err(SyncError::Cancelled)));
    }
}
