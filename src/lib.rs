// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod config;
pub mod error;
pub mod gateway;
pub mod models;
pub mod store;
pub mod sync;
pub mod utils;

pub use config::{Config, ConnectionConfig, GatewayConfig, GatewayKind, SyncConfig};
pub use error::{Result, SyncError};
pub use gateway::{FileGateway, HttpGateway, RemoteRepositoryGateway};
pub use models::{BatchOperation, ChangeSet, RepositoryInfo, RepositoryToggle};
pub use store::{RepositoryEdit, RepositoryStore};
pub use sync::{SessionState, SubmissionHandle, SubmitOutcome, SyncController};
pub use utils::{OperationTimer, Validator};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[test]
    fn test_library_exports() {
        let _config = Config::default_config();
        let _store = RepositoryStore::new("local");
    }

    #[tokio::test]
    async fn test_session_against_file_gateway() {
        let dir = tempdir().unwrap();
        let gateway = Arc::new(FileGateway::new(dir.path().join("registry.json")));
        gateway
            .seed(
                "local",
                vec![
                    RepositoryInfo::new("https://example.com/a.json", "A"),
                    RepositoryInfo::new("https://example.com/b.json", "B")
                        .with_enabled(false)
                        .protected(),
                ],
            )
            .await
            .unwrap();

        let timeout = Config::default_config().sync.remote_call_timeout();
        let controller = SyncController::new(gateway.clone(), timeout);

        let mut store = controller.begin_sync("local").await.unwrap();
        store.set_enabled("https://example.com/b.json", true).unwrap();
        store.remove("https://example.com/a.json").unwrap();
        controller.commit("local", &store).unwrap().wait().await.unwrap();

        let reopened = controller.begin_sync("local").await.unwrap();
        assert!(!reopened.has_changes());
        assert_eq!(reopened.working().len(), 1);
        assert!(reopened.working()[0].enabled);
    }
}
