// file: src/gateway/mod.rs
// description: remote repository registry contract and its implementations
// reference: internal module structure

pub mod file;
pub mod http;

pub use file::FileGateway;
pub use http::HttpGateway;

use crate::config::{Config, GatewayKind};
use crate::error::Result;
use crate::models::{ChangeSet, RepositoryInfo};
use async_trait::async_trait;
use std::sync::Arc;

/// Listing and update calls against the service that owns the durable
/// repository list for a connection.
///
/// `update` must apply a change set all-or-nothing. Any error is treated by
/// callers as "nothing applied".
#[async_trait]
pub trait RemoteRepositoryGateway: Send + Sync {
    async fn list(&self, connection_id: &str) -> Result<Vec<RepositoryInfo>>;

    async fn update(&self, connection_id: &str, changes: &ChangeSet) -> Result<()>;
}

pub fn from_config(config: &Config) -> Result<Arc<dyn RemoteRepositoryGateway>> {
    let gateway: Arc<dyn RemoteRepositoryGateway> = match config.gateway.kind {
        GatewayKind::File => Arc::new(FileGateway::new(config.gateway.registry_path.clone())),
        GatewayKind::Http => Arc::new(HttpGateway::new(config.gateway.connections.clone())?),
    };
    Ok(gateway)
}
