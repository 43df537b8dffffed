// file: src/gateway/file.rs
// description: JSON file backed repository registry keyed by connection id
// reference: https://docs.rs/tokio/latest/tokio/fs

use crate::error::{Result, SyncError};
use crate::gateway::RemoteRepositoryGateway;
use crate::models::{ChangeSet, RepositoryInfo};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegistryDocument {
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    connections: BTreeMap<String, Vec<RepositoryInfo>>,
}

pub struct FileGateway {
    path: PathBuf,
    // serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl FileGateway {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    /// Replaces the stored list for a connection.
    pub async fn seed(&self, connection_id: &str, repositories: Vec<RepositoryInfo>) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut document = self.read().await?;
        document
            .connections
            .insert(connection_id.to_string(), repositories);
        self.write(&mut document).await
    }

    async fn read(&self) -> Result<RegistryDocument> {
        let exists = fs::try_exists(&self.path).await.map_err(|e| {
            SyncError::gateway(format!("Failed to inspect {}: {}", self.path.display(), e))
        })?;
        if !exists {
            debug!("No registry file at {:?}, starting empty", self.path);
            return Ok(RegistryDocument::default());
        }

        let contents = fs::read_to_string(&self.path).await.map_err(|e| {
            SyncError::gateway(format!("Failed to read {}: {}", self.path.display(), e))
        })?;

        serde_json::from_str(&contents).map_err(|e| {
            SyncError::gateway(format!("Failed to parse {}: {}", self.path.display(), e))
        })
    }

    async fn write(&self, document: &mut RegistryDocument) -> Result<()> {
        document.updated_at = Some(Utc::now());

        let contents = serde_json::to_string_pretty(document)
            .map_err(|e| SyncError::gateway(format!("Failed to serialize registry: {}", e)))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    SyncError::gateway(format!("Failed to create {}: {}", parent.display(), e))
                })?;
            }
        }

        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, contents).await.map_err(|e| {
            SyncError::gateway(format!("Failed to write {}: {}", staging.display(), e))
        })?;
        fs::rename(&staging, &self.path).await.map_err(|e| {
            SyncError::gateway(format!("Failed to replace {}: {}", self.path.display(), e))
        })?;

        Ok(())
    }
}

/// Produces the new list, or an error if any part of the change set does not
/// apply cleanly to `current`.
fn apply_changes(current: &[RepositoryInfo], changes: &ChangeSet) -> Result<Vec<RepositoryInfo>> {
    let mut next = current.to_vec();

    for removal in &changes.removals {
        let index = next
            .iter()
            .position(|r| r.url == removal.url)
            .ok_or_else(|| SyncError::gateway(format!("cannot remove unknown repository {}", removal.url)))?;
        if next[index].is_protected {
            return Err(SyncError::gateway(format!(
                "repository {} is protected",
                removal.url
            )));
        }
        next.remove(index);
    }

    for addition in &changes.additions {
        if next.iter().any(|r| r.url == addition.url) {
            return Err(SyncError::gateway(format!(
                "repository {} already exists",
                addition.url
            )));
        }
        next.push(addition.clone());
    }

    for toggle in &changes.toggles {
        let entry = next
            .iter_mut()
            .find(|r| r.url == toggle.url)
            .ok_or_else(|| SyncError::gateway(format!("cannot toggle unknown repository {}", toggle.url)))?;
        entry.enabled = toggle.enabled;
    }

    Ok(next)
}

#[async_trait]
impl RemoteRepositoryGateway for FileGateway {
    async fn list(&self, connection_id: &str) -> Result<Vec<RepositoryInfo>> {
        let _guard = self.lock.lock().await;
        let document = self.read().await?;
        Ok(document
            .connections
            .get(connection_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn update(&self, connection_id: &str, changes: &ChangeSet) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut document = self.read().await?;

        let current = document
            .connections
            .get(connection_id)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let next = apply_changes(current, changes)?;

        document.connections.insert(connection_id.to_string(), next);
        self.write(&mut document).await?;

        info!(
            "Stored {} for connection {} in {}",
            changes.summary(),
            connection_id,
            self.path.display()
        );
        Ok(())
    }
}
