// file: src/gateway/http.rs
// description: REST client for a remote template repository registry
// reference: https://docs.rs/reqwest

use crate::config::ConnectionConfig;
use crate::error::{Result, SyncError};
use crate::gateway::RemoteRepositoryGateway;
use crate::models::{BatchOperation, ChangeSet, RepositoryInfo};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use std::collections::HashMap;
use tracing::debug;

const REPOSITORIES_PATH: &str = "/api/v1/templates/repositories";
const BATCH_PATH: &str = "/api/v1/batch/templates/repositories";

pub struct HttpGateway {
    client: Client,
    connections: HashMap<String, ConnectionConfig>,
}

impl HttpGateway {
    pub fn new(connections: HashMap<String, ConnectionConfig>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("template_sync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SyncError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            connections,
        })
    }

    fn connection(&self, connection_id: &str) -> Result<&ConnectionConfig> {
        self.connections.get(connection_id).ok_or_else(|| {
            SyncError::gateway(format!("no base URL configured for connection {}", connection_id))
        })
    }

    fn endpoint(connection: &ConnectionConfig, path: &str) -> String {
        format!("{}{}", connection.base_url.trim_end_matches('/'), path)
    }

    fn authorize(request: RequestBuilder, connection: &ConnectionConfig) -> RequestBuilder {
        match &connection.token {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    async fn check_status(response: Response) -> Result<Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(SyncError::gateway(format!(
            "request failed with status {}: {}",
            status, error_text
        )))
    }
}

#[async_trait]
impl RemoteRepositoryGateway for HttpGateway {
    async fn list(&self, connection_id: &str) -> Result<Vec<RepositoryInfo>> {
        let connection = self.connection(connection_id)?;
        let url = Self::endpoint(connection, REPOSITORIES_PATH);
        debug!("Listing template repositories from {}", url);

        let request = Self::authorize(self.client.get(&url), connection);
        let response = request
            .send()
            .await
            .map_err(|e| SyncError::gateway(e.to_string()))?;
        let response = Self::check_status(response).await?;

        response
            .json::<Vec<RepositoryInfo>>()
            .await
            .map_err(|e| SyncError::gateway(format!("Failed to parse repository list: {}", e)))
    }

    async fn update(&self, connection_id: &str, changes: &ChangeSet) -> Result<()> {
        let connection = self.connection(connection_id)?;
        let url = Self::endpoint(connection, BATCH_PATH);
        let operations: Vec<BatchOperation> = changes.operations();
        debug!("Submitting {} batch operations to {}", operations.len(), url);

        let request = Self::authorize(self.client.patch(&url), connection).json(&operations);
        let response = request
            .send()
            .await
            .map_err(|e| SyncError::gateway(e.to_string()))?;
        Self::check_status(response).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RepositoryToggle;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway_for(server: &MockServer, token: Option<&str>) -> HttpGateway {
        let mut connections = HashMap::new();
        connections.insert(
            "remote".to_string(),
            ConnectionConfig {
                base_url: format!("{}/", server.uri()),
                token: token.map(str::to_string),
            },
        );
        HttpGateway::new(connections).unwrap()
    }

    #[tokio::test]
    async fn test_list_parses_repositories() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(REPOSITORIES_PATH))
            .and(header("Authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"url": "a", "name": "A", "enabled": true, "protected": true},
                {"url": "b", "name": "B", "enabled": false}
            ])))
            .mount(&server)
            .await;

        let repos = gateway_for(&server, Some("secret")).list("remote").await.unwrap();
        assert_eq!(repos.len(), 2);
        assert!(repos[0].is_protected);
        assert!(!repos[1].enabled);
    }

    #[tokio::test]
    async fn test_update_sends_batch_operations() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path(BATCH_PATH))
            .and(body_json(serde_json::json!([
                {"op": "enable", "url": "b"}
            ])))
            .respond_with(ResponseTemplate::new(207))
            .expect(1)
            .mount(&server)
            .await;

        let changes = ChangeSet {
            toggles: vec![RepositoryToggle {
                url: "b".into(),
                enabled: true,
            }],
            ..ChangeSet::default()
        };
        gateway_for(&server, None)
            .update("remote", &changes)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_server_error_is_gateway_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(REPOSITORIES_PATH))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = gateway_for(&server, None).list("remote").await.unwrap_err();
        match err {
            SyncError::Gateway { cause } => {
                assert!(cause.contains("500"));
                assert!(cause.contains("boom"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_connection() {
        let gateway = HttpGateway::new(HashMap::new()).unwrap();
        let err = gateway.list("nowhere").await.unwrap_err();
        assert!(matches!(err, SyncError::Gateway { .. }));
    }
}
