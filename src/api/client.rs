use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::types::{EndpointStatus, ProbeError};
use crate::settings::EndpointConfig;

/// Request timeout for the status probe in seconds
pub const PROBE_TIMEOUT_SECS: u64 = 10;

/// Path suffix of the Anthropic-compatible serving base URL
pub const SERVING_SUFFIX: &str = "/serving-endpoints/anthropic";

/// CLI version (from Cargo.toml)
const DEFAULT_VERSION: &str = env!("CARGO_PKG_VERSION");

fn build_user_agent() -> String {
    format!("endpoint-check/{}", DEFAULT_VERSION)
}

/// Base URL with all trailing slashes removed.
pub fn normalize_base_url(base_url: &str) -> &str {
    base_url.trim_end_matches('/')
}

/// Recover the workspace root from the configured base URL.
///
/// `https://ws.cloud.databricks.com/serving-endpoints/anthropic/`
/// becomes `https://ws.cloud.databricks.com`.
pub fn workspace_root(base_url: &str) -> &str {
    let base = normalize_base_url(base_url);
    base.strip_suffix(SERVING_SUFFIX).unwrap_or(base)
}

/// Status API URL for `model` under `workspace_root`.
pub fn endpoint_status_url(workspace_root: &str, model: &str) -> Result<Url> {
    let mut url = Url::parse(workspace_root)
        .with_context(|| format!("Invalid workspace URL: {}", workspace_root))?;

    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("Workspace URL cannot be a base: {}", workspace_root))?
        .pop_if_empty()
        .extend(["api", "2.0", "serving-endpoints", model]);

    Ok(url)
}

/// Client for the serving-endpoints status API
pub struct ServingClient {
    client: Client,
    user_agent: String,
    timeout_secs: u64,
}

impl ServingClient {
    /// Create a client with the default probe timeout
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(PROBE_TIMEOUT_SECS))
    }

    /// Create a client with a custom request timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            user_agent: build_user_agent(),
            timeout_secs: timeout.as_secs().max(1),
        })
    }

    /// Fetch the state of the configured serving endpoint.
    ///
    /// Sends exactly one GET; there are no retries.
    pub async fn endpoint_status(
        &self,
        config: &EndpointConfig,
    ) -> Result<EndpointStatus, ProbeError> {
        let root = workspace_root(&config.base_url);
        let url = endpoint_status_url(root, &config.model)
            .map_err(|e| ProbeError::Unexpected(format!("{:#}", e)))?;

        debug!("=== Endpoint Status Request ===");
        debug!("URL: {}", url);
        debug!("Timeout: {}s", self.timeout_secs);

        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", config.auth_token))
            .header("Content-Type", "application/json")
            .header("User-Agent", &self.user_agent)
            .send()
            .await
            .map_err(|e| ProbeError::from_reqwest(e, self.timeout_secs))?;

        let status = response.status();
        debug!("=== Endpoint Status Response ===");
        debug!("Status: {}", status);

        let body = response
            .text()
            .await
            .map_err(|e| ProbeError::from_reqwest(e, self.timeout_secs))?;

        if status != StatusCode::OK {
            debug!("Endpoint status request failed with status {}", status);
            return Err(ProbeError::from_status(
                status.as_u16(),
                &body,
                &config.model,
            ));
        }

        let payload: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| ProbeError::Unexpected(format!("Failed to parse response: {}", e)))?;

        Ok(EndpointStatus::from_payload(&payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn config_for(base_url: String, model: &str) -> EndpointConfig {
        EndpointConfig {
            base_url,
            auth_token: "test-token".to_string(),
            model: model.to_string(),
        }
    }

    #[test]
    fn test_workspace_root_strips_serving_suffix() {
        assert_eq!(
            workspace_root("https://ws.cloud.databricks.com/serving-endpoints/anthropic"),
            "https://ws.cloud.databricks.com"
        );
        assert_eq!(
            workspace_root("https://ws.cloud.databricks.com/serving-endpoints/anthropic/"),
            "https://ws.cloud.databricks.com"
        );
    }

    #[test]
    fn test_workspace_root_without_suffix() {
        assert_eq!(
            workspace_root("https://ws.cloud.databricks.com/"),
            "https://ws.cloud.databricks.com"
        );
        assert_eq!(
            workspace_root("https://ws.cloud.databricks.com/serving-endpoints"),
            "https://ws.cloud.databricks.com/serving-endpoints"
        );
    }

    #[test]
    fn test_repeated_trailing_slashes_are_stripped() {
        assert_eq!(
            workspace_root("https://ws.example.com/serving-endpoints/anthropic//"),
            "https://ws.example.com"
        );
        assert_eq!(
            workspace_root("https://ws.example.com///"),
            "https://ws.example.com"
        );
        assert_eq!(
            normalize_base_url("https://ws.example.com//"),
            "https://ws.example.com"
        );
    }

    #[test]
    fn test_endpoint_status_url() {
        let url = endpoint_status_url("https://ws.cloud.databricks.com", "claude-sonnet").unwrap();
        assert_eq!(
            url.as_str(),
            "https://ws.cloud.databricks.com/api/2.0/serving-endpoints/claude-sonnet"
        );

        assert!(endpoint_status_url("not a url", "m").is_err());
    }

    #[tokio::test]
    async fn test_endpoint_status_ready() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/2.0/serving-endpoints/claude-sonnet")
                    .header("Authorization", "Bearer test-token");
                then.status(200)
                    .json_body(json!({"state": {"config_update": {"state": "READY"}}}));
            })
            .await;

        let client = ServingClient::new().unwrap();
        let config = config_for(
            format!("{}{}", server.base_url(), SERVING_SUFFIX),
            "claude-sonnet",
        );
        let status = client.endpoint_status(&config).await.unwrap();

        mock.assert_async().await;
        assert_eq!(status.state, "READY");
    }

    #[tokio::test]
    async fn test_endpoint_status_unauthorized() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/2.0/serving-endpoints/m");
                then.status(401).body("unauthorized");
            })
            .await;

        let client = ServingClient::new().unwrap();
        let err = client
            .endpoint_status(&config_for(server.base_url(), "m"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::Unauthorized));
    }

    #[tokio::test]
    async fn test_endpoint_status_server_error_echoes_body() {
        let server = MockServer::start_async().await;
        let body = "x".repeat(500);
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/2.0/serving-endpoints/m");
                then.status(503).body(body.as_str());
            })
            .await;

        let client = ServingClient::new().unwrap();
        let err = client
            .endpoint_status(&config_for(server.base_url(), "m"))
            .await
            .unwrap_err();
        match err {
            ProbeError::Http { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body.len(), 200);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_endpoint_status_invalid_json_is_unexpected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/2.0/serving-endpoints/m");
                then.status(200).body("<html>login</html>");
            })
            .await;

        let client = ServingClient::new().unwrap();
        let err = client
            .endpoint_status(&config_for(server.base_url(), "m"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::Unexpected(_)));
    }

    #[tokio::test]
    async fn test_endpoint_status_timeout() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/2.0/serving-endpoints/m");
                then.status(200)
                    .delay(Duration::from_secs(3))
                    .json_body(json!({}));
            })
            .await;

        let client = ServingClient::with_timeout(Duration::from_millis(200)).unwrap();
        let err = client
            .endpoint_status(&config_for(server.base_url(), "m"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_endpoint_status_connection_refused() {
        let client = ServingClient::new().unwrap();
        let err = client
            .endpoint_status(&config_for("http://127.0.0.1:1".to_string(), "m"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::Connection(_)));
    }

    #[tokio::test]
    async fn test_endpoint_status_invalid_base_url() {
        let client = ServingClient::new().unwrap();
        let err = client
            .endpoint_status(&config_for("ws.example.com".to_string(), "m"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::Unexpected(_)));
    }
}
