//! Monitor backend client.
//!
//! [`MonitorApi`] is the seam between the snapshot engine and the network:
//! it fetches the bulk snapshot and re-tests single endpoints, translating
//! transport and payload problems into [`MonitorError`]. It never touches the
//! engine's snapshot. [`HttpMonitorClient`] is the reqwest implementation.

mod error;
mod wire;

pub use error::*;

use crate::config::MonitorConfig;
use crate::params::ParameterSet;
use crate::session::{Role, SessionContext};
use crate::snapshot::{MonitorSnapshot, MonitoredEndpoint, StatusPolicy};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Instant;

/// Backend operations the snapshot engine depends on.
///
/// Object-safe; the engine holds it as `Arc<dyn MonitorApi>`.
#[async_trait]
pub trait MonitorApi: Send + Sync + 'static {
    /// Fetch the full monitor feed.
    ///
    /// # Errors
    ///
    /// - `Unauthenticated` if the session is incomplete (no request is made)
    /// - `Transport` on network failure or non-2xx
    /// - `MalformedResponse` if `summary` or `details` is missing or invalid
    async fn fetch_snapshot(
        &self,
        session: &SessionContext,
        params: &ParameterSet,
    ) -> Result<MonitorSnapshot, MonitorError>;

    /// Re-test one endpoint now and return its updated row.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`MonitorApi::fetch_snapshot`], scoped to the one endpoint.
    async fn test_endpoint(
        &self,
        session: &SessionContext,
        params: &ParameterSet,
        key: &str,
    ) -> Result<MonitoredEndpoint, MonitorError>;
}

/// Build `base` + path segments, percent-encoding each segment.
pub(crate) fn join_url(base: &str, segments: &[&str]) -> Result<reqwest::Url, MonitorError> {
    let mut url = reqwest::Url::parse(base)
        .map_err(|e| MonitorError::transport(None, format!("invalid base URL '{}': {}", base, e)))?;
    url.path_segments_mut()
        .map_err(|_| {
            MonitorError::transport(None, format!("base URL '{}' cannot have a path", base))
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Turn a non-2xx response into a `Transport` error, keeping the backend's message.
pub(crate) async fn error_from_response(response: reqwest::Response) -> MonitorError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| {
            let mut text = body.trim().to_string();
            if text.is_empty() {
                text = status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string();
            }
            text.chars().take(200).collect()
        });

    MonitorError::transport(Some(status.as_u16()), message)
}

/// Attach `token`, `key` and `role` headers, or fail without a request.
pub(crate) fn with_credentials(
    request: reqwest::RequestBuilder,
    session: &SessionContext,
) -> Result<reqwest::RequestBuilder, MonitorError> {
    let credentials = session
        .credentials()
        .ok_or(MonitorError::Unauthenticated)?;
    Ok(request
        .header("token", credentials.token)
        .header("key", credentials.project_key)
        .header("role", credentials.role.as_str()))
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

/// reqwest-backed [`MonitorApi`].
#[derive(Debug, Clone)]
pub struct HttpMonitorClient {
    client: reqwest::Client,
    base_url: String,
    policy: StatusPolicy,
    forward_parameters: bool,
}

impl HttpMonitorClient {
    /// Create a client with a pooled HTTP connection and the configured timeout.
    pub fn new(config: &MonitorConfig, policy: StatusPolicy) -> Result<Self, MonitorError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| {
                MonitorError::transport(None, format!("failed to build HTTP client: {}", e))
            })?;

        Ok(Self::with_client(client, config, policy))
    }

    /// Create a client around an existing HTTP client (for testing).
    pub fn with_client(
        client: reqwest::Client,
        config: &MonitorConfig,
        policy: StatusPolicy,
    ) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            policy,
            forward_parameters: config.forward_parameters,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn monitor_request(
        &self,
        segments: &[&str],
        session: &SessionContext,
        params: &ParameterSet,
    ) -> Result<reqwest::RequestBuilder, MonitorError> {
        // An anonymous session never reaches URL building
        if !session.is_authenticated() {
            return Err(MonitorError::Unauthenticated);
        }

        let url = join_url(&self.base_url, segments)?;
        let mut request = with_credentials(self.client.get(url), session)?;
        if self.forward_parameters {
            for (name, value) in params.header_pairs() {
                request = request.header(name, value);
            }
        }
        Ok(request)
    }

    async fn get_body(&self, request: reqwest::RequestBuilder) -> Result<String, MonitorError> {
        let response = request.send().await.map_err(MonitorError::from_reqwest)?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        response.text().await.map_err(MonitorError::from_reqwest)
    }

    /// Exchange a project key and API key for a session.
    ///
    /// # Errors
    ///
    /// `Transport` with the backend's status (400 missing fields, 401 rejected
    /// credentials, 403 role mismatch) or `MalformedResponse` if no token came back.
    pub async fn login(
        &self,
        project_key: &str,
        api_key: &str,
        role: Role,
    ) -> Result<SessionContext, MonitorError> {
        let url = join_url(&self.base_url, &["api", "login"])?;
        let body = serde_json::json!({
            "project_key": project_key,
            "api_key": api_key,
            "role": role.as_str(),
        });

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(MonitorError::from_reqwest)?;
        if !response.status().is_success() {
            let err = error_from_response(response).await;
            tracing::warn!(project_key, error = %err, "Login rejected");
            return Err(err);
        }

        let login: LoginResponse = response.json().await.map_err(MonitorError::from_reqwest)?;
        let token = login
            .token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                MonitorError::MalformedResponse("login response has no token".to_string())
            })?;

        tracing::info!(project_key, role = %role, "Signed in");
        let mut session = SessionContext::new(role, project_key, token);
        session.display_name = login.name;
        Ok(session)
    }
}

#[async_trait]
impl MonitorApi for HttpMonitorClient {
    async fn fetch_snapshot(
        &self,
        session: &SessionContext,
        params: &ParameterSet,
    ) -> Result<MonitorSnapshot, MonitorError> {
        let request = self.monitor_request(&["monitor"], session, params)?;

        let start = Instant::now();
        let body = self.get_body(request).await?;
        tracing::debug!(
            duration_ms = start.elapsed().as_millis() as u64,
            bytes = body.len(),
            "Monitor feed received"
        );

        wire::parse_snapshot(&body, &self.policy)
    }

    async fn test_endpoint(
        &self,
        session: &SessionContext,
        params: &ParameterSet,
        key: &str,
    ) -> Result<MonitoredEndpoint, MonitorError> {
        let request = self.monitor_request(&["monitor", "test", key], session, params)?;

        let start = Instant::now();
        let body = self.get_body(request).await?;
        tracing::debug!(
            key,
            duration_ms = start.elapsed().as_millis() as u64,
            "Test-now response received"
        );

        wire::parse_endpoint(&body, &self.policy)
    }
}
