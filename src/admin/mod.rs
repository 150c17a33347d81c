//! Admin registry client.
//!
//! CRUD over the endpoint registry (`/admin/api-endpoints`) and the users
//! allowed to sign in (`/admin/users`). Every call needs an admin session;
//! anything else fails before a request is built.

mod error;
mod model;

pub use error::*;
pub use model::*;

use crate::client::{error_from_response, join_url, with_credentials, MonitorError};
use crate::config::MonitorConfig;
use crate::session::SessionContext;
use crate::view::{facet, FacetFilter};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

const ENDPOINTS: &[&str] = &["admin", "api-endpoints"];
const USERS: &[&str] = &["admin", "users"];

/// reqwest-backed client for the admin API.
#[derive(Debug, Clone)]
pub struct AdminClient {
    client: reqwest::Client,
    base_url: String,
}

impl AdminClient {
    pub fn new(config: &MonitorConfig) -> Result<Self, AdminError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| {
                MonitorError::transport(None, format!("failed to build HTTP client: {}", e))
            })?;
        Ok(Self::with_client(client, config))
    }

    /// Create a client around an existing HTTP client (for testing).
    pub fn with_client(client: reqwest::Client, config: &MonitorConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
        }
    }

    fn authorize(session: &SessionContext) -> Result<(), MonitorError> {
        let credentials = session
            .credentials()
            .ok_or(MonitorError::Unauthenticated)?;
        if !session.is_admin() {
            tracing::warn!(role = %credentials.role, "Admin call refused for non-admin session");
            return Err(MonitorError::Forbidden {
                role: credentials.role.to_string(),
            });
        }
        Ok(())
    }

    async fn send(
        &self,
        session: &SessionContext,
        method: Method,
        segments: &[&str],
        body: Option<Value>,
    ) -> Result<Value, MonitorError> {
        Self::authorize(session)?;

        let url = join_url(&self.base_url, segments)?;
        let mut request = with_credentials(self.client.request(method.clone(), url), session)?;
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(MonitorError::from_reqwest)?;
        let status = response.status();
        if !status.is_success() {
            let err = error_from_response(response).await;
            tracing::warn!(
                %method,
                path = %segments.join("/"),
                error = %err,
                "Admin request failed"
            );
            return Err(err);
        }

        let text = response.text().await.map_err(MonitorError::from_reqwest)?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        let value: Value = serde_json::from_str(&text)
            .map_err(|e| MonitorError::MalformedResponse(format!("invalid JSON: {}", e)))?;

        // Some handlers report failures as a 2xx body with an `error` field
        if let Some(message) = value.get("error").and_then(Value::as_str) {
            return Err(MonitorError::transport(Some(status.as_u16()), message));
        }

        tracing::debug!(
            %method,
            path = %segments.join("/"),
            status = status.as_u16(),
            "Admin request succeeded"
        );
        Ok(value)
    }

    fn encode<T: Serialize>(body: &T) -> Result<Value, MonitorError> {
        serde_json::to_value(body).map_err(|e| {
            MonitorError::MalformedResponse(format!("failed to encode request body: {}", e))
        })
    }

    fn decode<T: DeserializeOwned>(value: Value, what: &str) -> Result<T, MonitorError> {
        serde_json::from_value(value)
            .map_err(|e| MonitorError::MalformedResponse(format!("invalid {}: {}", what, e)))
    }

    pub async fn list_endpoints(
        &self,
        session: &SessionContext,
    ) -> Result<Vec<EndpointDefinition>, AdminError> {
        let value = self.send(session, Method::GET, ENDPOINTS, None).await?;
        Ok(Self::decode(value, "endpoint list")?)
    }

    /// Register an endpoint. Returns the backend-assigned `api_key`.
    pub async fn create_endpoint(
        &self,
        session: &SessionContext,
        draft: &EndpointDraft,
    ) -> Result<String, AdminError> {
        draft.validate()?;
        let value = self
            .send(session, Method::POST, ENDPOINTS, Some(Self::encode(draft)?))
            .await?;
        let api_key = value
            .get("api_key")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                MonitorError::MalformedResponse("create response has no api_key".into())
            })?
            .to_string();
        tracing::info!(api_key = %api_key, name = %draft.name, "Endpoint registered");
        Ok(api_key)
    }

    pub async fn update_endpoint(
        &self,
        session: &SessionContext,
        api_key: &str,
        draft: &EndpointDraft,
    ) -> Result<(), AdminError> {
        draft.validate()?;
        self.send(
            session,
            Method::PUT,
            &[ENDPOINTS[0], ENDPOINTS[1], api_key],
            Some(Self::encode(draft)?),
        )
        .await?;
        tracing::info!(api_key, "Endpoint updated");
        Ok(())
    }

    pub async fn delete_endpoint(
        &self,
        session: &SessionContext,
        api_key: &str,
    ) -> Result<(), AdminError> {
        self.send(
            session,
            Method::DELETE,
            &[ENDPOINTS[0], ENDPOINTS[1], api_key],
            None,
        )
        .await?;
        tracing::info!(api_key, "Endpoint deleted");
        Ok(())
    }

    pub async fn list_users(
        &self,
        session: &SessionContext,
    ) -> Result<Vec<UserRecord>, AdminError> {
        let value = self.send(session, Method::GET, USERS, None).await?;
        Ok(Self::decode(value, "user list")?)
    }

    pub async fn create_user(
        &self,
        session: &SessionContext,
        user: &UserRecord,
    ) -> Result<(), AdminError> {
        user.validate()?;
        self.send(session, Method::POST, USERS, Some(Self::encode(user)?))
            .await?;
        tracing::info!(project_key = %user.project_key, role = %user.role, "User added");
        Ok(())
    }

    /// Replace the user stored under `project_key` (the key itself may change).
    pub async fn update_user(
        &self,
        session: &SessionContext,
        project_key: &str,
        user: &UserRecord,
    ) -> Result<(), AdminError> {
        user.validate()?;
        self.send(
            session,
            Method::PUT,
            &[USERS[0], USERS[1], project_key],
            Some(Self::encode(user)?),
        )
        .await?;
        tracing::info!(project_key, "User updated");
        Ok(())
    }

    pub async fn delete_user(
        &self,
        session: &SessionContext,
        project_key: &str,
    ) -> Result<(), AdminError> {
        self.send(
            session,
            Method::DELETE,
            &[USERS[0], USERS[1], project_key],
            None,
        )
        .await?;
        tracing::info!(project_key, "User deleted");
        Ok(())
    }
}

/// Sport universe of a registry listing, prefixed with `All`.
pub fn sports(definitions: &[EndpointDefinition]) -> Vec<String> {
    facet(definitions.iter().map(EndpointDefinition::sport_label))
}

/// Category universe of a registry listing, prefixed with `All`.
pub fn categories(definitions: &[EndpointDefinition]) -> Vec<String> {
    facet(definitions.iter().map(EndpointDefinition::category_label))
}

/// Definitions matching both facets, in listing order.
pub fn filter_definitions<'a>(
    definitions: &'a [EndpointDefinition],
    category: &FacetFilter,
    sport: &FacetFilter,
) -> Vec<&'a EndpointDefinition> {
    definitions
        .iter()
        .filter(|d| category.matches(d.category_label()) && sport.matches(d.sport_label()))
        .collect()
}
