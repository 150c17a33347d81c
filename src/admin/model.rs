//! Registry records managed through the admin API.

use super::error::AdminError;
use crate::session::Role;
use crate::snapshot::{HttpMethod, UNCATEGORIZED};
use serde::{Deserialize, Deserializer, Serialize};

/// Label for definitions without a sport.
pub const UNKNOWN_SPORT: &str = "Unknown";

/// The registry stores NULLs for fields it never received.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One registered endpoint as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointDefinition {
    pub api_key: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub method: HttpMethod,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default)]
    pub sport: Option<String>,
}

impl EndpointDefinition {
    pub fn category_label(&self) -> &str {
        match self.category.as_deref() {
            Some(c) if !c.trim().is_empty() => c,
            _ => UNCATEGORIZED,
        }
    }

    pub fn sport_label(&self) -> &str {
        match self.sport.as_deref() {
            Some(s) if !s.trim().is_empty() => s,
            _ => UNKNOWN_SPORT,
        }
    }

    /// Editable fields, for building an update from an existing record.
    pub fn to_draft(&self) -> EndpointDraft {
        EndpointDraft {
            name: self.name.clone(),
            url: self.url.clone(),
            method: self.method,
            category: self.category.clone().unwrap_or_default(),
            description: self.description.clone(),
            sport: self.sport.clone().unwrap_or_default(),
        }
    }
}

/// Body of an endpoint create or update. The backend assigns `api_key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointDraft {
    pub name: String,
    pub url: String,
    pub method: HttpMethod,
    pub category: String,
    pub description: String,
    pub sport: String,
}

fn require(field: &'static str, value: &str) -> Result<(), AdminError> {
    if value.trim().is_empty() {
        return Err(AdminError::MissingField { field });
    }
    Ok(())
}

impl EndpointDraft {
    /// Every field is required.
    pub fn validate(&self) -> Result<(), AdminError> {
        require("name", &self.name)?;
        require("url", &self.url)?;
        require("category", &self.category)?;
        require("description", &self.description)?;
        require("sport", &self.sport)?;
        Ok(())
    }
}

/// A project allowed to sign in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub project_key: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub username: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub api_key: String,
    pub role: Role,
}

impl UserRecord {
    pub fn validate(&self) -> Result<(), AdminError> {
        require("project_key", &self.project_key)?;
        require("username", &self.username)?;
        require("api_key", &self.api_key)?;
        Ok(())
    }
}
