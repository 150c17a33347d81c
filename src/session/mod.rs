//! Authenticated identity used to authorize every monitor request.
//!
//! A [`SessionContext`] is produced once by logging in and passed explicitly
//! into each client call. Any missing field means "not signed in".

use crate::storage::{LocalStore, StorageError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Storage key of the persisted session.
pub const SESSION_STORAGE_KEY: &str = "session";

/// Role granted to the signed-in project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(format!("Invalid role: {} (expected admin or user)", other)),
        }
    }
}

/// Identity of the signed-in operator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, rename = "projectKey", skip_serializing_if = "Option::is_none")]
    pub project_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, rename = "name", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Borrowed view of a fully populated session.
#[derive(Debug, Clone, Copy)]
pub struct Credentials<'a> {
    pub role: Role,
    pub project_key: &'a str,
    pub token: &'a str,
}

impl SessionContext {
    pub fn new(role: Role, project_key: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            role: Some(role),
            project_key: Some(project_key.into()),
            token: Some(token.into()),
            display_name: None,
        }
    }

    /// The unauthenticated session.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// All three credentials, or `None` if any is missing or blank.
    pub fn credentials(&self) -> Option<Credentials<'_>> {
        let role = self.role?;
        let project_key = self.project_key.as_deref().filter(|s| !s.trim().is_empty())?;
        let token = self.token.as_deref().filter(|s| !s.trim().is_empty())?;
        Some(Credentials {
            role,
            project_key,
            token,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials().is_some()
    }

    /// Capability flag for the admin surface.
    pub fn is_admin(&self) -> bool {
        matches!(self.credentials(), Some(c) if c.role == Role::Admin)
    }
}

/// Persistence for the signed-in identity.
#[derive(Debug, Clone)]
pub struct SessionStore {
    store: LocalStore,
}

impl SessionStore {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    /// The saved session, or an anonymous one.
    pub fn load(&self) -> Result<SessionContext, StorageError> {
        Ok(self
            .store
            .get::<SessionContext>(SESSION_STORAGE_KEY)?
            .unwrap_or_default())
    }

    pub fn save(&self, session: &SessionContext) -> Result<(), StorageError> {
        self.store.set(SESSION_STORAGE_KEY, session)
    }

    /// Forget the saved identity (logout).
    pub fn clear(&self) -> Result<bool, StorageError> {
        self.store.remove(SESSION_STORAGE_KEY)
    }
}
