//! Compute provider trait definition

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Compute API abstraction
///
/// The reconciler only needs these four capabilities from a provider.
/// The OpenStack client implements it against Nova; tests substitute an
/// in-memory fake.
#[async_trait]
pub trait ComputeClient: Send + Sync {
    /// List every server visible to the configured project, in provider order
    async fn list_servers(&self) -> Result<Vec<ServerInfo>>;

    /// Request a new server and return its identifier
    async fn create_server(&self, request: CreateServerRequest) -> Result<String>;

    /// Fetch the current view of a single server
    async fn get_server(&self, id: &str) -> Result<ServerInfo>;

    async fn delete_server(&self, id: &str) -> Result<()>;
}

/// A server as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub id: String,
    pub name: String,
    pub status: ServerStatus,
}

impl ServerInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>, status: ServerStatus) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status,
        }
    }

    /// Project a single attribute by name.
    ///
    /// Only `name` and `id` are addressable.
    pub fn attribute(&self, attr: ServerAttribute) -> &str {
        match attr {
            ServerAttribute::Name => &self.name,
            ServerAttribute::Id => &self.id,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ServerAttribute {
    #[default]
    Name,
    Id,
}

impl std::str::FromStr for ServerAttribute {
    type Err = crate::error::CloudError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "name" => Ok(ServerAttribute::Name),
            "id" => Ok(ServerAttribute::Id),
            other => Err(crate::error::CloudError::InvalidConfig(format!(
                "unsupported server attribute '{}' (expected 'name' or 'id')",
                other
            ))),
        }
    }
}

/// Lifecycle status reported by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ServerStatus {
    Build,
    Active,
    Error,
    /// Any other provider status, kept verbatim
    Other(String),
}

impl ServerStatus {
    pub fn is_building(&self) -> bool {
        matches!(self, ServerStatus::Build)
    }

    pub fn as_str(&self) -> &str {
        match self {
            ServerStatus::Build => "BUILD",
            ServerStatus::Active => "ACTIVE",
            ServerStatus::Error => "ERROR",
            ServerStatus::Other(s) => s,
        }
    }
}

impl From<&str> for ServerStatus {
    fn from(s: &str) -> Self {
        match s {
            "BUILD" => ServerStatus::Build,
            "ACTIVE" => ServerStatus::Active,
            "ERROR" => ServerStatus::Error,
            other => ServerStatus::Other(other.to_string()),
        }
    }
}

impl From<String> for ServerStatus {
    fn from(s: String) -> Self {
        ServerStatus::from(s.as_str())
    }
}

impl From<ServerStatus> for String {
    fn from(status: ServerStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Arguments for a single server creation call
#[derive(Debug, Clone, PartialEq)]
pub struct CreateServerRequest {
    pub name: String,
    pub key_name: String,
    /// Raw user data, passed through unchanged
    pub user_data: Vec<u8>,
    pub image: Option<String>,
    pub flavor: Option<String>,
    pub networks: Vec<String>,
    /// Remaining group attributes
    pub extra: BTreeMap<String, serde_json::Value>,
}
