//! Desired-state model
//!
//! A resource file declares named server groups and how many servers each
//! group should have:
//!
//! ```yaml
//! resources:
//!   web:
//!     number: 3
//!     image: trusty
//!     flavor: m1.small
//!     networks: [private]
//!   db:
//!     number: 1
//! ```
//!
//! Every group expands into `number` servers named `<group><index>`, with
//! `_<project_tag>` appended when a project tag is in use.

use crate::error::{CloudError, Result};
use crate::provider::CreateServerRequest;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Ordered set of server groups
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupSpec {
    groups: Vec<ServerGroup>,
}

/// A named class of servers sharing a naming prefix and attributes
#[derive(Debug, Clone, PartialEq)]
pub struct ServerGroup {
    pub name: String,
    pub number: u32,
    /// Attributes copied into every server of the group
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl ServerGroup {
    pub fn new(name: impl Into<String>, number: u32) -> Self {
        Self {
            name: name.into(),
            number,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }
}

#[derive(Deserialize)]
struct GroupConfig {
    number: u32,
    #[serde(flatten)]
    attributes: BTreeMap<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct ResourceFile {
    resources: serde_yaml::Mapping,
}

impl GroupSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a group. Declaration order decides naming order.
    pub fn push(&mut self, group: ServerGroup) {
        self.groups.push(group);
    }

    pub fn with_group(mut self, group: ServerGroup) -> Self {
        self.push(group);
        self
    }

    pub fn groups(&self) -> &[ServerGroup] {
        &self.groups
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let file: ResourceFile = serde_yaml::from_str(content).map_err(|e| {
            CloudError::InvalidConfig(format!("invalid resource document: {}", e))
        })?;

        let mut spec = GroupSpec::new();
        for (key, value) in file.resources {
            let name = key
                .as_str()
                .ok_or_else(|| {
                    CloudError::InvalidConfig(format!("group name must be a string: {:?}", key))
                })?
                .to_string();

            let config: GroupConfig = serde_yaml::from_value(value)
                .map_err(|e| CloudError::InvalidConfig(format!("group '{}': {}", name, e)))?;
            // Server names are generated; a group cannot override them
            if config.attributes.contains_key("name") {
                return Err(CloudError::InvalidConfig(format!(
                    "group '{}': 'name' is generated and cannot be set",
                    name
                )));
            }

            spec.push(ServerGroup {
                name,
                number: config.number,
                attributes: config.attributes,
            });
        }

        Ok(spec)
    }
}

pub async fn read_resources(path: impl AsRef<Path>) -> Result<GroupSpec> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path).await?;
    let spec = GroupSpec::from_yaml_str(&content)?;
    tracing::debug!(
        "Loaded {} server groups from {}",
        spec.groups.len(),
        path.display()
    );
    Ok(spec)
}

/// A server the desired state calls for
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DesiredServer {
    pub name: String,
    /// Count of the group this server belongs to
    pub number: u32,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl DesiredServer {
    pub fn new(name: impl Into<String>, number: u32) -> Self {
        Self {
            name: name.into(),
            number,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Build the creation call for this server.
    ///
    /// `number` is dropped and `image`, `flavor` and `networks` are lifted
    /// out of the attributes; everything else is passed through.
    pub fn to_request(&self, key_name: &str, user_data: Vec<u8>) -> Result<CreateServerRequest> {
        let mut extra = self.attributes.clone();

        let image = take_string(&mut extra, &self.name, "image")?;
        let flavor = take_string(&mut extra, &self.name, "flavor")?;
        let networks = match extra.remove("networks") {
            None | Some(serde_json::Value::Null) => Vec::new(),
            Some(serde_json::Value::Array(items)) => items
                .into_iter()
                .map(|item| match item {
                    serde_json::Value::String(s) => Ok(s),
                    other => Err(CloudError::InvalidConfig(format!(
                        "server '{}': network entries must be strings, got {}",
                        self.name, other
                    ))),
                })
                .collect::<Result<Vec<_>>>()?,
            Some(other) => {
                return Err(CloudError::InvalidConfig(format!(
                    "server '{}': networks must be a list, got {}",
                    self.name, other
                )));
            }
        };

        Ok(CreateServerRequest {
            name: self.name.clone(),
            key_name: key_name.to_string(),
            user_data,
            image,
            flavor,
            networks,
            extra,
        })
    }
}

fn take_string(
    attributes: &mut BTreeMap<String, serde_json::Value>,
    server: &str,
    key: &str,
) -> Result<Option<String>> {
    match attributes.remove(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(CloudError::InvalidConfig(format!(
            "server '{}': {} must be a string, got {}",
            server, key, other
        ))),
    }
}

/// Expand a group spec into the flat, ordered list of desired servers.
///
/// Groups keep their declaration order and indices run 1..=number, so a
/// group with `number == 0` contributes nothing. An empty tag counts as no
/// tag.
pub fn generate_desired_servers(spec: &GroupSpec, project_tag: Option<&str>) -> Vec<DesiredServer> {
    let tag = project_tag.filter(|t| !t.is_empty());

    spec.groups
        .iter()
        .flat_map(|group| {
            (1..=group.number).map(move |index| {
                let name = match tag {
                    Some(tag) => format!("{}{}_{}", group.name, index, tag),
                    None => format!("{}{}", group.name, index),
                };
                DesiredServer {
                    name,
                    number: group.number,
                    attributes: group.attributes.clone(),
                }
            })
        })
        .collect()
}
