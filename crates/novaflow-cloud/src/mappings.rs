//! Friendly-name to provider-id mappings
//!
//! Resource files usually name images, flavors and networks the way humans
//! know them. A mappings file translates those names into the ids of one
//! particular cloud:
//!
//! ```yaml
//! image:
//!   trusty: 0f2a...-image-uuid
//! flavor:
//!   m1.small: "2"
//! networks:
//!   private: 4d1c...-net-uuid
//! ```

use crate::error::{CloudError, Result};
use crate::provider::CreateServerRequest;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Mappings {
    #[serde(default)]
    pub image: HashMap<String, String>,
    #[serde(default)]
    pub flavor: HashMap<String, String>,
    #[serde(default)]
    pub networks: HashMap<String, String>,
}

impl Mappings {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| CloudError::InvalidConfig(format!("invalid mappings document: {}", e)))
    }

    /// Rewrite image, flavor and network references in place.
    /// Values without a mapping are left untouched.
    pub fn apply(&self, request: &mut CreateServerRequest) {
        if let Some(image) = request.image.as_mut() {
            resolve(&self.image, image);
        }
        if let Some(flavor) = request.flavor.as_mut() {
            resolve(&self.flavor, flavor);
        }
        for network in request.networks.iter_mut() {
            resolve(&self.networks, network);
        }
    }
}

fn resolve(table: &HashMap<String, String>, value: &mut String) {
    if let Some(id) = table.get(value.as_str()) {
        *value = id.clone();
    }
}

pub async fn read_mappings(path: impl AsRef<Path>) -> Result<Mappings> {
    let content = tokio::fs::read_to_string(path.as_ref()).await?;
    Mappings::from_yaml_str(&content)
}
