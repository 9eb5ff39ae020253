//! OpenStack compute provider implementation

use crate::client::NovaClient;
use crate::config::OpenStackConfig;
use async_trait::async_trait;
use novaflow_cloud::{ComputeClient, CreateServerRequest, ServerInfo};

/// OpenStack provider
pub struct OpenStackProvider {
    nova: NovaClient,
}

impl OpenStackProvider {
    pub fn new(config: OpenStackConfig) -> Self {
        Self {
            nova: NovaClient::new(config),
        }
    }
}

#[async_trait]
impl ComputeClient for OpenStackProvider {
    async fn list_servers(&self) -> novaflow_cloud::Result<Vec<ServerInfo>> {
        Ok(self.nova.list_servers().await?)
    }

    async fn create_server(&self, request: CreateServerRequest) -> novaflow_cloud::Result<String> {
        tracing::info!("Creating server: {}", request.name);
        Ok(self.nova.create_server(&request).await?)
    }

    async fn get_server(&self, id: &str) -> novaflow_cloud::Result<ServerInfo> {
        Ok(self.nova.get_server(id).await?)
    }

    async fn delete_server(&self, id: &str) -> novaflow_cloud::Result<()> {
        tracing::info!("Deleting server: {}", id);
        Ok(self.nova.delete_server(id).await?)
    }
}
