use clap::Args;
use colored::Colorize;
use novaflow_cloud::DesiredServer;
use novaflow_cloud_openstack::{OpenStackConfig, OpenStackProvider};

/// OpenStack credentials, defaulting to the usual `OS_*` variables
#[derive(Args)]
pub struct CredentialArgs {
    /// Keystone user name
    #[arg(long, env = "OS_USERNAME", global = true)]
    pub os_username: Option<String>,
    /// Keystone password
    #[arg(long, env = "OS_PASSWORD", global = true, hide_env_values = true)]
    pub os_password: Option<String>,
    /// Keystone endpoint
    #[arg(long, env = "OS_AUTH_URL", global = true)]
    pub os_auth_url: Option<String>,
    /// Tenant (project) name
    #[arg(long, env = "OS_TENANT_NAME", global = true)]
    pub os_tenant_name: Option<String>,
    /// Region used to pick the compute endpoint
    #[arg(long, env = "OS_REGION_NAME", global = true)]
    pub os_region_name: Option<String>,
}

impl CredentialArgs {
    pub fn into_config(self) -> anyhow::Result<OpenStackConfig> {
        fn required(value: Option<String>, flag: &str, var: &str) -> anyhow::Result<String> {
            value.ok_or_else(|| anyhow::anyhow!("--{} or {} must be set", flag, var))
        }

        Ok(OpenStackConfig {
            username: required(self.os_username, "os-username", "OS_USERNAME")?,
            password: required(self.os_password, "os-password", "OS_PASSWORD")?,
            auth_url: required(self.os_auth_url, "os-auth-url", "OS_AUTH_URL")?,
            tenant_name: required(self.os_tenant_name, "os-tenant-name", "OS_TENANT_NAME")?,
            region_name: required(self.os_region_name, "os-region-name", "OS_REGION_NAME")?,
        })
    }

    pub fn into_provider(self) -> anyhow::Result<OpenStackProvider> {
        Ok(OpenStackProvider::new(self.into_config()?))
    }
}

/// Print a list of desired servers with their group count
pub fn print_servers(servers: &[DesiredServer]) {
    for server in servers {
        println!("  • {} (group of {})", server.name.cyan(), server.number);
    }
}
