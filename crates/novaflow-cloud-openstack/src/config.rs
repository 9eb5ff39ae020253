//! Credentials for an OpenStack project

use crate::error::{OpenStackError, Result};

pub const ENV_USERNAME: &str = "OS_USERNAME";
pub const ENV_PASSWORD: &str = "OS_PASSWORD";
pub const ENV_AUTH_URL: &str = "OS_AUTH_URL";
pub const ENV_TENANT_NAME: &str = "OS_TENANT_NAME";
pub const ENV_REGION_NAME: &str = "OS_REGION_NAME";

/// Everything needed to authenticate against Keystone and pick a Nova
/// endpoint
#[derive(Clone)]
pub struct OpenStackConfig {
    pub username: String,
    pub password: String,
    pub auth_url: String,
    pub tenant_name: String,
    pub region_name: String,
}

impl OpenStackConfig {
    /// Create OpenStackConfig from the usual `OS_*` environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            username: env_var(ENV_USERNAME)?,
            password: env_var(ENV_PASSWORD)?,
            auth_url: env_var(ENV_AUTH_URL)?,
            tenant_name: env_var(ENV_TENANT_NAME)?,
            region_name: env_var(ENV_REGION_NAME)?,
        })
    }
}

// Keep the password out of logs
impl std::fmt::Debug for OpenStackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenStackConfig")
            .field("username", &self.username)
            .field("password", &"***")
            .field("auth_url", &self.auth_url)
            .field("tenant_name", &self.tenant_name)
            .field("region_name", &self.region_name)
            .finish()
    }
}

fn env_var(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| OpenStackError::MissingEnvVar(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env() {
        temp_env::with_vars(
            [
                (ENV_USERNAME, Some("os_username")),
                (ENV_PASSWORD, Some("os_password")),
                (ENV_AUTH_URL, Some("http://example.com/")),
                (ENV_TENANT_NAME, Some("tenant_name")),
                (ENV_REGION_NAME, Some("region_name")),
            ],
            || {
                let config = OpenStackConfig::from_env().unwrap();
                assert_eq!(config.username, "os_username");
                assert_eq!(config.password, "os_password");
                assert_eq!(config.auth_url, "http://example.com/");
                assert_eq!(config.tenant_name, "tenant_name");
                assert_eq!(config.region_name, "region_name");
            },
        );
    }

    #[test]
    fn test_from_env_missing_var() {
        temp_env::with_vars(
            [
                (ENV_USERNAME, Some("os_username")),
                (ENV_PASSWORD, Some("os_password")),
                (ENV_AUTH_URL, Some("http://example.com/")),
                (ENV_TENANT_NAME, None),
                (ENV_REGION_NAME, Some("region_name")),
            ],
            || match OpenStackConfig::from_env() {
                Err(OpenStackError::MissingEnvVar(var)) => assert_eq!(var, ENV_TENANT_NAME),
                other => panic!("Expected MissingEnvVar, got {:?}", other),
            },
        );
    }

    #[test]
    fn test_debug_hides_password() {
        let config = OpenStackConfig {
            username: "u".into(),
            password: "secret".into(),
            auth_url: "http://keystone:5000/v2.0".into(),
            tenant_name: "t".into(),
            region_name: "r".into(),
        };
        assert!(!format!("{:?}", config).contains("secret"));
    }
}
