//! OpenStack provider error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OpenStackError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Keystone authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("No compute endpoint for region '{0}' in the service catalog")]
    EndpointNotFound(String),

    #[error("Server not found: {0}")]
    ServerNotFound(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, OpenStackError>;

impl From<OpenStackError> for novaflow_cloud::CloudError {
    fn from(err: OpenStackError) -> Self {
        use novaflow_cloud::CloudError;
        match err {
            OpenStackError::AuthenticationFailed(msg) => CloudError::AuthenticationFailed(msg),
            OpenStackError::MissingEnvVar(var) => {
                CloudError::InvalidConfig(format!("missing environment variable {}", var))
            }
            OpenStackError::ServerNotFound(id) => CloudError::ServerNotFound(id),
            other => CloudError::ApiError(other.to_string()),
        }
    }
}
