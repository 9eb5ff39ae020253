//! Keystone v2 + Nova API client
//!
//! Authenticates with a tenant name and password, picks the compute
//! endpoint for the configured region from the service catalog and talks to
//! the Nova `servers` API with the issued token.
//!
//! The token is cached until Nova rejects it. A 401 clears the cache, and
//! the request is sent once more with a fresh token; a second 401 is
//! reported as [`OpenStackError::AuthenticationFailed`].

use crate::config::OpenStackConfig;
use crate::error::{OpenStackError, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use novaflow_cloud::{CreateServerRequest, ServerInfo};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";
const COMPUTE_SERVICE_TYPE: &str = "compute";

/// Nova client bound to one project
pub struct NovaClient {
    client: reqwest::Client,
    config: OpenStackConfig,
    session: Mutex<Option<Session>>,
}

/// Token and endpoint obtained from Keystone
#[derive(Debug, Clone, PartialEq, Eq)]
struct Session {
    token: String,
    compute_url: String,
}

impl NovaClient {
    pub fn new(config: OpenStackConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            session: Mutex::new(None),
        }
    }

    async fn session(&self) -> Result<Session> {
        let mut cached = self.session.lock().await;
        if let Some(session) = cached.as_ref() {
            return Ok(session.clone());
        }

        let session = self.authenticate().await?;
        *cached = Some(session.clone());
        Ok(session)
    }

    /// Replace a session Nova refused
    async fn refresh_session(&self, rejected: &Session) -> Result<Session> {
        let mut cached = self.session.lock().await;
        if let Some(current) = cached.as_ref().filter(|s| s.token != rejected.token) {
            return Ok(current.clone());
        }

        *cached = None;
        let session = self.authenticate().await?;
        *cached = Some(session.clone());
        Ok(session)
    }

    async fn authenticate(&self) -> Result<Session> {
        let url = format!("{}/tokens", self.config.auth_url.trim_end_matches('/'));
        let request_body = TokenRequest {
            auth: AuthBody {
                tenant_name: self.config.tenant_name.clone(),
                password_credentials: PasswordCredentials {
                    username: self.config.username.clone(),
                    password: self.config.password.clone(),
                },
            },
        };

        tracing::debug!("Authenticating as {} at {}", self.config.username, url);

        let response = self.client.post(&url).json(&request_body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OpenStackError::AuthenticationFailed(format!(
                "{}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response.json().await?;
        session_from_token(token, &self.config.region_name)
    }

    /// Send a compute request, re-authenticating once if the token is refused
    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&serde_json::Value>,
        server_id: Option<&str>,
    ) -> Result<reqwest::Response> {
        let session = self.session().await?;
        let response = self
            .request(&session, method.clone(), path, query, body)
            .send()
            .await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return check(response, server_id).await;
        }

        tracing::info!("Nova rejected the token, authenticating again");
        let session = self.refresh_session(&session).await?;
        let response = self
            .request(&session, method, path, query, body)
            .send()
            .await?;
        check(response, server_id).await
    }

    fn request(
        &self,
        session: &Session,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&serde_json::Value>,
    ) -> reqwest::RequestBuilder {
        let url = format!("{}{}", session.compute_url, path);
        tracing::debug!("{} {}", method, url);

        let mut builder = self
            .client
            .request(method, url)
            .header(AUTH_TOKEN_HEADER, &session.token);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }
        builder
    }

    /// List all servers with details, following Nova's pagination
    pub async fn list_servers(&self) -> Result<Vec<ServerInfo>> {
        let mut servers = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let page: ServersResponse = {
                let query: Vec<(&str, &str)> =
                    marker.as_deref().map(|m| ("marker", m)).into_iter().collect();
                self.send(Method::GET, "/servers/detail", &query, None, None)
                    .await?
                    .json()
                    .await?
            };

            let next = page.next_marker();
            servers.extend(page.servers);
            match next {
                Some(next) => marker = Some(next),
                None => break,
            }
        }

        Ok(servers)
    }

    /// Boot a server and return its id
    pub async fn create_server(&self, request: &CreateServerRequest) -> Result<String> {
        tracing::debug!("Creating {}", request.name);

        let body: CreatedResponse = self
            .send(Method::POST, "/servers", &[], Some(&create_body(request)), None)
            .await?
            .json()
            .await?;
        Ok(body.server.id)
    }

    pub async fn get_server(&self, id: &str) -> Result<ServerInfo> {
        let path = format!("/servers/{}", id);
        let body: ServerResponse = self
            .send(Method::GET, &path, &[], None, Some(id))
            .await?
            .json()
            .await?;
        Ok(body.server)
    }

    pub async fn delete_server(&self, id: &str) -> Result<()> {
        let path = format!("/servers/{}", id);
        self.send(Method::DELETE, &path, &[], None, Some(id)).await?;
        Ok(())
    }
}

/// Map a non-success response to an error
async fn check(response: reqwest::Response, server_id: Option<&str>) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    match (status.as_u16(), server_id) {
        (401, _) => Err(OpenStackError::AuthenticationFailed(message)),
        (404, Some(id)) => Err(OpenStackError::ServerNotFound(id.to_string())),
        (code, _) => Err(OpenStackError::Api {
            status: code,
            message,
        }),
    }
}

fn session_from_token(token: TokenResponse, region: &str) -> Result<Session> {
    let compute_url = token
        .access
        .service_catalog
        .iter()
        .filter(|s| s.service_type == COMPUTE_SERVICE_TYPE)
        .flat_map(|s| s.endpoints.iter())
        .find(|e| e.region.as_deref() == Some(region))
        .map(|e| e.public_url.trim_end_matches('/').to_string())
        .ok_or_else(|| OpenStackError::EndpointNotFound(region.to_string()))?;

    Ok(Session {
        token: token.access.token.id,
        compute_url,
    })
}

/// Nova `POST /servers` payload
fn create_body(request: &CreateServerRequest) -> serde_json::Value {
    let mut server: serde_json::Map<String, serde_json::Value> = request
        .extra
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    server.insert("name".to_string(), serde_json::json!(request.name));
    server.insert("key_name".to_string(), serde_json::json!(request.key_name));
    server.insert(
        "user_data".to_string(),
        serde_json::json!(STANDARD.encode(&request.user_data)),
    );
    if let Some(image) = &request.image {
        server.insert("imageRef".to_string(), serde_json::json!(image));
    }
    if let Some(flavor) = &request.flavor {
        server.insert("flavorRef".to_string(), serde_json::json!(flavor));
    }
    if !request.networks.is_empty() {
        let networks: Vec<serde_json::Value> = request
            .networks
            .iter()
            .map(|id| serde_json::json!({ "uuid": id }))
            .collect();
        server.insert("networks".to_string(), serde_json::Value::Array(networks));
    }

    serde_json::json!({ "server": server })
}

// Keystone v2 wire types

#[derive(Debug, Serialize)]
struct TokenRequest {
    auth: AuthBody,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthBody {
    tenant_name: String,
    password_credentials: PasswordCredentials,
}

#[derive(Debug, Serialize)]
struct PasswordCredentials {
    username: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access: Access,
}

#[derive(Debug, Deserialize)]
struct Access {
    token: Token,
    #[serde(rename = "serviceCatalog", default)]
    service_catalog: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
struct Token {
    id: String,
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    #[serde(rename = "type")]
    service_type: String,
    #[serde(default)]
    endpoints: Vec<Endpoint>,
}

#[derive(Debug, Deserialize)]
struct Endpoint {
    region: Option<String>,
    #[serde(rename = "publicURL")]
    public_url: String,
}

// Nova wire types

#[derive(Debug, Deserialize)]
struct ServersResponse {
    servers: Vec<ServerInfo>,
    #[serde(default)]
    servers_links: Vec<Link>,
}

impl ServersResponse {
    /// Marker for the following page, if Nova announced one
    fn next_marker(&self) -> Option<String> {
        if !self.servers_links.iter().any(|l| l.rel == "next") {
            return None;
        }
        self.servers.last().map(|s| s.id.clone())
    }
}

#[derive(Debug, Deserialize)]
struct Link {
    rel: String,
}

#[derive(Debug, Deserialize)]
struct ServerResponse {
    server: ServerInfo,
}

#[derive(Debug, Deserialize)]
struct CreatedResponse {
    server: CreatedServerRef,
}

#[derive(Debug, Deserialize)]
struct CreatedServerRef {
    id: String,
}
