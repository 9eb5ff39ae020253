//! Reconciliation driver
//!
//! Reads the existing servers of a project, diffs them by name against the
//! desired state and creates whatever is missing. Every provider call is
//! awaited in turn; nothing runs concurrently.

use crate::error::{CloudError, Result};
use crate::mappings::Mappings;
use crate::plan::{ApplyResult, CreatedServer, Plan};
use crate::provider::{ComputeClient, ServerAttribute, ServerStatus};
use crate::resources::{DesiredServer, generate_desired_servers, read_resources};
use std::collections::HashSet;
use std::path::Path;
use std::time::{Duration, Instant};

/// Interval between status polls while a server is in BUILD
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Options for [`create_servers`]
#[derive(Debug, Clone)]
pub struct ApplyOptions {
    /// Fixed sleep between polls. There is no timeout and no backoff.
    pub poll_interval: Duration,

    /// Name translation applied to each creation request
    pub mappings: Option<Mappings>,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            mappings: None,
        }
    }
}

/// List existing servers, projecting one attribute per server.
///
/// With a project tag only servers whose name contains the tag are kept.
/// Provider order is preserved.
pub async fn get_existing_servers<C>(
    client: &C,
    project_tag: Option<&str>,
    attr: ServerAttribute,
) -> Result<Vec<String>>
where
    C: ComputeClient + ?Sized,
{
    let servers = client.list_servers().await?;
    tracing::debug!("Provider reported {} servers", servers.len());

    Ok(servers
        .iter()
        .filter(|s| project_tag.is_none_or(|tag| s.name.contains(tag)))
        .map(|s| s.attribute(attr).to_string())
        .collect())
}

/// Desired servers whose names are not in `existing`, in desired order
pub fn diff_by_name(desired: Vec<DesiredServer>, existing: &[String]) -> Vec<DesiredServer> {
    let existing: HashSet<&str> = existing.iter().map(String::as_str).collect();
    desired
        .into_iter()
        .filter(|s| !existing.contains(s.name.as_str()))
        .collect()
}

/// Compute the plan for a resource file.
///
/// The project tag suffixes the generated names; existing servers are read
/// without filtering. `Plan::present` holds only desired names, so servers
/// outside the resource file never count.
pub async fn plan<C>(
    client: &C,
    resource_path: impl AsRef<Path>,
    project_tag: Option<&str>,
) -> Result<Plan>
where
    C: ComputeClient + ?Sized,
{
    let spec = read_resources(resource_path).await?;
    let desired = generate_desired_servers(&spec, project_tag);
    let existing = get_existing_servers(client, None, ServerAttribute::Name).await?;

    let present: Vec<String> = {
        let existing: HashSet<&str> = existing.iter().map(String::as_str).collect();
        desired
            .iter()
            .filter(|s| existing.contains(s.name.as_str()))
            .map(|s| s.name.clone())
            .collect()
    };
    let to_create = diff_by_name(desired, &existing);
    tracing::debug!(
        "{} servers missing, {} already present",
        to_create.len(),
        present.len()
    );

    Ok(Plan { to_create, present })
}

/// Desired servers from `resource_path` that do not exist yet
pub async fn servers_to_create<C>(
    client: &C,
    resource_path: impl AsRef<Path>,
    project_tag: Option<&str>,
) -> Result<Vec<DesiredServer>>
where
    C: ComputeClient + ?Sized,
{
    Ok(plan(client, resource_path, project_tag).await?.to_create)
}

/// Create every server in `to_create`, then wait for each to leave BUILD.
///
/// The user data file is read afresh for every creation call. All creation
/// calls are issued first; polling then happens one server at a time.
pub async fn create_servers<C>(
    client: &C,
    to_create: &[DesiredServer],
    user_data_path: impl AsRef<Path>,
    key_name: &str,
    options: &ApplyOptions,
) -> Result<ApplyResult>
where
    C: ComputeClient + ?Sized,
{
    let start = Instant::now();
    let user_data_path = user_data_path.as_ref();
    let mut pending = Vec::with_capacity(to_create.len());

    for server in to_create {
        let user_data = tokio::fs::read(user_data_path).await?;
        let mut request = server.to_request(key_name, user_data)?;
        if let Some(mappings) = &options.mappings {
            mappings.apply(&mut request);
        }

        let id = client.create_server(request).await?;
        tracing::info!("Requested server {} (id: {})", server.name, id);
        pending.push((server.name.clone(), id));
    }

    let mut result = ApplyResult::new();
    for (name, id) in pending {
        let status = wait_for_server(client, &id, options.poll_interval).await?;
        if status != ServerStatus::Active {
            tracing::warn!("Server {} ({}) left BUILD as {}", name, id, status);
        } else {
            tracing::info!("Server {} is ACTIVE", name);
        }
        result.created.push(CreatedServer { name, id, status });
    }

    result.duration_ms = start.elapsed().as_millis() as u64;
    Ok(result)
}

/// Poll a server until its status is no longer BUILD and return that status.
///
/// Any non-BUILD status ends the wait, ERROR included.
pub async fn wait_for_server<C>(
    client: &C,
    id: &str,
    poll_interval: Duration,
) -> Result<ServerStatus>
where
    C: ComputeClient + ?Sized,
{
    loop {
        let server = client.get_server(id).await?;
        if !server.status.is_building() {
            return Ok(server.status);
        }
        tracing::debug!("Server {} still in BUILD", id);
        tokio::time::sleep(poll_interval).await;
    }
}

/// Delete every server whose name contains `project_tag`.
/// Returns the deleted ids.
pub async fn delete_servers<C>(client: &C, project_tag: &str) -> Result<Vec<String>>
where
    C: ComputeClient + ?Sized,
{
    if project_tag.is_empty() {
        return Err(CloudError::InvalidConfig(
            "refusing to delete servers without a project tag".to_string(),
        ));
    }

    let ids = get_existing_servers(client, Some(project_tag), ServerAttribute::Id).await?;
    for id in &ids {
        client.delete_server(id).await?;
        tracing::info!("Deleted server {}", id);
    }
    Ok(ids)
}
