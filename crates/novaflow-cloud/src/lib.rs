//! Novaflow cloud core
//!
//! Converges a cloud project toward a declarative server layout:
//!
//! 1. a resource file declares server groups with counts,
//! 2. the groups expand into deterministically named desired servers,
//! 3. existing servers are listed through a [`ComputeClient`],
//! 4. missing servers are created and polled until they leave BUILD.
//!
//! ```text
//! resources.yaml ──► GroupSpec ──► Vec<DesiredServer> ─┐
//!                                                      ├─► diff by name ──► create + wait
//! ComputeClient::list_servers ──► existing names ──────┘
//! ```
//!
//! Concrete providers live in their own crates (`novaflow-cloud-openstack`).

pub mod error;
pub mod mappings;
pub mod plan;
pub mod provider;
pub mod reconcile;
pub mod resources;

// Re-exports
pub use error::{CloudError, Result};
pub use mappings::{Mappings, read_mappings};
pub use plan::{ApplyResult, CreatedServer, Plan, PlanSummary};
pub use provider::{ComputeClient, CreateServerRequest, ServerAttribute, ServerInfo, ServerStatus};
pub use reconcile::{
    ApplyOptions, DEFAULT_POLL_INTERVAL, create_servers, delete_servers, diff_by_name,
    get_existing_servers, plan, servers_to_create, wait_for_server,
};
pub use resources::{
    DesiredServer, GroupSpec, ServerGroup, generate_desired_servers, read_resources,
};
