//! OpenStack provider for Novaflow
//!
//! This crate implements the `ComputeClient` trait against OpenStack,
//! authenticating with Keystone (v2 password credentials) and managing
//! servers through the Nova compute API.
//!
//! # Example
//!
//! ```ignore
//! use novaflow_cloud::{ServerAttribute, get_existing_servers};
//! use novaflow_cloud_openstack::{OpenStackConfig, OpenStackProvider};
//!
//! let provider = OpenStackProvider::new(OpenStackConfig::from_env()?);
//! let names = get_existing_servers(&provider, Some("abc123"), ServerAttribute::Name).await?;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod provider;

#[cfg(test)]
mod test_daemon;

pub use client::NovaClient;
pub use config::OpenStackConfig;
pub use error::{OpenStackError, Result};
pub use provider::OpenStackProvider;
