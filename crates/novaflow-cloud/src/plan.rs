//! Plan and apply reports

use crate::provider::ServerStatus;
use crate::resources::DesiredServer;
use serde::Serialize;

/// Servers that must be created to converge the project
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    /// Desired servers missing from the project, in desired order
    pub to_create: Vec<DesiredServer>,

    /// Desired names the project already has
    pub present: Vec<String>,
}

impl Plan {
    pub fn has_changes(&self) -> bool {
        !self.to_create.is_empty()
    }

    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            create: self.to_create.len(),
            present: self.present.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanSummary {
    pub create: usize,
    pub present: usize,
}

impl std::fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to create, {} already present", self.create, self.present)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ApplyResult {
    pub created: Vec<CreatedServer>,

    /// Total execution time in milliseconds
    pub duration_ms: u64,
}

impl ApplyResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Servers that settled in a state other than ACTIVE
    pub fn not_active(&self) -> Vec<&CreatedServer> {
        self.created
            .iter()
            .filter(|s| s.status != ServerStatus::Active)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedServer {
    pub name: String,
    pub id: String,
    /// First status observed after BUILD
    pub status: ServerStatus,
}
