//! Planner configuration.

use serde::{Deserialize, Serialize};

use crate::admission::OccupancyThresholds;
use crate::cluster::ClusterSnapshot;
use crate::error::PlannerError;
use crate::node::Node;
use crate::planner::DEFAULT_MAX_NEW_NODES;
use crate::workload::{AppResource, WorkloadSet};

/// Raw occupancy ceilings as configured, before clamping.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCeilings {
    pub cpu: Option<i64>,
    pub memory: Option<i64>,
    pub storage: Option<i64>,
}

impl RawCeilings {
    pub fn resolve(&self) -> OccupancyThresholds {
        OccupancyThresholds::from_raw(
            self.cpu.unwrap_or(100),
            self.memory.unwrap_or(100),
            self.storage.unwrap_or(100),
        )
    }
}

/// Holds raw planner config parsed from YAML file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct RawPlannerConfig {
    pub max_new_nodes: Option<u32>,
    pub ceilings: Option<RawCeilings>,
    pub cluster: Option<ClusterSnapshot>,
    pub apps: Option<Vec<AppResource>>,
    pub new_node: Option<Node>,
}

/// Represents a validated planning run: the original cluster, the selected
/// applications, the new-node template and the search parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Upper bound on the node counts attempted per run.
    pub max_new_nodes: u32,
    /// Occupancy ceilings, clamped into [0, 100].
    pub thresholds: OccupancyThresholds,
    /// Original cluster description.
    pub cluster: ClusterSnapshot,
    /// Selected applications.
    pub apps: Vec<AppResource>,
    /// The single new-node definition to clone during the search.
    pub new_node: Node,
}

impl PlannerConfig {
    pub fn from_file(file_name: &str) -> Result<Self, PlannerError> {
        let content = std::fs::read_to_string(file_name)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, PlannerError> {
        let raw: RawPlannerConfig = serde_yaml::from_str(content)?;

        let cluster = raw
            .cluster
            .ok_or_else(|| PlannerError::Config("cluster description is missing".to_string()))?;
        if cluster.nodes.is_empty() {
            return Err(PlannerError::Config(
                "cluster description has no nodes".to_string(),
            ));
        }
        let new_node = raw.new_node.ok_or(PlannerError::MissingNodeTemplate)?;

        Ok(Self {
            max_new_nodes: raw.max_new_nodes.unwrap_or(DEFAULT_MAX_NEW_NODES),
            thresholds: raw.ceilings.unwrap_or_default().resolve(),
            cluster,
            apps: raw.apps.unwrap_or_default(),
            new_node,
        })
    }

    /// Workload set of the selected applications, pods annotated with the
    /// owning application's name.
    pub fn workload_set(&self) -> WorkloadSet {
        WorkloadSet::from_apps(&self.apps)
    }
}
