//! Scheduling oracle boundary.
//!
//! The oracle decides which pod goes on which node for a concrete cluster
//! snapshot. It is consumed as a black-box capability behind a trait so the
//! search loop can be exercised with a deterministic stub instead of a full
//! scheduling engine.

use serde::Serialize;
use thiserror::Error;

use crate::cluster::ClusterSnapshot;
use crate::node::Node;
use crate::pod::Pod;
use crate::workload::WorkloadSet;

/// Failure of the scheduling computation itself. Treated as fatal by the
/// search loop and propagated unchanged.
#[derive(Debug, Error, PartialEq)]
pub enum OracleError {
    #[error("scheduling simulation failed: {0}")]
    Internal(String),
}

/// A node together with the pods the oracle placed on it.
#[derive(Clone, Debug, Serialize)]
pub struct NodePlacement {
    pub node: Node,
    pub pods: Vec<Pod>,
}

/// A pod the oracle could not place, with the scheduler's reason.
#[derive(Clone, Debug, Serialize)]
pub struct UnscheduledPod {
    pub pod: Pod,
    pub reason: String,
}

/// Result of one oracle invocation. Created fresh per iteration and read-only
/// to the rest of the core.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SimulationOutcome {
    pub node_placements: Vec<NodePlacement>,
    pub unscheduled: Vec<UnscheduledPod>,
}

pub trait SchedulingOracle {
    /// Simulates scheduling of `workloads` (and everything the snapshot
    /// itself produces) onto the snapshot's nodes. Must be deterministic for
    /// identical inputs and must not mutate them.
    fn simulate(
        &self,
        snapshot: &ClusterSnapshot,
        workloads: &WorkloadSet,
    ) -> Result<SimulationOutcome, OracleError>;
}
