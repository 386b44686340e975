//! Structured summary of a simulation outcome.
//!
//! Pure transformation consumed by an external presentation layer; no
//! formatting decisions are made here beyond JSON persistence.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;

use serde::Serialize;

use crate::admission::{aggregate_occupancy, ResourceOccupancy};
use crate::error::PlannerError;
use crate::oracle::SimulationOutcome;
use crate::resources::{ResourceKind, Resources};

/// Allocatable vs. requested for one resource kind on one node.
#[derive(Clone, Debug, Serialize)]
pub struct ResourceUsage {
    pub allocatable: u64,
    pub requested: u64,
    /// Integer percent, rounded down. Absent when nothing is allocatable.
    pub percent: Option<u32>,
}

#[derive(Clone, Debug, Serialize)]
pub struct NodeReport {
    pub name: String,
    /// Whether the node was added by the simulation (cloned from the
    /// new-node template) rather than present in the original cluster.
    pub new_node: bool,
    pub pod_count: usize,
    pub usage: BTreeMap<ResourceKind, ResourceUsage>,
}

#[derive(Clone, Debug, Serialize)]
pub struct PodReport {
    pub name: String,
    pub namespace: String,
    pub app_name: Option<String>,
    pub node: Option<String>,
    pub requests: Resources,
    /// Share of the hosting node's allocatable, per resource kind.
    pub percent_of_node: BTreeMap<ResourceKind, u32>,
}

#[derive(Clone, Debug, Serialize)]
pub struct UnscheduledReport {
    pub name: String,
    pub namespace: String,
    pub app_name: Option<String>,
    pub reason: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ClusterReport {
    pub nodes: Vec<NodeReport>,
    pub pods: Vec<PodReport>,
    pub unscheduled: Vec<UnscheduledReport>,
    pub totals: BTreeMap<ResourceKind, ResourceOccupancy>,
}

/// Builds the structured summary for one simulation outcome.
pub fn build_report(outcome: &SimulationOutcome) -> ClusterReport {
    let mut nodes = Vec::new();
    let mut pods = Vec::new();

    for placement in &outcome.node_placements {
        let allocatable = &placement.node.allocatable;
        let mut requested = Resources::default();

        for pod in &placement.pods {
            requested += pod.requests.clone();

            let mut percent_of_node = BTreeMap::new();
            for kind in pod.requests.kinds() {
                let capacity = allocatable.get(&kind);
                if capacity > 0 {
                    percent_of_node
                        .insert(kind.clone(), (pod.requests.get(&kind) * 100 / capacity) as u32);
                }
            }
            pods.push(PodReport {
                name: pod.name.clone(),
                namespace: pod.namespace.clone(),
                app_name: pod.app_name().map(str::to_string),
                node: pod.node_name.clone(),
                requests: pod.requests.clone(),
                percent_of_node,
            });
        }

        let mut usage = BTreeMap::new();
        for kind in allocatable.kinds() {
            let occupancy = ResourceOccupancy {
                allocatable: allocatable.get(&kind),
                requested: requested.get(&kind),
            };
            usage.insert(
                kind,
                ResourceUsage {
                    allocatable: occupancy.allocatable,
                    requested: occupancy.requested,
                    percent: occupancy.percent(),
                },
            );
        }

        nodes.push(NodeReport {
            name: placement.node.name.clone(),
            new_node: placement.node.is_simulated(),
            pod_count: placement.pods.len(),
            usage,
        });
    }

    let unscheduled = outcome
        .unscheduled
        .iter()
        .map(|u| UnscheduledReport {
            name: u.pod.name.clone(),
            namespace: u.pod.namespace.clone(),
            app_name: u.pod.app_name().map(str::to_string),
            reason: u.reason.clone(),
        })
        .collect();

    ClusterReport {
        nodes,
        pods,
        unscheduled,
        totals: aggregate_occupancy(outcome),
    }
}

/// Writes the report as JSON.
pub fn save_report(report: &ClusterReport, path: &str) -> Result<(), PlannerError> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), report)?;
    Ok(())
}
