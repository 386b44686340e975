//! Built-in deterministic scheduling oracle.
//!
//! Places daemon-set pods once per eligible node, then assigns the remaining
//! pods to the first node (in snapshot order) whose constraints match and
//! whose free capacity covers the requests. Deterministic by construction:
//! the node order and the pod order fully decide the placement.

use crate::cluster::ClusterSnapshot;
use crate::node::Node;
use crate::oracle::{
    NodePlacement, OracleError, SchedulingOracle, SimulationOutcome, UnscheduledPod,
};
use crate::pod::Pod;
use crate::resources::Resources;
use crate::workload::WorkloadSet;

#[derive(Default)]
pub struct FirstFitOracle;

impl FirstFitOracle {
    pub fn new() -> Self {
        Default::default()
    }
}

struct NodeSlot {
    node: Node,
    free: Resources,
    pods: Vec<Pod>,
}

impl NodeSlot {
    fn try_place(&mut self, pod: &Pod) -> bool {
        if !pod.fits_node_constraints(&self.node) || !pod.requests.fits_within(&self.free) {
            return false;
        }
        self.free.cpu_milli -= pod.requests.cpu_milli;
        self.free.memory -= pod.requests.memory;
        self.free.storage -= pod.requests.storage;
        for (name, amount) in &pod.requests.extended {
            if let Some(free) = self.free.extended.get_mut(name) {
                *free -= amount;
            }
        }
        let mut placed = pod.clone();
        placed.node_name = Some(self.node.name.clone());
        self.pods.push(placed);
        true
    }
}

impl SchedulingOracle for FirstFitOracle {
    fn simulate(
        &self,
        snapshot: &ClusterSnapshot,
        workloads: &WorkloadSet,
    ) -> Result<SimulationOutcome, OracleError> {
        let mut slots: Vec<NodeSlot> = snapshot
            .nodes
            .iter()
            .map(|node| NodeSlot {
                node: node.clone(),
                free: node.allocatable.clone(),
                pods: Vec::new(),
            })
            .collect();
        let mut unscheduled = Vec::new();

        // Daemon-set pods run once per eligible node and are placed before
        // anything else, like the real scheduler's per-node overhead.
        for ds in snapshot.daemon_sets.iter().chain(&workloads.daemon_sets) {
            for slot in &mut slots {
                if !ds.pod.fits_node_constraints(&slot.node) {
                    continue;
                }
                let mut pod = ds.pod.clone();
                pod.name = format!("{}-{}", ds.name, slot.node.name);
                if !slot.try_place(&pod) {
                    unscheduled.push(UnscheduledPod {
                        pod,
                        reason: format!(
                            "node {} cannot hold daemonset {}: insufficient resources",
                            slot.node.name, ds.name
                        ),
                    });
                }
            }
        }

        for pod in snapshot.pods.iter().chain(&workloads.pods) {
            let placed = slots.iter_mut().any(|slot| slot.try_place(pod));
            if !placed {
                unscheduled.push(UnscheduledPod {
                    pod: pod.clone(),
                    reason: format!(
                        "0/{} nodes are available: no node matches the pod's \
                         constraints with enough free resources",
                        slots.len()
                    ),
                });
            }
        }

        Ok(SimulationOutcome {
            node_placements: slots
                .into_iter()
                .map(|slot| NodePlacement {
                    node: slot.node,
                    pods: slot.pods,
                })
                .collect(),
            unscheduled,
        })
    }
}
