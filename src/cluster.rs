//! Cluster snapshot the scheduling oracle runs against.

use serde::{Deserialize, Serialize};

use crate::node::Node;
use crate::pod::Pod;
use crate::workload::DaemonSet;

/// Ordered set of nodes plus the workload-producing objects already active on
/// the cluster. The search loop never mutates a snapshot in place: each
/// iteration derives a fresh one with the candidate nodes appended.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterSnapshot {
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub pods: Vec<Pod>,
    #[serde(default)]
    pub daemon_sets: Vec<DaemonSet>,
}

impl ClusterSnapshot {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self {
            nodes,
            pods: Vec::new(),
            daemon_sets: Vec::new(),
        }
    }

    /// Derives the trial snapshot for one search iteration: the original
    /// nodes followed by the candidate nodes, everything else unchanged.
    pub fn with_candidate_nodes(&self, candidates: Vec<Node>) -> ClusterSnapshot {
        let mut snapshot = self.clone();
        snapshot.nodes.extend(candidates);
        snapshot
    }
}
