//! Classification of unscheduled pods against the new-node template.
//!
//! Decides, per pod, whether a placement failure can be fixed by adding more
//! nodes of the template or is structural. Classification is pod-local and
//! order-independent.

use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::node::Node;
use crate::pod::Pod;
use crate::resources::Resources;
use crate::workload::DaemonSet;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum UnschedulableCause {
    /// The template's scheduling constraints (selector, taints) can never
    /// admit this pod, no matter how many nodes are added.
    Unfixable,
    /// Constraints are compatible, but the per-node companion workload
    /// footprint plus the pod's own request already exceeds one template
    /// node's allocatable capacity.
    OverheadBlocked,
    /// The pod simply does not fit the current node count. The only cause
    /// that justifies continuing the search.
    CapacityLimited,
}

impl UnschedulableCause {
    pub fn is_structural(&self) -> bool {
        !matches!(self, UnschedulableCause::CapacityLimited)
    }
}

impl Display for UnschedulableCause {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            UnschedulableCause::Unfixable => {
                write!(f, "pod does not fit new node affinity or taints")
            }
            UnschedulableCause::OverheadBlocked => write!(
                f,
                "the total requested resource of daemonset pods in new node is too large"
            ),
            UnschedulableCause::CapacityLimited => write!(f, "insufficient node count"),
        }
    }
}

/// Summed requests of every companion pod that would run on one node of the
/// template. Companion footprint replicates per node, so a single-node sum is
/// enough.
pub fn companion_overhead(template: &Node, daemon_sets: &[DaemonSet]) -> Resources {
    let mut overhead = Resources::default();
    for ds in daemon_sets {
        if ds.pod.fits_node_constraints(template) {
            overhead += ds.pod.requests.clone();
        }
    }
    overhead
}

/// Classifies one unscheduled pod. The constraint check runs first, before
/// any capacity reasoning.
pub fn classify_unscheduled_pod(
    pod: &Pod,
    template: &Node,
    daemon_sets: &[DaemonSet],
) -> UnschedulableCause {
    if !pod.fits_node_constraints(template) {
        return UnschedulableCause::Unfixable;
    }

    let footprint = companion_overhead(template, daemon_sets) + pod.requests.clone();
    if !footprint.fits_within(&template.allocatable) {
        return UnschedulableCause::OverheadBlocked;
    }

    UnschedulableCause::CapacityLimited
}
