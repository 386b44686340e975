//! Resource-occupancy admission after a fully successful placement.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::oracle::SimulationOutcome;
use crate::resources::{ResourceKind, Resources};

/// Occupancy ceilings in integer percent, one per constrained resource kind.
/// 100 means no constraint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancyThresholds {
    pub cpu: u32,
    pub memory: u32,
    pub storage: u32,
}

impl Default for OccupancyThresholds {
    fn default() -> Self {
        Self {
            cpu: 100,
            memory: 100,
            storage: 100,
        }
    }
}

impl OccupancyThresholds {
    /// Builds thresholds from raw configured values. An out-of-range value
    /// silently resets to 100.
    pub fn from_raw(cpu: i64, memory: i64, storage: i64) -> Self {
        Self {
            cpu: clamp_ceiling(cpu),
            memory: clamp_ceiling(memory),
            storage: clamp_ceiling(storage),
        }
    }

    fn ceiling(&self, kind: &ResourceKind) -> u32 {
        match kind {
            ResourceKind::Cpu => self.cpu,
            ResourceKind::Memory => self.memory,
            ResourceKind::Storage => self.storage,
            // Extended resources have no configurable ceiling.
            ResourceKind::Extended(_) => 100,
        }
    }
}

fn clamp_ceiling(value: i64) -> u32 {
    if (0..=100).contains(&value) {
        value as u32
    } else {
        100
    }
}

/// Total allocatable vs. requested for one resource kind, aggregated across
/// every node in the snapshot. Recomputed from scratch at each use; the node
/// set changes every iteration, so nothing here may be cached.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ResourceOccupancy {
    pub allocatable: u64,
    pub requested: u64,
}

impl ResourceOccupancy {
    /// Occupancy in integer percent, rounded down. `None` when the cluster
    /// has no allocatable capacity of this kind, which means no constraint.
    pub fn percent(&self) -> Option<u32> {
        if self.allocatable == 0 {
            None
        } else {
            Some((self.requested * 100 / self.allocatable) as u32)
        }
    }
}

/// Aggregates occupancy per resource kind across all nodes of the outcome,
/// original and simulator-added alike.
pub fn aggregate_occupancy(outcome: &SimulationOutcome) -> BTreeMap<ResourceKind, ResourceOccupancy> {
    let mut totals: BTreeMap<ResourceKind, ResourceOccupancy> = BTreeMap::new();

    for placement in &outcome.node_placements {
        let mut requested = Resources::default();
        for pod in &placement.pods {
            requested += pod.requests.clone();
        }
        // Union of the kinds the node declares and the kinds its pods request:
        // requests against an undeclared kind still count toward the totals.
        let mut kinds = placement.node.allocatable.kinds();
        for kind in requested.kinds() {
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        for kind in kinds {
            let entry = totals.entry(kind.clone()).or_default();
            entry.allocatable += placement.node.allocatable.get(&kind);
            entry.requested += requested.get(&kind);
        }
    }

    totals
}

/// Pass/fail decision with the first offending resource kind, if any.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum AdmissionVerdict {
    Passed,
    Rejected {
        resource: ResourceKind,
        occupancy: u32,
        ceiling: u32,
    },
}

impl AdmissionVerdict {
    pub fn passed(&self) -> bool {
        matches!(self, AdmissionVerdict::Passed)
    }
}

impl Display for AdmissionVerdict {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            AdmissionVerdict::Passed => write!(f, "all occupancy ceilings satisfied"),
            AdmissionVerdict::Rejected {
                resource,
                occupancy,
                ceiling,
            } => write!(
                f,
                "the average occupancy rate ({}%) of {} goes beyond the configured ceiling ({}%)",
                occupancy, resource, ceiling
            ),
        }
    }
}

/// Checks aggregated occupancy against the ceilings. Invoked only when the
/// oracle reports zero unscheduled pods. Fails on the first resource kind, in
/// the fixed order cpu, memory, storage, whose occupancy exceeds its ceiling.
pub fn check_admission(
    outcome: &SimulationOutcome,
    thresholds: &OccupancyThresholds,
) -> AdmissionVerdict {
    let totals = aggregate_occupancy(outcome);

    for (kind, occupancy) in &totals {
        let ceiling = thresholds.ceiling(kind);
        // A kind absent from the cluster imposes no constraint.
        if let Some(percent) = occupancy.percent() {
            if percent > ceiling {
                return AdmissionVerdict::Rejected {
                    resource: kind.clone(),
                    occupancy: percent,
                    ceiling,
                };
            }
        }
    }

    AdmissionVerdict::Passed
}
