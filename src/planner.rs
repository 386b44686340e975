//! Node-count search loop.
//!
//! Grows the cluster snapshot by cloning the new-node template, invokes the
//! scheduling oracle, classifies failures and enforces occupancy ceilings
//! until success, a structural abort, cancellation or the search ceiling.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};
use serde::Serialize;

use crate::admission::{check_admission, AdmissionVerdict, OccupancyThresholds};
use crate::classifier::{classify_unscheduled_pod, UnschedulableCause};
use crate::cluster::ClusterSnapshot;
use crate::error::PlannerError;
use crate::node::Node;
use crate::node_template::expand_template;
use crate::oracle::{SchedulingOracle, SimulationOutcome};
use crate::report::{build_report, ClusterReport};
use crate::workload::{DaemonSet, WorkloadSet};

/// Default upper bound on the number of nodes attempted per run.
pub const DEFAULT_MAX_NEW_NODES: u32 = 100;

/// The pod that stopped the search, and why adding more template nodes
/// cannot help.
#[derive(Clone, Debug, Serialize)]
pub struct StructuralBlocker {
    pub pod: String,
    pub cause: UnschedulableCause,
    /// The reason reported by the scheduling oracle.
    pub oracle_reason: String,
}

/// Terminal state of one planning run. Every variant is a successful
/// computation carrying its diagnostic report; fatal errors surface as
/// `PlannerError` instead.
#[derive(Debug, Serialize)]
pub enum PlanOutcome {
    /// Full placement and admission succeeded with `nodes_added` candidates.
    Success {
        nodes_added: u32,
        report: ClusterReport,
    },
    /// No amount of additional identical nodes will ever succeed.
    StructurallyFailed {
        nodes_added: u32,
        blocker: StructuralBlocker,
        report: ClusterReport,
    },
    /// The search ceiling was reached without success. More nodes of a
    /// different shape might still help.
    Exhausted {
        attempts: u32,
        report: Option<ClusterReport>,
    },
    /// An external cancellation was observed at an iteration boundary.
    Cancelled { attempts: u32 },
}

pub struct CapacityPlanner {
    oracle: Box<dyn SchedulingOracle>,
    thresholds: OccupancyThresholds,
    max_new_nodes: u32,
    cancel_flag: Option<Arc<AtomicBool>>,
}

impl CapacityPlanner {
    pub fn new(
        oracle: Box<dyn SchedulingOracle>,
        thresholds: OccupancyThresholds,
        max_new_nodes: u32,
    ) -> Self {
        Self {
            oracle,
            thresholds,
            max_new_nodes,
            cancel_flag: None,
        }
    }

    /// Registers a flag observed at iteration boundaries; setting it makes
    /// the running plan terminate in `PlanOutcome::Cancelled`.
    pub fn set_cancel_flag(&mut self, flag: Arc<AtomicBool>) {
        self.cancel_flag = Some(flag);
    }

    fn cancelled(&self) -> bool {
        self.cancel_flag
            .as_ref()
            .map(|flag| flag.load(Ordering::Relaxed))
            .unwrap_or(false)
    }

    /// Runs the search: node counts 0, 1, 2, ... up to the ceiling, strictly
    /// sequentially. Each iteration derives a fresh trial snapshot from the
    /// original; nothing is reused across iterations.
    pub fn plan(
        &self,
        snapshot: &ClusterSnapshot,
        template: &Node,
        workloads: &WorkloadSet,
    ) -> Result<PlanOutcome, PlannerError> {
        // Companions scale with the template, not with the node count, so the
        // set is fixed for the whole run: cluster daemon sets plus the ones
        // contributed by the selected applications.
        let companions: Vec<DaemonSet> = snapshot
            .daemon_sets
            .iter()
            .chain(workloads.daemon_sets.iter())
            .cloned()
            .collect();

        let mut last_outcome: Option<SimulationOutcome> = None;

        for i in 0..self.max_new_nodes {
            if self.cancelled() {
                info!("planning cancelled after {} attempt(s)", i);
                return Ok(PlanOutcome::Cancelled { attempts: i });
            }

            info!("add {} node(s)", i);
            let candidates = expand_template(Some(template), i)?;
            let trial = snapshot.with_candidate_nodes(candidates);

            let outcome = self.oracle.simulate(&trial, workloads)?;

            if outcome.unscheduled.is_empty() {
                match check_admission(&outcome, &self.thresholds) {
                    AdmissionVerdict::Passed => {
                        info!("success with {} added node(s)", i);
                        return Ok(PlanOutcome::Success {
                            nodes_added: i,
                            report: build_report(&outcome),
                        });
                    }
                    verdict @ AdmissionVerdict::Rejected { .. } => {
                        warn!("{}", verdict);
                        last_outcome = Some(outcome);
                        continue;
                    }
                }
            }

            warn!("there are {} unscheduled pod(s)", outcome.unscheduled.len());
            for unscheduled in &outcome.unscheduled {
                debug!(
                    "failed to schedule pod {}: {}",
                    unscheduled.pod.full_name(),
                    unscheduled.reason
                );
                let cause = classify_unscheduled_pod(&unscheduled.pod, template, &companions);
                if cause.is_structural() {
                    warn!(
                        "failed to schedule pod {}: {}",
                        unscheduled.pod.full_name(),
                        cause
                    );
                    return Ok(PlanOutcome::StructurallyFailed {
                        nodes_added: i,
                        blocker: StructuralBlocker {
                            pod: unscheduled.pod.full_name(),
                            cause,
                            oracle_reason: unscheduled.reason.clone(),
                        },
                        report: build_report(&outcome),
                    });
                }
            }

            last_outcome = Some(outcome);
        }

        warn!(
            "we have added {} nodes but it still failed",
            self.max_new_nodes
        );
        Ok(PlanOutcome::Exhausted {
            attempts: self.max_new_nodes,
            report: last_outcome.as_ref().map(build_report),
        })
    }
}
