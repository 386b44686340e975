use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use k8s_capacity_planner::admission::{
    check_admission, AdmissionVerdict, OccupancyThresholds,
};
use k8s_capacity_planner::classifier::{classify_unscheduled_pod, UnschedulableCause};
use k8s_capacity_planner::cluster::ClusterSnapshot;
use k8s_capacity_planner::default_oracles::first_fit_oracle::FirstFitOracle;
use k8s_capacity_planner::error::PlannerError;
use k8s_capacity_planner::node::{Node, Taint, TaintEffect, NEW_NODE_LABEL};
use k8s_capacity_planner::node_template::expand_template;
use k8s_capacity_planner::oracle::{
    NodePlacement, OracleError, SchedulingOracle, SimulationOutcome, UnscheduledPod,
};
use k8s_capacity_planner::planner::{CapacityPlanner, PlanOutcome};
use k8s_capacity_planner::planner_config::PlannerConfig;
use k8s_capacity_planner::pod::{Pod, Toleration, TolerationOperator};
use k8s_capacity_planner::resources::{ResourceKind, Resources};
use k8s_capacity_planner::workload::{DaemonSet, WorkloadSet};

const GIB: u64 = 1024 * 1024 * 1024;

fn node(name: &str, cpu_milli: u64, memory: u64) -> Node {
    Node::new(name, Resources::new(cpu_milli, memory))
}

fn pod(name: &str, cpu_milli: u64, memory: u64) -> Pod {
    Pod::new(name, Resources::new(cpu_milli, memory))
}

fn workloads(pods: Vec<Pod>) -> WorkloadSet {
    WorkloadSet {
        pods,
        daemon_sets: Vec::new(),
    }
}

/// Wraps an oracle and counts how many times it is invoked.
struct CountingOracle<O> {
    calls: Rc<Cell<u32>>,
    inner: O,
}

impl<O: SchedulingOracle> SchedulingOracle for CountingOracle<O> {
    fn simulate(
        &self,
        snapshot: &ClusterSnapshot,
        workloads: &WorkloadSet,
    ) -> Result<SimulationOutcome, OracleError> {
        self.calls.set(self.calls.get() + 1);
        self.inner.simulate(snapshot, workloads)
    }
}

fn counting_first_fit(calls: &Rc<Cell<u32>>) -> Box<dyn SchedulingOracle> {
    Box::new(CountingOracle {
        calls: calls.clone(),
        inner: FirstFitOracle::new(),
    })
}

/// Stub that never places anything: always reports one capacity-limited pod.
struct NeverPlacesOracle;

impl SchedulingOracle for NeverPlacesOracle {
    fn simulate(
        &self,
        snapshot: &ClusterSnapshot,
        _workloads: &WorkloadSet,
    ) -> Result<SimulationOutcome, OracleError> {
        Ok(SimulationOutcome {
            node_placements: snapshot
                .nodes
                .iter()
                .map(|n| NodePlacement {
                    node: n.clone(),
                    pods: Vec::new(),
                })
                .collect(),
            unscheduled: vec![UnscheduledPod {
                pod: pod("stuck", 500, GIB),
                reason: "insufficient cpu".to_string(),
            }],
        })
    }
}

#[test]
fn test_empty_workload_set_succeeds_without_new_nodes() {
    let cluster = ClusterSnapshot::new(vec![node("node-1", 2000, 4 * GIB)]);
    let template = node("template", 2000, 4 * GIB);
    let planner = CapacityPlanner::new(
        Box::new(FirstFitOracle::new()),
        OccupancyThresholds::default(),
        10,
    );

    let outcome = planner
        .plan(&cluster, &template, &workloads(Vec::new()))
        .unwrap();
    match outcome {
        PlanOutcome::Success {
            nodes_added,
            report,
        } => {
            assert_eq!(nodes_added, 0);
            assert_eq!(report.nodes.len(), 1);
            assert_eq!(report.totals[&ResourceKind::Cpu].percent(), Some(0));
        }
        other => panic!("expected success, got {:?}", other),
    }
}

#[test]
fn test_single_pod_fits_existing_node() {
    // 2000m/4Gi node with one 500m/1Gi pod: fits as-is, 25% occupancy.
    let cluster = ClusterSnapshot::new(vec![node("node-1", 2000, 4 * GIB)]);
    let template = node("template", 2000, 4 * GIB);
    let planner = CapacityPlanner::new(
        Box::new(FirstFitOracle::new()),
        OccupancyThresholds::default(),
        10,
    );

    let outcome = planner
        .plan(&cluster, &template, &workloads(vec![pod("web", 500, GIB)]))
        .unwrap();
    match outcome {
        PlanOutcome::Success {
            nodes_added,
            report,
        } => {
            assert_eq!(nodes_added, 0);
            assert_eq!(report.totals[&ResourceKind::Cpu].percent(), Some(25));
            assert_eq!(report.totals[&ResourceKind::Memory].percent(), Some(25));
            assert!(!report.nodes[0].new_node);
            assert_eq!(report.pods.len(), 1);
            assert_eq!(report.pods[0].node.as_deref(), Some("node-1"));
        }
        other => panic!("expected success, got {:?}", other),
    }
}

#[test]
fn test_search_attempts_every_count_until_success() {
    // Three pods of 800m/1Gi, original node too small, template holds one
    // pod each: success needs exactly three added nodes, and every count
    // below that must have been attempted.
    let cluster = ClusterSnapshot::new(vec![node("node-1", 100, GIB)]);
    let template = node("template", 1000, 2 * GIB);
    let calls = Rc::new(Cell::new(0));
    let planner = CapacityPlanner::new(
        counting_first_fit(&calls),
        OccupancyThresholds::default(),
        10,
    );

    let pods = vec![
        pod("app-0", 800, GIB),
        pod("app-1", 800, GIB),
        pod("app-2", 800, GIB),
    ];
    let outcome = planner.plan(&cluster, &template, &workloads(pods)).unwrap();
    match outcome {
        PlanOutcome::Success {
            nodes_added,
            report,
        } => {
            assert_eq!(nodes_added, 3);
            assert_eq!(calls.get(), 4); // i = 0, 1, 2, 3
            assert_eq!(report.nodes.iter().filter(|n| n.new_node).count(), 3);
        }
        other => panic!("expected success, got {:?}", other),
    }
}

#[test]
fn test_unfixable_taint_aborts_at_first_iteration() {
    let mut tainted = node("node-1", 2000, 4 * GIB);
    tainted.taints.push(Taint {
        key: "dedicated".to_string(),
        value: None,
        effect: TaintEffect::NoSchedule,
    });
    let cluster = ClusterSnapshot::new(vec![tainted.clone()]);
    let mut template = node("template", 2000, 4 * GIB);
    template.taints = tainted.taints.clone();

    let calls = Rc::new(Cell::new(0));
    let planner = CapacityPlanner::new(
        counting_first_fit(&calls),
        OccupancyThresholds::default(),
        10,
    );

    let outcome = planner
        .plan(&cluster, &template, &workloads(vec![pod("web", 500, GIB)]))
        .unwrap();
    match outcome {
        PlanOutcome::StructurallyFailed {
            nodes_added,
            blocker,
            report,
        } => {
            assert_eq!(nodes_added, 0);
            assert_eq!(calls.get(), 1);
            assert_eq!(blocker.cause, UnschedulableCause::Unfixable);
            assert_eq!(blocker.pod, "default/web");
            assert_eq!(report.unscheduled.len(), 1);
        }
        other => panic!("expected structural failure, got {:?}", other),
    }
}

#[test]
fn test_daemonset_overhead_blocks_the_search() {
    let cluster = ClusterSnapshot {
        nodes: vec![node("node-1", 100, GIB)],
        pods: Vec::new(),
        daemon_sets: vec![DaemonSet {
            name: "log-agent".to_string(),
            pod: pod("log-agent", 900, 0),
        }],
    };
    let template = node("template", 1000, 2 * GIB);
    let planner = CapacityPlanner::new(
        Box::new(FirstFitOracle::new()),
        OccupancyThresholds::default(),
        10,
    );

    // 900m of per-node overhead plus a 200m pod exceeds the 1000m template.
    let outcome = planner
        .plan(&cluster, &template, &workloads(vec![pod("web", 200, GIB)]))
        .unwrap();
    match outcome {
        PlanOutcome::StructurallyFailed { blocker, .. } => {
            assert_eq!(blocker.cause, UnschedulableCause::OverheadBlocked);
        }
        other => panic!("expected structural failure, got {:?}", other),
    }
}

#[test]
fn test_exhausted_after_exactly_ceiling_attempts() {
    let cluster = ClusterSnapshot::new(vec![node("node-1", 1000, GIB)]);
    let template = node("template", 1000, 2 * GIB);
    let calls = Rc::new(Cell::new(0));
    let planner = CapacityPlanner::new(
        Box::new(CountingOracle {
            calls: calls.clone(),
            inner: NeverPlacesOracle,
        }),
        OccupancyThresholds::default(),
        5,
    );

    let outcome = planner
        .plan(&cluster, &template, &workloads(Vec::new()))
        .unwrap();
    match outcome {
        PlanOutcome::Exhausted { attempts, report } => {
            assert_eq!(attempts, 5);
            assert_eq!(calls.get(), 5);
            assert!(report.is_some());
        }
        other => panic!("expected exhaustion, got {:?}", other),
    }
}

#[test]
fn test_admission_rejection_is_not_terminal() {
    // Everything places at i = 0, but a 0% CPU ceiling can never pass, so the
    // loop keeps trying larger counts until the ceiling of attempts.
    let cluster = ClusterSnapshot::new(vec![node("node-1", 2000, 4 * GIB)]);
    let template = node("template", 2000, 4 * GIB);
    let calls = Rc::new(Cell::new(0));
    let planner = CapacityPlanner::new(
        counting_first_fit(&calls),
        OccupancyThresholds::from_raw(0, 100, 100),
        3,
    );

    let outcome = planner
        .plan(&cluster, &template, &workloads(vec![pod("web", 500, GIB)]))
        .unwrap();
    match outcome {
        PlanOutcome::Exhausted { attempts, .. } => {
            assert_eq!(attempts, 3);
            assert_eq!(calls.get(), 3);
        }
        other => panic!("expected exhaustion, got {:?}", other),
    }
}

#[test]
fn test_cancellation_observed_before_first_iteration() {
    let cluster = ClusterSnapshot::new(vec![node("node-1", 2000, 4 * GIB)]);
    let template = node("template", 2000, 4 * GIB);
    let calls = Rc::new(Cell::new(0));
    let mut planner = CapacityPlanner::new(
        counting_first_fit(&calls),
        OccupancyThresholds::default(),
        10,
    );
    let flag = Arc::new(AtomicBool::new(false));
    planner.set_cancel_flag(flag.clone());
    flag.store(true, Ordering::Relaxed);

    let outcome = planner
        .plan(&cluster, &template, &workloads(vec![pod("web", 500, GIB)]))
        .unwrap();
    match outcome {
        PlanOutcome::Cancelled { attempts } => {
            assert_eq!(attempts, 0);
            assert_eq!(calls.get(), 0);
        }
        other => panic!("expected cancellation, got {:?}", other),
    }
}

#[test]
fn test_admission_enforces_cpu_ceiling() {
    let outcome = SimulationOutcome {
        node_placements: vec![NodePlacement {
            node: node("node-1", 1000, 4 * GIB),
            pods: vec![pod("heavy", 900, GIB)],
        }],
        unscheduled: Vec::new(),
    };

    match check_admission(&outcome, &OccupancyThresholds::from_raw(80, 100, 100)) {
        AdmissionVerdict::Rejected {
            resource,
            occupancy,
            ceiling,
        } => {
            assert_eq!(resource, ResourceKind::Cpu);
            assert_eq!(occupancy, 90);
            assert_eq!(ceiling, 80);
        }
        verdict => panic!("expected rejection, got {:?}", verdict),
    }

    assert!(check_admission(&outcome, &OccupancyThresholds::from_raw(95, 100, 100)).passed());
}

#[test]
fn test_admission_skips_absent_resource_kinds() {
    // No storage declared anywhere: the storage ceiling imposes no constraint.
    let outcome = SimulationOutcome {
        node_placements: vec![NodePlacement {
            node: node("node-1", 1000, GIB),
            pods: vec![pod("web", 100, GIB / 2)],
        }],
        unscheduled: Vec::new(),
    };
    assert!(check_admission(&outcome, &OccupancyThresholds::from_raw(100, 100, 0)).passed());
}

#[test]
fn test_thresholds_clamp_out_of_range_values() {
    let thresholds = OccupancyThresholds::from_raw(-5, 250, 40);
    assert_eq!(thresholds.cpu, 100);
    assert_eq!(thresholds.memory, 100);
    assert_eq!(thresholds.storage, 40);
}

#[test]
fn test_expander_produces_marked_deterministic_clones() {
    let mut template = node("template", 2000, 4 * GIB);
    template.labels.insert("zone".to_string(), "a".to_string());

    let first = expand_template(Some(&template), 3).unwrap();
    let second = expand_template(Some(&template), 3).unwrap();
    assert_eq!(first, second);

    assert_eq!(first.len(), 3);
    assert_eq!(first[0].name, "simulated-node-00");
    assert_eq!(first[2].name, "simulated-node-02");
    for candidate in &first {
        assert!(candidate.is_simulated());
        assert!(candidate.labels.contains_key(NEW_NODE_LABEL));
        assert_eq!(candidate.allocatable, template.allocatable);
        assert_eq!(candidate.labels.get("zone"), Some(&"a".to_string()));
    }
}

#[test]
fn test_expander_edge_cases() {
    let template = node("template", 2000, 4 * GIB);
    assert!(expand_template(Some(&template), 0).unwrap().is_empty());
    assert!(matches!(
        expand_template(None, 3),
        Err(PlannerError::MissingNodeTemplate)
    ));
}

#[test]
fn test_classifier_prefers_constraint_check_over_capacity() {
    // Pod both violates the template taint and exceeds its capacity; the
    // constraint mismatch must win.
    let mut template = node("template", 100, GIB);
    template.taints.push(Taint {
        key: "dedicated".to_string(),
        value: None,
        effect: TaintEffect::NoSchedule,
    });
    let big = pod("big", 5000, 8 * GIB);
    assert_eq!(
        classify_unscheduled_pod(&big, &template, &[]),
        UnschedulableCause::Unfixable
    );
}

#[test]
fn test_classifier_tolerated_taint_is_not_structural() {
    let mut template = node("template", 2000, 4 * GIB);
    template.taints.push(Taint {
        key: "dedicated".to_string(),
        value: None,
        effect: TaintEffect::NoSchedule,
    });
    let mut tolerant = pod("tolerant", 500, GIB);
    tolerant.tolerations.push(Toleration {
        key: "dedicated".to_string(),
        operator: TolerationOperator::Exists,
        value: None,
        effect: None,
    });
    assert_eq!(
        classify_unscheduled_pod(&tolerant, &template, &[]),
        UnschedulableCause::CapacityLimited
    );
}

#[test]
fn test_first_fit_oracle_honors_node_selector() {
    let mut gpu_node = node("gpu-node", 4000, 8 * GIB);
    gpu_node
        .labels
        .insert("accelerator".to_string(), "gpu".to_string());
    let cluster = ClusterSnapshot::new(vec![node("cpu-node", 4000, 8 * GIB), gpu_node]);

    let mut selective = pod("trainer", 1000, GIB);
    selective
        .node_selector
        .insert("accelerator".to_string(), "gpu".to_string());

    let outcome = FirstFitOracle::new()
        .simulate(&cluster, &workloads(vec![selective]))
        .unwrap();
    assert!(outcome.unscheduled.is_empty());
    assert_eq!(outcome.node_placements[0].pods.len(), 0);
    assert_eq!(outcome.node_placements[1].pods.len(), 1);
    assert_eq!(
        outcome.node_placements[1].pods[0].node_name.as_deref(),
        Some("gpu-node")
    );
}

#[test]
fn test_first_fit_oracle_expands_daemon_sets_per_node() {
    let cluster = ClusterSnapshot {
        nodes: vec![node("node-1", 2000, 4 * GIB), node("node-2", 2000, 4 * GIB)],
        pods: Vec::new(),
        daemon_sets: vec![DaemonSet {
            name: "log-agent".to_string(),
            pod: pod("log-agent", 100, GIB / 4),
        }],
    };

    let outcome = FirstFitOracle::new()
        .simulate(&cluster, &workloads(Vec::new()))
        .unwrap();
    assert!(outcome.unscheduled.is_empty());
    for placement in &outcome.node_placements {
        assert_eq!(placement.pods.len(), 1);
        assert_eq!(
            placement.pods[0].name,
            format!("log-agent-{}", placement.node.name)
        );
    }
}

#[test]
fn test_config_loading_and_validation() {
    let yaml = r#"
max_new_nodes: 20
ceilings: { cpu: 60, memory: 200 }
cluster:
  nodes:
    - name: node-1
      allocatable: { cpu_milli: 2000, memory: 4294967296 }
apps:
  - name: web
    pods:
      - name: web-0
        requests: { cpu_milli: 500, memory: 1073741824 }
new_node:
  name: template
  allocatable: { cpu_milli: 2000, memory: 4294967296 }
"#;
    let config = PlannerConfig::from_yaml(yaml).unwrap();
    assert_eq!(config.max_new_nodes, 20);
    assert_eq!(config.thresholds.cpu, 60);
    assert_eq!(config.thresholds.memory, 100); // out of range, reset
    assert_eq!(config.cluster.nodes.len(), 1);

    let workload_set = config.workload_set();
    assert_eq!(workload_set.pods.len(), 1);
    assert_eq!(workload_set.pods[0].app_name(), Some("web"));

    let no_template = "cluster:\n  nodes:\n    - name: node-1\n      allocatable: {}\n";
    assert!(matches!(
        PlannerConfig::from_yaml(no_template),
        Err(PlannerError::MissingNodeTemplate)
    ));
}

#[test]
fn test_oracle_error_is_fatal() {
    struct BrokenOracle;
    impl SchedulingOracle for BrokenOracle {
        fn simulate(
            &self,
            _snapshot: &ClusterSnapshot,
            _workloads: &WorkloadSet,
        ) -> Result<SimulationOutcome, OracleError> {
            Err(OracleError::Internal("scheduler plugin crashed".to_string()))
        }
    }

    let cluster = ClusterSnapshot::new(vec![node("node-1", 2000, 4 * GIB)]);
    let template = node("template", 2000, 4 * GIB);
    let planner = CapacityPlanner::new(Box::new(BrokenOracle), OccupancyThresholds::default(), 10);

    let err = planner
        .plan(&cluster, &template, &workloads(vec![pod("web", 500, GIB)]))
        .unwrap_err();
    assert!(matches!(err, PlannerError::Oracle(_)));
}
