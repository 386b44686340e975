use k8s_capacity_planner::default_oracles::first_fit_oracle::FirstFitOracle;
use k8s_capacity_planner::planner::{CapacityPlanner, PlanOutcome};
use k8s_capacity_planner::planner_config::PlannerConfig;
use k8s_capacity_planner::report::save_report;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "planner-config.yaml".to_string());
    let config = PlannerConfig::from_file(&config_path)?;

    let planner = CapacityPlanner::new(
        Box::new(FirstFitOracle::new()),
        config.thresholds,
        config.max_new_nodes,
    );
    let outcome = planner.plan(&config.cluster, &config.new_node, &config.workload_set())?;

    match &outcome {
        PlanOutcome::Success {
            nodes_added,
            report,
        } => {
            println!("success with {} added node(s)", nodes_added);
            save_report(report, "./report.json")?;
        }
        PlanOutcome::StructurallyFailed {
            blocker, report, ..
        } => {
            println!("failed to schedule pod {}: {}", blocker.pod, blocker.cause);
            save_report(report, "./report.json")?;
        }
        PlanOutcome::Exhausted { attempts, report } => {
            println!("we have added {} nodes but it still failed", attempts);
            if let Some(report) = report {
                save_report(report, "./report.json")?;
            }
        }
        PlanOutcome::Cancelled { attempts } => {
            println!("cancelled after {} attempt(s)", attempts);
        }
    }
    Ok(())
}
