//! Workload-producing objects: applications, their pods and daemon sets.

use serde::{Deserialize, Serialize};

use crate::pod::{Pod, APP_NAME_LABEL};

/// Companion workload replicated once per node. Its pod template consumes
/// fixed per-node capacity regardless of how many nodes exist.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DaemonSet {
    pub name: String,
    pub pod: Pod,
}

/// The k8s objects produced by one selected application.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AppResource {
    pub name: String,
    #[serde(default)]
    pub pods: Vec<Pod>,
    #[serde(default)]
    pub daemon_sets: Vec<DaemonSet>,
}

/// The fixed collection of pods and daemon sets requested by the selected
/// applications. Immutable input to every search iteration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkloadSet {
    pub pods: Vec<Pod>,
    pub daemon_sets: Vec<DaemonSet>,
}

impl WorkloadSet {
    /// Flattens the selected applications, annotating every pod with the name
    /// of the application it belongs to.
    pub fn from_apps(apps: &[AppResource]) -> Self {
        let mut pods = Vec::new();
        let mut daemon_sets = Vec::new();
        for app in apps {
            for pod in &app.pods {
                let mut pod = pod.clone();
                pod.labels
                    .insert(APP_NAME_LABEL.to_string(), app.name.clone());
                pods.push(pod);
            }
            for ds in &app.daemon_sets {
                let mut ds = ds.clone();
                ds.pod
                    .labels
                    .insert(APP_NAME_LABEL.to_string(), app.name.clone());
                daemon_sets.push(ds);
            }
        }
        Self { pods, daemon_sets }
    }
}
