//! Representation of the k8s pod

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::node::{Node, Taint};
use crate::resources::Resources;

/// Label carrying the name of the application a pod belongs to.
pub const APP_NAME_LABEL: &str = "app.kubernetes.io/name";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TolerationOperator {
    #[default]
    Equal,
    Exists,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Toleration {
    /// Empty key with operator `Exists` tolerates every taint.
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub operator: TolerationOperator,
    #[serde(default)]
    pub value: Option<String>,
    /// `None` matches taints of any effect.
    #[serde(default)]
    pub effect: Option<crate::node::TaintEffect>,
}

impl Toleration {
    pub fn tolerates(&self, taint: &Taint) -> bool {
        if let Some(effect) = &self.effect {
            if *effect != taint.effect {
                return false;
            }
        }
        match self.operator {
            TolerationOperator::Exists => self.key.is_empty() || self.key == taint.key,
            TolerationOperator::Equal => self.key == taint.key && self.value == taint.value,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pod {
    pub name: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub requests: Resources,
    /// Labels the hosting node must carry.
    #[serde(default)]
    pub node_selector: BTreeMap<String, String>,
    #[serde(default)]
    pub tolerations: Vec<Toleration>,
    /// Name of the node the pod is placed on, set by the scheduling oracle.
    #[serde(default)]
    pub node_name: Option<String>,
}

fn default_namespace() -> String {
    "default".to_string()
}

impl Pod {
    pub fn new(name: impl Into<String>, requests: Resources) -> Self {
        Self {
            name: name.into(),
            namespace: default_namespace(),
            labels: BTreeMap::new(),
            requests,
            node_selector: BTreeMap::new(),
            tolerations: Vec::new(),
            node_name: None,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }

    pub fn app_name(&self) -> Option<&str> {
        self.labels.get(APP_NAME_LABEL).map(String::as_str)
    }

    /// True if every node-selector entry is present on the node's labels.
    pub fn selector_matches(&self, node: &Node) -> bool {
        self.node_selector
            .iter()
            .all(|(key, value)| node.labels.get(key) == Some(value))
    }

    /// True if every blocking taint on the node is tolerated by this pod.
    pub fn tolerates_taints(&self, node: &Node) -> bool {
        node.taints
            .iter()
            .filter(|taint| taint.is_blocking())
            .all(|taint| self.tolerations.iter().any(|t| t.tolerates(taint)))
    }

    /// Capacity-independent placement check: selector and taints only.
    pub fn fits_node_constraints(&self, node: &Node) -> bool {
        self.selector_matches(node) && self.tolerates_taints(node)
    }
}
