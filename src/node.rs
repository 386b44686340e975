//! Representation of the k8s node

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::resources::Resources;

/// Label set on every node cloned from the new-node template, so later stages
/// can tell original nodes from simulator-added ones.
pub const NEW_NODE_LABEL: &str = "simulator/new-node";

/// Name prefix of nodes cloned from the new-node template.
pub const NEW_NODE_NAME_PREFIX: &str = "simulated-node";

/// Taint effect, matching the k8s scheduling semantics.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaintEffect {
    NoSchedule,
    NoExecute,
    PreferNoSchedule,
}

impl Display for TaintEffect {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            TaintEffect::NoSchedule => write!(f, "NoSchedule"),
            TaintEffect::NoExecute => write!(f, "NoExecute"),
            TaintEffect::PreferNoSchedule => write!(f, "PreferNoSchedule"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Taint {
    pub key: String,
    #[serde(default)]
    pub value: Option<String>,
    pub effect: TaintEffect,
}

impl Taint {
    /// Only these effects actually block placement.
    pub fn is_blocking(&self) -> bool {
        matches!(self.effect, TaintEffect::NoSchedule | TaintEffect::NoExecute)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub taints: Vec<Taint>,
    pub allocatable: Resources,
}

impl Node {
    pub fn new(name: impl Into<String>, allocatable: Resources) -> Self {
        Self {
            name: name.into(),
            labels: BTreeMap::new(),
            taints: Vec::new(),
            allocatable,
        }
    }

    pub fn is_simulated(&self) -> bool {
        self.labels.contains_key(NEW_NODE_LABEL)
    }
}
