//! Resource amounts with k8s-style precision (millicores for CPU, bytes for memory).

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize, Serializer};

/// Resource kinds in the fixed order used by the admission checker.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ResourceKind {
    Cpu,
    Memory,
    Storage,
    Extended(String),
}

// Serialized by name so reports can key maps on the kind.
impl Serialize for ResourceKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            ResourceKind::Cpu => write!(f, "cpu"),
            ResourceKind::Memory => write!(f, "memory"),
            ResourceKind::Storage => write!(f, "storage"),
            ResourceKind::Extended(name) => write!(f, "{}", name),
        }
    }
}

/// Vector of resource amounts attached to a node (allocatable) or a pod (requests).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    /// CPU in millicores.
    #[serde(default)]
    pub cpu_milli: u64,
    /// Memory in bytes.
    #[serde(default)]
    pub memory: u64,
    /// Local storage (volume group) capacity in bytes.
    #[serde(default)]
    pub storage: u64,
    /// Extended resources by name, opaque integer amounts.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extended: BTreeMap<String, u64>,
}

impl Resources {
    pub fn new(cpu_milli: u64, memory: u64) -> Self {
        Self {
            cpu_milli,
            memory,
            ..Default::default()
        }
    }

    pub fn get(&self, kind: &ResourceKind) -> u64 {
        match kind {
            ResourceKind::Cpu => self.cpu_milli,
            ResourceKind::Memory => self.memory,
            ResourceKind::Storage => self.storage,
            ResourceKind::Extended(name) => self.extended.get(name).copied().unwrap_or(0),
        }
    }

    /// Resource kinds with a non-zero amount, in admission evaluation order.
    pub fn kinds(&self) -> Vec<ResourceKind> {
        let mut kinds = Vec::new();
        if self.cpu_milli > 0 {
            kinds.push(ResourceKind::Cpu);
        }
        if self.memory > 0 {
            kinds.push(ResourceKind::Memory);
        }
        if self.storage > 0 {
            kinds.push(ResourceKind::Storage);
        }
        for name in self.extended.keys() {
            kinds.push(ResourceKind::Extended(name.clone()));
        }
        kinds
    }

    /// True if every dimension of `self` fits within `capacity`.
    pub fn fits_within(&self, capacity: &Resources) -> bool {
        self.cpu_milli <= capacity.cpu_milli
            && self.memory <= capacity.memory
            && self.storage <= capacity.storage
            && self
                .extended
                .iter()
                .all(|(name, amount)| *amount <= capacity.extended.get(name).copied().unwrap_or(0))
    }

    pub fn is_zero(&self) -> bool {
        self.cpu_milli == 0
            && self.memory == 0
            && self.storage == 0
            && self.extended.values().all(|amount| *amount == 0)
    }
}

impl Add for Resources {
    type Output = Resources;

    fn add(mut self, rhs: Resources) -> Resources {
        self += rhs;
        self
    }
}

impl AddAssign for Resources {
    fn add_assign(&mut self, rhs: Resources) {
        self.cpu_milli += rhs.cpu_milli;
        self.memory += rhs.memory;
        self.storage += rhs.storage;
        for (name, amount) in rhs.extended {
            *self.extended.entry(name).or_insert(0) += amount;
        }
    }
}
