//! Capacity planner for k8s clusters: given a cluster description, a workload
//! set and a new-node template, finds the minimum number of additional nodes
//! needed so that every pod can be scheduled without violating the configured
//! resource-occupancy ceilings.

pub mod admission;
pub mod classifier;
pub mod cluster;
pub mod default_oracles;
pub mod error;
pub mod node;
pub mod node_template;
pub mod oracle;
pub mod planner;
pub mod planner_config;
pub mod pod;
pub mod report;
pub mod resources;
pub mod workload;
