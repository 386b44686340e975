//! Expansion of the new-node template into candidate nodes.

use crate::error::PlannerError;
use crate::node::{Node, NEW_NODE_LABEL, NEW_NODE_NAME_PREFIX};

/// Clones `template` `count` times, giving each clone a deterministic unique
/// name (`simulated-node-00`, `simulated-node-01`, ...) and the marker label
/// identifying it as simulator-added.
///
/// An absent template is a configuration error. `count = 0` yields an empty
/// sequence. Candidate nodes are rebuilt from scratch every iteration, so
/// names only need to be unique within a single call.
pub fn expand_template(template: Option<&Node>, count: u32) -> Result<Vec<Node>, PlannerError> {
    let template = template.ok_or(PlannerError::MissingNodeTemplate)?;

    let mut nodes = Vec::with_capacity(count as usize);
    for i in 0..count {
        let mut node = template.clone();
        node.name = format!("{}-{:02}", NEW_NODE_NAME_PREFIX, i);
        node.labels.insert(NEW_NODE_LABEL.to_string(), String::new());
        nodes.push(node);
    }
    Ok(nodes)
}
