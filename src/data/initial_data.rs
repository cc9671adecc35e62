use log::debug;
use serde_json::{Map, Value};

use crate::control::control_model::{ControlNode, ControlTree};

/// Assign every record entry whose key is a leaf id onto that leaf.
///
/// The tree already has its shape from compilation, so nothing is rebuilt;
/// nested leaves are found wherever they sit. Keys that are not leaf ids
/// are ignored. Returns how many leaves received a value.
pub fn push_initial_data(tree: &mut ControlTree, record: &Map<String, Value>) -> usize {
    let mut applied = 0;
    for (id, value) in record {
        if tree.set_value(id, value.clone()) {
            applied += 1;
        } else {
            debug!("initial data key '{}' has no matching field", id);
        }
    }
    debug!("pushed initial data into {} of {} fields", applied, tree.leaf_ids().len());
    applied
}

/// Rebuild the tree-shaped value for a flat record: the inverse of
/// `flatten`. Leaves missing from the record come back as `null`.
pub fn unflatten(tree: &ControlTree, record: &Map<String, Value>) -> Map<String, Value> {
    unflatten_level(tree.nodes(), record)
}

fn unflatten_level(nodes: &[ControlNode], record: &Map<String, Value>) -> Map<String, Value> {
    nodes
        .iter()
        .map(|node| {
            let value = match node {
                ControlNode::Group(group) => Value::Object(unflatten_level(&group.children, record)),
                leaf => record.get(leaf.id()).cloned().unwrap_or(Value::Null),
            };
            (node.id().to_string(), value)
        })
        .collect()
}
