use log::error;
use serde_json::{Map, Value};

use crate::{
    control::control_model::{ControlNode, ControlTree},
    layout::layout_model::SYNTHETIC_PREFIX,
};

/// Flat `{leaf id: value}` payload handed to the transport.
pub type SubmissionRecord = Map<String, Value>;

/// The value being flattened no longer matches the tree it came from.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FlattenError {
    #[error("key '{key}' at {path} looks like a generated group but the tree has no such group")]
    UnknownSyntheticKey { key: String, path: String },

    #[error("group '{id}' at {path} holds a non-object value")]
    GroupNotObject { id: String, path: String },
}

/// Remove every synthetic group wrapper from a tree-shaped value.
///
/// The walk is driven by the compiled tree: a key is hoisted only when the
/// tree has a synthetic group with that id at that level. Children are
/// flattened before their group is hoisted, so any nesting depth collapses
/// in one pass. Leaf values, arrays included, are copied untouched; keys the
/// tree does not know (a pressed button, extra data) pass through.
pub fn flatten(tree: &ControlTree, value: &Map<String, Value>) -> Result<SubmissionRecord, FlattenError> {
    flatten_level(tree.nodes(), value, "$").inspect_err(|e| error!("flatten failed: {}", e))
}

fn flatten_level(
    nodes: &[ControlNode],
    value: &Map<String, Value>,
    path: &str,
) -> Result<SubmissionRecord, FlattenError> {
    let mut record = SubmissionRecord::new();
    let mut hoisted = Vec::new();

    for (key, val) in value {
        match nodes.iter().find(|node| node.id() == key.as_str()) {
            Some(ControlNode::Group(group)) => {
                let inner = val.as_object().ok_or_else(|| FlattenError::GroupNotObject {
                    id: group.id.clone(),
                    path: path.to_string(),
                })?;
                let flat = flatten_level(&group.children, inner, &format!("{}.{}", path, key))?;

                if group.synthetic {
                    hoisted.push(flat);
                } else {
                    record.insert(key.clone(), Value::Object(flat));
                }
            }
            Some(_) => {
                record.insert(key.clone(), val.clone());
            }
            None if is_synthetic_key(key) => {
                return Err(FlattenError::UnknownSyntheticKey {
                    key: key.clone(),
                    path: path.to_string(),
                });
            }
            None => {
                record.insert(key.clone(), val.clone());
            }
        }
    }

    // Hoisted fields win over same-named pass-through keys.
    for flat in hoisted {
        record.extend(flat);
    }
    Ok(record)
}

/// `generated_<digits>`
pub fn is_synthetic_key(key: &str) -> bool {
    key.strip_prefix(SYNTHETIC_PREFIX)
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}
