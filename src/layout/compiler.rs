use std::collections::HashSet;

use log::debug;
use serde_json::Value;

use crate::{
    control::{
        control_model::{ControlNode, ControlOption, ControlTree, FieldState, GroupNode, SelectField, StringField},
        correlator::ErrorCorrelator,
    },
    layout::{
        error::CompileError,
        layout_model::{ChoiceSpec, LayoutNode, LeafKind, LeafSpec, SYNTHETIC_PREFIX},
        normalize::{layout_fingerprint, normalize_layout},
    },
};

/// Normalize and compile a raw layout in one go.
pub fn compile_layout(specs: &[Value]) -> Result<ControlTree, CompileError> {
    let nodes = normalize_layout(specs)?;
    let tree = compile(&nodes)?.with_fingerprint(layout_fingerprint(specs));

    debug!(
        "compiled layout {}: {} fields, {} groups",
        tree.fingerprint().unwrap_or_default(),
        tree.leaf_ids().len(),
        tree.group_ids().len()
    );
    Ok(tree)
}

/// Compile normalized layout nodes into a fresh control tree.
///
/// Each call starts a new pass: group ids restart at `generated_0` and the
/// tree gets its own error store.
pub fn compile(nodes: &[LayoutNode]) -> Result<ControlTree, CompileError> {
    let correlator = ErrorCorrelator::new();
    let mut pass = CompilePass {
        next_group: 0,
        seen: HashSet::new(),
        correlator: &correlator,
    };
    let controls = pass.compile_nodes(nodes)?;
    Ok(ControlTree::new(controls, correlator))
}

struct CompilePass<'a> {
    next_group: usize,
    seen: HashSet<String>,
    correlator: &'a ErrorCorrelator,
}

impl CompilePass<'_> {
    fn compile_nodes(&mut self, nodes: &[LayoutNode]) -> Result<Vec<ControlNode>, CompileError> {
        nodes.iter().map(|node| self.compile_node(node)).collect()
    }

    fn compile_node(&mut self, node: &LayoutNode) -> Result<ControlNode, CompileError> {
        match node {
            LayoutNode::Group(group) => {
                // Ids are handed out before descending, so parents get the lower number.
                let id = format!("{}{}", SYNTHETIC_PREFIX, self.next_group);
                self.next_group += 1;
                self.claim(&id)?;

                Ok(ControlNode::Group(GroupNode {
                    id,
                    legend: group.legend.clone(),
                    synthetic: true,
                    children: self.compile_nodes(&group.children)?,
                }))
            }
            LayoutNode::Leaf(leaf) => {
                self.claim(&leaf.id)?;
                Ok(self.compile_leaf(leaf))
            }
        }
    }

    fn compile_leaf(&self, leaf: &LeafSpec) -> ControlNode {
        match &leaf.kind {
            LeafKind::String => ControlNode::StringField(StringField::new(
                leaf.id.clone(),
                leaf.label.clone(),
                self.correlator.validator_for(&leaf.id),
            )),
            LeafKind::Radio { choices } => ControlNode::RadioField(select_field(leaf, choices)),
            LeafKind::Choice { choices } => ControlNode::ChoiceField(select_field(leaf, choices)),
        }
    }

    fn claim(&mut self, id: &str) -> Result<(), CompileError> {
        if self.seen.insert(id.to_string()) {
            Ok(())
        } else {
            Err(CompileError::DuplicateFieldId { id: id.to_string() })
        }
    }
}

fn select_field(leaf: &LeafSpec, choices: &[ChoiceSpec]) -> SelectField {
    SelectField {
        id: leaf.id.clone(),
        label: leaf.label.clone(),
        options: choices
            .iter()
            .map(|choice| ControlOption {
                label: choice.display_name.clone(),
                value: choice.value.clone(),
            })
            .collect(),
        state: FieldState::default(),
    }
}
