use log::{debug, warn};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::control::correlator::{ErrorCorrelator, ExternalErrorMap, ExternalValidator, PendingErrors};

/// Mutable per-leaf state, what a rendering layer binds an input to.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldState {
    pub value: Value,
    pub dirty: bool,
    pub touched: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StringField {
    pub id: String,
    pub label: String,
    pub state: FieldState,
    #[serde(skip)]
    validator: ExternalValidator,
}

impl StringField {
    pub fn new(id: impl Into<String>, label: impl Into<String>, validator: ExternalValidator) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            state: FieldState::default(),
            validator,
        }
    }

    /// Run the external validator; the result replaces any previous error.
    pub fn validate(&mut self) -> Option<&str> {
        self.state.error = self.validator.validate();
        self.state.error.as_deref()
    }

    fn validate_with(&mut self, pending: &mut PendingErrors) {
        self.state.error = self.validator.validate_with(pending);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlOption {
    pub label: String,
    pub value: Value,
}

/// Single-select leaf, shared by radio groups and choice lists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectField {
    pub id: String,
    pub label: String,
    pub options: Vec<ControlOption>,
    pub state: FieldState,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupNode {
    pub id: String,
    pub legend: String,
    /// Set on groups the compiler generated; their keys never reach a
    /// submission record.
    pub synthetic: bool,
    pub children: Vec<ControlNode>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ControlNode {
    StringField(StringField),
    RadioField(SelectField),
    ChoiceField(SelectField),
    Group(GroupNode),
}

impl ControlNode {
    pub fn id(&self) -> &str {
        match self {
            ControlNode::StringField(f) => &f.id,
            ControlNode::RadioField(f) | ControlNode::ChoiceField(f) => &f.id,
            ControlNode::Group(g) => &g.id,
        }
    }

    /// Placeholder or label for leaves, legend for groups.
    pub fn label(&self) -> &str {
        match self {
            ControlNode::StringField(f) => &f.label,
            ControlNode::RadioField(f) | ControlNode::ChoiceField(f) => &f.label,
            ControlNode::Group(g) => &g.legend,
        }
    }

    pub fn is_leaf(&self) -> bool {
        !matches!(self, ControlNode::Group(_))
    }

    pub fn state(&self) -> Option<&FieldState> {
        match self {
            ControlNode::StringField(f) => Some(&f.state),
            ControlNode::RadioField(f) | ControlNode::ChoiceField(f) => Some(&f.state),
            ControlNode::Group(_) => None,
        }
    }

    pub fn state_mut(&mut self) -> Option<&mut FieldState> {
        match self {
            ControlNode::StringField(f) => Some(&mut f.state),
            ControlNode::RadioField(f) | ControlNode::ChoiceField(f) => Some(&mut f.state),
            ControlNode::Group(_) => None,
        }
    }

    pub fn children(&self) -> &[ControlNode] {
        match self {
            ControlNode::Group(g) => &g.children,
            _ => &[],
        }
    }
}

/// The output of one compilation pass, together with the error store its
/// string fields validate against.
///
/// Cloning shares the error store with the original.
#[derive(Debug, Clone, Serialize)]
pub struct ControlTree {
    nodes: Vec<ControlNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fingerprint: Option<String>,
    #[serde(skip)]
    correlator: ErrorCorrelator,
}

impl ControlTree {
    pub fn new(nodes: Vec<ControlNode>, correlator: ErrorCorrelator) -> Self {
        Self {
            nodes,
            fingerprint: None,
            correlator,
        }
    }

    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = Some(fingerprint.into());
        self
    }

    pub fn nodes(&self) -> &[ControlNode] {
        &self.nodes
    }

    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    pub fn correlator(&self) -> &ErrorCorrelator {
        &self.correlator
    }

    /// Leaf ids in depth-first order.
    pub fn leaf_ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        collect_ids(&self.nodes, &mut ids, true);
        ids
    }

    pub fn group_ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        collect_ids(&self.nodes, &mut ids, false);
        ids
    }

    pub fn find(&self, id: &str) -> Option<&ControlNode> {
        find_node(&self.nodes, id)
    }

    /// Assign a leaf value. String fields re-validate afterwards, like any
    /// programmatic value change. Returns false when `id` is not a leaf.
    pub fn set_value(&mut self, id: &str, value: Value) -> bool {
        match find_node_mut(&mut self.nodes, id) {
            Some(ControlNode::StringField(field)) => {
                field.state.value = value;
                field.validate();
                true
            }
            Some(ControlNode::RadioField(field) | ControlNode::ChoiceField(field)) => {
                field.state.value = value;
                true
            }
            _ => false,
        }
    }

    /// Re-run validation of a single field, as happens on user edits.
    pub fn validate(&mut self, id: &str) -> Option<String> {
        match find_node_mut(&mut self.nodes, id) {
            Some(ControlNode::StringField(field)) => field.validate().map(str::to_string),
            _ => None,
        }
    }

    pub fn touch_all(&mut self) {
        visit_leaves_mut(&mut self.nodes, &mut |node| {
            if let Some(state) = node.state_mut() {
                state.touched = true;
            }
        });
    }

    pub fn valid(&self) -> bool {
        let mut valid = true;
        visit_leaves(&self.nodes, &mut |node| {
            if node.state().is_some_and(|s| s.error.is_some()) {
                valid = false;
            }
        });
        valid
    }

    /// Current value shaped like the tree: every group becomes an object
    /// keyed by its id.
    pub fn value(&self) -> Map<String, Value> {
        collect_value(&self.nodes)
    }

    /// Hand a fresh server error delivery to the tree.
    ///
    /// Entries are merged into the pending store, then each affected field
    /// is marked dirty and touched and re-validated while the store stays
    /// locked, so the message shows without further interaction. `None` or
    /// an empty map clears the store. Returns the ids whose message was
    /// surfaced on a field.
    pub fn deliver_errors(&mut self, errors: Option<&ExternalErrorMap>) -> Vec<String> {
        let mut pending = self.correlator.lock();

        let errors = match errors {
            Some(errors) if !errors.is_empty() => errors,
            _ => {
                debug!("clearing {} pending external errors", pending.len());
                pending.clear();
                return Vec::new();
            }
        };

        pending.merge(errors);

        let mut surfaced = Vec::new();
        for id in errors.keys() {
            match find_node_mut(&mut self.nodes, id) {
                Some(ControlNode::StringField(field)) => {
                    field.state.dirty = true;
                    field.state.touched = true;
                    field.validate_with(&mut pending);
                    if field.state.error.is_some() {
                        surfaced.push(id.clone());
                    }
                }
                Some(ControlNode::RadioField(field) | ControlNode::ChoiceField(field)) => {
                    field.state.dirty = true;
                    field.state.touched = true;
                    debug!("external error for '{}' kept pending, field has no validator", id);
                }
                Some(ControlNode::Group(_)) | None => {
                    warn!("external error for '{}' does not match any field", id);
                }
            }
        }
        surfaced
    }
}

fn collect_ids<'a>(nodes: &'a [ControlNode], ids: &mut Vec<&'a str>, leaves: bool) {
    for node in nodes {
        if node.is_leaf() == leaves {
            ids.push(node.id());
        }
        collect_ids(node.children(), ids, leaves);
    }
}

fn collect_value(nodes: &[ControlNode]) -> Map<String, Value> {
    nodes
        .iter()
        .map(|node| {
            let value = match node {
                ControlNode::Group(group) => Value::Object(collect_value(&group.children)),
                leaf => leaf.state().map(|s| s.value.clone()).unwrap_or(Value::Null),
            };
            (node.id().to_string(), value)
        })
        .collect()
}

fn find_node<'a>(nodes: &'a [ControlNode], id: &str) -> Option<&'a ControlNode> {
    nodes.iter().find_map(|node| {
        if node.id() == id {
            Some(node)
        } else {
            find_node(node.children(), id)
        }
    })
}

fn find_node_mut<'a>(nodes: &'a mut [ControlNode], id: &str) -> Option<&'a mut ControlNode> {
    for node in nodes.iter_mut() {
        if node.id() == id {
            return Some(node);
        }
        if let ControlNode::Group(group) = node {
            if let Some(found) = find_node_mut(&mut group.children, id) {
                return Some(found);
            }
        }
    }
    None
}

fn visit_leaves(nodes: &[ControlNode], f: &mut dyn FnMut(&ControlNode)) {
    for node in nodes {
        match node {
            ControlNode::Group(group) => visit_leaves(&group.children, f),
            leaf => f(leaf),
        }
    }
}

fn visit_leaves_mut(nodes: &mut [ControlNode], f: &mut dyn FnMut(&mut ControlNode)) {
    for node in nodes {
        match node {
            ControlNode::Group(group) => visit_leaves_mut(&mut group.children, f),
            leaf => f(leaf),
        }
    }
}
