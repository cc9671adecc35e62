use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Prefix of every id assigned to a compiled group.
pub const SYNTHETIC_PREFIX: &str = "generated_";

/// A layout entry after boundary normalization. Nothing downstream of
/// `normalize_layout` looks at the raw JSON shape again.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum LayoutNode {
    Leaf(LeafSpec),
    Group(GroupSpec),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeafSpec {
    pub id: String,
    pub label: String,
    pub kind: LeafKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSpec {
    pub legend: String,
    pub children: Vec<LayoutNode>,
}

/// Supported leaf control types. Radio and choice carry the same data and
/// differ only in how they are presented.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LeafKind {
    String,
    Radio { choices: Vec<ChoiceSpec> },
    Choice { choices: Vec<ChoiceSpec> },
}

/// One entry of a `choices` list as sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceSpec {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub value: Value,
}

impl LayoutNode {
    pub fn leaf(id: impl Into<String>, label: impl Into<String>, kind: LeafKind) -> Self {
        LayoutNode::Leaf(LeafSpec {
            id: id.into(),
            label: label.into(),
            kind,
        })
    }

    pub fn group(legend: impl Into<String>, children: Vec<LayoutNode>) -> Self {
        LayoutNode::Group(GroupSpec {
            legend: legend.into(),
            children,
        })
    }
}
