use serde_json::{Map, Value};

use crate::layout::{
    error::CompileError,
    layout_model::{ChoiceSpec, LayoutNode, LeafKind},
};

/// Map the three accepted layout encodings onto `LayoutNode`.
///
/// - an array holding at least one nested array is a fieldset, with an
///   optional leading string legend
/// - any other array is a positional leaf `[id, label?, type?]`
/// - an object carries `id`, `label`, `type`, `controls`, `choices`
pub fn normalize_layout(specs: &[Value]) -> Result<Vec<LayoutNode>, CompileError> {
    specs
        .iter()
        .enumerate()
        .map(|(i, spec)| normalize_spec(spec, &format!("layout[{}]", i)))
        .collect()
}

fn normalize_spec(spec: &Value, path: &str) -> Result<LayoutNode, CompileError> {
    match spec {
        Value::Array(items) if items.iter().any(Value::is_array) => normalize_fieldset(items, path),
        Value::Array(items) => {
            let label = scalar_text(items.get(1), path, "label")?;
            let type_name = type_name(items.get(2), path)?;
            build_node(items.first(), label, &type_name, None, path)
        }
        Value::Object(fields) => {
            let label = scalar_text(fields.get("label"), path, "label")?;
            let type_name = type_name(fields.get("type"), path)?;
            build_node(fields.get("id"), label, &type_name, Some(fields), path)
        }
        other => Err(CompileError::InvalidLayout {
            path: path.to_string(),
            reason: format!("expected an array or an object, got {}", json_kind(other)),
        }),
    }
}

fn normalize_fieldset(items: &[Value], path: &str) -> Result<LayoutNode, CompileError> {
    let (legend, offset) = match items.first() {
        Some(Value::String(legend)) => (legend.clone(), 1),
        _ => (String::new(), 0),
    };

    let children = items[offset..]
        .iter()
        .enumerate()
        .map(|(i, child)| normalize_spec(child, &format!("{}[{}]", path, i + offset)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(LayoutNode::group(legend, children))
}

fn build_node(
    id: Option<&Value>,
    label: Option<String>,
    type_name: &str,
    fields: Option<&Map<String, Value>>,
    path: &str,
) -> Result<LayoutNode, CompileError> {
    let label = label.unwrap_or_default();

    let kind = match type_name {
        "fieldset" => {
            let controls = match fields.and_then(|f| f.get("controls")) {
                Some(Value::Array(controls)) => controls,
                Some(other) => {
                    return Err(CompileError::InvalidLayout {
                        path: path.to_string(),
                        reason: format!("controls must be a list, got {}", json_kind(other)),
                    });
                }
                None => {
                    return Err(CompileError::InvalidLayout {
                        path: path.to_string(),
                        reason: "fieldset without controls".to_string(),
                    });
                }
            };
            let children = controls
                .iter()
                .enumerate()
                .map(|(i, child)| normalize_spec(child, &format!("{}.controls[{}]", path, i)))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(LayoutNode::group(label, children));
        }
        "string" => LeafKind::String,
        "radio" | "choice" => {
            let id = field_id(id, path)?;
            let choices = choices(fields, &id, path)?;
            let kind = if type_name == "radio" {
                LeafKind::Radio { choices }
            } else {
                LeafKind::Choice { choices }
            };
            return Ok(LayoutNode::leaf(id, label, kind));
        }
        other => {
            return Err(CompileError::UnsupportedControlType {
                type_name: other.to_string(),
                path: path.to_string(),
            });
        }
    };

    Ok(LayoutNode::leaf(field_id(id, path)?, label, kind))
}

fn field_id(id: Option<&Value>, path: &str) -> Result<String, CompileError> {
    match id {
        Some(Value::String(id)) if !id.is_empty() => Ok(id.clone()),
        _ => Err(CompileError::MissingFieldId {
            path: path.to_string(),
        }),
    }
}

fn choices(
    fields: Option<&Map<String, Value>>,
    id: &str,
    path: &str,
) -> Result<Vec<ChoiceSpec>, CompileError> {
    let raw = match fields.and_then(|f| f.get("choices")) {
        Some(raw @ Value::Array(_)) => raw,
        _ => {
            return Err(CompileError::MissingChoices {
                id: id.to_string(),
                path: path.to_string(),
            });
        }
    };

    serde_json::from_value(raw.clone()).map_err(|e| CompileError::InvalidLayout {
        path: format!("{}.choices", path),
        reason: e.to_string(),
    })
}

/// Absent and `null` both mean "use the default".
fn type_name(raw: Option<&Value>, path: &str) -> Result<String, CompileError> {
    match raw {
        None | Some(Value::Null) => Ok("string".to_string()),
        Some(Value::String(t)) => Ok(t.clone()),
        Some(other) => Err(CompileError::UnsupportedControlType {
            type_name: other.to_string(),
            path: path.to_string(),
        }),
    }
}

fn scalar_text(raw: Option<&Value>, path: &str, what: &str) -> Result<Option<String>, CompileError> {
    match raw {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(v @ (Value::Number(_) | Value::Bool(_))) => Ok(Some(v.to_string())),
        Some(other) => Err(CompileError::InvalidLayout {
            path: path.to_string(),
            reason: format!("{} must be text, got {}", what, json_kind(other)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Stable digest of a raw layout, used to tag trace events.
pub fn layout_fingerprint(specs: &[Value]) -> String {
    use sha1::{Digest, Sha1};

    let mut hasher = Sha1::new();
    for spec in specs {
        hasher.update(spec.to_string().as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}
