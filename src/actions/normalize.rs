use serde_json::Value;

use crate::actions::action_model::{ActionDescriptor, ActionError, DEFAULT_ACTION_COLOR};

/// Normalize the `actions` entry of a form config, order preserved.
///
/// - primitive: `id = label = value`
/// - pair `[id, label?]`: label defaults to the id
/// - object: `id`, `label`, `cancel` read as given, `color` defaults to
///   `"primary"` when absent or empty
///
/// `cancel` is read from the raw entry for every encoding, so only objects
/// can set it. A missing or `null` list yields no actions.
pub fn normalize_actions(actions: Option<&Value>) -> Result<Vec<ActionDescriptor>, ActionError> {
    let entries = match actions {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(entries)) => entries,
        Some(_) => return Err(ActionError::NotAList),
    };

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| normalize_action(index, entry))
        .collect()
}

fn normalize_action(index: usize, entry: &Value) -> Result<ActionDescriptor, ActionError> {
    let missing = || ActionError::MissingActionId { index };

    let (id, label, color) = match entry {
        Value::Array(pair) => {
            let id = pair.first().and_then(primitive_text).ok_or_else(missing)?;
            let label = pair.get(1).and_then(primitive_text).unwrap_or_else(|| id.clone());
            (id, Some(label), DEFAULT_ACTION_COLOR.to_string())
        }
        Value::Object(fields) => {
            let id = fields.get("id").and_then(primitive_text).ok_or_else(missing)?;
            let label = fields.get("label").and_then(primitive_text);
            let color = fields
                .get("color")
                .and_then(Value::as_str)
                .filter(|c| !c.is_empty())
                .unwrap_or(DEFAULT_ACTION_COLOR)
                .to_string();
            (id, label, color)
        }
        primitive => {
            let id = primitive_text(primitive).ok_or_else(missing)?;
            (id.clone(), Some(id), DEFAULT_ACTION_COLOR.to_string())
        }
    };

    Ok(ActionDescriptor {
        id,
        label,
        color,
        cancel: entry.get("cancel").and_then(Value::as_bool),
    })
}

fn primitive_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
