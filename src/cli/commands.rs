use std::time::Duration;

use serde_json::{Value, json};

use crate::actions::normalize::normalize_actions;
use crate::cli::config::AppConfig;
use crate::control::control_model::ControlTree;
use crate::data::flatten::flatten;
use crate::form::form_model::SubmitEvent;
use crate::form::session::FormSession;
use crate::layout::compiler::compile_layout;
use crate::trace::logger::TraceLogger;
use crate::transport::http::HttpTransport;

// ============================================================================
// compile subcommand
// ============================================================================

pub fn cmd_compile(layout_path: &str) -> Result<String, Box<dyn std::error::Error>> {
    let layout = load_layout(layout_path)?;
    let tree = compile_layout(&layout)?;
    Ok(serde_json::to_string_pretty(&tree)?)
}

// ============================================================================
// flatten subcommand
// ============================================================================

pub fn cmd_flatten(layout_path: &str, value_path: &str) -> Result<String, Box<dyn std::error::Error>> {
    let tree = compile_layout(&load_layout(layout_path)?)?;
    let value = match load_document(value_path)? {
        Value::Object(value) => value,
        _ => return Err(format!("{}: expected an object", value_path).into()),
    };

    let record = flatten(&tree, &value)?;
    Ok(serde_json::to_string_pretty(&record)?)
}

// ============================================================================
// actions subcommand
// ============================================================================

pub fn cmd_actions(path: &str) -> Result<String, Box<dyn std::error::Error>> {
    let document = load_document(path)?;
    let actions = match &document {
        Value::Object(config) => config.get("actions"),
        other => Some(other),
    };

    let actions = normalize_actions(actions)?;
    Ok(serde_json::to_string_pretty(&actions)?)
}

// ============================================================================
// fetch / submit subcommands
// ============================================================================

pub fn cmd_fetch(
    url: &str,
    config: &AppConfig,
    tracer: TraceLogger,
) -> Result<String, Box<dyn std::error::Error>> {
    let mut session = remote_session(url, config, tracer)?;
    session.init()?;

    let summary = json!({
        "form_title": session.form_title(),
        "actions": session.actions(),
        "controls": session.tree(),
        "value": session.value(),
    });
    Ok(serde_json::to_string_pretty(&summary)?)
}

/// Returns the printed event and whether the server accepted the data.
pub fn cmd_submit(
    url: &str,
    data_path: &str,
    button: Option<&str>,
    cancel: bool,
    config: &AppConfig,
    tracer: TraceLogger,
) -> Result<(String, bool), Box<dyn std::error::Error>> {
    let mut session = remote_session(url, config, tracer)?;
    session.init()?;
    session.set_initial_data(load_document(data_path)?);

    let event = session.submitted(button, cancel)?;
    let accepted = !matches!(event, SubmitEvent::Rejected { .. });

    let mut output = serde_json::to_string_pretty(&event)?;
    if let SubmitEvent::Rejected { .. } = event {
        if let Some(tree) = session.tree() {
            output.push('\n');
            output.push_str(&format_field_errors(tree));
        }
    }
    Ok((output, accepted))
}

fn remote_session(
    url: &str,
    config: &AppConfig,
    tracer: TraceLogger,
) -> Result<FormSession, Box<dyn std::error::Error>> {
    let transport = HttpTransport::new(url, Some(Duration::from_secs(config.server.timeout_secs)))?
        .with_extra_form_data(config.server.extra_form_data.clone());
    Ok(FormSession::with_transport(transport).with_tracer(tracer))
}

// ============================================================================
// Helpers
// ============================================================================

/// Read a JSON or YAML file into a JSON value.
pub fn load_document(path: &str) -> Result<Value, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    let value: Value = serde_yaml::from_str(&content)?;
    Ok(value)
}

/// Accept either a bare layout list or a form config carrying one.
pub fn load_layout(path: &str) -> Result<Vec<Value>, Box<dyn std::error::Error>> {
    match load_document(path)? {
        Value::Array(layout) => Ok(layout),
        Value::Object(mut config) => match config.remove("layout") {
            Some(Value::Array(layout)) => Ok(layout),
            _ => Err(format!("{}: no layout list", path).into()),
        },
        _ => Err(format!("{}: expected a layout list or a form config", path).into()),
    }
}

fn format_field_errors(tree: &ControlTree) -> String {
    let mut lines = Vec::new();
    for id in tree.leaf_ids() {
        if let Some(error) = tree.find(id).and_then(|n| n.state()).and_then(|s| s.error.as_deref()) {
            lines.push(format!("  {}: {}", id, error));
        }
    }
    if lines.is_empty() {
        "rejected without field messages".to_string()
    } else {
        format!("field errors:\n{}", lines.join("\n"))
    }
}
